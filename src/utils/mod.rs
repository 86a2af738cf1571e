pub mod report;
pub mod size_format;
pub mod time_format;
