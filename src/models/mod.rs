pub mod clean_result;
pub mod folder;
pub mod scan_result;

pub use clean_result::{CleanResult, FailedOp};
pub use folder::{DependencyFolder, Ecosystem};
pub use scan_result::ScanResult;
