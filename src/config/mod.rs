pub mod defaults;
pub mod settings;

pub use settings::{CacheSettings, Config, ScanSettings};
