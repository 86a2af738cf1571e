pub mod config;
pub mod error;
pub mod models;
pub mod operations;
pub mod scanner;
pub mod tui;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{CacheError, ScanError};
pub use models::{CleanResult, DependencyFolder, Ecosystem, FailedOp, ScanResult};
pub use operations::{CleanupOperation, CleanupOptions};
pub use scanner::{CacheProvider, FlushPolicy, ScanConfig, Scanner, SizeAnalyzer, SizeCache};
