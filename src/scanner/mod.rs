pub mod classifier;
pub mod engine;
pub mod size_analyzer;
pub mod size_cache;

pub use classifier::{classify_type, is_target, TARGET_DIRECTORIES};
pub use engine::{FlushPolicy, ScanConfig, Scanner};
pub use size_analyzer::{SizeAnalyzer, SizeTally};
pub use size_cache::{CacheEntry, CacheIndex, CacheProvider, CacheStats, SizeCache};
