use std::path::PathBuf;

pub struct DefaultConfig;

impl DefaultConfig {
    /// 默认分析任务数量
    pub const WORKERS: usize = 4;

    /// 默认最大扫描深度
    pub const MAX_DEPTH: usize = 10;

    /// 默认不进入的系统目录
    pub fn default_ignore_paths() -> Vec<PathBuf> {
        [
            // macOS 系统目录
            "/System",
            "/Library",
            "/Applications",
            "/private/var",
            "/.Trash",
            "/.Spotlight-V100",
            "/.fseventsd",
            "/Network",
            "/Volumes",
            // Linux 虚拟文件系统
            "/proc",
            "/sys",
            "/dev",
            "/run",
        ]
        .iter()
        .map(PathBuf::from)
        .collect()
    }

    /// 默认扫描的根目录
    pub fn default_scan_path() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// 默认缓存文件路径
    pub fn default_cache_path() -> PathBuf {
        crate::scanner::SizeCache::default_path()
    }
}
