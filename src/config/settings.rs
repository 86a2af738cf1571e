use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::defaults::DefaultConfig;
use crate::scanner::{FlushPolicy, ScanConfig};

/// 覆盖 `scan.workers` 的环境变量
pub const ENV_WORKERS: &str = "DEPO_CLEANER_WORKERS";

/// 覆盖 `scan.max_depth` 的环境变量
pub const ENV_MAX_DEPTH: &str = "DEPO_CLEANER_MAX_DEPTH";

/// 可以通过 `config set` 修改的键
pub const SETTABLE_KEYS: &[&str] = &[
    "scan.default_path",
    "scan.workers",
    "scan.max_depth",
    "scan.follow_symlinks",
    "cache.enabled",
    "cache.path",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 扫描配置
    pub scan: ScanSettings,

    /// 缓存配置
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// 未指定路径时扫描的目录
    pub default_path: PathBuf,

    /// 分析任务数量
    pub workers: usize,

    /// 最大扫描深度，0 表示不限制
    pub max_depth: usize,

    /// 是否跟随符号链接
    pub follow_symlinks: bool,

    /// 不进入的路径
    pub ignore_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// 是否启用大小缓存
    pub enabled: bool,

    /// 缓存文件路径
    pub path: PathBuf,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            default_path: DefaultConfig::default_scan_path(),
            workers: DefaultConfig::WORKERS,
            max_depth: DefaultConfig::MAX_DEPTH,
            follow_symlinks: false,
            ignore_paths: DefaultConfig::default_ignore_paths(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: DefaultConfig::default_cache_path(),
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件 {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("配置文件格式错误 {}", path.display()))?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        // 确保目录存在
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("无法写入配置文件 {}", path.display()))?;
        Ok(())
    }

    /// 获取默认配置文件路径
    pub fn default_config_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法找到配置目录"))?;
        path.push("depo-cleaner");
        path.push("config.toml");
        Ok(path)
    }

    /// 加载配置，如果文件不存在则创建默认配置
    pub fn load_or_create_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_or_create(&config_path)
    }

    /// 从指定路径加载，文件不存在时写入默认配置
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            let config = Self::default();
            config.save_to_file(path)?;
            tracing::info!(path = %path.display(), "已创建默认配置文件");
            Ok(config)
        }
    }

    /// 恢复默认值
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 按点分隔的键修改配置，例如 `scan.workers`
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "scan.default_path" => self.scan.default_path = PathBuf::from(value),
            "scan.workers" => {
                let workers: usize = value
                    .parse()
                    .with_context(|| format!("{} 必须是正整数: {}", key, value))?;
                if workers == 0 {
                    bail!("{} 必须大于 0", key);
                }
                self.scan.workers = workers;
            }
            "scan.max_depth" => {
                self.scan.max_depth = value
                    .parse()
                    .with_context(|| format!("{} 必须是非负整数: {}", key, value))?;
            }
            "scan.follow_symlinks" => self.scan.follow_symlinks = parse_bool(key, value)?,
            "cache.enabled" => self.cache.enabled = parse_bool(key, value)?,
            "cache.path" => self.cache.path = PathBuf::from(value),
            _ => bail!("未知的配置项: {}（可用: {}）", key, SETTABLE_KEYS.join(", ")),
        }
        Ok(())
    }

    /// 用环境变量覆盖配置，无效值只记录警告
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_WORKERS) {
            match value.trim().parse::<usize>() {
                Ok(workers) if workers > 0 => self.scan.workers = workers,
                _ => tracing::warn!(var = ENV_WORKERS, value = %value, "忽略无效的环境变量"),
            }
        }

        if let Some(value) = lookup(ENV_MAX_DEPTH) {
            match value.trim().parse::<usize>() {
                Ok(depth) => self.scan.max_depth = depth,
                Err(_) => tracing::warn!(var = ENV_MAX_DEPTH, value = %value, "忽略无效的环境变量"),
            }
        }
    }

    /// 生成扫描引擎配置
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            workers: self.scan.workers.max(1),
            max_depth: (self.scan.max_depth > 0).then_some(self.scan.max_depth),
            follow_symlinks: self.scan.follow_symlinks,
            ignore_paths: self.scan.ignore_paths.clone(),
            flush_policy: FlushPolicy::OnComplete,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => bail!("{} 必须是布尔值 (true/false): {}", key, value),
    }
}
