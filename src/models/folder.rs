use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// 依赖目录所属的生态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ecosystem {
    #[serde(rename = "Node.js")]
    NodeJs,

    #[serde(rename = "Go/PHP")]
    GoPhp,

    Python,

    Rust,

    Unknown,
}

impl Ecosystem {
    /// 显示用的标签
    pub fn label(&self) -> &'static str {
        match self {
            Ecosystem::NodeJs => "Node.js",
            Ecosystem::GoPhp => "Go/PHP",
            Ecosystem::Python => "Python",
            Ecosystem::Rust => "Rust",
            Ecosystem::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 一个可清理的依赖 / 构建产物目录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyFolder {
    /// 绝对路径，同一次扫描内唯一
    pub path: PathBuf,

    /// 目录下所有文件的总字节数
    pub size: u64,

    /// 目录本身的修改时间
    pub mod_time: DateTime<Utc>,

    /// 最后访问时间（平台不支持时等于修改时间）
    pub access_time: DateTime<Utc>,

    /// 生态类型
    #[serde(rename = "type")]
    pub ecosystem: Ecosystem,

    /// 统计时无法读取的子项数量；大于 0 时 size 只是下限
    #[serde(default)]
    pub skipped_entries: u64,
}

impl DependencyFolder {
    /// 大小是否只是部分统计结果
    pub fn is_partial(&self) -> bool {
        self.skipped_entries > 0
    }

    /// 目录名（用于显示）
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
