use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 删除失败的条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedOp {
    pub path: PathBuf,
    pub reason: String,
}

/// 清理操作的结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanResult {
    /// 是否为演练模式
    pub dry_run: bool,

    /// 已删除（或演练中将被删除）的目录
    pub deleted: Vec<PathBuf>,

    /// 失败的目录及原因
    pub failed: Vec<FailedOp>,

    /// 释放的空间
    pub space_reclaimed: u64,
}

impl CleanResult {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
