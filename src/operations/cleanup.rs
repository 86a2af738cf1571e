use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::models::{CleanResult, DependencyFolder, FailedOp};

/// 删除方式
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupOptions {
    /// 只报告将要删除的目录，不做任何修改
    pub dry_run: bool,

    /// 移动到系统回收站而不是直接删除
    pub use_trash: bool,
}

/// 依赖目录清理操作
pub struct CleanupOperation {
    options: CleanupOptions,
}

impl CleanupOperation {
    pub fn new(options: CleanupOptions) -> Self {
        Self { options }
    }

    /// 并行删除选中的目录（阻塞）
    ///
    /// 结果中的 deleted 和 failed 保持输入顺序。
    pub fn run(&self, cancel: &CancellationToken, folders: &[DependencyFolder]) -> CleanResult {
        let outcomes: Vec<_> = folders
            .par_iter()
            .map(|folder| (folder, self.remove(cancel, &folder.path)))
            .collect();

        let mut result = CleanResult {
            dry_run: self.options.dry_run,
            ..CleanResult::default()
        };

        for (folder, outcome) in outcomes {
            match outcome {
                Ok(()) => {
                    if self.options.dry_run {
                        tracing::info!(path = %folder.path.display(), size = folder.size, "演练：将删除");
                    } else {
                        tracing::info!(path = %folder.path.display(), size = folder.size, "已删除");
                    }
                    result.deleted.push(folder.path.clone());
                    result.space_reclaimed += folder.size;
                }
                Err(reason) => {
                    tracing::error!(path = %folder.path.display(), reason = %reason, "删除失败");
                    result.failed.push(FailedOp {
                        path: folder.path.clone(),
                        reason,
                    });
                }
            }
        }

        result
    }

    fn remove(&self, cancel: &CancellationToken, path: &Path) -> Result<(), String> {
        if cancel.is_cancelled() {
            return Err("已取消".to_string());
        }

        if fs::symlink_metadata(path).is_err() {
            return Err("路径已不存在".to_string());
        }

        if self.options.dry_run {
            return Ok(());
        }

        if self.options.use_trash {
            trash::delete(path).map_err(|e| format!("无法移动到回收站: {}", e))
        } else {
            fs::remove_dir_all(path).map_err(|e| e.to_string())
        }
    }
}
