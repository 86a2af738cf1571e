use chrono::{DateTime, Utc};
use std::fs::{self, Metadata};
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::error::ScanError;
use crate::models::DependencyFolder;
use crate::scanner::classifier;

/// 大小分析器 - 负责统计单个依赖目录的大小和访问时间
///
/// 这是阻塞 IO 操作，扫描引擎总是在阻塞线程池中调用它。
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeAnalyzer;

/// 一次递归统计的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeTally {
    /// 非目录项的字节总数
    pub bytes: u64,

    /// 统计到的文件数量
    pub files: u64,

    /// 无法读取而被跳过的子项数量
    pub skipped: u64,
}

impl SizeAnalyzer {
    /// 创建新的大小分析器
    pub fn new() -> Self {
        Self
    }

    /// 分析目录，返回依赖目录信息
    ///
    /// 只有目录本身无法 stat 时才返回错误；子项的错误会被跳过并计入
    /// `skipped_entries`，此时 size 只是下限。
    pub fn analyze(&self, path: &Path) -> Result<DependencyFolder, ScanError> {
        let metadata = fs::metadata(path).map_err(|e| ScanError::from_io(path, e))?;
        let modified = metadata.modified().map_err(|e| ScanError::from_io(path, e))?;

        let tally = self.calculate_size(path);
        if tally.skipped > 0 {
            tracing::debug!(
                path = %path.display(),
                skipped = tally.skipped,
                "部分子项无法读取，大小为下限值"
            );
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(DependencyFolder {
            path: path.to_path_buf(),
            size: tally.bytes,
            mod_time: DateTime::<Utc>::from(modified),
            access_time: DateTime::<Utc>::from(resolve_access_time(&metadata)),
            ecosystem: classifier::classify_type(&name),
            skipped_entries: tally.skipped,
        })
    }

    /// 递归累加目录下所有非目录项的大小
    pub fn calculate_size(&self, path: &Path) -> SizeTally {
        let mut tally = SizeTally::default();

        for entry in WalkDir::new(path).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "跳过无法访问的子项");
                    tally.skipped += 1;
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => {
                    tally.bytes += metadata.len();
                    tally.files += 1;
                }
                Err(err) => {
                    tracing::debug!(path = %entry.path().display(), error = %err, "无法读取元数据");
                    tally.skipped += 1;
                }
            }
        }

        tally
    }
}

/// 获取最后访问时间，平台不支持时回退到修改时间
pub fn resolve_access_time(metadata: &Metadata) -> SystemTime {
    metadata
        .accessed()
        .or_else(|_| metadata.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}
