use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 扫描过程中的错误
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("权限不足: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("路径不存在: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("不是目录: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("IO 错误 ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("后台任务失败: {0}")]
    TaskFailed(String),
}

impl ScanError {
    /// 按 io::ErrorKind 归类文件系统错误
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source: err },
        }
    }

    /// 遍历时 walkdir 报告的错误
    pub fn from_walk(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        match err.into_io_error() {
            Some(io_err) => Self::from_io(&path, io_err),
            None => Self::Io {
                path,
                source: io::Error::new(io::ErrorKind::Other, "检测到符号链接循环"),
            },
        }
    }

    /// 出错的路径（任务失败时没有路径）
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::NotADirectory { path }
            | Self::Io { path, .. } => Some(path),
            Self::TaskFailed(_) => None,
        }
    }

    /// 权限不足或路径不存在属于可预期的跳过，其余视为真正的错误
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. } | Self::NotFound { .. })
    }
}

/// 缓存读写错误
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("缓存 IO 错误: {0}")]
    Io(#[from] io::Error),

    #[error("缓存文件已损坏: {}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("缓存序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_classification() {
        let path = Path::new("/tmp/x");

        let err = ScanError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ScanError::PermissionDenied { .. }));
        assert!(err.is_skippable());

        let err = ScanError::from_io(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, ScanError::NotFound { .. }));

        let err = ScanError::from_io(path, io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(matches!(err, ScanError::Io { .. }));
        assert!(!err.is_skippable());
        assert_eq!(err.path(), Some(path));
    }
}
