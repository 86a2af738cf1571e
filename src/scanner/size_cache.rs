use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::CacheError;

/// 缓存文件格式版本
pub const CACHE_VERSION: &str = "1.0";

/// 扫描引擎依赖的缓存能力
pub trait CacheProvider: Send + Sync {
    /// 只读查询
    fn get(&self, path: &Path) -> Option<CacheEntry>;

    /// 插入或更新条目，只修改内存
    fn set(&self, path: &Path, entry: CacheEntry);

    /// 条目存在且修改时间完全相同才算有效
    fn is_valid(&self, path: &Path, current_mod_time: DateTime<Utc>) -> bool;

    /// 把内存中的修改写回磁盘
    fn save(&self) -> Result<(), CacheError>;
}

/// 缓存条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// 目录绝对路径
    pub path: PathBuf,

    /// 上次统计的大小
    pub size: u64,

    /// 上次统计时目录的修改时间
    pub mod_time: DateTime<Utc>,

    /// 上次统计的时间
    pub last_scan: DateTime<Utc>,
}

/// 持久化的缓存索引
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheIndex {
    /// 缓存格式版本
    pub version: String,

    /// 路径 -> 条目
    pub entries: HashMap<PathBuf, CacheEntry>,

    /// 最后写盘时间
    pub updated_at: DateTime<Utc>,
}

impl Default for CacheIndex {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION.to_string(),
            entries: HashMap::new(),
            updated_at: Utc::now(),
        }
    }
}

struct CacheState {
    index: CacheIndex,
    dirty: bool,
}

/// 目录大小缓存
///
/// 构造时从磁盘加载一次，之后只在内存中修改，调用 `save` 时整体原子写回。
/// 所有读写都经过同一把读写锁，可以被多个分析任务共享。
pub struct SizeCache {
    /// 缓存文件路径
    cache_file: PathBuf,

    state: RwLock<CacheState>,
}

/// 缓存统计信息
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// 条目数量
    pub total_entries: usize,

    /// 所有条目记录的大小之和
    pub total_cached_size: u64,

    /// 最后更新时间
    pub last_updated: DateTime<Utc>,

    /// 缓存文件大小
    pub cache_file_size: u64,
}

impl SizeCache {
    /// 加载缓存；文件损坏时记录警告并从空缓存开始
    pub fn new(cache_file: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache_file = cache_file.into();

        match Self::open(&cache_file) {
            Err(CacheError::Corrupt { path, source }) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "缓存文件已损坏，使用空缓存"
                );
                Ok(Self::empty(cache_file))
            }
            other => other,
        }
    }

    /// 严格加载缓存：文件不存在时为空缓存，内容损坏时返回错误
    pub fn open(cache_file: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache_file = cache_file.into();

        let content = match fs::read(&cache_file) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::empty(cache_file));
            }
            Err(err) => return Err(CacheError::Io(err)),
        };

        let index: CacheIndex =
            serde_json::from_slice(&content).map_err(|source| CacheError::Corrupt {
                path: cache_file.clone(),
                source,
            })?;

        tracing::debug!(
            path = %cache_file.display(),
            entries = index.entries.len(),
            "已加载缓存"
        );

        Ok(Self {
            cache_file,
            state: RwLock::new(CacheState { index, dirty: false }),
        })
    }

    fn empty(cache_file: PathBuf) -> Self {
        Self {
            cache_file,
            state: RwLock::new(CacheState {
                index: CacheIndex::default(),
                dirty: false,
            }),
        }
    }

    /// 默认缓存文件位置
    pub fn default_path() -> PathBuf {
        let cache_dir = dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".cache")))
            .unwrap_or_else(|| PathBuf::from("."));

        cache_dir.join("depo-cleaner").join("cache.json")
    }

    /// 缓存文件路径
    pub fn path(&self) -> &Path {
        &self.cache_file
    }

    pub fn len(&self) -> usize {
        self.read().index.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 是否有尚未写盘的修改
    pub fn is_dirty(&self) -> bool {
        self.read().dirty
    }

    /// 清空所有条目并立即写盘
    pub fn clear(&self) -> Result<(), CacheError> {
        let mut state = self.write();
        state.index = CacheIndex::default();
        state.dirty = true;
        self.persist(&mut state)
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> CacheStats {
        let state = self.read();
        CacheStats {
            total_entries: state.index.entries.len(),
            total_cached_size: state.index.entries.values().map(|e| e.size).sum(),
            last_updated: state.index.updated_at,
            cache_file_size: fs::metadata(&self.cache_file).map(|m| m.len()).unwrap_or(0),
        }
    }

    // 私有方法

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 临时文件放在缓存文件旁边，保证 rename 在同一个文件系统内
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .cache_file
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "cache.json".into());
        name.push(".tmp");
        self.cache_file.with_file_name(name)
    }

    /// 在持有写锁的情况下写盘
    fn persist(&self, state: &mut CacheState) -> Result<(), CacheError> {
        if !state.dirty {
            return Ok(());
        }

        state.index.updated_at = Utc::now();

        if let Some(parent) = self.cache_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = serde_json::to_vec_pretty(&state.index)?;
        let temp_path = self.temp_path();

        if let Err(err) = write_file_synced(&temp_path, &data) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }

        if let Err(err) = fs::rename(&temp_path, &self.cache_file) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }

        state.dirty = false;
        tracing::debug!(
            path = %self.cache_file.display(),
            entries = state.index.entries.len(),
            "缓存已保存"
        );
        Ok(())
    }
}

fn write_file_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

impl CacheProvider for SizeCache {
    fn get(&self, path: &Path) -> Option<CacheEntry> {
        self.read().index.entries.get(path).cloned()
    }

    fn set(&self, path: &Path, entry: CacheEntry) {
        // JSON 的键只能是 UTF-8 字符串，这样的路径写入后整个索引都无法保存
        if path.to_str().is_none() || entry.path.to_str().is_none() {
            tracing::debug!(path = %path.display(), "路径不是有效的 UTF-8，不写入缓存");
            return;
        }

        let mut state = self.write();
        state.index.entries.insert(path.to_path_buf(), entry);
        state.dirty = true;
    }

    fn is_valid(&self, path: &Path, current_mod_time: DateTime<Utc>) -> bool {
        self.read()
            .index
            .entries
            .get(path)
            .is_some_and(|entry| entry.mod_time == current_mod_time)
    }

    fn save(&self) -> Result<(), CacheError> {
        let mut state = self.write();
        self.persist(&mut state)
    }
}
