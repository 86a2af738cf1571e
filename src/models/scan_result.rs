use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::DependencyFolder;

/// 一次扫描的汇总结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// 扫描的根路径
    pub root_path: PathBuf,

    /// 扫描开始时间
    pub start_time: DateTime<Utc>,

    /// 扫描耗时
    pub duration: Duration,

    /// 发现的依赖目录（无序）
    pub folders: Vec<DependencyFolder>,

    /// 所有目录的总大小
    pub total_size: u64,

    /// 目录数量
    pub total_count: usize,

    /// 命中缓存的目录数
    pub cache_hits: usize,

    /// 重新统计的目录数
    pub cache_misses: usize,

    /// 扫描中遇到的路径级错误数
    pub error_count: usize,

    /// 扫描是否被中途取消
    pub cancelled: bool,
}

impl ScanResult {
    /// 创建新的扫描结果
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            start_time: Utc::now(),
            duration: Duration::ZERO,
            folders: Vec::new(),
            total_size: 0,
            total_count: 0,
            cache_hits: 0,
            cache_misses: 0,
            error_count: 0,
            cancelled: false,
        }
    }

    /// 加入一个目录并累计统计
    pub fn add_folder(&mut self, folder: DependencyFolder, from_cache: bool) {
        self.total_size += folder.size;
        self.total_count += 1;
        if from_cache {
            self.cache_hits += 1;
        } else {
            self.cache_misses += 1;
        }
        self.folders.push(folder);
    }

    /// 完成扫描，记录耗时
    pub fn finish(&mut self) {
        self.duration = Utc::now()
            .signed_duration_since(self.start_time)
            .to_std()
            .unwrap_or_default();
    }

    /// 缓存命中率（百分比），没有任何目录时为 None
    pub fn cache_hit_rate(&self) -> Option<f64> {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            None
        } else {
            Some(self.cache_hits as f64 / total as f64 * 100.0)
        }
    }

    /// 按生态统计目录数量和大小
    pub fn size_by_ecosystem(&self) -> HashMap<String, (usize, u64)> {
        let mut stats: HashMap<String, (usize, u64)> = HashMap::new();
        for folder in &self.folders {
            let entry = stats.entry(folder.ecosystem.label().to_string()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += folder.size;
        }
        stats
    }

    /// 按大小降序返回目录
    pub fn sorted_by_size(&self) -> Vec<DependencyFolder> {
        let mut folders = self.folders.clone();
        folders.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        folders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ecosystem;

    fn folder(path: &str, size: u64, ecosystem: Ecosystem) -> DependencyFolder {
        let now = Utc::now();
        DependencyFolder {
            path: PathBuf::from(path),
            size,
            mod_time: now,
            access_time: now,
            ecosystem,
            skipped_entries: 0,
        }
    }

    #[test]
    fn test_add_folder_updates_counters() {
        let mut result = ScanResult::new(PathBuf::from("/root"));
        assert_eq!(result.cache_hit_rate(), None);

        result.add_folder(folder("/root/a/node_modules", 30, Ecosystem::NodeJs), false);
        result.add_folder(folder("/root/b/.venv", 5, Ecosystem::Python), true);

        assert_eq!(result.total_count, 2);
        assert_eq!(result.total_size, 35);
        assert_eq!(result.cache_hits, 1);
        assert_eq!(result.cache_misses, 1);
        assert_eq!(result.cache_hit_rate(), Some(50.0));

        let by_type = result.size_by_ecosystem();
        assert_eq!(by_type.get("Node.js"), Some(&(1, 30)));
        assert_eq!(by_type.get("Python"), Some(&(1, 5)));

        let sorted = result.sorted_by_size();
        assert_eq!(sorted[0].size, 30);
    }
}
