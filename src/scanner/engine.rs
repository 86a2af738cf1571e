use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::error::ScanError;
use crate::models::{DependencyFolder, ScanResult};
use crate::scanner::classifier;
use crate::scanner::size_analyzer::{resolve_access_time, SizeAnalyzer};
use crate::scanner::size_cache::{CacheEntry, CacheProvider};

/// 分析任务数量上限
pub const MAX_WORKERS: usize = 256;

/// 缓存写盘时机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// 扫描结束后写一次
    #[default]
    OnComplete,

    /// 每统计完一个目录写一次
    PerItem,

    /// 由调用方自己调用 save
    Manual,
}

/// 扫描引擎配置
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// 分析任务数量
    pub workers: usize,

    /// 最多遍历的层数（根目录算第 1 层，None 表示不限制）
    pub max_depth: Option<usize>,

    /// 是否跟随符号链接
    pub follow_symlinks: bool,

    /// 不进入的路径（前缀匹配）
    pub ignore_paths: Vec<PathBuf>,

    /// 缓存写盘时机
    pub flush_policy: FlushPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(4),
            max_depth: None,
            follow_symlinks: false,
            ignore_paths: Vec::new(),
            flush_policy: FlushPolicy::default(),
        }
    }
}

/// 依赖目录扫描器
///
/// 一个阻塞遍历任务负责发现依赖目录，固定数量的分析任务负责统计大小，
/// 汇总在调用 `scan` 的任务中完成。
pub struct Scanner {
    config: ScanConfig,
    cache: Option<Arc<dyn CacheProvider>>,
    analyzer: SizeAnalyzer,
}

/// 发往汇总任务的单个结果
#[derive(Debug)]
struct FolderReport {
    folder: DependencyFolder,
    from_cache: bool,
}

/// 遍历任务和分析任务共享的状态
struct ScanContext {
    analyzer: SizeAnalyzer,
    cache: Option<Arc<dyn CacheProvider>>,
    flush_policy: FlushPolicy,
    cancel: CancellationToken,
}

impl ScanContext {
    /// 统计目录大小并写入缓存（阻塞）
    fn analyze_and_record(&self, path: &Path) -> Result<DependencyFolder, ScanError> {
        let folder = self.analyzer.analyze(path)?;

        if let Some(cache) = &self.cache {
            cache.set(
                path,
                CacheEntry {
                    path: path.to_path_buf(),
                    size: folder.size,
                    mod_time: folder.mod_time,
                    last_scan: Utc::now(),
                },
            );

            if self.flush_policy == FlushPolicy::PerItem {
                if let Err(err) = cache.save() {
                    tracing::warn!(error = %err, "保存缓存失败");
                }
            }
        }

        Ok(folder)
    }
}

impl Scanner {
    /// 创建扫描器；cache 为 None 时每个目录都重新统计
    pub fn new(config: ScanConfig, cache: Option<Arc<dyn CacheProvider>>) -> Self {
        Self {
            config,
            cache,
            analyzer: SizeAnalyzer::new(),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// 扫描 root_path 下的所有依赖目录
    ///
    /// 只有根目录无法访问时才返回错误。单个路径的失败只计入
    /// `error_count`；取消后返回已经汇总的部分结果。
    pub async fn scan(
        &self,
        cancel: CancellationToken,
        root_path: &Path,
    ) -> Result<ScanResult, ScanError> {
        let root = tokio::fs::canonicalize(root_path)
            .await
            .map_err(|e| ScanError::from_io(root_path, e))?;
        let root_metadata = tokio::fs::metadata(&root)
            .await
            .map_err(|e| ScanError::from_io(&root, e))?;
        if !root_metadata.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        let mut result = ScanResult::new(root.clone());
        let workers = self.config.workers.clamp(1, MAX_WORKERS);

        tracing::info!(root = %root.display(), workers, "开始扫描");

        let (work_tx, work_rx) = mpsc::channel::<PathBuf>(workers * 2);
        let (results_tx, mut results_rx) = mpsc::channel::<FolderReport>(workers);
        let (errors_tx, mut errors_rx) = mpsc::channel::<ScanError>(workers);

        let ctx = Arc::new(ScanContext {
            analyzer: self.analyzer,
            cache: self.cache.clone(),
            flush_policy: self.config.flush_policy,
            cancel,
        });

        // 启动分析任务
        let queue = Arc::new(Mutex::new(work_rx));
        let worker_handles: Vec<_> = (0..workers)
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    Arc::clone(&ctx),
                    Arc::clone(&queue),
                    results_tx.clone(),
                    errors_tx.clone(),
                ))
            })
            .collect();
        drop(queue);

        // 启动遍历任务，它持有最后一份发送端
        let walker = Walker {
            ctx: Arc::clone(&ctx),
            root,
            max_depth: self.config.max_depth,
            follow_symlinks: self.config.follow_symlinks,
            ignore_paths: self.config.ignore_paths.clone(),
            work_tx,
            results_tx,
            errors_tx,
        };
        let walk_handle = tokio::task::spawn_blocking(move || walker.run());

        // 汇总，直到所有发送端都已释放
        let mut results_open = true;
        let mut errors_open = true;
        while results_open || errors_open {
            tokio::select! {
                report = results_rx.recv(), if results_open => match report {
                    Some(report) => result.add_folder(report.folder, report.from_cache),
                    None => results_open = false,
                },
                err = errors_rx.recv(), if errors_open => match err {
                    Some(err) => {
                        result.error_count += 1;
                        log_scan_error(&err);
                    }
                    None => errors_open = false,
                },
            }
        }

        if let Err(err) = walk_handle.await {
            result.error_count += 1;
            tracing::error!(error = %err, "遍历任务异常退出");
        }
        let mut abandoned = Vec::new();
        for handle in worker_handles {
            match handle.await {
                Ok(Some(analysis)) => abandoned.push(analysis),
                Ok(None) => {}
                Err(err) => {
                    result.error_count += 1;
                    tracing::error!(error = %err, "分析任务异常退出");
                }
            }
        }

        // 取消时仍在统计的目录结果不再汇总，但要等它们写完缓存再写盘
        for analysis in abandoned {
            let _ = analysis.await;
        }

        result.cancelled = ctx.cancel.is_cancelled();
        result.finish();

        if self.config.flush_policy == FlushPolicy::OnComplete {
            self.flush_cache().await;
        }

        tracing::info!(
            folders = result.total_count,
            total_size = result.total_size,
            cache_hits = result.cache_hits,
            cache_misses = result.cache_misses,
            errors = result.error_count,
            cancelled = result.cancelled,
            duration_ms = result.duration.as_millis() as u64,
            "扫描完成"
        );

        Ok(result)
    }

    async fn flush_cache(&self) {
        let Some(cache) = self.cache.clone() else {
            return;
        };

        match tokio::task::spawn_blocking(move || cache.save()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "保存缓存失败"),
            Err(err) => tracing::warn!(error = %err, "保存缓存的任务异常退出"),
        }
    }
}

type Analysis = JoinHandle<Result<DependencyFolder, ScanError>>;

/// 分析任务：从队列取路径，统计后发送结果
///
/// 取消时如果还有统计在进行，返回它的句柄。
async fn run_worker(
    id: usize,
    ctx: Arc<ScanContext>,
    queue: Arc<Mutex<mpsc::Receiver<PathBuf>>>,
    results_tx: mpsc::Sender<FolderReport>,
    errors_tx: mpsc::Sender<ScanError>,
) -> Option<Analysis> {
    loop {
        if ctx.cancel.is_cancelled() {
            break;
        }

        let next = tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            path = async { queue.lock().await.recv().await } => path,
        };
        let Some(path) = next else {
            break;
        };

        let task_ctx = Arc::clone(&ctx);
        let task_path = path.clone();
        let mut analysis: Analysis =
            tokio::task::spawn_blocking(move || task_ctx.analyze_and_record(&task_path));

        let joined = tokio::select! {
            _ = ctx.cancel.cancelled() => None,
            joined = &mut analysis => Some(joined),
        };
        let Some(outcome) = joined else {
            tracing::trace!(worker = id, "取消时统计仍在进行");
            return Some(analysis);
        };

        let delivered = match outcome {
            Ok(Ok(folder)) => {
                let report = FolderReport {
                    folder,
                    from_cache: false,
                };
                tokio::select! {
                    _ = ctx.cancel.cancelled() => break,
                    sent = results_tx.send(report) => sent.is_ok(),
                }
            }
            Ok(Err(err)) => tokio::select! {
                _ = ctx.cancel.cancelled() => break,
                sent = errors_tx.send(err) => sent.is_ok(),
            },
            Err(join_err) => {
                let err = ScanError::TaskFailed(format!("{}: {}", path.display(), join_err));
                errors_tx.send(err).await.is_ok()
            }
        };

        if !delivered {
            break;
        }
    }

    tracing::trace!(worker = id, "分析任务退出");
    None
}

/// 遍历任务（运行在阻塞线程池中）
struct Walker {
    ctx: Arc<ScanContext>,
    root: PathBuf,
    max_depth: Option<usize>,
    follow_symlinks: bool,
    ignore_paths: Vec<PathBuf>,
    work_tx: mpsc::Sender<PathBuf>,
    results_tx: mpsc::Sender<FolderReport>,
    errors_tx: mpsc::Sender<ScanError>,
}

impl Walker {
    fn run(self) {
        let mut walk = WalkDir::new(&self.root).follow_links(self.follow_symlinks);
        // walkdir 的根目录深度为 0
        if let Some(max_depth) = self.max_depth {
            walk = walk.max_depth(max_depth.saturating_sub(1));
        }

        let mut entries = walk.into_iter();
        loop {
            if self.ctx.cancel.is_cancelled() {
                tracing::debug!("扫描已取消，停止遍历");
                break;
            }

            let entry = match entries.next() {
                Some(Ok(entry)) => entry,
                Some(Err(err)) => {
                    self.report_error(ScanError::from_walk(err));
                    continue;
                }
                None => break,
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            if entry.depth() > 0 && self.is_ignored(entry.path()) {
                tracing::debug!(path = %entry.path().display(), "跳过忽略的路径");
                entries.skip_current_dir();
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if !classifier::is_target(&name) {
                continue;
            }

            // 依赖目录是遍历的叶子，不再深入
            entries.skip_current_dir();

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    self.report_error(ScanError::from_walk(err));
                    continue;
                }
            };

            self.resolve_target(entry.into_path(), &name, &metadata);
        }
    }

    fn is_ignored(&self, path: &Path) -> bool {
        self.ignore_paths.iter().any(|ignored| path.starts_with(ignored))
    }

    /// 缓存有效时直接构造结果，否则交给分析任务
    fn resolve_target(&self, path: PathBuf, name: &str, metadata: &Metadata) {
        let live_mod_time = match metadata.modified() {
            Ok(modified) => DateTime::<Utc>::from(modified),
            Err(err) => {
                self.report_error(ScanError::from_io(&path, err));
                return;
            }
        };

        if let Some(cache) = &self.ctx.cache {
            if cache.is_valid(&path, live_mod_time) {
                if let Some(entry) = cache.get(&path) {
                    tracing::trace!(path = %path.display(), "缓存命中");
                    let folder = DependencyFolder {
                        path,
                        size: entry.size,
                        mod_time: entry.mod_time,
                        access_time: DateTime::<Utc>::from(resolve_access_time(metadata)),
                        ecosystem: classifier::classify_type(name),
                        skipped_entries: 0,
                    };
                    self.emit(FolderReport {
                        folder,
                        from_cache: true,
                    });
                    return;
                }
            }
        }

        self.dispatch(path);
    }

    /// 放入工作队列；队列已满时在当前线程直接分析，保证不丢任何目录
    fn dispatch(&self, path: PathBuf) {
        match self.work_tx.try_send(path) {
            Ok(()) => {}
            Err(TrySendError::Full(path)) => {
                tracing::trace!(path = %path.display(), "工作队列已满，在遍历线程中分析");
                self.analyze_inline(path);
            }
            Err(TrySendError::Closed(path)) => {
                if !self.ctx.cancel.is_cancelled() {
                    self.analyze_inline(path);
                }
            }
        }
    }

    fn analyze_inline(&self, path: PathBuf) {
        match self.ctx.analyze_and_record(&path) {
            Ok(folder) => self.emit(FolderReport {
                folder,
                from_cache: false,
            }),
            Err(err) => self.report_error(err),
        }
    }

    fn emit(&self, report: FolderReport) {
        // 汇总任务在所有发送端释放前不会退出，发送失败只可能发生在异常情况下
        if self.results_tx.blocking_send(report).is_err() {
            tracing::debug!("结果通道已关闭");
        }
    }

    fn report_error(&self, err: ScanError) {
        if self.errors_tx.blocking_send(err).is_err() {
            tracing::debug!("错误通道已关闭");
        }
    }
}

fn log_scan_error(err: &ScanError) {
    if err.is_skippable() {
        tracing::warn!(error = %err, "跳过无法访问的路径");
    } else {
        tracing::error!(error = %err, "扫描路径出错");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ecosystem;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;

    fn config(workers: usize) -> ScanConfig {
        ScanConfig {
            workers,
            ..ScanConfig::default()
        }
    }

    fn write_file(path: &Path, len: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![b'x'; len]).unwrap();
    }

    /// 在第 n 次查询时触发取消的缓存
    struct CancellingCache {
        token: CancellationToken,
        lookups: AtomicUsize,
        cancel_after: usize,
    }

    impl CacheProvider for CancellingCache {
        fn get(&self, _path: &Path) -> Option<CacheEntry> {
            None
        }

        fn set(&self, _path: &Path, _entry: CacheEntry) {}

        fn is_valid(&self, _path: &Path, _current_mod_time: DateTime<Utc>) -> bool {
            if self.lookups.fetch_add(1, Ordering::SeqCst) + 1 >= self.cancel_after {
                self.token.cancel();
            }
            false
        }

        fn save(&self) -> Result<(), crate::error::CacheError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_scan_example_tree() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write_file(&root.join("a/node_modules/x.js"), 10);
        write_file(&root.join("a/node_modules/y.js"), 20);
        write_file(&root.join("b/.venv/pyvenv.cfg"), 5);
        write_file(&root.join("c/src/main.rs"), 100);

        let scanner = Scanner::new(config(2), None);
        let result = scanner.scan(CancellationToken::new(), root).await.unwrap();

        assert_eq!(result.total_count, 2);
        assert_eq!(result.total_size, 35);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.cache_hits, 0);
        assert_eq!(result.cache_misses, 2);
        assert!(!result.cancelled);

        let mut types: Vec<_> = result
            .folders
            .iter()
            .map(|f| (f.name(), f.ecosystem))
            .collect();
        types.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            types,
            vec![
                (".venv".to_string(), Ecosystem::Python),
                ("node_modules".to_string(), Ecosystem::NodeJs),
            ]
        );
        assert!(result.folders.iter().all(|f| f.path.is_absolute()));
    }

    #[tokio::test]
    async fn test_nested_targets_reported_once() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write_file(&root.join("app/node_modules/a/index.js"), 7);
        write_file(&root.join("app/node_modules/a/node_modules/b/index.js"), 3);

        let scanner = Scanner::new(config(2), None);
        let result = scanner.scan(CancellationToken::new(), root).await.unwrap();

        assert_eq!(result.total_count, 1);
        assert_eq!(result.total_size, 10);
    }

    #[tokio::test]
    async fn test_queue_overflow_never_drops_targets() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        for i in 0..40 {
            write_file(&root.join(format!("p{:02}/target/out.bin", i)), i + 1);
        }

        // 单个分析任务、容量为 2 的队列，大部分目录会走遍历线程的同步分析
        let scanner = Scanner::new(config(1), None);
        let result = scanner.scan(CancellationToken::new(), root).await.unwrap();

        assert_eq!(result.total_count, 40);
        assert_eq!(result.total_size, (1..=40).sum::<usize>() as u64);

        let mut paths: Vec<_> = result.folders.iter().map(|f| f.path.clone()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 40);
    }

    #[tokio::test]
    async fn test_max_depth() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write_file(&root.join("a/b/node_modules/x.js"), 4);
        write_file(&root.join("venv/lib.py"), 2);

        let scan_with_depth = |max_depth| {
            Scanner::new(
                ScanConfig {
                    max_depth: Some(max_depth),
                    ..config(2)
                },
                None,
            )
        };

        // 根目录算第 1 层，相对深度等于 max_depth 的目录不会被访问
        let result = scan_with_depth(1).scan(CancellationToken::new(), root).await.unwrap();
        assert_eq!(result.total_count, 0);

        let result = scan_with_depth(2).scan(CancellationToken::new(), root).await.unwrap();
        assert_eq!(result.total_count, 1);
        assert_eq!(result.total_size, 2);

        let result = scan_with_depth(3).scan(CancellationToken::new(), root).await.unwrap();
        assert_eq!(result.total_count, 1);

        let result = scan_with_depth(4).scan(CancellationToken::new(), root).await.unwrap();
        assert_eq!(result.total_count, 2);
        assert_eq!(result.total_size, 6);
    }

    #[tokio::test]
    async fn test_ignore_paths() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        write_file(&root.join("keep/node_modules/x.js"), 4);
        write_file(&root.join("skip/node_modules/x.js"), 8);

        let scanner = Scanner::new(
            ScanConfig {
                ignore_paths: vec![root.join("skip")],
                ..config(2)
            },
            None,
        );
        let result = scanner.scan(CancellationToken::new(), &root).await.unwrap();

        assert_eq!(result.total_count, 1);
        assert_eq!(result.total_size, 4);
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let temp_dir = tempdir().unwrap();
        let scanner = Scanner::new(config(2), None);

        let err = scanner
            .scan(CancellationToken::new(), &temp_dir.path().join("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_file_root_is_fatal() {
        let temp_dir = tempdir().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        let scanner = Scanner::new(config(2), None);
        let err = scanner.scan(CancellationToken::new(), &file).await.unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_walk_errors_are_counted_not_fatal() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write_file(&root.join("a/node_modules/x.js"), 3);
        std::os::unix::fs::symlink(root.join("does-not-exist"), root.join("dangling")).unwrap();

        let scanner = Scanner::new(
            ScanConfig {
                follow_symlinks: true,
                ..config(2)
            },
            None,
        );
        let result = scanner.scan(CancellationToken::new(), root).await.unwrap();

        assert_eq!(result.total_count, 1);
        assert_eq!(result.error_count, 1);
    }

    #[tokio::test]
    async fn test_pre_cancelled_scan_returns_empty() {
        let temp_dir = tempdir().unwrap();
        write_file(&temp_dir.path().join("a/node_modules/x.js"), 3);

        let token = CancellationToken::new();
        token.cancel();

        let scanner = Scanner::new(config(2), None);
        let result = scanner.scan(token, temp_dir.path()).await.unwrap();

        assert!(result.cancelled);
        assert_eq!(result.total_count, 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_walk_returns_partial_result() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        for i in 0..50 {
            write_file(&root.join(format!("p{:02}/node_modules/index.js", i)), 1);
        }

        let token = CancellationToken::new();
        let cache = Arc::new(CancellingCache {
            token: token.clone(),
            lookups: AtomicUsize::new(0),
            cancel_after: 3,
        });
        let scanner = Scanner::new(
            ScanConfig {
                flush_policy: FlushPolicy::Manual,
                ..config(2)
            },
            Some(cache),
        );

        let result = tokio::time::timeout(Duration::from_secs(30), scanner.scan(token, root))
            .await
            .expect("取消后扫描必须结束")
            .unwrap();

        assert!(result.cancelled);
        assert!(result.total_count <= 3);
        assert!(result.total_count < 50);
    }

    /// set 时触发取消并拖慢写入，模拟取消时仍在进行的统计
    struct SlowRecordingCache {
        token: CancellationToken,
        entries: std::sync::Mutex<Vec<PathBuf>>,
        saved: std::sync::Mutex<Vec<PathBuf>>,
    }

    impl CacheProvider for SlowRecordingCache {
        fn get(&self, _path: &Path) -> Option<CacheEntry> {
            None
        }

        fn set(&self, path: &Path, _entry: CacheEntry) {
            self.token.cancel();
            std::thread::sleep(Duration::from_millis(200));
            self.entries.lock().unwrap().push(path.to_path_buf());
        }

        fn is_valid(&self, _path: &Path, _current_mod_time: DateTime<Utc>) -> bool {
            false
        }

        fn save(&self) -> Result<(), crate::error::CacheError> {
            let entries = self.entries.lock().unwrap().clone();
            *self.saved.lock().unwrap() = entries;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_cancelled_analysis_is_flushed() {
        let temp_dir = tempdir().unwrap();
        write_file(&temp_dir.path().join("a/node_modules/x.js"), 3);

        let token = CancellationToken::new();
        let cache = Arc::new(SlowRecordingCache {
            token: token.clone(),
            entries: std::sync::Mutex::new(Vec::new()),
            saved: std::sync::Mutex::new(Vec::new()),
        });
        let scanner = Scanner::new(config(2), Some(cache.clone()));

        let result = tokio::time::timeout(Duration::from_secs(30), scanner.scan(token, temp_dir.path()))
            .await
            .expect("取消后扫描必须结束")
            .unwrap();

        assert!(result.cancelled);
        assert_eq!(result.total_count, 0);
        assert_eq!(cache.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_worker_count_is_clamped() {
        let temp_dir = tempdir().unwrap();
        write_file(&temp_dir.path().join("a/node_modules/x.js"), 3);

        let scanner = Scanner::new(config(usize::MAX), None);
        let result = scanner.scan(CancellationToken::new(), temp_dir.path()).await.unwrap();

        assert_eq!(result.total_count, 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_path_does_not_block_cache_save() {
        use crate::scanner::size_cache::SizeCache;
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = tempdir().unwrap();
        let state_dir = tempdir().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        let cache_file = state_dir.path().join("cache.json");

        let odd = root.join(OsStr::from_bytes(b"proj\xff"));
        write_file(&odd.join("node_modules/x.js"), 7);
        write_file(&root.join("ok/node_modules/x.js"), 5);

        let cache = Arc::new(SizeCache::new(&cache_file).unwrap());
        let scanner = Scanner::new(config(2), Some(cache.clone()));
        let result = scanner.scan(CancellationToken::new(), &root).await.unwrap();

        assert_eq!(result.total_count, 2);
        assert_eq!(result.total_size, 12);
        assert!(!cache.is_dirty());
        assert!(cache_file.exists());

        let on_disk = SizeCache::open(&cache_file).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk.get(&root.join("ok/node_modules")).unwrap().size, 5);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_child_reports_partial_folder() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        let node_modules = root.join("app/node_modules");
        write_file(&node_modules.join("index.js"), 10);
        write_file(&node_modules.join("locked/secret.js"), 100);

        let locked = node_modules.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // root 用户不受权限位限制
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let scanner = Scanner::new(config(2), None);
        let result = scanner.scan(CancellationToken::new(), root).await;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let result = result.unwrap();

        assert_eq!(result.total_count, 1);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.total_size, 10);
        assert!(result.folders[0].is_partial());
    }
}
