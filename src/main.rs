mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cli::{CacheAction, Cli, Commands, ConfigAction, OutputFormat};
use depo_cleaner::config::Config;
use depo_cleaner::models::ScanResult;
use depo_cleaner::operations::{CleanupOperation, CleanupOptions};
use depo_cleaner::scanner::{CacheProvider, Scanner, SizeCache};
use depo_cleaner::tui::run_selector;
use depo_cleaner::utils::{report, size_format};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // 加载配置
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_config_path()?,
    };
    let file_config = Config::load_or_create(&config_path)?;

    let mut config = file_config.clone();
    config.apply_env_overrides();
    if let Some(workers) = cli.workers {
        config.scan.workers = workers.max(1);
    }

    // 根据命令执行相应操作
    match cli.command {
        Commands::Scan {
            path,
            no_cache,
            depth,
            format,
        } => {
            let show_spinner = format == OutputFormat::Table;
            let result = scan(&config, path, depth, no_cache, show_spinner).await?;

            let mut stdout = io::stdout().lock();
            match format {
                OutputFormat::Table => report::write_scan_table(&mut stdout, &result)?,
                OutputFormat::Json => report::write_scan_json(&mut stdout, &result)?,
            }
        }
        Commands::Clean {
            path,
            no_cache,
            dry_run,
            trash,
            yes,
        } => {
            let result = scan(&config, path, None, no_cache, true).await?;
            if result.cancelled {
                println!("扫描已取消，不执行清理");
                return Ok(());
            }
            if result.folders.is_empty() {
                println!("没有发现可清理的依赖目录");
                return Ok(());
            }

            let selected = run_selector(result.folders).await?;
            if selected.is_empty() {
                println!("未选择任何目录");
                return Ok(());
            }

            let total: u64 = selected.iter().map(|f| f.size).sum();
            if !yes && !dry_run {
                let prompt = format!(
                    "确定要删除选中的 {} 个目录（{}）吗？(y/N): ",
                    selected.len(),
                    size_format::format_size(total)
                );
                if !confirm(&prompt)? {
                    println!("已取消删除");
                    return Ok(());
                }
            }

            let cancel = CancellationToken::new();
            let ctrl_c = watch_ctrl_c(cancel.clone());
            let operation = CleanupOperation::new(CleanupOptions {
                dry_run,
                use_trash: trash,
            });
            let outcome = tokio::task::spawn_blocking(move || operation.run(&cancel, &selected))
                .await
                .context("清理任务异常退出")?;
            ctrl_c.abort();

            report::write_clean_report(&mut io::stdout().lock(), &outcome)?;
            if !outcome.is_success() {
                anyhow::bail!("{} 个目录删除失败", outcome.failed.len());
            }
        }
        Commands::Cache { action } => {
            let cache = SizeCache::new(&config.cache.path)?;
            match action {
                CacheAction::Clear => {
                    cache.clear()?;
                    println!("缓存已清空: {}", cache.path().display());
                }
                CacheAction::Info => {
                    report::write_cache_stats(&mut io::stdout().lock(), cache.path(), &cache.stats())?;
                }
            }
        }
        Commands::Config { action } => run_config(file_config, &config, &config_path, action)?,
    }

    Ok(())
}

/// 初始化日志：RUST_LOG 优先，否则默认 info，--verbose 时为 debug
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// 扫描目录，期间显示进度并响应 Ctrl-C
async fn scan(
    config: &Config,
    path: Option<PathBuf>,
    depth: Option<usize>,
    no_cache: bool,
    show_spinner: bool,
) -> Result<ScanResult> {
    let root = path.unwrap_or_else(|| config.scan.default_path.clone());

    let mut scan_config = config.scan_config();
    if let Some(depth) = depth {
        scan_config.max_depth = (depth > 0).then_some(depth);
    }

    let cache: Option<Arc<dyn CacheProvider>> = if no_cache || !config.cache.enabled {
        None
    } else {
        Some(Arc::new(SizeCache::new(&config.cache.path)?))
    };

    let scanner = Scanner::new(scan_config, cache);
    let cancel = CancellationToken::new();
    let ctrl_c = watch_ctrl_c(cancel.clone());

    let progress = if show_spinner {
        create_spinner(&root)
    } else {
        ProgressBar::hidden()
    };

    let result = scanner.scan(cancel, &root).await;

    progress.finish_and_clear();
    ctrl_c.abort();

    let result = result.with_context(|| format!("无法扫描 {}", root.display()))?;
    if result.cancelled {
        tracing::warn!("扫描被中断，只显示部分结果");
    }
    Ok(result)
}

fn run_config(
    mut file_config: Config,
    effective: &Config,
    config_path: &Path,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(effective)?);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
        ConfigAction::Reset => {
            file_config.reset();
            file_config.save_to_file(config_path)?;
            println!("配置已重置: {}", config_path.display());
        }
        ConfigAction::Set { key, value } => {
            file_config.set_value(&key, &value)?;
            file_config.save_to_file(config_path)?;
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}

/// 收到 Ctrl-C 时取消 token
fn watch_ctrl_c(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("收到中断信号，正在停止");
            cancel.cancel();
        }
    })
}

/// 创建进度指示器
fn create_spinner(root: &Path) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(format!("正在扫描 {}", root.display()));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// 在终端询问 y/N
fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES"))
}
