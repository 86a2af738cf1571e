use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "depo-cleaner")]
#[command(about = "扫描并清理 node_modules、target、.venv 等依赖目录")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 配置文件路径
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 分析任务数量（覆盖配置文件）
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// 详细输出
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 扫描目录并列出所有依赖目录
    Scan {
        /// 要扫描的目录（默认使用配置中的 scan.default_path）
        path: Option<PathBuf>,

        /// 不使用大小缓存
        #[arg(long)]
        no_cache: bool,

        /// 最大扫描深度，0 表示不限制
        #[arg(short, long)]
        depth: Option<usize>,

        /// 输出格式
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// 扫描后交互式选择并删除依赖目录
    Clean {
        /// 要扫描的目录（默认使用配置中的 scan.default_path）
        path: Option<PathBuf>,

        /// 不使用大小缓存
        #[arg(long)]
        no_cache: bool,

        /// 只显示将要删除的目录
        #[arg(long)]
        dry_run: bool,

        /// 移动到回收站而不是直接删除
        #[arg(long)]
        trash: bool,

        /// 跳过删除前的确认
        #[arg(short, long)]
        yes: bool,
    },

    /// 管理大小缓存
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// 管理配置
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// 清空缓存
    Clear,

    /// 显示缓存信息
    Info,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// 显示当前配置
    Show,

    /// 显示配置文件路径
    Path,

    /// 重置为默认配置
    Reset,

    /// 修改配置项，例如 `config set scan.workers 8`
    Set {
        /// 配置项
        key: String,

        /// 新的值
        value: String,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// 表格格式
    Table,
    /// JSON 格式
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan() {
        let cli = Cli::parse_from(["depo-cleaner", "scan", "/work", "--no-cache", "--format", "json", "-w", "2"]);
        assert_eq!(cli.workers, Some(2));
        match cli.command {
            Commands::Scan { path, no_cache, format, depth } => {
                assert_eq!(path, Some(PathBuf::from("/work")));
                assert!(no_cache);
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(depth, None);
            }
            _ => panic!("应该解析为 scan"),
        }
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::parse_from(["depo-cleaner", "config", "set", "scan.workers", "8"]);
        match cli.command {
            Commands::Config {
                action: ConfigAction::Set { key, value },
            } => {
                assert_eq!(key, "scan.workers");
                assert_eq!(value, "8");
            }
            _ => panic!("应该解析为 config set"),
        }
    }
}
