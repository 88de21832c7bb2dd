// ============================================================================
// Weft - CLI 模块
// ============================================================================
//
// 文件: src/cli/mod.rs
// 职责: CLI 命令行接口模块入口和路由
// 边界:
//   - ✅ CLI 结构定义和命令枚举
//   - ✅ 全局参数到 RuntimeArgs 的转换
//   - ✅ 配置加载、语言与颜色初始化
//   - ✅ 命令路由分发
//   - ❌ 不应包含具体命令实现逻辑
//   - ❌ 不应包含任务图与调度逻辑
//
// ============================================================================

pub mod cache;
pub mod graph;
pub mod init;
pub mod run;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::i18n::set_language;
use crate::models::config::{Config, RuntimeArgs};
use crate::t;
use crate::utils::colors::Colors;
use crate::utils::logger::init_tracing;
use cache::{handle_cache, CacheArgs};
use graph::{handle_graph, GraphArgs};
use init::{handle_init, InitArgs};
use run::{handle_run, RunArgs};

/// Weft - Lightweight task graph build engine
#[derive(Debug, Parser)]
#[command(name = "weft")]
#[command(about = "Lightweight task graph build engine based on Rust")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Global verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Interface language (zh_cn, en_us)
    #[arg(short, long, global = true)]
    pub language: Option<String>,

    /// Workspace root directory
    #[arg(short = 'C', long, global = true)]
    pub workspace_root: Option<String>,

    /// Number of parallel workers
    #[arg(short = 'j', long, global = true)]
    pub workers: Option<usize>,

    /// Task timeout (seconds, 0 disables)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Retry count for failed tasks
    #[arg(long, global = true)]
    pub retry: Option<u32>,

    /// Keep running independent tasks after a failure
    #[arg(long = "continue", global = true)]
    pub continue_on_failure: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Commands
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run tasks in dependency order
    Run(RunArgs),
    /// Show modules, task edges and execution order
    Graph(GraphArgs),
    /// Inspect or maintain the incremental cache
    Cache(CacheArgs),
    /// Initialize configuration file
    Init(InitArgs),
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let runtime_args = build_runtime_args(&cli);

    let workspace_dir = match &cli.workspace_root {
        Some(root) => PathBuf::from(root),
        None => std::env::current_dir().context(t!("error.current_dir"))?,
    };

    // init 不依赖已有配置
    let command = match cli.command {
        Commands::Init(args) => {
            if let Some(language) = &cli.language {
                set_language(language);
            }
            Colors::set_enabled(!cli.no_color);
            init_tracing(cli.verbose);
            return handle_init(args, &workspace_dir);
        }
        command => command,
    };

    // 加载配置并用命令行参数覆盖
    let mut config = Config::discover(&workspace_dir)?;
    config.merge_runtime_args(runtime_args);

    set_language(&config.i18n.language);
    Colors::set_enabled(config.output.colored);
    init_tracing(config.output.verbose);

    match command {
        Commands::Run(args) => handle_run(args, config).await,
        Commands::Graph(args) => handle_graph(args, config),
        Commands::Cache(args) => handle_cache(args, config),
        Commands::Init(_) => Ok(()),
    }
}

/// Build runtime args from CLI arguments
fn build_runtime_args(cli: &Cli) -> RuntimeArgs {
    RuntimeArgs {
        verbose: if cli.verbose { Some(true) } else { None },
        colored: if cli.no_color { Some(false) } else { None },
        show_progress: if cli.no_progress { Some(false) } else { None },
        workers: cli.workers,
        task_timeout: cli.timeout,
        retry_count: cli.retry,
        continue_on_failure: if cli.continue_on_failure { Some(true) } else { None },
        cache_enabled: None,
        workspace_root: cli.workspace_root.clone(),
        language: cli.language.clone(),
    }
}
