// ============================================================================
// Weft - CLI Run 命令
// ============================================================================
//
// 文件: src/cli/run.rs
// 职责: 构建运行命令的 CLI 接口层
// 边界:
//   - ✅ 命令行参数定义和解析
//   - ✅ Ctrl-C 接入取消信号
//   - ✅ 调用构建执行器并渲染结果
//   - ❌ 不应包含调度逻辑
//   - ❌ 不应包含数据模型定义
//
// ============================================================================

use anyhow::Result;
use atty::Stream;
use clap::Args;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::{BuildExecutor, BuildObserver, BuildRequest, TracingObserver};
use crate::models::{BuildStatus, Config};
use crate::ui::progress::ProgressObserver;
use crate::ui::summary::{render_build_result, render_configuration_error};
use crate::utils::logger::Logger;
use crate::{t, tf};

/// 运行构建命令
#[derive(Debug, Args)]
pub struct RunArgs {
    /// 构建目标：模块标识或 `module:task`（可重复，默认全部）
    #[arg(short = 'm', long = "module")]
    pub targets: Vec<String>,

    /// 只按顺序列出任务，不执行动作
    #[arg(long)]
    pub dry_run: bool,

    /// 不读取也不写入增量缓存
    #[arg(long)]
    pub no_cache: bool,
}

pub async fn handle_run(args: RunArgs, mut config: Config) -> Result<()> {
    if args.no_cache {
        config.cache.enabled = false;
    }
    let verbose = config.output.verbose;
    let show_progress = config.output.show_progress && atty::is(Stream::Stdout);

    if args.targets.is_empty() {
        Logger::info(tf!("run.start_all", config.modules.len()));
    } else {
        Logger::info(tf!("run.start_targets", args.targets.join(", ")));
    }
    if args.dry_run {
        Logger::info(t!("run.dry_run"));
    }

    // Ctrl-C 触发取消
    let cancel = CancellationToken::new();
    let signal_listener = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                Logger::warn(t!("run.interrupt"));
                cancel.cancel();
            }
        })
    };

    let progress = show_progress.then(|| Arc::new(ProgressObserver::new()));
    let observer: Arc<dyn BuildObserver> = match &progress {
        Some(progress) => progress.clone(),
        None => Arc::new(TracingObserver),
    };

    let request = BuildRequest::new()
        .with_targets(args.targets)
        .dry_run(args.dry_run)
        .with_cancel(cancel)
        .with_observer(observer);

    let executor = BuildExecutor::new(config);
    let outcome = executor.execute(request).await;
    signal_listener.abort();
    if let Some(progress) = &progress {
        progress.finish();
    }

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            render_configuration_error(&e);
            return Err(anyhow::Error::new(e).context(t!("run.config_invalid")));
        }
    };

    render_build_result(&result, verbose);

    match result.status {
        BuildStatus::Succeeded => Ok(()),
        BuildStatus::Failed => anyhow::bail!(t!("run.failed")),
        BuildStatus::Cancelled => anyhow::bail!(t!("run.cancelled")),
    }
}
