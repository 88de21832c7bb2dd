// ============================================================================
// Weft - CLI Cache 命令
// ============================================================================
//
// 文件: src/cli/cache.rs
// 职责: 增量缓存维护命令的 CLI 接口层
// 边界:
//   - ✅ status / clear / compact 子命令
//   - ✅ 结果输出
//   - ❌ 不应包含缓存存储格式逻辑
//
// ============================================================================

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::core::BuildExecutor;
use crate::models::Config;
use crate::utils::constants::icons;
use crate::utils::logger::Logger;
use crate::utils::styles::HEAVY_RULE;
use crate::{t, tf};

/// 缓存维护命令
#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show cache statistics
    Status,
    /// Remove every cache entry
    Clear,
    /// Rewrite the cache log with live entries only
    Compact,
}

pub fn handle_cache(args: CacheArgs, config: Config) -> Result<()> {
    let cache_dir = config.cache_dir();
    let executor = BuildExecutor::new(config);
    let cache = executor
        .open_cache()
        .with_context(|| tf!("cache.open_failed", cache_dir.display()))?;

    match args.action {
        CacheAction::Status => {
            let status = cache.status();
            Logger::info(format!("\n{} {}", icons::UP_TO_DATE, t!("cache.title")));
            Logger::info(HEAVY_RULE);
            Logger::info(tf!("cache.location", cache_dir.display()));
            Logger::info(tf!("cache.tasks", status.tasks));
            Logger::info(tf!("cache.entries", status.entries, cache.history()));
            Logger::info(tf!("cache.log_size", status.log_lines, status.log_bytes));
            if status.corrupt_lines > 0 {
                Logger::warn(tf!("cache.corrupt", status.corrupt_lines));
            }
        }
        CacheAction::Clear => {
            cache.clear()?;
            Logger::success(t!("cache.cleared"));
        }
        CacheAction::Compact => {
            let before = cache.status().log_lines;
            cache.compact()?;
            let after = cache.status().log_lines;
            Logger::success(tf!("cache.compacted", before, after));
        }
    }

    Ok(())
}
