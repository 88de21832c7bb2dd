// ============================================================================
// Weft - 执行上下文
// ============================================================================
//
// 文件: src/core/context.rs
// 职责: 单次构建调用的全部可变状态入口
// 边界:
//   - ✅ 执行选项（并发、失败策略、超时、重试、宽限期）
//   - ✅ 缓存句柄、取消信号、事件观察者
//   - ✅ 从配置派生执行选项
//   - ❌ 不使用任何全局状态
//   - ❌ 不包含调度逻辑
//
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::core::cache::IncrementalCache;
use crate::core::reporter::{BuildEvent, BuildObserver};
use crate::models::Config;

/// 默认取消宽限期
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// 失败策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// 出现失败后不再派发新任务，已在运行的任务允许完成
    #[default]
    FailFast,
    /// 继续执行所有依赖未失败的任务
    Continue,
}

/// 执行选项
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// 工作线程数
    pub workers: usize,
    pub failure_mode: FailureMode,
    /// 单个任务的超时时间
    pub task_timeout: Option<Duration>,
    /// 失败后的额外重试次数
    pub retry_count: u32,
    /// 取消后等待运行中任务的时间
    pub grace_period: Duration,
    /// 只走调度顺序，不执行动作
    pub dry_run: bool,
    /// 是否使用增量缓存
    pub use_cache: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            failure_mode: FailureMode::FailFast,
            task_timeout: None,
            retry_count: 0,
            grace_period: DEFAULT_GRACE_PERIOD,
            dry_run: false,
            use_cache: true,
        }
    }
}

impl ExecutionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.execution.workers.max(1),
            failure_mode: if config.execution.continue_on_failure {
                FailureMode::Continue
            } else {
                FailureMode::FailFast
            },
            task_timeout: config.task_timeout(),
            retry_count: config.execution.retry_count,
            grace_period: config.grace_period(),
            dry_run: false,
            use_cache: config.cache.enabled,
        }
    }
}

/// 单次构建的执行上下文，显式传递给调度器
#[derive(Clone)]
pub struct ExecutionContext {
    pub options: ExecutionOptions,
    /// 工作区根目录（模块目录相对于它解析）
    pub workspace_root: PathBuf,
    pub cache: Option<Arc<IncrementalCache>>,
    pub cancel: CancellationToken,
    pub observer: Option<Arc<dyn BuildObserver>>,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("options", &self.options)
            .field("workspace_root", &self.workspace_root)
            .field("cache", &self.cache.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl ExecutionContext {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            options: ExecutionOptions::default(),
            workspace_root: workspace_root.into(),
            cache: None,
            cancel: CancellationToken::new(),
            observer: None,
        }
    }

    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cache(mut self, cache: Arc<IncrementalCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn BuildObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// 实际生效的缓存（禁用缓存或试运行时为 None）
    pub fn active_cache(&self) -> Option<&Arc<IncrementalCache>> {
        if self.options.use_cache && !self.options.dry_run {
            self.cache.as_ref()
        } else {
            None
        }
    }

    pub(crate) fn emit(&self, event: BuildEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_config() {
        let mut config = Config::default();
        config.execution.workers = 0;
        config.execution.continue_on_failure = true;
        config.execution.task_timeout = 5;
        config.cache.enabled = false;

        let options = ExecutionOptions::from_config(&config);
        assert_eq!(options.workers, 1);
        assert_eq!(options.failure_mode, FailureMode::Continue);
        assert_eq!(options.task_timeout, Some(Duration::from_secs(5)));
        assert!(!options.use_cache);
    }

    #[test]
    fn dry_run_disables_cache() {
        let mut context = ExecutionContext::new(".")
            .with_cache(Arc::new(IncrementalCache::in_memory(3)));
        assert!(context.active_cache().is_some());

        context.options.dry_run = true;
        assert!(context.active_cache().is_none());
    }
}
