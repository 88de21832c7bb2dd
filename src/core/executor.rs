// ============================================================================
// Weft - 构建执行器
// ============================================================================
//
// 文件: src/core/executor.rs
// 职责: 单次构建调用的门面：注册表 → 任务图 → 调度器 → 报告器
// 边界:
//   - ✅ 从配置构建注册表与任务图
//   - ✅ 构建目标选择（模块或 `module:task`）
//   - ✅ 打开增量缓存（失败时退回内存缓存）
//   - ✅ 组装执行上下文并启动调度器
//   - ❌ 不包含 CLI 参数处理
//   - ❌ 不包含终端输出
//
// ============================================================================

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::action::ActionRegistry;
use crate::core::cache::IncrementalCache;
use crate::core::context::{ExecutionContext, ExecutionOptions};
use crate::core::error::{CacheError, ConfigurationError};
use crate::core::graph::{GraphBuilder, TaskGraph};
use crate::core::registry::UnitRegistry;
use crate::core::reporter::BuildObserver;
use crate::core::scheduler::Scheduler;
use crate::models::{BuildResult, Config, TaskId};

/// 一次构建请求
#[derive(Clone, Default)]
pub struct BuildRequest {
    /// 构建目标，空表示全部
    pub targets: Vec<String>,
    pub dry_run: bool,
    pub cancel: CancellationToken,
    pub observer: Option<Arc<dyn BuildObserver>>,
}

impl BuildRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
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
}

/// 构建执行器
pub struct BuildExecutor {
    config: Config,
    actions: ActionRegistry,
}

impl BuildExecutor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            actions: ActionRegistry::with_builtins(),
        }
    }

    /// 替换动作注册表
    pub fn with_actions(mut self, actions: ActionRegistry) -> Self {
        self.actions = actions;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    /// 校验模块声明
    pub fn registry(&self) -> Result<UnitRegistry, ConfigurationError> {
        UnitRegistry::from_modules(self.config.modules.iter().cloned())
    }

    /// 构建任务图并按目标裁剪
    ///
    /// 目标为模块标识时选择该模块及其依赖模块的全部任务；
    /// 目标为 `module:task` 时选择该任务及其传递依赖。
    pub fn plan(&self, targets: &[String]) -> Result<TaskGraph, ConfigurationError> {
        let registry = self.registry()?;
        let graph = GraphBuilder::new(&self.actions).build(&registry)?;
        if targets.is_empty() {
            return Ok(graph);
        }

        let mut seeds = Vec::new();
        for target in targets {
            if target.contains(':') {
                let id = TaskId::parse(target, "");
                if graph.node(&id).is_none() {
                    return Err(ConfigurationError::UnknownTarget {
                        target: target.clone(),
                    });
                }
                seeds.push(id);
            } else {
                let closure = registry.closure(std::slice::from_ref(target))?;
                for module in closure.modules() {
                    seeds.extend(graph.tasks_of(&module.id).map(|node| node.id.clone()));
                }
            }
        }

        debug!(targets = ?targets, seeds = seeds.len(), "selecting build targets");
        graph.select(&seeds)
    }

    /// 打开配置中的持久化缓存
    pub fn open_cache(&self) -> Result<IncrementalCache, CacheError> {
        IncrementalCache::open(&self.config.cache_dir(), self.config.cache.history)
    }

    /// 执行一次构建
    ///
    /// 配置错误在任何任务运行前返回；任务失败体现在结果中。
    pub async fn execute(&self, request: BuildRequest) -> Result<BuildResult, ConfigurationError> {
        let graph = Arc::new(self.plan(&request.targets)?);

        let mut options = ExecutionOptions::from_config(&self.config);
        options.dry_run = request.dry_run;
        let workers = options.workers;

        let mut context = ExecutionContext::new(self.config.workspace_root())
            .with_options(options)
            .with_cancel(request.cancel);
        if let Some(observer) = request.observer {
            context = context.with_observer(observer);
        }

        let cache = if context.options.use_cache && !context.options.dry_run {
            let cache = match self.open_cache() {
                Ok(cache) => cache,
                Err(e) => {
                    warn!(error = %e, "cannot open cache, falling back to memory");
                    IncrementalCache::in_memory(self.config.cache.history)
                }
            };
            let cache = Arc::new(cache);
            context = context.with_cache(cache.clone());
            Some(cache)
        } else {
            None
        };

        let result = Scheduler::new(Arc::new(context)).run(graph, workers).await;

        if let Some(cache) = cache {
            if let Err(e) = cache.maybe_compact_async().await {
                warn!(error = %e, "cache compaction failed");
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Module, TaskDecl};

    fn config() -> Config {
        let mut config = Config::default();
        config.modules = vec![
            Module::new("base").with_task(TaskDecl::new("build")),
            Module::new("core")
                .with_dependency("base")
                .with_task(TaskDecl::new("compile"))
                .with_task(TaskDecl::new("test")),
            Module::new("app")
                .with_dependency("core")
                .with_task(TaskDecl::new("build")),
            Module::new("docs").with_task(TaskDecl::new("build")),
        ];
        config
    }

    fn ids(graph: &TaskGraph) -> Vec<String> {
        graph.tasks().map(|node| node.id.to_string()).collect()
    }

    #[test]
    fn plan_without_targets_keeps_everything() {
        let graph = BuildExecutor::new(config()).plan(&[]).unwrap();
        assert_eq!(graph.len(), 5);
    }

    #[test]
    fn module_targets_pull_in_dependencies() {
        let graph = BuildExecutor::new(config())
            .plan(&["core".to_string()])
            .unwrap();
        assert_eq!(ids(&graph), vec!["base:build", "core:compile", "core:test"]);
    }

    #[test]
    fn task_targets_select_only_what_they_need() {
        let graph = BuildExecutor::new(config())
            .plan(&["core:compile".to_string()])
            .unwrap();
        assert_eq!(ids(&graph), vec!["base:build", "core:compile"]);
    }

    #[test]
    fn unknown_targets_are_configuration_errors() {
        let executor = BuildExecutor::new(config());
        assert!(matches!(
            executor.plan(&["nope".to_string()]),
            Err(ConfigurationError::UnknownModule { .. })
        ));
        assert!(matches!(
            executor.plan(&["core:nope".to_string()]),
            Err(ConfigurationError::UnknownTarget { .. })
        ));
    }

    #[tokio::test]
    async fn configuration_errors_abort_before_execution() {
        let mut config = config();
        config.modules.push(Module::new("base"));

        let err = BuildExecutor::new(config)
            .execute(BuildRequest::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateModule { .. }));
    }
}
