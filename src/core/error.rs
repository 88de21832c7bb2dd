// ============================================================================
// Weft - 错误类型
// ============================================================================
//
// 文件: src/core/error.rs
// 职责: 核心引擎错误分类
// 边界:
//   - ✅ 配置错误（构建前致命）
//   - ✅ 任务执行错误（归属单个任务）
//   - ✅ 缓存错误（按未命中处理）
//   - ❌ 不应包含错误展示逻辑
//
// ============================================================================

use std::time::Duration;
use thiserror::Error;

fn describe_cycle(cycle: &[String]) -> String {
    match cycle.first() {
        Some(first) => format!("{} -> {}", cycle.join(" -> "), first),
        None => String::new(),
    }
}

/// 配置错误：在任何任务运行前报告，整个构建中止
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("duplicate module '{module}'")]
    DuplicateModule { module: String },

    #[error("module '{module}' depends on unknown module '{dependency}'")]
    UnknownDependency { module: String, dependency: String },

    #[error("unknown module '{module}'")]
    UnknownModule { module: String },

    #[error("unknown build target '{target}'")]
    UnknownTarget { target: String },

    #[error("dependency cycle between modules: {}", describe_cycle(.cycle))]
    ModuleCycle { cycle: Vec<String> },

    #[error("dependency cycle between tasks: {}", describe_cycle(.cycle))]
    TaskCycle { cycle: Vec<String> },

    #[error("duplicate task '{task}' in module '{module}'")]
    DuplicateTask { module: String, task: String },

    #[error("task '{task}' depends on unknown task '{reference}'")]
    UnknownTask { task: String, reference: String },

    #[error("task '{task}' depends on '{reference}', whose module is not a dependency of '{module}'")]
    HiddenDependency {
        task: String,
        reference: String,
        module: String,
    },

    #[error("task '{task}' uses unknown action '{action}'")]
    UnknownAction { task: String, action: String },

    #[error("invalid identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: String },
}

impl ConfigurationError {
    /// 循环依赖的成员列表
    pub fn cycle(&self) -> Option<&[String]> {
        match self {
            ConfigurationError::ModuleCycle { cycle } | ConfigurationError::TaskCycle { cycle } => {
                Some(cycle)
            }
            _ => None,
        }
    }
}

/// 任务执行错误：只影响所属任务及其下游
#[derive(Debug, Error)]
pub enum TaskExecutionError {
    #[error("{0}")]
    ActionFailed(String),

    #[error("command `{command}` exited with code {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("interrupted")]
    Interrupted,

    #[error("action panicked: {0}")]
    Panicked(String),

    #[error("invalid action parameters: {0}")]
    InvalidParams(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaskExecutionError {
    /// 该错误是否值得重试
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            TaskExecutionError::Interrupted | TaskExecutionError::InvalidParams(_)
        )
    }
}

/// 缓存错误：调用方按缓存未命中处理
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt cache entry at line {line}: {reason}")]
    Corruption { line: usize, reason: String },

    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_closes_the_loop() {
        let err = ConfigurationError::ModuleCycle {
            cycle: vec!["a".into(), "b".into(), "c".into()],
        };
        assert_eq!(
            err.to_string(),
            "dependency cycle between modules: a -> b -> c -> a"
        );
        assert_eq!(err.cycle().map(|c| c.len()), Some(3));
    }
}
