// ============================================================================
// Weft - 任务动作注册表
// ============================================================================
//
// 文件: src/core/action.rs
// 职责: 任务动作的多态实现与按键注册
// 边界:
//   - ✅ 动作 trait 定义
//   - ✅ 动作注册与解析（构图时解析）
//   - ✅ 内置动作：noop、exec、write
//   - ❌ 不包含调度、重试、超时逻辑
//   - ❌ 不包含缓存判断
//
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::error::TaskExecutionError;
use crate::models::TaskId;

/// 动作执行时可见的上下文
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// 任务标识
    pub task: TaskId,
    /// 声明的参数
    pub params: BTreeMap<String, Value>,
    /// 模块工作目录（绝对路径）
    pub module_dir: PathBuf,
    /// 声明的输出路径（绝对路径）
    pub outputs: Vec<PathBuf>,
    /// 构建取消信号
    pub cancel: CancellationToken,
}

impl ActionContext {
    /// 读取字符串参数
    pub fn str_param(&self, key: &str) -> Result<Option<&str>, TaskExecutionError> {
        match self.params.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(TaskExecutionError::InvalidParams(format!(
                "`{}` must be a string, got {}",
                key, other
            ))),
        }
    }

    /// 读取字符串数组参数
    pub fn list_param(&self, key: &str) -> Result<Vec<String>, TaskExecutionError> {
        match self.params.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Ok(other.to_string()),
                })
                .collect(),
            Some(other) => Err(TaskExecutionError::InvalidParams(format!(
                "`{}` must be an array, got {}",
                key, other
            ))),
        }
    }
}

/// 任务动作
#[async_trait]
pub trait TaskAction: Send + Sync {
    async fn execute(&self, ctx: &ActionContext) -> Result<(), TaskExecutionError>;
}

/// 动作注册表，键为稳定字符串
#[derive(Clone)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn TaskAction>>,
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

impl ActionRegistry {
    /// 空注册表
    pub fn empty() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// 包含内置动作的注册表
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("noop", NoopAction);
        registry.register("exec", ExecAction);
        registry.register("write", WriteAction);
        registry
    }

    /// 注册动作，同名动作会被替换
    pub fn register<A>(&mut self, key: impl Into<String>, action: A)
    where
        A: TaskAction + 'static,
    {
        self.actions.insert(key.into(), Arc::new(action));
    }

    /// 注册已共享的动作
    pub fn register_shared(&mut self, key: impl Into<String>, action: Arc<dyn TaskAction>) {
        self.actions.insert(key.into(), action);
    }

    pub fn resolve(&self, key: &str) -> Option<Arc<dyn TaskAction>> {
        self.actions.get(key).cloned()
    }

    /// 已注册的键（排序后）
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.actions.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// 不做任何事情的动作（聚合任务）
pub struct NoopAction;

#[async_trait]
impl TaskAction for NoopAction {
    async fn execute(&self, _ctx: &ActionContext) -> Result<(), TaskExecutionError> {
        Ok(())
    }
}

/// 在模块目录中执行外部命令
///
/// 参数：`command`（必填）、`args`（数组）、`env`（字符串表）。
pub struct ExecAction;

#[async_trait]
impl TaskAction for ExecAction {
    async fn execute(&self, ctx: &ActionContext) -> Result<(), TaskExecutionError> {
        let program = ctx
            .str_param("command")?
            .ok_or_else(|| TaskExecutionError::InvalidParams("`command` is required".into()))?;
        let args = ctx.list_param("args")?;

        let mut command = Command::new(program);
        command
            .args(&args)
            .current_dir(&ctx.module_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(Value::Object(env)) = ctx.params.get("env") {
            for (key, value) in env {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                command.env(key, value);
            }
        }

        let command_str = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        debug!(task = %ctx.task, command = %command_str, "spawning command");

        let output = command.output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !stdout.is_empty() {
            debug!(task = %ctx.task, "stdout: {}", stdout.trim_end());
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(TaskExecutionError::NonZeroExit {
                command: command_str,
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim_end().to_string(),
            })
        }
    }
}

/// 将 `content` 写入 `path`（默认第一个声明的输出）
pub struct WriteAction;

#[async_trait]
impl TaskAction for WriteAction {
    async fn execute(&self, ctx: &ActionContext) -> Result<(), TaskExecutionError> {
        let content = ctx.str_param("content")?.unwrap_or_default();
        let target = match ctx.str_param("path")? {
            Some(path) => ctx.module_dir.join(path),
            None => ctx.outputs.first().cloned().ok_or_else(|| {
                TaskExecutionError::InvalidParams(
                    "`path` is required when the task declares no outputs".into(),
                )
            })?,
        };

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, content).await?;
        debug!(task = %ctx.task, path = %target.display(), "wrote output");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context(dir: &TempDir, params: BTreeMap<String, Value>, outputs: Vec<&str>) -> ActionContext {
        ActionContext {
            task: TaskId::new("m", "t"),
            params,
            module_dir: dir.path().to_path_buf(),
            outputs: outputs.into_iter().map(|o| dir.path().join(o)).collect(),
            cancel: CancellationToken::new(),
        }
    }

    #[test]
    fn builtins_are_registered() {
        let registry = ActionRegistry::default();
        assert_eq!(registry.keys(), vec!["exec", "noop", "write"]);
        assert!(registry.resolve("missing").is_none());
    }

    #[tokio::test]
    async fn write_action_defaults_to_first_output() {
        let dir = TempDir::new().unwrap();
        let mut params = BTreeMap::new();
        params.insert("content".to_string(), Value::from("hello"));
        let ctx = context(&dir, params, vec!["out/result.txt"]);

        WriteAction.execute(&ctx).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("out/result.txt")).unwrap();
        assert_eq!(written, "hello");
    }

    #[tokio::test]
    async fn write_action_without_target_is_invalid() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, BTreeMap::new(), vec![]);
        let err = WriteAction.execute(&ctx).await.unwrap_err();
        assert!(matches!(err, TaskExecutionError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn exec_action_requires_command() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, BTreeMap::new(), vec![]);
        let err = ExecAction.execute(&ctx).await.unwrap_err();
        assert!(matches!(err, TaskExecutionError::InvalidParams(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exec_action_reports_exit_code() {
        let dir = TempDir::new().unwrap();
        let mut params = BTreeMap::new();
        params.insert("command".to_string(), Value::from("sh"));
        params.insert(
            "args".to_string(),
            Value::from(vec!["-c", "echo oops >&2; exit 3"]),
        );
        let ctx = context(&dir, params, vec![]);

        match ExecAction.execute(&ctx).await.unwrap_err() {
            TaskExecutionError::NonZeroExit { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exec_action_runs_in_module_dir_with_env() {
        let dir = TempDir::new().unwrap();
        let mut params = BTreeMap::new();
        params.insert("command".to_string(), Value::from("sh"));
        params.insert(
            "args".to_string(),
            Value::from(vec!["-c", "printf %s \"$GREETING\" > greeting.txt"]),
        );
        params.insert("env".to_string(), serde_json::json!({ "GREETING": "hi" }));
        let ctx = context(&dir, params, vec![]);

        ExecAction.execute(&ctx).await.unwrap();
        let written = std::fs::read_to_string(dir.path().join("greeting.txt")).unwrap();
        assert_eq!(written, "hi");
    }
}
