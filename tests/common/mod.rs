// ============================================================================
// Weft - 集成测试公共工具
// ============================================================================
//
// 文件: tests/common/mod.rs
// 职责: 临时工作区搭建与可观测的测试动作
// 边界:
//   - ✅ 临时目录中的文件布局
//   - ✅ 记录执行次数的动作
//   - ❌ 不包含断言逻辑
//
// ============================================================================

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use weft::core::{ActionContext, ActionRegistry, BuildExecutor, TaskAction, TaskExecutionError};
use weft::models::{Config, Module};

/// 测试动作的注册键
pub const RECORD: &str = "record";

/// 记录每次执行的动作
///
/// 参数 `fail = true` 时返回失败；成功时把任务名写入所有声明的输出。
#[derive(Clone, Default)]
pub struct RecordingAction {
    runs: Arc<Mutex<Vec<String>>>,
}

impl RecordingAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按执行顺序排列的任务标识
    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }

    pub fn count_of(&self, task: &str) -> usize {
        self.runs.lock().unwrap().iter().filter(|t| *t == task).count()
    }

    pub fn reset(&self) {
        self.runs.lock().unwrap().clear();
    }
}

#[async_trait]
impl TaskAction for RecordingAction {
    async fn execute(&self, ctx: &ActionContext) -> Result<(), TaskExecutionError> {
        self.runs.lock().unwrap().push(ctx.task.to_string());

        if matches!(ctx.params.get("fail"), Some(Value::Bool(true))) {
            return Err(TaskExecutionError::ActionFailed(format!("{} failed on purpose", ctx.task)));
        }

        for output in &ctx.outputs {
            if let Some(parent) = output.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(output, ctx.task.to_string()).await?;
        }
        Ok(())
    }
}

/// 临时工作区
pub struct TestWorkspace {
    dir: TempDir,
    modules: Vec<Module>,
    continue_on_failure: bool,
    workers: usize,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self::in_dir(TempDir::new().expect("failed to create temp dir"))
    }

    /// 以指定前缀命名的工作区目录
    pub fn with_prefix(prefix: &str) -> Self {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .expect("failed to create temp dir");
        Self::in_dir(dir)
    }

    fn in_dir(dir: TempDir) -> Self {
        Self {
            dir,
            modules: Vec::new(),
            continue_on_failure: false,
            workers: 2,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// 写入工作区文件（自动创建父目录）
    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(path, content).expect("failed to write file");
        self
    }

    pub fn remove(&self, relative: &str) {
        std::fs::remove_file(self.path(relative)).expect("failed to remove file");
    }

    pub fn with_module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    pub fn continue_on_failure(mut self) -> Self {
        self.continue_on_failure = true;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// 以临时目录为根的配置
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.workspace.root = self.root().to_string_lossy().to_string();
        config.execution.workers = self.workers;
        config.execution.continue_on_failure = self.continue_on_failure;
        config.output.show_progress = false;
        config.modules = self.modules.clone();
        config
    }

    /// 注册了记录动作的执行器
    pub fn executor(&self, action: &RecordingAction) -> BuildExecutor {
        let mut actions = ActionRegistry::with_builtins();
        actions.register(RECORD, action.clone());
        BuildExecutor::new(self.config()).with_actions(actions)
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
