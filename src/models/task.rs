// ============================================================================
// Weft - 任务数据模型
// ============================================================================
//
// 文件: src/models/task.rs
// 职责: 任务标识、任务状态与执行记录的数据结构定义
// 边界:
//   - ✅ 任务标识解析与格式化
//   - ✅ 任务状态枚举定义
//   - ✅ 执行记录的状态迁移辅助方法
//   - ❌ 不应包含任务执行逻辑
//   - ❌ 不应包含任务调度逻辑
//   - ❌ 不应包含 CLI 相关逻辑
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime};

/// 任务全限定标识，格式为 `module:name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId {
    /// 所属模块
    pub module: String,
    /// 模块内任务名
    pub name: String,
}

impl TaskId {
    /// 创建任务标识
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// 解析任务引用
    ///
    /// `name` 解析为 `current_module` 内的任务，`module:name` 解析为指定模块的任务。
    pub fn parse(reference: &str, current_module: &str) -> Self {
        match reference.split_once(':') {
            Some((module, name)) => Self::new(module, name),
            None => Self::new(current_module, reference),
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.name)
    }
}

/// 任务状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// 等待依赖完成
    Pending,
    /// 依赖已满足，等待工作线程
    Ready,
    /// 正在执行
    Running,
    /// 执行成功
    Succeeded,
    /// 执行失败
    Failed,
    /// 已跳过
    Skipped,
    /// 缓存命中，无需执行
    UpToDate,
}

impl TaskStatus {
    /// 是否处于终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Skipped | TaskStatus::UpToDate
        )
    }

    /// 是否为可以解锁下游任务的终态
    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::UpToDate)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Ready => "Ready",
            TaskStatus::Running => "Running",
            TaskStatus::Succeeded => "Succeeded",
            TaskStatus::Failed => "Failed",
            TaskStatus::Skipped => "Skipped",
            TaskStatus::UpToDate => "UpToDate",
        };
        write!(f, "{}", text)
    }
}

/// 单个任务的执行记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// 任务标识
    pub task: TaskId,
    /// 当前状态
    pub status: TaskStatus,
    /// 开始时间
    pub started_at: Option<SystemTime>,
    /// 结束时间
    pub finished_at: Option<SystemTime>,
    /// 失败原因
    pub failure: Option<String>,
    /// 跳过原因
    pub skip_reason: Option<String>,
    /// 已尝试执行的次数
    pub attempts: u32,
    /// 本次计算出的输入指纹
    pub input_fingerprint: Option<String>,
}

impl ExecutionRecord {
    /// 创建初始记录（Pending）
    pub fn new(task: TaskId) -> Self {
        Self {
            task,
            status: TaskStatus::Pending,
            started_at: None,
            finished_at: None,
            failure: None,
            skip_reason: None,
            attempts: 0,
            input_fingerprint: None,
        }
    }

    /// 进入 Running
    pub fn start(&mut self) {
        self.status = TaskStatus::Running;
        self.started_at = Some(SystemTime::now());
    }

    /// 以成功或缓存命中结束
    pub fn succeed(&mut self, status: TaskStatus) {
        debug_assert!(status.is_success());
        self.status = status;
        self.finished_at = Some(SystemTime::now());
    }

    /// 以失败结束
    pub fn fail(&mut self, cause: impl Into<String>) {
        self.status = TaskStatus::Failed;
        self.failure = Some(cause.into());
        self.finished_at = Some(SystemTime::now());
    }

    /// 不执行直接跳过
    pub fn skip(&mut self, reason: impl Into<String>) {
        self.status = TaskStatus::Skipped;
        self.skip_reason = Some(reason.into());
        self.finished_at = Some(SystemTime::now());
    }

    /// 执行时长
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => end.duration_since(start).ok(),
            _ => None,
        }
    }

    /// 任务从未被调度
    pub fn is_not_run(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}
