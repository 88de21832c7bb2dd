// ============================================================================
// Weft - 构建结果数据模型
// ============================================================================
//
// 文件: src/models/report.rs
// 职责: 构建结果与汇总统计的数据结构定义
// 边界:
//   - ✅ 构建整体状态定义
//   - ✅ 汇总统计结构定义
//   - ✅ 构建结果查询方法
//   - ❌ 不应包含统计计算逻辑
//   - ❌ 不应包含终端渲染逻辑
//
// ============================================================================

use serde::Serialize;
use std::time::Duration;

use crate::models::task::{ExecutionRecord, TaskId, TaskStatus};

/// 构建整体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildStatus {
    /// 所有任务成功或命中缓存
    Succeeded,
    /// 至少一个任务失败
    Failed,
    /// 收到外部停止信号
    Cancelled,
}

/// 构建汇总统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub up_to_date: usize,
    /// 从未被调度的任务数
    pub not_run: usize,
    /// 总耗时
    pub wall_time: Duration,
}

/// 主要失败原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReason {
    pub task: TaskId,
    pub cause: String,
}

/// 一次构建的结果
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    /// 整体状态
    pub status: BuildStatus,
    /// 每个任务的执行记录（按声明顺序）
    pub records: Vec<ExecutionRecord>,
    /// 汇总统计
    pub summary: BuildSummary,
    /// 第一个失败任务的原因
    pub primary_failure: Option<FailureReason>,
}

impl BuildResult {
    /// 查找指定任务的执行记录
    pub fn record(&self, task: &TaskId) -> Option<&ExecutionRecord> {
        self.records.iter().find(|r| &r.task == task)
    }

    /// 按 `module:name` 查找任务状态
    pub fn status_of(&self, qualified: &str) -> Option<TaskStatus> {
        self.records
            .iter()
            .find(|r| r.task.to_string() == qualified)
            .map(|r| r.status)
    }

    pub fn is_success(&self) -> bool {
        self.status == BuildStatus::Succeeded
    }
}
