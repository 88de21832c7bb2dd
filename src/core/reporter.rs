// ============================================================================
// Weft - 执行报告器
// ============================================================================
//
// 文件: src/core/reporter.rs
// 职责: 执行事件分发与构建结果汇总
// 边界:
//   - ✅ 构建事件定义与观察者 trait
//   - ✅ 执行记录汇总统计
//   - ✅ 主要失败原因判定（最早结束的失败任务）
//   - ✅ 构建整体状态判定
//   - ❌ 不应包含终端渲染逻辑
//   - ❌ 不应修改执行记录
//
// ============================================================================

use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use crate::models::{
    BuildResult, BuildStatus, BuildSummary, ExecutionRecord, FailureReason, TaskId, TaskStatus,
};

/// 调度过程中发出的事件
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    /// 开始调度，`total` 为任务总数
    Planned { total: usize },
    /// 任务开始执行
    TaskStarted { task: TaskId },
    /// 任务进入终态
    TaskFinished {
        task: TaskId,
        status: TaskStatus,
        duration: Option<Duration>,
    },
    /// 收到停止信号
    Cancelled,
}

/// 构建事件观察者
pub trait BuildObserver: Send + Sync {
    fn on_event(&self, event: &BuildEvent);
}

/// 输出到 tracing 的观察者
#[derive(Debug, Default)]
pub struct TracingObserver;

impl BuildObserver for TracingObserver {
    fn on_event(&self, event: &BuildEvent) {
        match event {
            BuildEvent::Planned { total } => debug!(total, "build planned"),
            BuildEvent::TaskStarted { task } => info!(task = %task, "task started"),
            BuildEvent::TaskFinished {
                task,
                status,
                duration,
            } => {
                let millis = duration.map(|d| d.as_millis() as u64).unwrap_or(0);
                if *status == TaskStatus::Failed {
                    warn!(task = %task, %status, millis, "task finished");
                } else {
                    info!(task = %task, %status, millis, "task finished");
                }
            }
            BuildEvent::Cancelled => warn!("build cancelled"),
        }
    }
}

/// 收集事件的观察者（用于测试与诊断）
#[derive(Debug, Default)]
pub struct CollectingObserver {
    events: Mutex<Vec<BuildEvent>>,
}

impl CollectingObserver {
    pub fn events(&self) -> Vec<BuildEvent> {
        self.events
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// 按开始顺序列出任务
    pub fn started(&self) -> Vec<TaskId> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                BuildEvent::TaskStarted { task } => Some(task),
                _ => None,
            })
            .collect()
    }
}

impl BuildObserver for CollectingObserver {
    fn on_event(&self, event: &BuildEvent) {
        let mut events = self.events.lock().unwrap_or_else(|p| p.into_inner());
        events.push(event.clone());
    }
}

/// 执行报告器：只读地汇总调度器交出的执行记录
pub struct ExecutionReporter;

impl ExecutionReporter {
    /// 汇总统计
    pub fn summarize(records: &[ExecutionRecord], wall_time: Duration) -> BuildSummary {
        let mut summary = BuildSummary {
            total: records.len(),
            wall_time,
            ..BuildSummary::default()
        };

        for record in records {
            match record.status {
                TaskStatus::Succeeded => summary.succeeded += 1,
                TaskStatus::Failed => summary.failed += 1,
                TaskStatus::Skipped => summary.skipped += 1,
                TaskStatus::UpToDate => summary.up_to_date += 1,
                TaskStatus::Pending | TaskStatus::Ready | TaskStatus::Running => {
                    summary.not_run += 1
                }
            }
        }

        summary
    }

    /// 主要失败原因
    ///
    /// 取结束时间最早的失败任务，时间相同时按声明顺序（记录顺序）。
    pub fn primary_failure(records: &[ExecutionRecord]) -> Option<FailureReason> {
        records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.status == TaskStatus::Failed)
            .min_by_key(|(position, r)| (r.finished_at.unwrap_or(SystemTime::UNIX_EPOCH), *position))
            .map(|(_, r)| FailureReason {
                task: r.task.clone(),
                cause: r.failure.clone().unwrap_or_default(),
            })
    }

    /// 构建整体状态
    pub fn status(summary: &BuildSummary, cancelled: bool) -> BuildStatus {
        if cancelled {
            BuildStatus::Cancelled
        } else if summary.failed > 0 || summary.not_run > 0 {
            BuildStatus::Failed
        } else {
            BuildStatus::Succeeded
        }
    }

    /// 生成最终构建结果
    pub fn build_result(
        records: Vec<ExecutionRecord>,
        wall_time: Duration,
        cancelled: bool,
    ) -> BuildResult {
        let summary = Self::summarize(&records, wall_time);
        let primary_failure = Self::primary_failure(&records);
        let status = Self::status(&summary, cancelled);

        BuildResult {
            status,
            records,
            summary,
            primary_failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, status: TaskStatus, finished_secs: u64) -> ExecutionRecord {
        let mut record = ExecutionRecord::new(TaskId::new("m", name));
        record.status = status;
        if status != TaskStatus::Pending {
            record.finished_at =
                Some(SystemTime::UNIX_EPOCH + Duration::from_secs(finished_secs));
        }
        if status == TaskStatus::Failed {
            record.failure = Some(format!("{name} broke"));
        }
        record
    }

    #[test]
    fn summary_counts_every_state() {
        let records = vec![
            record("a", TaskStatus::Succeeded, 1),
            record("b", TaskStatus::UpToDate, 1),
            record("c", TaskStatus::Failed, 2),
            record("d", TaskStatus::Skipped, 2),
            record("e", TaskStatus::Pending, 0),
        ];

        let summary = ExecutionReporter::summarize(&records, Duration::from_secs(3));
        assert_eq!(summary.total, 5);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.up_to_date, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.not_run, 1);
        assert_eq!(summary.wall_time, Duration::from_secs(3));
    }

    #[test]
    fn primary_failure_is_earliest_finished() {
        let records = vec![
            record("late", TaskStatus::Failed, 9),
            record("early", TaskStatus::Failed, 4),
            record("tie", TaskStatus::Failed, 4),
        ];

        let failure = ExecutionReporter::primary_failure(&records).unwrap();
        assert_eq!(failure.task, TaskId::new("m", "early"));
        assert_eq!(failure.cause, "early broke");
    }

    #[test]
    fn overall_status() {
        let ok = vec![record("a", TaskStatus::Succeeded, 1)];
        assert_eq!(
            ExecutionReporter::build_result(ok.clone(), Duration::ZERO, false).status,
            BuildStatus::Succeeded
        );
        assert_eq!(
            ExecutionReporter::build_result(ok, Duration::ZERO, true).status,
            BuildStatus::Cancelled
        );

        let unfinished = vec![
            record("a", TaskStatus::Succeeded, 1),
            record("b", TaskStatus::Pending, 0),
        ];
        let result = ExecutionReporter::build_result(unfinished, Duration::ZERO, false);
        assert_eq!(result.status, BuildStatus::Failed);
        assert!(result.primary_failure.is_none());
    }

    #[test]
    fn collecting_observer_keeps_start_order() {
        let observer = CollectingObserver::default();
        observer.on_event(&BuildEvent::Planned { total: 2 });
        observer.on_event(&BuildEvent::TaskStarted {
            task: TaskId::new("m", "a"),
        });
        observer.on_event(&BuildEvent::TaskStarted {
            task: TaskId::new("m", "b"),
        });

        assert_eq!(observer.events().len(), 3);
        assert_eq!(
            observer.started(),
            vec![TaskId::new("m", "a"), TaskId::new("m", "b")]
        );
        TracingObserver.on_event(&BuildEvent::Cancelled);
    }
}
