// ============================================================================
// Weft - 任务调度器
// ============================================================================
//
// 文件: src/core/scheduler.rs
// 职责: 按依赖顺序将就绪任务派发给固定大小的工作池
// 边界:
//   - ✅ 任务状态机 Pending → Ready → Running → 终态
//   - ✅ 并发上限与确定性决胜（声明顺序）
//   - ✅ 失败策略（fail-fast / continue）与下游跳过
//   - ✅ 增量缓存检查、超时、重试、panic 捕获
//   - ✅ 取消信号与宽限期
//   - ❌ 不包含结果汇总（由报告器负责）
//   - ❌ 不包含 UI 显示逻辑
//
// 并发模型:
//   - 所有状态迁移经由同一把 std::sync::Mutex，锁从不跨越 .await
//   - 工作线程执行动作时不持有锁
//   - 无就绪任务且仍有任务运行时，工作线程在 Notify 上等待
//
// ============================================================================

use std::any::Any;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::core::action::ActionContext;
use crate::core::context::{ExecutionContext, FailureMode};
use crate::core::error::TaskExecutionError;
use crate::core::fingerprint::{input_fingerprint, output_fingerprint, Fingerprint};
use crate::core::graph::{TaskGraph, TaskNode};
use crate::core::reporter::{BuildEvent, ExecutionReporter};
use crate::models::{BuildResult, ExecutionRecord, TaskStatus};

/// 工作线程的下一步动作
enum Step {
    Run(usize),
    Wait,
    Exit,
}

/// 单个任务的执行结果
enum Outcome {
    Succeeded,
    UpToDate,
    Failed(String),
}

/// 调度状态，只能在锁内修改
struct RunState {
    records: Vec<ExecutionRecord>,
    /// 尚未完成的依赖数
    remaining: Vec<usize>,
    /// 就绪队列，按声明位置出队
    ready: BinaryHeap<Reverse<usize>>,
    running: usize,
    /// fail-fast 已触发
    halted: bool,
    /// 已处理取消信号
    cancel_seen: bool,
    /// 取消信号打断了未完成的工作
    cancelled: bool,
}

struct Shared {
    graph: Arc<TaskGraph>,
    context: Arc<ExecutionContext>,
    state: Mutex<RunState>,
    wake: Notify,
}

/// 任务调度器
pub struct Scheduler {
    context: Arc<ExecutionContext>,
}

impl Scheduler {
    pub fn new(context: Arc<ExecutionContext>) -> Self {
        Self { context }
    }

    /// 执行整个任务图
    ///
    /// 任意时刻最多 `workers` 个任务处于 Running。
    pub async fn run(&self, graph: Arc<TaskGraph>, workers: usize) -> BuildResult {
        let started = Instant::now();
        let workers = workers.max(1);
        self.context.emit(BuildEvent::Planned { total: graph.len() });

        if self.context.options.dry_run {
            return self.plan(&graph, started);
        }

        let shared = Arc::new(Shared::new(graph.clone(), self.context.clone()));
        let pool_size = workers.min(graph.len());
        debug!(workers = pool_size, tasks = graph.len(), "starting worker pool");

        let mut pool = JoinSet::new();
        for worker in 0..pool_size {
            pool.spawn(worker_loop(shared.clone(), worker));
        }
        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "worker terminated abnormally");
            }
        }

        let (records, cancelled) = shared.finish();
        let result = ExecutionReporter::build_result(records, started.elapsed(), cancelled);
        info!(
            status = ?result.status,
            succeeded = result.summary.succeeded,
            failed = result.summary.failed,
            up_to_date = result.summary.up_to_date,
            "build finished"
        );
        result
    }

    /// 试运行：按线性化顺序标记跳过，不执行任何动作
    fn plan(&self, graph: &TaskGraph, started: Instant) -> BuildResult {
        let mut records: Vec<ExecutionRecord> = graph
            .tasks()
            .map(|node| ExecutionRecord::new(node.id.clone()))
            .collect();

        for position in graph.linear_positions() {
            let record = &mut records[position];
            record.skip("dry run");
            self.context.emit(BuildEvent::TaskFinished {
                task: record.task.clone(),
                status: record.status,
                duration: None,
            });
        }

        ExecutionReporter::build_result(records, started.elapsed(), false)
    }
}

async fn worker_loop(shared: Arc<Shared>, worker: usize) {
    loop {
        let notified = shared.wake.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        match shared.next_step() {
            Step::Run(position) => shared.execute(position).await,
            Step::Wait => {
                tokio::select! {
                    _ = &mut notified => {}
                    _ = shared.context.cancel.cancelled() => {}
                }
            }
            Step::Exit => {
                debug!(worker, "worker idle, exiting");
                break;
            }
        }
    }
}

impl Shared {
    fn new(graph: Arc<TaskGraph>, context: Arc<ExecutionContext>) -> Self {
        let mut records = Vec::with_capacity(graph.len());
        let mut remaining = Vec::with_capacity(graph.len());
        let mut ready = BinaryHeap::new();

        for (position, node) in graph.tasks().enumerate() {
            let mut record = ExecutionRecord::new(node.id.clone());
            let deps = graph.dependency_positions(position).len();
            if deps == 0 {
                record.status = TaskStatus::Ready;
                ready.push(Reverse(position));
            }
            records.push(record);
            remaining.push(deps);
        }

        Self {
            graph,
            context,
            state: Mutex::new(RunState {
                records,
                remaining,
                ready,
                running: 0,
                halted: false,
                cancel_seen: false,
                cancelled: false,
            }),
            wake: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn emit_all(&self, events: Vec<BuildEvent>) {
        for event in events {
            self.context.emit(event);
        }
    }

    /// 决定工作线程的下一步
    fn next_step(&self) -> Step {
        let mut events = Vec::new();
        let step = {
            let mut state = self.lock();

            if self.context.cancel.is_cancelled() && !state.cancel_seen {
                events = cancel_unstarted(&mut state);
                if state.cancelled {
                    info!(skipped = events.len(), "cancellation requested");
                    events.insert(0, BuildEvent::Cancelled);
                } else {
                    debug!("cancellation requested after all work finished");
                }
            }

            if state.cancelled || state.halted {
                Step::Exit
            } else if let Some(Reverse(position)) = state.ready.pop() {
                state.records[position].start();
                state.running += 1;
                Step::Run(position)
            } else if state.running == 0 {
                Step::Exit
            } else {
                Step::Wait
            }
        };

        if !events.is_empty() {
            self.emit_all(events);
            self.wake.notify_waiters();
        }
        step
    }

    /// 执行单个任务：缓存检查、带重试的动作执行、记录缓存
    async fn execute(&self, position: usize) {
        let node = self.graph.node_at(position);
        let task_key = node.id.to_string();
        let module_dir = self.context.workspace_root.join(&node.module_dir);
        self.context.emit(BuildEvent::TaskStarted {
            task: node.id.clone(),
        });

        let mut fingerprint = None;
        if let Some(cache) = self.context.active_cache() {
            match self.compute_input_fingerprint(position, &module_dir).await {
                Ok(input) => {
                    if let Some(recorded) = cache.lookup(&task_key, &input) {
                        match self.compute_output_fingerprint(node, &module_dir).await {
                            Ok(current) if current == recorded => {
                                debug!(task = %task_key, input = input.short(), "cache hit");
                                self.complete(position, Outcome::UpToDate, 0, Some(input));
                                return;
                            }
                            Ok(_) => debug!(task = %task_key, "outputs changed since last run"),
                            Err(e) => warn!(task = %task_key, error = %e, "cannot fingerprint outputs"),
                        }
                    }
                    fingerprint = Some(input);
                }
                Err(e) => {
                    warn!(task = %task_key, error = %e, "cannot fingerprint inputs, cache bypassed");
                }
            }
        }

        let max_attempts = self.context.options.retry_count.saturating_add(1);
        let mut attempts = 0;
        let result = loop {
            attempts += 1;
            match self.attempt(node, &module_dir).await {
                Ok(()) => break Ok(()),
                Err(e)
                    if attempts < max_attempts
                        && e.is_retryable()
                        && !self.context.cancel.is_cancelled() =>
                {
                    warn!(task = %task_key, attempt = attempts, error = %e, "attempt failed, retrying");
                }
                Err(e) => break Err(e),
            }
        };

        let outcome = match result {
            Ok(()) => {
                if let (Some(cache), Some(input)) = (self.context.active_cache(), &fingerprint) {
                    match self.compute_output_fingerprint(node, &module_dir).await {
                        Ok(output) => {
                            let recorded = cache
                                .clone()
                                .record_async(task_key.clone(), input.clone(), output)
                                .await;
                            if let Err(e) = recorded {
                                warn!(task = %task_key, error = %e, "failed to record cache entry");
                            }
                        }
                        Err(e) => warn!(task = %task_key, error = %e, "cannot fingerprint outputs"),
                    }
                }
                Outcome::Succeeded
            }
            Err(e) => {
                warn!(task = %task_key, attempts, error = %e, "task failed");
                Outcome::Failed(e.to_string())
            }
        };

        self.complete(position, outcome, attempts, fingerprint);
    }

    /// 单次执行动作，处理超时、取消宽限期与 panic
    async fn attempt(&self, node: &TaskNode, module_dir: &Path) -> Result<(), TaskExecutionError> {
        let ctx = ActionContext {
            task: node.id.clone(),
            params: node.params.clone(),
            module_dir: module_dir.to_path_buf(),
            outputs: node.outputs.iter().map(|o| module_dir.join(o)).collect(),
            cancel: self.context.cancel.clone(),
        };
        let action = node.action.clone();
        let mut handle = tokio::spawn(async move { action.execute(&ctx).await });

        let limit = self.context.options.task_timeout;
        let deadline = limit.map(|l| tokio::time::Instant::now() + l);
        let cancel = self.context.cancel.clone();

        let joined = tokio::select! {
            joined = &mut handle => joined,
            _ = expire(deadline) => {
                handle.abort();
                return Err(TaskExecutionError::Timeout(limit.unwrap_or_default()));
            }
            _ = cancel.cancelled() => {
                let grace = self.context.options.grace_period;
                match tokio::time::timeout(grace, &mut handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        handle.abort();
                        return Err(TaskExecutionError::Interrupted);
                    }
                }
            }
        };

        match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(TaskExecutionError::Panicked(panic_message(e.into_panic()))),
            Err(e) => Err(TaskExecutionError::ActionFailed(e.to_string())),
        }
    }

    async fn compute_input_fingerprint(
        &self,
        position: usize,
        module_dir: &Path,
    ) -> io::Result<Fingerprint> {
        let graph = self.graph.clone();
        let dir = module_dir.to_path_buf();
        tokio::task::spawn_blocking(move || input_fingerprint(graph.node_at(position), &dir))
            .await
            .map_err(io::Error::other)?
    }

    async fn compute_output_fingerprint(
        &self,
        node: &TaskNode,
        module_dir: &Path,
    ) -> io::Result<Fingerprint> {
        let outputs = node.outputs.clone();
        let dir: PathBuf = module_dir.to_path_buf();
        tokio::task::spawn_blocking(move || output_fingerprint(&outputs, &dir))
            .await
            .map_err(io::Error::other)?
    }

    /// 记录终态并推进下游
    fn complete(
        &self,
        position: usize,
        outcome: Outcome,
        attempts: u32,
        fingerprint: Option<Fingerprint>,
    ) {
        let events = {
            let mut guard = self.lock();
            let state = &mut *guard;
            state.running = state.running.saturating_sub(1);

            let record = &mut state.records[position];
            record.attempts = attempts;
            record.input_fingerprint = fingerprint.map(|f| f.to_string());
            match &outcome {
                Outcome::Succeeded => record.succeed(TaskStatus::Succeeded),
                Outcome::UpToDate => record.succeed(TaskStatus::UpToDate),
                Outcome::Failed(cause) => record.fail(cause.clone()),
            }

            let mut events = vec![BuildEvent::TaskFinished {
                task: record.task.clone(),
                status: record.status,
                duration: record.duration(),
            }];

            match outcome {
                Outcome::Succeeded | Outcome::UpToDate => {
                    for dependent in self.graph.dependent_positions(position) {
                        state.remaining[dependent] = state.remaining[dependent].saturating_sub(1);
                        if state.remaining[dependent] == 0
                            && state.records[dependent].status == TaskStatus::Pending
                        {
                            state.records[dependent].status = TaskStatus::Ready;
                            state.ready.push(Reverse(dependent));
                        }
                    }
                }
                Outcome::Failed(_) => {
                    events.extend(self.skip_dependents(state, position));
                    if self.context.options.failure_mode == FailureMode::FailFast && !state.halted {
                        state.halted = true;
                        info!(task = %state.records[position].task, "fail-fast: no new tasks will be started");
                    }
                }
            }
            events
        };

        self.emit_all(events);
        self.wake.notify_waiters();
    }

    /// 将失败任务的传递下游全部标记为跳过
    fn skip_dependents(&self, state: &mut RunState, failed: usize) -> Vec<BuildEvent> {
        let reason = format!("dependency {} failed", state.records[failed].task);
        let mut events = Vec::new();
        let mut queue: VecDeque<usize> = self.graph.dependent_positions(failed).into();

        while let Some(position) = queue.pop_front() {
            let record = &mut state.records[position];
            if record.status != TaskStatus::Pending {
                continue;
            }
            record.skip(reason.clone());
            events.push(BuildEvent::TaskFinished {
                task: record.task.clone(),
                status: record.status,
                duration: None,
            });
            queue.extend(self.graph.dependent_positions(position));
        }

        events
    }

    /// 收尾：Ready 归一化为 Pending（未运行）
    fn finish(&self) -> (Vec<ExecutionRecord>, bool) {
        let mut state = self.lock();
        for record in state.records.iter_mut() {
            match record.status {
                TaskStatus::Ready => record.status = TaskStatus::Pending,
                TaskStatus::Running => record.fail("worker terminated"),
                _ => {}
            }
        }
        (std::mem::take(&mut state.records), state.cancelled)
    }
}

/// 取消所有未开始的任务
///
/// 只有仍有未完成工作时才把构建记为已取消。
fn cancel_unstarted(state: &mut RunState) -> Vec<BuildEvent> {
    state.cancel_seen = true;
    state.ready.clear();

    let mut events = Vec::new();
    for record in state.records.iter_mut() {
        if matches!(record.status, TaskStatus::Pending | TaskStatus::Ready) {
            record.skip("cancelled");
            events.push(BuildEvent::TaskFinished {
                task: record.task.clone(),
                status: record.status,
                duration: None,
            });
        }
    }
    state.cancelled = !events.is_empty() || state.running > 0;
    events
}

async fn expire(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
