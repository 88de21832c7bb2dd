// ============================================================================
// Weft - Core 核心模块
// ============================================================================
//
// 文件: src/core/mod.rs
// 职责: 任务图引擎子模块入口和导出
// 边界:
//   - ✅ 核心子模块导出
//   - ✅ 常用类型重新导出
//   - ❌ 不应包含具体业务实现
//   - ❌ 不应包含 CLI 相关逻辑
//   - ❌ 不应包含 UI 相关逻辑
//
// ============================================================================

pub mod action;
pub mod cache;
pub mod context;
pub mod error;
pub mod executor;
pub mod fingerprint;
pub mod graph;
pub mod registry;
pub mod reporter;
pub mod scheduler;

// 重新导出常用类型
pub use action::{ActionContext, ActionRegistry, TaskAction};
pub use cache::{CacheEntry, CacheStatus, IncrementalCache};
pub use context::{ExecutionContext, ExecutionOptions, FailureMode};
pub use error::{CacheError, ConfigurationError, TaskExecutionError};
pub use executor::{BuildExecutor, BuildRequest};
pub use fingerprint::Fingerprint;
pub use graph::{GraphBuilder, TaskGraph, TaskNode};
pub use registry::UnitRegistry;
pub use reporter::{BuildEvent, BuildObserver, CollectingObserver, ExecutionReporter, TracingObserver};
pub use scheduler::Scheduler;
