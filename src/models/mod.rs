// ============================================================================
// Weft - Models 数据模型模块
// ============================================================================
//
// 文件: src/models/mod.rs
// 职责: 数据模型模块入口和导出
//
// ============================================================================

pub mod config;
pub mod module;
pub mod report;
pub mod task;

pub use config::{Config, RuntimeArgs};
pub use module::{Module, TaskDecl};
pub use report::{BuildResult, BuildStatus, BuildSummary, FailureReason};
pub use task::{ExecutionRecord, TaskId, TaskStatus};
