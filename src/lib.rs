// ============================================================================
// Weft - 库入口
// ============================================================================
//
// 文件: src/lib.rs
// 职责: 任务图构建引擎的公共接口
// 边界:
//   - ✅ 子模块声明
//   - ✅ 常用类型重新导出
//   - ❌ 不应包含具体实现
//
// ============================================================================

pub mod cli;
pub mod core;
pub mod i18n;
pub mod models;
pub mod ui;
pub mod utils;

pub use crate::core::{
    ActionContext, ActionRegistry, BuildExecutor, BuildRequest, ConfigurationError,
    ExecutionContext, ExecutionOptions, FailureMode, GraphBuilder, IncrementalCache, Scheduler,
    TaskAction, TaskExecutionError, TaskGraph, UnitRegistry,
};
pub use crate::models::{
    BuildResult, BuildStatus, BuildSummary, Config, ExecutionRecord, Module, TaskDecl, TaskId,
    TaskStatus,
};
