// ============================================================================
// Weft - UI 模块
// ============================================================================
//
// 文件: src/ui/mod.rs
// 职责: 终端界面组件入口
// 边界:
//   - ✅ 进度条与结果汇总组件导出
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

pub mod progress;
pub mod summary;
