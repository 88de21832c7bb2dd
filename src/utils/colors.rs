// ============================================================================
// Weft - 颜色工具
// ============================================================================
//
// 文件: src/utils/colors.rs
// 职责: 终端颜色输出和主题管理
// 边界:
//   - ✅ 日志级别颜色主题
//   - ✅ 任务状态颜色
//   - ✅ 全局开关（--no-color）
//   - ❌ 不应包含业务逻辑
//   - ❌ 不应包含 UI 组件实现
//
// ============================================================================

use colored::{ColoredString, Colorize};

use crate::models::TaskStatus;

/// 颜色工具函数
pub struct Colors;

impl Colors {
    /// 全局启用或禁用颜色输出
    pub fn set_enabled(enabled: bool) {
        if enabled {
            colored::control::unset_override();
        } else {
            colored::control::set_override(false);
        }
    }

    /// 信息颜色
    pub fn info(text: &str) -> ColoredString {
        text.cyan()
    }

    /// 警告颜色
    pub fn warn(text: &str) -> ColoredString {
        text.yellow()
    }

    /// 错误颜色
    pub fn error(text: &str) -> ColoredString {
        text.red()
    }

    /// 成功颜色
    pub fn success(text: &str) -> ColoredString {
        text.green()
    }

    /// 次要信息颜色
    pub fn dim(text: &str) -> ColoredString {
        text.bright_black()
    }

    /// 按任务状态着色
    pub fn status(status: TaskStatus, text: &str) -> ColoredString {
        match status {
            TaskStatus::Succeeded => text.green(),
            TaskStatus::UpToDate => text.blue(),
            TaskStatus::Failed => text.red(),
            TaskStatus::Skipped => text.yellow(),
            TaskStatus::Pending | TaskStatus::Ready | TaskStatus::Running => text.bright_black(),
        }
    }
}
