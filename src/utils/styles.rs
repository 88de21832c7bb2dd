// ============================================================================
// Weft - 文本样式工具
// ============================================================================
//
// 文件: src/utils/styles.rs
// 职责: 终端文本样式格式化
// 边界:
//   - ✅ 文本样式（粗体、下划线）
//   - ✅ 分隔线
//   - ❌ 不应包含颜色相关功能
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

use colored::{ColoredString, Colorize};

/// 标题分隔线
pub const HEAVY_RULE: &str = "═══════════════════════════════════════";

/// 小节分隔线
pub const LIGHT_RULE: &str = "───────────────────────────────────────";

/// 文本样式工具函数
pub struct TextStyles;

impl TextStyles {
    /// 粗体文本
    pub fn bold(text: &str) -> ColoredString {
        text.bold()
    }

    /// 下划线文本
    pub fn underline(text: &str) -> ColoredString {
        text.underline()
    }
}
