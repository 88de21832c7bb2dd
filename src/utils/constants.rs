// ============================================================================
// Weft - 常量定义
// ============================================================================
//
// 文件: src/utils/constants.rs
// 职责: 应用程序常量定义
// 边界:
//   - ✅ 应用程序常量定义
//   - ✅ 默认文件名与目录
//   - ✅ 像素图标字符定义
//   - ❌ 不应包含动态配置
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

/// 应用名称常量
pub const APP_NAME: &str = "WEFT";

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "weft.toml";

/// 按优先级查找的配置文件名
pub const CONFIG_FILE_NAMES: [&str; 3] = ["weft.toml", "weft.yaml", "weft.yml"];

/// 默认缓存目录（相对工作区根目录）
pub const DEFAULT_CACHE_DIR: &str = ".weft/cache";

/// 缓存日志文件名
pub const CACHE_LOG_FILE: &str = "entries.jsonl";

/// 每个任务默认保留的指纹对数量
pub const DEFAULT_CACHE_HISTORY: usize = 3;

/// 诊断日志过滤环境变量
pub const LOG_ENV: &str = "WEFT_LOG";

/// 像素风格图标
pub mod icons {
    /// 构建图标
    pub const BUILD: &str = "▓";
    /// 成功图标
    pub const SUCCESS: &str = "✓";
    /// 错误图标
    pub const ERROR: &str = "✗";
    /// 警告图标
    pub const WARNING: &str = "!";
    /// 模块图标
    pub const MODULE: &str = "●";
    /// 任务图标
    pub const TASK: &str = "▪";
    /// 依赖图标
    pub const DEPENDENCY: &str = "◦";
    /// 缓存命中图标
    pub const UP_TO_DATE: &str = "≡";
    /// 未执行图标
    pub const NOT_RUN: &str = "·";
    /// 时间图标
    pub const TIME: &str = "⧖";
    /// 箭头图标
    pub const ARROW: &str = "→";
    /// 跳过图标
    pub const SKIP: &str = "○";
    /// 分析图标
    pub const ANALYZE: &str = "◇";
}

/// 进度条字符
pub mod progress_chars {
    /// indicatif 进度字符（已完成、当前、未完成）
    pub const BAR: &str = "█▓░";
}
