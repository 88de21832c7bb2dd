// ============================================================================
// Weft - 中文翻译表
// ============================================================================
//
// 文件: src/i18n/zh_cn.rs
// 职责: 中文翻译内容定义
// 边界:
//   - ✅ 中文翻译字符串定义
//   - ✅ 翻译键值对维护
//   - ❌ 不应包含翻译逻辑
//   - ❌ 不应包含其他语言翻译
//
// ============================================================================

/// 中文翻译表
pub const TRANSLATIONS: &[(&str, &str)] = &[
    // 运行命令
    ("run.start_all", "开始构建 {} 个模块的全部任务..."),
    ("run.start_targets", "开始构建目标: {}"),
    ("run.dry_run", "试运行：仅按顺序列出任务，不执行"),
    ("run.interrupt", "收到中断信号，等待运行中的任务结束..."),
    ("run.config_invalid", "构建配置无效"),
    ("run.failed", "构建失败"),
    ("run.cancelled", "构建已取消"),
    // 任务状态
    ("status.succeeded", "成功"),
    ("status.up_to_date", "最新"),
    ("status.failed", "失败"),
    ("status.skipped", "跳过"),
    ("status.not_run", "未执行"),
    // 构建汇总
    ("summary.title", "构建结果"),
    (
        "summary.counts",
        "总计 {} | 成功 {} | 最新 {} | 失败 {} | 跳过 {} | 未执行 {}",
    ),
    ("summary.wall_time", "总耗时: {}"),
    ("summary.attempts", "尝试次数: {}"),
    ("summary.primary_failure", "首个失败: {} ({})"),
    ("summary.build_succeeded", "构建成功"),
    ("summary.build_failed", "构建失败"),
    ("summary.build_cancelled", "构建已取消"),
    // 进度
    ("progress.task_failed", "{} 失败"),
    ("progress.cancelling", "正在取消..."),
    // 任务图命令
    ("graph.title", "任务图"),
    ("graph.total_modules", "模块数: {}"),
    ("graph.total_tasks", "任务数: {}"),
    ("graph.total_edges", "边数: {}"),
    ("graph.build_duration", "构建耗时 {}ms"),
    ("graph.modules", "模块"),
    ("graph.depends_on", "依赖 {}"),
    ("graph.action", "动作: {}"),
    ("graph.order", "执行顺序"),
    ("graph.unknown_format", "未知输出格式 '{}'，可选 table 或 json"),
    ("graph.cycle_detected", "检测到循环依赖:"),
    // 缓存命令
    ("cache.title", "增量缓存"),
    ("cache.location", "位置: {}"),
    ("cache.tasks", "有缓存的任务: {}"),
    ("cache.entries", "有效条目: {}（每个任务保留 {} 条）"),
    ("cache.log_size", "日志: {} 行, {} 字节"),
    ("cache.corrupt", "已跳过 {} 行损坏的日志"),
    ("cache.cleared", "缓存已清空"),
    ("cache.compacted", "缓存日志已压缩: {} -> {} 行"),
    ("cache.open_failed", "无法打开缓存目录 {}"),
    // 初始化命令
    ("init.start", "正在初始化 Weft 配置..."),
    ("init.config_exists", "配置文件已存在: {}"),
    ("init.use_force_hint", "使用 --force 覆盖已有文件"),
    ("init.config_created", "配置文件已创建: {}"),
    (
        "init.next_steps",
        "编辑 [[modules]] 条目后运行 `weft graph` 检查任务图",
    ),
    ("init.create_failed", "创建配置文件失败: {}"),
    // 错误
    ("error.current_dir", "无法获取当前目录"),
];
