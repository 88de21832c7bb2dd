// ============================================================================
// Weft - 构建结果汇总组件
// ============================================================================
//
// 文件: src/ui/summary.rs
// 职责: 构建结果与配置错误的终端显示
// 边界:
//   - ✅ 每个任务的终态列表（Pending 显示为未执行）
//   - ✅ 统计信息格式化输出
//   - ✅ 循环依赖成员显示
//   - ✅ 国际化文本支持
//   - ❌ 不应包含统计计算逻辑
//   - ❌ 不应包含任务执行逻辑
//
// ============================================================================

use std::time::Duration;

use crate::core::ConfigurationError;
use crate::models::{BuildResult, BuildStatus, ExecutionRecord, TaskStatus};
use crate::utils::colors::Colors;
use crate::utils::constants::icons;
use crate::utils::logger::Logger;
use crate::utils::styles::{TextStyles, HEAVY_RULE, LIGHT_RULE};
use crate::{t, tf};

/// 状态对应的图标与文本
pub fn status_label(status: TaskStatus) -> (&'static str, String) {
    match status {
        TaskStatus::Succeeded => (icons::SUCCESS, t!("status.succeeded")),
        TaskStatus::UpToDate => (icons::UP_TO_DATE, t!("status.up_to_date")),
        TaskStatus::Failed => (icons::ERROR, t!("status.failed")),
        TaskStatus::Skipped => (icons::SKIP, t!("status.skipped")),
        TaskStatus::Pending | TaskStatus::Ready | TaskStatus::Running => {
            (icons::NOT_RUN, t!("status.not_run"))
        }
    }
}

fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

fn render_record(record: &ExecutionRecord, width: usize, verbose: bool) {
    let (icon, label) = status_label(record.status);
    let name = record.task.to_string();
    let timing = record
        .duration()
        .filter(|_| record.status != TaskStatus::Skipped)
        .map(format_duration)
        .unwrap_or_default();

    Logger::info(format!(
        "  {} {:<width$} {} {}",
        Colors::status(record.status, icon),
        name,
        Colors::status(record.status, &label),
        Colors::dim(&timing),
        width = width
    ));

    if let Some(cause) = &record.failure {
        Logger::info(format!("      {}", Colors::error(cause)));
    }
    if verbose {
        if let Some(reason) = &record.skip_reason {
            Logger::info(format!("      {}", Colors::dim(reason)));
        }
        if record.attempts > 1 {
            Logger::info(format!("      {}", tf!("summary.attempts", record.attempts)));
        }
    }
}

/// 显示构建结果
pub fn render_build_result(result: &BuildResult, verbose: bool) {
    Logger::info(format!("\n{} {}", icons::BUILD, TextStyles::bold(&t!("summary.title"))));
    Logger::info(HEAVY_RULE);

    let width = result
        .records
        .iter()
        .map(|r| r.task.to_string().len())
        .max()
        .unwrap_or(0);
    for record in &result.records {
        render_record(record, width, verbose);
    }

    let summary = &result.summary;
    Logger::info(LIGHT_RULE);
    Logger::info(tf!(
        "summary.counts",
        summary.total,
        summary.succeeded,
        summary.up_to_date,
        summary.failed,
        summary.skipped,
        summary.not_run
    ));
    Logger::info(format!(
        "{} {}",
        icons::TIME,
        tf!("summary.wall_time", format_duration(summary.wall_time))
    ));

    if let Some(failure) = &result.primary_failure {
        Logger::error(tf!("summary.primary_failure", failure.task, failure.cause));
    }

    match result.status {
        BuildStatus::Succeeded => Logger::success(t!("summary.build_succeeded")),
        BuildStatus::Failed => Logger::error(t!("summary.build_failed")),
        BuildStatus::Cancelled => Logger::warn(t!("summary.build_cancelled")),
    }
}

/// 显示配置错误（循环依赖时列出环上的成员）
pub fn render_configuration_error(error: &ConfigurationError) {
    let Some(cycle) = error.cycle() else {
        return;
    };

    Logger::error(format!("{} {}", icons::ERROR, t!("graph.cycle_detected")));
    for (index, member) in cycle.iter().enumerate() {
        Logger::error(format!("  {}. {}", index + 1, member));
    }
    if let Some(first) = cycle.first() {
        Logger::error(format!("  {} {}", icons::ARROW, first));
    }
}
