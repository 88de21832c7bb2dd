// ============================================================================
// Weft - 构建进度组件
// ============================================================================
//
// 文件: src/ui/progress.rs
// 职责: 基于 indicatif 的构建进度条
// 边界:
//   - ✅ 监听构建事件并更新进度
//   - ✅ 失败任务即时提示
//   - ❌ 不应包含任务执行逻辑
//   - ❌ 不应判断终端类型（由调用方决定是否启用）
//
// ============================================================================

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::core::{BuildEvent, BuildObserver};
use crate::models::TaskStatus;
use crate::utils::colors::Colors;
use crate::utils::constants::{icons, progress_chars};
use crate::{t, tf};

const TEMPLATE: &str = "{spinner:.cyan} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} {wide_msg}";

/// 进度条观察者
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new() -> Self {
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars(progress_chars::BAR);
        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// 结束并清除进度条
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildObserver for ProgressObserver {
    fn on_event(&self, event: &BuildEvent) {
        match event {
            BuildEvent::Planned { total } => self.bar.set_length(*total as u64),
            BuildEvent::TaskStarted { task } => self.bar.set_message(task.to_string()),
            BuildEvent::TaskFinished { task, status, .. } => {
                self.bar.inc(1);
                if *status == TaskStatus::Failed {
                    self.bar.println(format!(
                        "{} {}",
                        Colors::error(icons::ERROR),
                        tf!("progress.task_failed", task)
                    ));
                }
            }
            BuildEvent::Cancelled => self.bar.set_message(t!("progress.cancelling")),
        }
    }
}
