// ============================================================================
// Weft - English Translation Table
// ============================================================================
//
// 文件: src/i18n/en_us.rs
// 职责: English translation content definition
// 边界:
//   - ✅ English translation strings definition
//   - ✅ Translation key-value pairs maintenance
//   - ❌ Should not contain translation logic
//   - ❌ Should not contain other language translations
//
// ============================================================================

/// English translation table
pub const TRANSLATIONS: &[(&str, &str)] = &[
    // Run command
    ("run.start_all", "Building all tasks of {} modules..."),
    ("run.start_targets", "Building targets: {}"),
    ("run.dry_run", "Dry run: tasks are listed in order but not executed"),
    ("run.interrupt", "Interrupt received, stopping after running tasks..."),
    ("run.config_invalid", "Invalid build configuration"),
    ("run.failed", "Build failed"),
    ("run.cancelled", "Build cancelled"),
    // Task states
    ("status.succeeded", "succeeded"),
    ("status.up_to_date", "up-to-date"),
    ("status.failed", "failed"),
    ("status.skipped", "skipped"),
    ("status.not_run", "not run"),
    // Build summary
    ("summary.title", "Build Result"),
    (
        "summary.counts",
        "Total {} | succeeded {} | up-to-date {} | failed {} | skipped {} | not run {}",
    ),
    ("summary.wall_time", "Wall time: {}"),
    ("summary.attempts", "attempts: {}"),
    ("summary.primary_failure", "First failure: {} ({})"),
    ("summary.build_succeeded", "Build succeeded"),
    ("summary.build_failed", "Build failed"),
    ("summary.build_cancelled", "Build cancelled"),
    // Progress
    ("progress.task_failed", "{} failed"),
    ("progress.cancelling", "cancelling..."),
    // Graph command
    ("graph.title", "Task Graph"),
    ("graph.total_modules", "Modules: {}"),
    ("graph.total_tasks", "Tasks: {}"),
    ("graph.total_edges", "Edges: {}"),
    ("graph.build_duration", "Built in {}ms"),
    ("graph.modules", "Modules"),
    ("graph.depends_on", "depends on {}"),
    ("graph.action", "action: {}"),
    ("graph.order", "Execution order"),
    ("graph.unknown_format", "Unknown output format '{}', expected table or json"),
    ("graph.cycle_detected", "Dependency cycle detected:"),
    // Cache command
    ("cache.title", "Incremental Cache"),
    ("cache.location", "Location: {}"),
    ("cache.tasks", "Tasks with entries: {}"),
    ("cache.entries", "Live entries: {} (keeping {} per task)"),
    ("cache.log_size", "Log: {} lines, {} bytes"),
    ("cache.corrupt", "{} corrupt log lines were skipped"),
    ("cache.cleared", "Cache cleared"),
    ("cache.compacted", "Cache log compacted: {} -> {} lines"),
    ("cache.open_failed", "Failed to open cache at {}"),
    // Init command
    ("init.start", "Initializing Weft configuration..."),
    ("init.config_exists", "Configuration file already exists: {}"),
    ("init.use_force_hint", "Use --force to overwrite the existing file"),
    ("init.config_created", "Configuration file created: {}"),
    (
        "init.next_steps",
        "Edit the [[modules]] entries, then run `weft graph` to check the task graph",
    ),
    ("init.create_failed", "Failed to create configuration file: {}"),
    // Errors
    ("error.current_dir", "Cannot determine the current directory"),
];
