// ============================================================================
// Weft - 构建引擎集成测试
// ============================================================================
//
// 文件: tests/engine_tests.rs
// 职责: 通过 BuildExecutor 验证端到端构建行为
// 边界:
//   - ✅ 持久化缓存下的增量构建
//   - ✅ 失败策略与配置错误
//   - ❌ 不测试 CLI 输出
//
// ============================================================================

mod common;

use common::{RecordingAction, TestWorkspace, RECORD};
use weft::core::{BuildRequest, ConfigurationError};
use weft::models::{BuildResult, BuildStatus, Module, TaskDecl, TaskStatus};

async fn build(workspace: &TestWorkspace, action: &RecordingAction) -> BuildResult {
    workspace
        .executor(action)
        .execute(BuildRequest::new())
        .await
        .expect("configuration should be valid")
}

fn task(name: &str) -> TaskDecl {
    TaskDecl::new(name).with_action(RECORD)
}

/// core:compile → core:test → app:bundle，各自声明输入输出
fn two_module_workspace() -> TestWorkspace {
    let workspace = TestWorkspace::new()
        .with_module(
            Module::new("core")
                .with_task(
                    task("compile")
                        .with_input("src/*.rs")
                        .with_output("out/lib.txt"),
                )
                .with_task(task("test").with_input("tests/*.rs")),
        )
        .with_module(
            Module::new("app").with_dependency("core").with_task(
                task("bundle")
                    .with_input("main.txt")
                    .with_output("dist/app.txt"),
            ),
        );
    workspace.write("core/src/lib.rs", "pub fn lib() {}");
    workspace.write("core/tests/it.rs", "#[test] fn it() {}");
    workspace.write("app/main.txt", "main");
    workspace
}

#[tokio::test]
async fn unchanged_workspace_is_up_to_date_on_second_run() {
    let workspace = two_module_workspace();
    let action = RecordingAction::new();

    let first = build(&workspace, &action).await;
    assert_eq!(first.status, BuildStatus::Succeeded);
    assert_eq!(action.runs(), vec!["core:compile", "core:test", "app:bundle"]);

    action.reset();
    let second = build(&workspace, &action).await;
    assert_eq!(second.status, BuildStatus::Succeeded);
    assert_eq!(action.count(), 0);
    assert_eq!(second.summary.up_to_date, 3);
    assert!(second
        .records
        .iter()
        .all(|r| r.status == TaskStatus::UpToDate));
}

#[tokio::test]
async fn changed_input_reruns_only_the_declaring_task() {
    let workspace = two_module_workspace();
    let action = RecordingAction::new();
    build(&workspace, &action).await;

    workspace.write("core/tests/it.rs", "#[test] fn it() { assert!(true) }");
    action.reset();
    let result = build(&workspace, &action).await;

    assert_eq!(action.runs(), vec!["core:test"]);
    assert_eq!(result.status_of("core:test"), Some(TaskStatus::Succeeded));
    assert_eq!(result.status_of("core:compile"), Some(TaskStatus::UpToDate));
    assert_eq!(result.status_of("app:bundle"), Some(TaskStatus::UpToDate));
}

#[tokio::test]
async fn new_input_file_matching_a_glob_invalidates_the_task() {
    let workspace = two_module_workspace();
    let action = RecordingAction::new();
    build(&workspace, &action).await;

    workspace.write("core/src/extra.rs", "pub fn extra() {}");
    action.reset();
    build(&workspace, &action).await;

    assert_eq!(action.runs(), vec!["core:compile"]);
}

#[tokio::test]
async fn deleted_output_forces_reexecution() {
    let workspace = two_module_workspace();
    let action = RecordingAction::new();
    build(&workspace, &action).await;
    assert!(workspace.path("app/dist/app.txt").is_file());

    workspace.remove("app/dist/app.txt");
    action.reset();
    let result = build(&workspace, &action).await;

    assert_eq!(action.runs(), vec!["app:bundle"]);
    assert_eq!(result.status_of("app:bundle"), Some(TaskStatus::Succeeded));
    assert!(workspace.path("app/dist/app.txt").is_file());
}

#[tokio::test]
async fn reverting_an_input_hits_older_cache_entries() {
    let workspace = two_module_workspace();
    let action = RecordingAction::new();
    build(&workspace, &action).await;
    workspace.write("app/main.txt", "feature branch");
    build(&workspace, &action).await;
    workspace.write("app/main.txt", "main");
    action.reset();
    let result = build(&workspace, &action).await;

    assert_eq!(action.count(), 0);
    assert_eq!(result.status_of("app:bundle"), Some(TaskStatus::UpToDate));
}

#[tokio::test]
async fn configuration_errors_prevent_any_execution() {
    let action = RecordingAction::new();
    let workspace = TestWorkspace::new()
        .with_module(Module::new("core").with_task(task("compile")))
        .with_module(
            Module::new("app")
                .with_dependency("core")
                .with_task(task("bundle"))
                .with_task(TaskDecl::new("publish").with_action("upload")),
        );

    let err = workspace
        .executor(&action)
        .execute(BuildRequest::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigurationError::UnknownAction { .. }));
    assert_eq!(action.count(), 0);
}

#[tokio::test]
async fn module_cycles_are_reported_with_their_members() {
    let action = RecordingAction::new();
    let workspace = TestWorkspace::new()
        .with_module(Module::new("a").with_dependency("b").with_task(task("t")))
        .with_module(Module::new("b").with_dependency("a").with_task(task("t")));

    let err = workspace
        .executor(&action)
        .execute(BuildRequest::new())
        .await
        .unwrap_err();

    let cycle = err.cycle().expect("cycle members");
    assert!(cycle.iter().any(|m| m == "a"));
    assert!(cycle.iter().any(|m| m == "b"));
    assert_eq!(action.count(), 0);
}

#[tokio::test]
async fn continue_mode_runs_everything_not_downstream_of_a_failure() {
    let action = RecordingAction::new();
    let workspace = TestWorkspace::new()
        .continue_on_failure()
        .with_workers(1)
        .with_module(Module::new("base").with_task(task("build").with_param("fail", true)))
        .with_module(
            Module::new("lib")
                .with_dependency("base")
                .with_task(task("build")),
        )
        .with_module(Module::new("docs").with_task(task("build")));

    let result = build(&workspace, &action).await;

    assert_eq!(result.status, BuildStatus::Failed);
    assert_eq!(result.status_of("base:build"), Some(TaskStatus::Failed));
    assert_eq!(result.status_of("lib:build"), Some(TaskStatus::Skipped));
    assert_eq!(result.status_of("docs:build"), Some(TaskStatus::Succeeded));
    assert_eq!(action.count_of("lib:build"), 0);

    let failure = result.primary_failure.expect("primary failure");
    assert_eq!(failure.task.to_string(), "base:build");
    assert!(failure.cause.contains("failed on purpose"));
}

#[tokio::test]
async fn failed_tasks_are_not_cached() {
    let action = RecordingAction::new();
    let workspace = TestWorkspace::new()
        .with_module(Module::new("base").with_task(task("build").with_param("fail", true)));

    build(&workspace, &action).await;
    build(&workspace, &action).await;

    assert_eq!(action.count_of("base:build"), 2);
}

#[tokio::test]
async fn targets_limit_the_build_to_their_closure() {
    let workspace = two_module_workspace()
        .with_module(Module::new("docs").with_task(task("build")));
    let action = RecordingAction::new();

    let result = workspace
        .executor(&action)
        .execute(BuildRequest::new().with_targets(["core:compile"]))
        .await
        .unwrap();

    assert_eq!(result.records.len(), 1);
    assert_eq!(action.runs(), vec!["core:compile"]);
}

#[tokio::test]
async fn dry_run_executes_nothing_and_writes_no_cache() {
    let workspace = two_module_workspace();
    let action = RecordingAction::new();

    let result = workspace
        .executor(&action)
        .execute(BuildRequest::new().dry_run(true))
        .await
        .unwrap();

    assert_eq!(result.status, BuildStatus::Succeeded);
    assert_eq!(action.count(), 0);
    assert_eq!(result.summary.skipped, 3);

    let executor = workspace.executor(&action);
    let cache = executor.open_cache().unwrap();
    assert_eq!(cache.status().entries, 0);
}

#[tokio::test]
async fn workspace_path_with_glob_characters_still_tracks_inputs() {
    let workspace = TestWorkspace::with_prefix("proj[1]").with_module(
        Module::new("core").with_task(task("compile").with_input("src/*.rs")),
    );
    workspace.write("core/src/lib.rs", "pub fn lib() {}");
    let action = RecordingAction::new();

    build(&workspace, &action).await;
    workspace.write("core/src/lib.rs", "pub fn lib() -> u8 { 1 }");
    let result = build(&workspace, &action).await;

    assert_eq!(result.status_of("core:compile"), Some(TaskStatus::Succeeded));
    assert_eq!(action.count_of("core:compile"), 2);
}
