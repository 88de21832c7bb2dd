// ============================================================================
// Weft - CLI Graph 命令
// ============================================================================
//
// 文件: src/cli/graph.rs
// 职责: 任务图查看命令的 CLI 接口层
// 边界:
//   - ✅ 命令行参数定义和解析
//   - ✅ 调用执行器构建任务图（不执行任务）
//   - ✅ 结果格式化输出（表格/JSON）
//   - ❌ 不应包含图构建算法逻辑
//   - ❌ 不应包含配置文件加载逻辑
//
// ============================================================================

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::time::Instant;

use crate::core::{BuildExecutor, TaskGraph};
use crate::models::Config;
use crate::ui::summary::render_configuration_error;
use crate::utils::constants::icons;
use crate::utils::logger::Logger;
use crate::utils::styles::{HEAVY_RULE, LIGHT_RULE};
use crate::{t, tf};

/// 查看任务图
#[derive(Debug, Args)]
pub struct GraphArgs {
    /// 输出格式 (table, json)
    #[arg(short = 'f', long, default_value = "table")]
    pub format: String,

    /// 只显示指定目标及其依赖（模块标识或 `module:task`）
    #[arg(short = 'm', long = "module")]
    pub targets: Vec<String>,
}

/// JSON 输出结构
#[derive(Debug, Serialize)]
pub struct GraphView {
    pub modules: Vec<ModuleView>,
    pub edges: Vec<EdgeView>,
    pub order: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ModuleView {
    pub id: String,
    pub dependencies: Vec<String>,
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
pub struct TaskView {
    pub id: String,
    pub action: String,
    pub depends_on: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeView {
    pub task: String,
    pub depends_on: String,
}

impl From<&TaskGraph> for GraphView {
    fn from(graph: &TaskGraph) -> Self {
        let modules = graph
            .modules()
            .iter()
            .map(|module| ModuleView {
                id: module.clone(),
                dependencies: graph
                    .module_edges()
                    .iter()
                    .filter(|(from, _)| from == module)
                    .map(|(_, to)| to.clone())
                    .collect(),
                tasks: graph
                    .tasks_of(module)
                    .map(|node| TaskView {
                        id: node.id.to_string(),
                        action: node.action_key.clone(),
                        depends_on: graph
                            .dependencies(&node.id)
                            .into_iter()
                            .map(|d| d.to_string())
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        let edges = graph
            .edges()
            .into_iter()
            .map(|(task, dependency)| EdgeView {
                task: task.to_string(),
                depends_on: dependency.to_string(),
            })
            .collect();

        let order = graph.linearize().into_iter().map(|id| id.to_string()).collect();

        Self {
            modules,
            edges,
            order,
        }
    }
}

pub fn handle_graph(args: GraphArgs, config: Config) -> Result<()> {
    let verbose = config.output.verbose;
    let started = Instant::now();

    let executor = BuildExecutor::new(config);
    let graph = match executor.plan(&args.targets) {
        Ok(graph) => graph,
        Err(e) => {
            render_configuration_error(&e);
            return Err(anyhow::Error::new(e).context(t!("run.config_invalid")));
        }
    };

    match args.format.as_str() {
        "json" => {
            let view = GraphView::from(&graph);
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        "table" => print_table_format(&graph, verbose, started.elapsed().as_millis()),
        other => anyhow::bail!(tf!("graph.unknown_format", other)),
    }

    Ok(())
}

fn print_table_format(graph: &TaskGraph, verbose: bool, elapsed_ms: u128) {
    Logger::info(format!("\n{} {}", icons::ANALYZE, t!("graph.title")));
    Logger::info(HEAVY_RULE);

    Logger::info(format!(
        "{} {}",
        icons::MODULE,
        tf!("graph.total_modules", graph.modules().len())
    ));
    Logger::info(format!(
        "{} {}",
        icons::TASK,
        tf!("graph.total_tasks", graph.len())
    ));
    Logger::info(format!(
        "{} {}",
        icons::DEPENDENCY,
        tf!("graph.total_edges", graph.edge_count())
    ));
    Logger::info(format!(
        "{} {}",
        icons::TIME,
        tf!("graph.build_duration", elapsed_ms)
    ));

    Logger::info(format!("\n{} {}", icons::MODULE, t!("graph.modules")));
    Logger::info(LIGHT_RULE);
    for module in graph.modules() {
        let dependencies: Vec<&str> = graph
            .module_edges()
            .iter()
            .filter(|(from, _)| from == module)
            .map(|(_, to)| to.as_str())
            .collect();

        if dependencies.is_empty() {
            Logger::info(format!("{} {}", icons::MODULE, module));
        } else {
            Logger::info(format!(
                "{} {} ({})",
                icons::MODULE,
                module,
                tf!("graph.depends_on", dependencies.join(", "))
            ));
        }

        for node in graph.tasks_of(module) {
            Logger::info(format!("  {} {}", icons::TASK, node.id.name));
            if verbose {
                Logger::info(format!("      {}", tf!("graph.action", &node.action_key)));
                for dependency in graph.dependencies(&node.id) {
                    Logger::info(format!("      {} {}", icons::DEPENDENCY, dependency));
                }
            }
        }
    }

    Logger::info(format!("\n{} {}", icons::ARROW, t!("graph.order")));
    Logger::info(LIGHT_RULE);
    for (index, id) in graph.linearize().into_iter().enumerate() {
        Logger::info(format!("{:>3}. {}", index + 1, id));
    }
}
