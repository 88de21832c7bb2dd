// ============================================================================
// Weft - 任务图构建器
// ============================================================================
//
// 文件: src/core/graph.rs
// 职责: 将模块声明转换为有向无环任务图
// 边界:
//   - ✅ 模块级与任务级循环检测（三色 DFS）
//   - ✅ 边推导（任务序列、模块依赖、显式依赖）
//   - ✅ 动作解析（构图时）
//   - ✅ 确定性线性化（Kahn 算法 + 声明顺序决胜）
//   - ✅ 子图选择
//   - ❌ 不应包含任务执行逻辑
//   - ❌ 不应包含缓存判断
//
// 边的含义:
//   A → B 表示 B 必须在 A 开始前完成
//
// 节点顺序:
//   节点按 (模块声明顺序, 模块内任务声明顺序) 插入，
//   因此节点下标即调度器的决胜键
//
// ============================================================================

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::core::action::{ActionRegistry, TaskAction};
use crate::core::error::ConfigurationError;
use crate::core::registry::UnitRegistry;
use crate::models::{Module, TaskId};

/// 任务图节点
#[derive(Clone)]
pub struct TaskNode {
    /// 任务全限定标识
    pub id: TaskId,
    /// 动作键
    pub action_key: String,
    /// 已解析的动作
    pub action: Arc<dyn TaskAction>,
    /// 动作参数
    pub params: BTreeMap<String, Value>,
    /// 输入 glob（相对模块目录）
    pub inputs: Vec<String>,
    /// 输出路径（相对模块目录）
    pub outputs: Vec<String>,
    /// 模块目录（相对工作区根目录）
    pub module_dir: PathBuf,
}

impl fmt::Debug for TaskNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskNode")
            .field("id", &self.id)
            .field("action_key", &self.action_key)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("module_dir", &self.module_dir)
            .finish()
    }
}

/// 有向无环任务图，单次构建内有效
#[derive(Debug, Clone)]
pub struct TaskGraph {
    graph: DiGraph<TaskNode, ()>,
    index: HashMap<TaskId, NodeIndex>,
    /// 模块标识（声明顺序）
    modules: Vec<String>,
    /// 声明的模块依赖 (模块, 依赖)
    module_edges: Vec<(String, String)>,
}

impl TaskGraph {
    fn empty() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            modules: Vec::new(),
            module_edges: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// 全部任务（声明顺序）
    pub fn tasks(&self) -> impl Iterator<Item = &TaskNode> {
        self.graph.node_weights()
    }

    pub fn node(&self, id: &TaskId) -> Option<&TaskNode> {
        self.index.get(id).map(|&i| &self.graph[i])
    }

    /// 按声明位置取节点
    pub fn node_at(&self, position: usize) -> &TaskNode {
        &self.graph[NodeIndex::new(position)]
    }

    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.index.get(id).map(|i| i.index())
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn module_edges(&self) -> &[(String, String)] {
        &self.module_edges
    }

    /// 指定模块的任务（声明顺序）
    pub fn tasks_of<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a TaskNode> + 'a {
        self.tasks().filter(move |node| node.id.module == module)
    }

    /// 任务的直接依赖（声明顺序）
    pub fn dependencies(&self, id: &TaskId) -> Vec<&TaskId> {
        self.position(id)
            .map(|p| {
                self.dependency_positions(p)
                    .into_iter()
                    .map(|d| &self.node_at(d).id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 直接依赖该任务的任务（声明顺序）
    pub fn dependents(&self, id: &TaskId) -> Vec<&TaskId> {
        self.position(id)
            .map(|p| {
                self.dependent_positions(p)
                    .into_iter()
                    .map(|d| &self.node_at(d).id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn dependency_positions(&self, position: usize) -> Vec<usize> {
        self.neighbor_positions(position, Direction::Outgoing)
    }

    pub(crate) fn dependent_positions(&self, position: usize) -> Vec<usize> {
        self.neighbor_positions(position, Direction::Incoming)
    }

    fn neighbor_positions(&self, position: usize, direction: Direction) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(position), direction)
            .map(|n| n.index())
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }

    /// 全部边 (任务, 依赖)，按声明位置排序
    pub fn edges(&self) -> Vec<(&TaskId, &TaskId)> {
        let mut pairs: Vec<(usize, usize)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (a.index(), b.index()))
            .collect();
        pairs.sort_unstable();
        pairs
            .into_iter()
            .map(|(a, b)| (&self.node_at(a).id, &self.node_at(b).id))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// 确定性线性化
    ///
    /// 每一步在所有就绪任务中选声明位置最小者，与单工作线程调度顺序一致。
    pub fn linearize(&self) -> Vec<&TaskId> {
        self.linear_positions()
            .into_iter()
            .map(|p| &self.node_at(p).id)
            .collect()
    }

    pub(crate) fn linear_positions(&self) -> Vec<usize> {
        let count = self.len();
        let mut remaining: Vec<usize> = (0..count)
            .map(|p| self.dependency_positions(p).len())
            .collect();
        let mut ready: BinaryHeap<Reverse<usize>> = remaining
            .iter()
            .enumerate()
            .filter(|(_, &deps)| deps == 0)
            .map(|(p, _)| Reverse(p))
            .collect();

        let mut order = Vec::with_capacity(count);
        while let Some(Reverse(position)) = ready.pop() {
            order.push(position);
            for dependent in self.dependent_positions(position) {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }
        order
    }

    /// 目标任务及其传递依赖组成的子图
    pub fn select(&self, targets: &[TaskId]) -> Result<TaskGraph, ConfigurationError> {
        let mut selected = HashSet::new();
        let mut queue = VecDeque::new();
        for target in targets {
            let position = self
                .position(target)
                .ok_or_else(|| ConfigurationError::UnknownTarget {
                    target: target.to_string(),
                })?;
            if selected.insert(position) {
                queue.push_back(position);
            }
        }
        while let Some(position) = queue.pop_front() {
            for dependency in self.dependency_positions(position) {
                if selected.insert(dependency) {
                    queue.push_back(dependency);
                }
            }
        }

        let mut subset = TaskGraph::empty();
        let mut remap = HashMap::new();
        for position in 0..self.len() {
            if !selected.contains(&position) {
                continue;
            }
            let node = self.node_at(position).clone();
            if !subset.modules.contains(&node.id.module) {
                subset.modules.push(node.id.module.clone());
            }
            let id = node.id.clone();
            let new_index = subset.graph.add_node(node);
            subset.index.insert(id, new_index);
            remap.insert(position, new_index);
        }
        for (&old, &new) in &remap {
            for dependency in self.dependency_positions(old) {
                if let Some(&target) = remap.get(&dependency) {
                    subset.graph.update_edge(new, target, ());
                }
            }
        }
        subset.module_edges = self
            .module_edges
            .iter()
            .filter(|(m, d)| subset.modules.contains(m) && subset.modules.contains(d))
            .cloned()
            .collect();

        Ok(subset)
    }
}

/// 任务图构建器
pub struct GraphBuilder<'a> {
    actions: &'a ActionRegistry,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(actions: &'a ActionRegistry) -> Self {
        Self { actions }
    }

    /// 构建任务图
    ///
    /// 纯函数：同一组模块总是得到相同的节点与边。
    pub fn build(&self, registry: &UnitRegistry) -> Result<TaskGraph, ConfigurationError> {
        check_module_cycles(registry)?;

        let mut task_graph = TaskGraph::empty();

        // 1. 节点：模块声明顺序 × 任务声明顺序
        for module in registry.modules() {
            task_graph.modules.push(module.id.clone());
            let module_dir = PathBuf::from(module.dir());
            for decl in &module.tasks {
                let id = TaskId::new(&module.id, &decl.name);
                let action = self.actions.resolve(&decl.action).ok_or_else(|| {
                    ConfigurationError::UnknownAction {
                        task: id.to_string(),
                        action: decl.action.clone(),
                    }
                })?;

                let node = task_graph.graph.add_node(TaskNode {
                    id: id.clone(),
                    action_key: decl.action.clone(),
                    action,
                    params: decl.params.clone(),
                    inputs: decl.inputs.clone(),
                    outputs: decl.outputs.clone(),
                    module_dir: module_dir.clone(),
                });
                task_graph.index.insert(id, node);
            }
        }

        // 2. 任务序列：后一个任务依赖前一个任务
        for module in registry.modules() {
            for pair in module.tasks.windows(2) {
                let later = task_graph.index[&TaskId::new(&module.id, &pair[1].name)];
                let earlier = task_graph.index[&TaskId::new(&module.id, &pair[0].name)];
                task_graph.graph.update_edge(later, earlier, ());
            }
        }

        // 3. 模块依赖：首个任务依赖被依赖模块的末尾任务
        for module in registry.modules() {
            for dependency in &module.dependencies {
                task_graph
                    .module_edges
                    .push((module.id.clone(), dependency.clone()));

                let Some(first) = module.tasks.first() else {
                    continue;
                };
                let from = task_graph.index[&TaskId::new(&module.id, &first.name)];
                for exit in exit_tasks(registry, dependency) {
                    let to = task_graph.index[&exit];
                    task_graph.graph.update_edge(from, to, ());
                }
            }
        }

        // 4. 显式依赖
        let mut reachable: HashMap<&str, HashSet<String>> = HashMap::new();
        for module in registry.modules() {
            for decl in &module.tasks {
                let id = TaskId::new(&module.id, &decl.name);
                let from = task_graph.index[&id];

                for reference in &decl.depends_on {
                    let target = TaskId::parse(reference, &module.id);
                    let Some(&to) = task_graph.index.get(&target) else {
                        return Err(ConfigurationError::UnknownTask {
                            task: id.to_string(),
                            reference: reference.clone(),
                        });
                    };

                    if target.module != module.id {
                        let visible = reachable
                            .entry(module.id.as_str())
                            .or_insert_with(|| registry.reachable_from(&module.id));
                        if !visible.contains(&target.module) {
                            return Err(ConfigurationError::HiddenDependency {
                                task: id.to_string(),
                                reference: reference.clone(),
                                module: module.id.clone(),
                            });
                        }
                    }

                    task_graph.graph.update_edge(from, to, ());
                }
            }
        }

        check_task_cycles(&task_graph)?;

        debug!(
            modules = task_graph.modules.len(),
            tasks = task_graph.len(),
            edges = task_graph.edge_count(),
            "task graph built"
        );
        Ok(task_graph)
    }
}

/// 模块的出口任务：末尾任务；无任务的模块透传到其依赖的出口任务
fn exit_tasks(registry: &UnitRegistry, module_id: &str) -> Vec<TaskId> {
    let mut exits = Vec::new();
    let mut visited = HashSet::new();
    collect_exits(registry, module_id, &mut visited, &mut exits);
    exits
}

fn collect_exits(
    registry: &UnitRegistry,
    module_id: &str,
    visited: &mut HashSet<String>,
    exits: &mut Vec<TaskId>,
) {
    if !visited.insert(module_id.to_string()) {
        return;
    }
    let Some(module) = registry.get(module_id) else {
        return;
    };
    match module.tasks.last() {
        Some(last) => {
            let id = TaskId::new(&module.id, &last.name);
            if !exits.contains(&id) {
                exits.push(id);
            }
        }
        None => {
            for dependency in &module.dependencies {
                collect_exits(registry, dependency, visited, exits);
            }
        }
    }
}

fn check_module_cycles(registry: &UnitRegistry) -> Result<(), ConfigurationError> {
    let modules: &[Module] = registry.modules();
    let cycle = find_cycle(modules.len(), |position| {
        modules[position]
            .dependencies
            .iter()
            .filter_map(|d| registry.position(d))
            .collect()
    });

    match cycle {
        Some(members) => Err(ConfigurationError::ModuleCycle {
            cycle: members.into_iter().map(|p| modules[p].id.clone()).collect(),
        }),
        None => Ok(()),
    }
}

fn check_task_cycles(task_graph: &TaskGraph) -> Result<(), ConfigurationError> {
    let cycle = find_cycle(task_graph.len(), |position| {
        task_graph.dependency_positions(position)
    });

    match cycle {
        Some(members) => Err(ConfigurationError::TaskCycle {
            cycle: members
                .into_iter()
                .map(|p| task_graph.node_at(p).id.to_string())
                .collect(),
        }),
        None => Ok(()),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

/// 三色 DFS，返回第一个闭合的环
///
/// 从位置 0 开始依次作为根，邻居按给定顺序访问，因此结果稳定。
/// 环从第一个被重新进入的节点开始，到闭合环的节点结束。
fn find_cycle<F>(count: usize, neighbors: F) -> Option<Vec<usize>>
where
    F: Fn(usize) -> Vec<usize>,
{
    let mut color = vec![Color::Unvisited; count];

    for root in 0..count {
        if color[root] != Color::Unvisited {
            continue;
        }
        color[root] = Color::InProgress;
        let mut stack: Vec<(usize, Vec<usize>, usize)> = vec![(root, neighbors(root), 0)];

        while let Some(frame) = stack.last_mut() {
            if frame.2 < frame.1.len() {
                let next = frame.1[frame.2];
                frame.2 += 1;
                match color[next] {
                    Color::Unvisited => {
                        color[next] = Color::InProgress;
                        stack.push((next, neighbors(next), 0));
                    }
                    Color::InProgress => {
                        let start = stack.iter().position(|(node, _, _)| *node == next)?;
                        return Some(stack[start..].iter().map(|(node, _, _)| *node).collect());
                    }
                    Color::Done => {}
                }
            } else {
                color[frame.0] = Color::Done;
                stack.pop();
            }
        }
    }

    None
}
