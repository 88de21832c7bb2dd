// ============================================================================
// Weft - 模块声明数据模型
// ============================================================================
//
// 文件: src/models/module.rs
// 职责: 模块与任务声明的数据结构定义
// 边界:
//   - ✅ 模块声明（标识、依赖、任务序列）
//   - ✅ 任务声明（动作、参数、输入、输出、显式依赖）
//   - ✅ 声明的序列化/反序列化
//   - ❌ 不应包含声明校验逻辑
//   - ❌ 不应包含依赖图构建逻辑
//
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 未指定动作时使用的动作
pub const DEFAULT_ACTION: &str = "noop";

fn default_action() -> String {
    DEFAULT_ACTION.to_string()
}

/// 任务声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDecl {
    /// 模块内唯一的任务名
    pub name: String,
    /// 动作注册表中的键
    #[serde(default = "default_action")]
    pub action: String,
    /// 传给动作的参数
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
    /// 输入文件 glob（相对模块目录）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,
    /// 输出路径（相对模块目录）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    /// 显式任务依赖（`name` 或 `module:name`）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl TaskDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: default_action(),
            params: BTreeMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_input(mut self, pattern: impl Into<String>) -> Self {
        self.inputs.push(pattern.into());
        self
    }

    pub fn with_output(mut self, path: impl Into<String>) -> Self {
        self.outputs.push(path.into());
        self
    }

    pub fn depends_on(mut self, reference: impl Into<String>) -> Self {
        self.depends_on.push(reference.into());
        self
    }
}

/// 模块声明，配置阶段创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// 模块唯一标识
    pub id: String,
    /// 工作目录（相对工作区根目录，默认与标识相同）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// 依赖的模块标识（保持声明顺序）
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// 任务序列（按声明顺序执行）
    #[serde(default)]
    pub tasks: Vec<TaskDecl>,
}

impl Module {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dir: None,
            dependencies: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn with_dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    pub fn with_task(mut self, task: TaskDecl) -> Self {
        self.tasks.push(task);
        self
    }

    /// 模块工作目录
    pub fn dir(&self) -> &str {
        self.dir.as_deref().unwrap_or(&self.id)
    }

    /// 按名称查找任务
    pub fn task(&self, name: &str) -> Option<&TaskDecl> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_declaration_defaults() {
        let toml_src = r#"
            id = "core"
            dependencies = ["base"]

            [[tasks]]
            name = "compile"

            [[tasks]]
            name = "jar"
            action = "write"
            outputs = ["build/core.jar"]
            params = { content = "bytes" }
        "#;

        let module: Module = toml::from_str(toml_src).unwrap();
        assert_eq!(module.dir(), "core");
        assert_eq!(module.dependencies, vec!["base".to_string()]);
        assert_eq!(module.tasks[0].action, DEFAULT_ACTION);
        assert_eq!(module.task("jar").unwrap().outputs, vec!["build/core.jar"]);
        assert_eq!(
            module.task("jar").unwrap().params.get("content"),
            Some(&Value::from("bytes"))
        );
    }
}
