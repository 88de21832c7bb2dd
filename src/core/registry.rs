// ============================================================================
// Weft - 模块注册表
// ============================================================================
//
// 文件: src/core/registry.rs
// 职责: 已声明模块的校验与存储
// 边界:
//   - ✅ 标识格式校验
//   - ✅ 重复模块 / 重复任务检测
//   - ✅ 未知依赖检测
//   - ✅ 依赖闭包（选择目标模块及其传递依赖）
//   - ❌ 不应包含循环检测（由图构建器负责）
//   - ❌ 不应包含任务执行逻辑
//
// ============================================================================

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use crate::core::error::ConfigurationError;
use crate::models::Module;

const MODULE_ID_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_.\-/]*$";
const TASK_NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$";

type CompiledPattern = OnceLock<Result<Regex, regex::Error>>;

static MODULE_ID: CompiledPattern = OnceLock::new();
static TASK_NAME: CompiledPattern = OnceLock::new();

fn compiled<'a>(cell: &'a CompiledPattern, pattern: &str) -> Result<&'a Regex, regex::Error> {
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map_err(Clone::clone)
}

fn check_identifier(
    id: &str,
    cell: &CompiledPattern,
    pattern: &str,
) -> Result<(), ConfigurationError> {
    if id.is_empty() {
        return Err(ConfigurationError::InvalidIdentifier {
            id: id.to_string(),
            reason: "identifier is empty".to_string(),
        });
    }
    let regex = compiled(cell, pattern).map_err(|e| ConfigurationError::InvalidIdentifier {
        id: id.to_string(),
        reason: format!("cannot compile {}: {}", pattern, e),
    })?;
    if !regex.is_match(id) {
        return Err(ConfigurationError::InvalidIdentifier {
            id: id.to_string(),
            reason: format!("must match {}", pattern),
        });
    }
    Ok(())
}

/// 模块注册表，保持声明顺序
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    modules: Vec<Module>,
    index: HashMap<String, usize>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册并完整校验一组模块
    pub fn from_modules<I>(modules: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = Module>,
    {
        let mut registry = Self::new();
        for module in modules {
            registry.register(module)?;
        }
        registry.validate()?;
        Ok(registry)
    }

    /// 注册单个模块
    ///
    /// 依赖可以引用稍后注册的模块，未知依赖在 `validate` 中检查。
    pub fn register(&mut self, module: Module) -> Result<(), ConfigurationError> {
        check_identifier(&module.id, &MODULE_ID, MODULE_ID_PATTERN)?;

        if self.index.contains_key(&module.id) {
            return Err(ConfigurationError::DuplicateModule { module: module.id });
        }

        let mut seen = HashSet::new();
        for task in &module.tasks {
            check_identifier(&task.name, &TASK_NAME, TASK_NAME_PATTERN)?;
            if !seen.insert(task.name.as_str()) {
                return Err(ConfigurationError::DuplicateTask {
                    module: module.id.clone(),
                    task: task.name.clone(),
                });
            }
        }

        self.index.insert(module.id.clone(), self.modules.len());
        self.modules.push(module);
        Ok(())
    }

    /// 检查所有依赖标识都已注册
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for module in &self.modules {
            for dependency in &module.dependencies {
                if !self.index.contains_key(dependency) {
                    return Err(ConfigurationError::UnknownDependency {
                        module: module.id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Module> {
        self.index.get(id).map(|&i| &self.modules[i])
    }

    /// 模块的声明位置
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// 从 `id` 出发可达的全部依赖模块（不含自身，除非存在环）
    pub fn reachable_from(&self, id: &str) -> HashSet<String> {
        let mut visited = HashSet::new();
        let mut stack: Vec<&str> = match self.get(id) {
            Some(module) => module.dependencies.iter().map(String::as_str).collect(),
            None => Vec::new(),
        };

        while let Some(current) = stack.pop() {
            if !visited.insert(current.to_string()) {
                continue;
            }
            if let Some(module) = self.get(current) {
                stack.extend(module.dependencies.iter().map(String::as_str));
            }
        }

        visited
    }

    /// 目标模块及其传递依赖组成的子注册表，保持原声明顺序
    pub fn closure(&self, targets: &[String]) -> Result<UnitRegistry, ConfigurationError> {
        let mut selected = HashSet::new();
        for target in targets {
            if !self.index.contains_key(target) {
                return Err(ConfigurationError::UnknownModule {
                    module: target.clone(),
                });
            }
            selected.insert(target.clone());
            selected.extend(self.reachable_from(target));
        }

        let mut subset = UnitRegistry::new();
        for module in self.modules.iter().filter(|m| selected.contains(&m.id)) {
            subset.index.insert(module.id.clone(), subset.modules.len());
            subset.modules.push(module.clone());
        }
        Ok(subset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskDecl;

    #[test]
    fn rejects_duplicate_modules() {
        let err = UnitRegistry::from_modules(vec![Module::new("a"), Module::new("a")]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateModule {
                module: "a".to_string()
            }
        );
    }

    #[test]
    fn rejects_unknown_dependencies() {
        let err = UnitRegistry::from_modules(vec![
            Module::new("a").with_dependency("b"),
            Module::new("c"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownDependency {
                module: "a".to_string(),
                dependency: "b".to_string()
            }
        );
    }

    #[test]
    fn forward_references_are_allowed() {
        let registry = UnitRegistry::from_modules(vec![
            Module::new("app").with_dependency("core"),
            Module::new("core"),
        ])
        .unwrap();
        assert_eq!(registry.position("core"), Some(1));
    }

    #[test]
    fn rejects_duplicate_tasks_and_bad_names() {
        let dup = Module::new("a")
            .with_task(TaskDecl::new("build"))
            .with_task(TaskDecl::new("build"));
        assert!(matches!(
            UnitRegistry::from_modules(vec![dup]),
            Err(ConfigurationError::DuplicateTask { .. })
        ));

        let bad_task = Module::new("a").with_task(TaskDecl::new("x:y"));
        assert!(matches!(
            UnitRegistry::from_modules(vec![bad_task]),
            Err(ConfigurationError::InvalidIdentifier { .. })
        ));

        assert!(matches!(
            UnitRegistry::from_modules(vec![Module::new("")]),
            Err(ConfigurationError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn broken_identifier_pattern_is_reported_not_panicked() {
        let cell = CompiledPattern::new();
        let err = check_identifier("core", &cell, "[").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidIdentifier { ref id, .. } if id == "core"));
        assert!(check_identifier("core", &MODULE_ID, MODULE_ID_PATTERN).is_ok());
    }

    #[test]
    fn closure_keeps_declaration_order() {
        let registry = UnitRegistry::from_modules(vec![
            Module::new("base"),
            Module::new("other"),
            Module::new("core").with_dependency("base"),
            Module::new("app").with_dependency("core"),
        ])
        .unwrap();

        let subset = registry.closure(&["app".to_string()]).unwrap();
        let ids: Vec<_> = subset.modules().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["base", "core", "app"]);

        assert!(matches!(
            registry.closure(&["nope".to_string()]),
            Err(ConfigurationError::UnknownModule { .. })
        ));
    }
}
