// ============================================================================
// Weft - 配置数据模型
// ============================================================================
//
// 文件: src/models/config.rs
// 职责: 配置文件数据结构定义和操作
// 边界:
//   - ✅ 配置文件数据结构定义
//   - ✅ 配置序列化/反序列化（TOML / YAML）
//   - ✅ 配置默认值
//   - ✅ 运行时参数合并
//   - ✅ 配置文件读写操作
//   - ❌ 不应包含声明校验逻辑
//   - ❌ 不应包含 CLI 参数解析
//   - ❌ 不应保存构建期间的可变状态
//
// ============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::module::{Module, TaskDecl};
use crate::utils::constants::{
    CONFIG_FILE_NAMES, DEFAULT_CACHE_DIR, DEFAULT_CACHE_HISTORY, DEFAULT_CONFIG_FILE,
};

/// Weft 配置文件结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 工作空间配置
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    /// 执行配置
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// 增量缓存配置
    #[serde(default)]
    pub cache: CacheConfig,
    /// 输出配置
    #[serde(default)]
    pub output: OutputConfig,
    /// 国际化配置
    #[serde(default)]
    pub i18n: I18nConfig,
    /// 模块声明
    #[serde(default)]
    pub modules: Vec<Module>,
}

/// 工作空间配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// 工作区根目录
    #[serde(default = "Config::default_root")]
    pub root: String,
    /// 缓存目录（相对工作区根目录）
    #[serde(default = "Config::default_cache_dir")]
    pub cache_dir: String,
}

/// 执行配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// 工作线程数
    #[serde(default = "Config::default_workers")]
    pub workers: usize,
    /// 单个任务超时时间（秒，0 表示不限制）
    #[serde(default)]
    pub task_timeout: u64,
    /// 失败重试次数
    #[serde(default)]
    pub retry_count: u32,
    /// 失败后是否继续执行无关任务
    #[serde(default)]
    pub continue_on_failure: bool,
    /// 取消后等待运行中任务的宽限时间（秒）
    #[serde(default = "Config::default_grace_period")]
    pub grace_period: u64,
}

/// 增量缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 是否启用
    #[serde(default = "Config::default_cache_enabled")]
    pub enabled: bool,
    /// 每个任务保留的指纹对数量
    #[serde(default = "Config::default_cache_history")]
    pub history: usize,
}

/// 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 是否显示进度条
    #[serde(default = "Config::default_show_progress")]
    pub show_progress: bool,
    /// 是否详细输出
    #[serde(default)]
    pub verbose: bool,
    /// 是否彩色输出
    #[serde(default = "Config::default_colored")]
    pub colored: bool,
}

/// 国际化配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct I18nConfig {
    /// 界面语言
    #[serde(default = "Config::default_language")]
    pub language: String,
}

/// CLI 运行时参数（用于覆盖配置文件）
#[derive(Debug, Clone, Default)]
pub struct RuntimeArgs {
    pub verbose: Option<bool>,
    pub colored: Option<bool>,
    pub show_progress: Option<bool>,
    pub workers: Option<usize>,
    pub task_timeout: Option<u64>,
    pub retry_count: Option<u32>,
    pub continue_on_failure: Option<bool>,
    pub cache_enabled: Option<bool>,
    pub workspace_root: Option<String>,
    pub language: Option<String>,
}

/// 配置默认值 trait
pub trait ConfigDefaults {
    fn default_root() -> String {
        ".".to_string()
    }

    fn default_cache_dir() -> String {
        DEFAULT_CACHE_DIR.to_string()
    }

    fn default_workers() -> usize {
        num_cpus::get()
    }

    fn default_grace_period() -> u64 {
        10
    }

    fn default_cache_enabled() -> bool {
        true
    }

    fn default_cache_history() -> usize {
        DEFAULT_CACHE_HISTORY
    }

    fn default_show_progress() -> bool {
        true
    }

    fn default_colored() -> bool {
        true
    }

    fn default_language() -> String {
        "en_us".to_string()
    }
}

impl ConfigDefaults for Config {}

impl Config {
    /// 从指定文件加载配置，按扩展名选择格式
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?,
        };

        Ok(config)
    }

    /// 在目录中查找配置文件（weft.toml、weft.yaml、weft.yml）
    pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// 加载目录中的配置文件，不存在时使用默认配置
    pub fn discover(dir: &Path) -> Result<Self> {
        let mut config = match Self::find_config_file(dir) {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };

        if config.workspace.root == "." {
            config.workspace.root = dir.to_string_lossy().to_string();
        }
        Ok(config)
    }

    /// 合并运行时参数
    pub fn merge_runtime_args(&mut self, args: RuntimeArgs) {
        if let Some(verbose) = args.verbose {
            self.output.verbose = verbose;
        }
        if let Some(colored) = args.colored {
            self.output.colored = colored;
        }
        if let Some(show_progress) = args.show_progress {
            self.output.show_progress = show_progress;
        }
        if let Some(workers) = args.workers {
            self.execution.workers = workers;
        }
        if let Some(task_timeout) = args.task_timeout {
            self.execution.task_timeout = task_timeout;
        }
        if let Some(retry_count) = args.retry_count {
            self.execution.retry_count = retry_count;
        }
        if let Some(continue_on_failure) = args.continue_on_failure {
            self.execution.continue_on_failure = continue_on_failure;
        }
        if let Some(enabled) = args.cache_enabled {
            self.cache.enabled = enabled;
        }
        if let Some(workspace_root) = args.workspace_root {
            self.workspace.root = workspace_root;
        }
        if let Some(language) = args.language {
            self.i18n.language = language;
        }
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, config_path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// 生成默认配置模板
    pub fn generate_default_template() -> Self {
        let mut config = Self::default();

        config.modules = vec![
            Module::new("core").with_task(
                TaskDecl::new("compile")
                    .with_action("exec")
                    .with_param("command", "cargo")
                    .with_param("args", vec!["build"])
                    .with_input("src/**/*.rs"),
            ),
            Module::new("app").with_dependency("core").with_task(
                TaskDecl::new("test")
                    .with_action("exec")
                    .with_param("command", "cargo")
                    .with_param("args", vec!["test"])
                    .with_input("src/**/*.rs"),
            ),
        ];

        config
    }

    /// 生成默认配置模板并保存到文件
    pub fn create_default_config_file(config_path: &Path) -> Result<()> {
        Self::generate_default_template().save_to_file(config_path)
    }

    /// 默认配置文件路径
    pub fn default_config_path(dir: &Path) -> PathBuf {
        dir.join(DEFAULT_CONFIG_FILE)
    }

    /// 工作区根目录
    pub fn workspace_root(&self) -> PathBuf {
        let root = &self.workspace.root;
        if root == "." {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        } else {
            PathBuf::from(root)
        }
    }

    /// 缓存目录绝对路径
    pub fn cache_dir(&self) -> PathBuf {
        self.workspace_root().join(&self.workspace.cache_dir)
    }

    /// 任务超时时长
    pub fn task_timeout(&self) -> Option<Duration> {
        match self.execution.task_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// 取消宽限时长
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.execution.grace_period)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: WorkspaceConfig::default(),
            execution: ExecutionConfig::default(),
            cache: CacheConfig::default(),
            output: OutputConfig::default(),
            i18n: I18nConfig::default(),
            modules: Vec::new(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: Config::default_root(),
            cache_dir: Config::default_cache_dir(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            workers: Config::default_workers(),
            task_timeout: 0,
            retry_count: 0,
            continue_on_failure: false,
            grace_period: Config::default_grace_period(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: Config::default_cache_enabled(),
            history: Config::default_cache_history(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            show_progress: Config::default_show_progress(),
            verbose: false,
            colored: Config::default_colored(),
        }
    }
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            language: Config::default_language(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_full_toml_config() {
        let src = r#"
            [workspace]
            cache_dir = "build/cache"

            [execution]
            workers = 2
            task_timeout = 30
            continue_on_failure = true

            [cache]
            history = 5

            [[modules]]
            id = "a"

            [[modules.tasks]]
            name = "compile"

            [[modules]]
            id = "b"
            dependencies = ["a"]
        "#;

        let config: Config = toml::from_str(src).unwrap();
        assert_eq!(config.execution.workers, 2);
        assert_eq!(config.task_timeout(), Some(Duration::from_secs(30)));
        assert!(config.execution.continue_on_failure);
        assert_eq!(config.execution.grace_period, 10);
        assert_eq!(config.cache.history, 5);
        assert!(config.cache.enabled);
        assert_eq!(config.workspace.cache_dir, "build/cache");
        assert_eq!(config.modules.len(), 2);
        assert_eq!(config.modules[1].dependencies, vec!["a".to_string()]);
    }

    #[test]
    fn runtime_args_override_file_values() {
        let mut config = Config::default();
        config.merge_runtime_args(RuntimeArgs {
            workers: Some(1),
            continue_on_failure: Some(true),
            cache_enabled: Some(false),
            ..Default::default()
        });

        assert_eq!(config.execution.workers, 1);
        assert!(config.execution.continue_on_failure);
        assert!(!config.cache.enabled);
        assert_eq!(config.task_timeout(), None);
    }

    #[test]
    fn discover_reads_yaml_and_anchors_root() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("weft.yaml"),
            "modules:\n  - id: a\n    tasks:\n      - name: build\n",
        )
        .unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.modules[0].tasks[0].name, "build");
        assert_eq!(config.workspace_root(), dir.path());
    }

    #[test]
    fn template_round_trips_through_file() {
        let dir = TempDir::new().unwrap();
        let path = Config::default_config_path(dir.path());
        Config::create_default_config_file(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.modules.len(), 2);
        assert_eq!(loaded.modules[1].dependencies, vec!["core".to_string()]);
    }
}
