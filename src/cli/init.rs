// ============================================================================
// Weft - 初始化命令处理
// ============================================================================
//
// 文件: src/cli/init.rs
// 职责: 处理配置文件初始化命令
// 边界:
//   - ✅ 初始化命令参数解析
//   - ✅ 默认配置文件生成
//   - ✅ 配置文件存在性检查
//   - ❌ 不应包含配置文件格式定义
//   - ❌ 不应包含配置验证逻辑
//
// ============================================================================

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use crate::models::config::Config;
use crate::utils::logger::Logger;
use crate::{t, tf};

/// 初始化命令参数
#[derive(Debug, Args)]
pub struct InitArgs {
    /// 配置文件路径（默认为工作区根目录下的 weft.toml）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 强制覆盖已存在的配置文件
    #[arg(short, long)]
    pub force: bool,
}

/// 处理初始化命令
pub fn handle_init(args: InitArgs, workspace_dir: &Path) -> Result<()> {
    Logger::info(t!("init.start"));

    let config_path = args
        .config
        .unwrap_or_else(|| Config::default_config_path(workspace_dir));

    // 检查配置文件是否已存在
    if config_path.exists() && !args.force {
        Logger::warn(tf!("init.config_exists", config_path.display()));
        Logger::info(t!("init.use_force_hint"));
        return Ok(());
    }

    match Config::create_default_config_file(&config_path) {
        Ok(_) => {
            Logger::success(tf!("init.config_created", config_path.display()));
            Logger::info(t!("init.next_steps"));
        }
        Err(e) => {
            Logger::error(tf!("init.create_failed", e));
            return Err(e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_writes_template_and_respects_existing_file() {
        let dir = TempDir::new().unwrap();
        let args = InitArgs {
            config: None,
            force: false,
        };
        handle_init(args, dir.path()).unwrap();

        let path = dir.path().join("weft.toml");
        let written = Config::load(&path).unwrap();
        assert_eq!(written.modules.len(), 2);

        std::fs::write(&path, "# custom").unwrap();
        handle_init(
            InitArgs {
                config: None,
                force: false,
            },
            dir.path(),
        )
        .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# custom");

        handle_init(
            InitArgs {
                config: None,
                force: true,
            },
            dir.path(),
        )
        .unwrap();
        assert_ne!(std::fs::read_to_string(&path).unwrap(), "# custom");
    }
}
