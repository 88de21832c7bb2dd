// ============================================================================
// Weft - 内容指纹
// ============================================================================
//
// 文件: src/core/fingerprint.rs
// 职责: 基于内容的输入/输出指纹计算
// 边界:
//   - ✅ 输入指纹：任务标识、动作、参数、输入文件内容
//   - ✅ 输出指纹：声明的输出文件/目录内容
//   - ✅ 路径按相对形式参与哈希，工作区可整体移动
//   - ❌ 不包含缓存读写
//   - ❌ 不包含调度逻辑
//
// ============================================================================

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::graph::TaskNode;

/// 十六进制 SHA-256 指纹
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 缩短的展示形式
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }

    fn finish(hasher: Sha256) -> Self {
        Self(format!("{:x}", hasher.finalize()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn hash_file(path: &Path) -> io::Result<String> {
    let contents = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(format!("{:x}", hasher.finalize()))
}

fn relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// 展开输入 glob，返回排序后的相对路径 → 文件路径
fn expand_inputs(patterns: &[String], module_dir: &Path) -> io::Result<BTreeMap<String, PathBuf>> {
    let mut files = BTreeMap::new();

    // 模块目录按字面量匹配，只有声明的模式部分是 glob
    let base = PathBuf::from(glob::Pattern::escape(&module_dir.to_string_lossy()));
    for pattern in patterns {
        let full_pattern = base.join(pattern).to_string_lossy().to_string();
        let paths = glob::glob(&full_pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

        for entry in paths {
            let path = entry.map_err(|e| e.into_error())?;
            if path.is_file() {
                files.insert(relative(&path, module_dir), path);
            } else if path.is_dir() {
                for file in WalkDir::new(&path).follow_links(false) {
                    let file = file.map_err(io::Error::other)?;
                    if file.file_type().is_file() {
                        files.insert(relative(file.path(), module_dir), file.into_path());
                    }
                }
            }
        }
    }

    Ok(files)
}

/// 计算任务的输入指纹
pub fn input_fingerprint(node: &TaskNode, module_dir: &Path) -> io::Result<Fingerprint> {
    let mut hasher = Sha256::new();

    hasher.update(node.id.to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(node.action_key.as_bytes());
    hasher.update(b"\0");
    let params = serde_json::to_string(&node.params).map_err(io::Error::other)?;
    hasher.update(params.as_bytes());
    hasher.update(b"\0");

    // 模式本身参与哈希，匹配为空的模式也能区分
    let patterns: BTreeSet<&String> = node.inputs.iter().collect();
    for pattern in patterns {
        hasher.update(pattern.as_bytes());
        hasher.update(b"\n");
    }

    for (path, file) in expand_inputs(&node.inputs, module_dir)? {
        hasher.update(path.as_bytes());
        hasher.update(b"=");
        hasher.update(hash_file(&file)?.as_bytes());
        hasher.update(b"\n");
    }

    Ok(Fingerprint::finish(hasher))
}

/// 计算声明输出的当前指纹
///
/// 缺失的输出以固定标记参与哈希，因此删除输出会改变指纹。
pub fn output_fingerprint(outputs: &[String], module_dir: &Path) -> io::Result<Fingerprint> {
    let mut hasher = Sha256::new();

    for declared in outputs {
        let path = module_dir.join(declared);
        hasher.update(declared.as_bytes());

        if path.is_file() {
            hasher.update(b":f:");
            hasher.update(hash_file(&path)?.as_bytes());
        } else if path.is_dir() {
            hasher.update(b":d:");
            let mut files = BTreeMap::new();
            for entry in WalkDir::new(&path).follow_links(false) {
                let entry = entry.map_err(io::Error::other)?;
                if entry.file_type().is_file() {
                    files.insert(relative(entry.path(), &path), entry.into_path());
                }
            }
            for (rel, file) in files {
                hasher.update(rel.as_bytes());
                hasher.update(b"=");
                hasher.update(hash_file(&file)?.as_bytes());
                hasher.update(b";");
            }
        } else {
            hasher.update(b":missing");
        }
        hasher.update(b"\n");
    }

    Ok(Fingerprint::finish(hasher))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::NoopAction;
    use crate::models::TaskId;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn node(inputs: Vec<&str>) -> TaskNode {
        TaskNode {
            id: TaskId::new("m", "compile"),
            action_key: "noop".to_string(),
            action: Arc::new(NoopAction),
            params: BTreeMap::new(),
            inputs: inputs.into_iter().map(String::from).collect(),
            outputs: Vec::new(),
            module_dir: PathBuf::from("m"),
        }
    }

    #[test]
    fn input_fingerprint_tracks_file_contents() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/a.txt"), "one").unwrap();

        let task = node(vec!["src/*.txt"]);
        let first = input_fingerprint(&task, dir.path()).unwrap();
        let again = input_fingerprint(&task, dir.path()).unwrap();
        assert_eq!(first, again);

        fs::write(dir.path().join("src/a.txt"), "two").unwrap();
        let changed = input_fingerprint(&task, dir.path()).unwrap();
        assert_ne!(first, changed);

        fs::write(dir.path().join("src/b.txt"), "new file").unwrap();
        let added = input_fingerprint(&task, dir.path()).unwrap();
        assert_ne!(changed, added);
    }

    #[test]
    fn module_dir_with_glob_metacharacters_is_matched_literally() {
        let dir = TempDir::new().unwrap();
        let module_dir = dir.path().join("proj[1]");
        fs::create_dir_all(module_dir.join("src")).unwrap();
        fs::write(module_dir.join("src/lib.rs"), "one").unwrap();

        let task = node(vec!["src/*.rs"]);
        let first = input_fingerprint(&task, &module_dir).unwrap();
        assert_ne!(first, input_fingerprint(&node(vec!["src/*.rs"]), dir.path()).unwrap());

        fs::write(module_dir.join("src/lib.rs"), "two").unwrap();
        assert_ne!(first, input_fingerprint(&task, &module_dir).unwrap());
    }

    #[test]
    fn input_fingerprint_includes_params() {
        let dir = TempDir::new().unwrap();
        let plain = node(vec![]);
        let mut with_param = node(vec![]);
        with_param
            .params
            .insert("command".to_string(), serde_json::Value::from("make"));

        assert_ne!(
            input_fingerprint(&plain, dir.path()).unwrap(),
            input_fingerprint(&with_param, dir.path()).unwrap()
        );
    }

    #[test]
    fn output_fingerprint_detects_deleted_outputs() {
        let dir = TempDir::new().unwrap();
        let outputs = vec!["build".to_string(), "report.txt".to_string()];
        fs::create_dir_all(dir.path().join("build/classes")).unwrap();
        fs::write(dir.path().join("build/classes/A.class"), "A").unwrap();
        fs::write(dir.path().join("report.txt"), "ok").unwrap();

        let present = output_fingerprint(&outputs, dir.path()).unwrap();
        assert_eq!(present, output_fingerprint(&outputs, dir.path()).unwrap());

        fs::remove_file(dir.path().join("report.txt")).unwrap();
        assert_ne!(present, output_fingerprint(&outputs, dir.path()).unwrap());
    }

    #[test]
    fn output_fingerprint_is_independent_of_workspace_location() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        for dir in [&first, &second] {
            fs::create_dir_all(dir.path().join("out")).unwrap();
            fs::write(dir.path().join("out/x.bin"), "same").unwrap();
        }

        let outputs = vec!["out".to_string()];
        assert_eq!(
            output_fingerprint(&outputs, first.path()).unwrap(),
            output_fingerprint(&outputs, second.path()).unwrap()
        );
    }
}
