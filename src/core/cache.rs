// ============================================================================
// Weft - 增量缓存
// ============================================================================
//
// 文件: src/core/cache.rs
// 职责: (任务, 输入指纹) → 输出指纹 的持久化缓存
// 边界:
//   - ✅ 查询与记录
//   - ✅ 每个任务保留最近 N 对指纹，最旧的先淘汰
//   - ✅ JSON Lines 追加日志持久化，重放时后写覆盖先写
//   - ✅ 损坏的记录按未命中处理（fail open）
//   - ✅ 日志压缩、状态统计、清空
//   - ❌ 不包含指纹计算
//   - ❌ 不包含调度逻辑
//
// 存储格式:
//   <cache_dir>/entries.jsonl，每行一个 CacheEntry
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::core::error::CacheError;
use crate::core::fingerprint::Fingerprint;
use crate::utils::constants::CACHE_LOG_FILE;

/// 日志行数超过存活条目数的倍数时触发压缩
const COMPACT_RATIO: usize = 2;

/// 触发自动压缩的最小日志行数
const COMPACT_MIN_LINES: usize = 64;

/// 缓存条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// 任务全限定标识
    pub task: String,
    /// 输入指纹
    pub input: Fingerprint,
    /// 输出指纹
    pub output: Fingerprint,
}

/// 缓存统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatus {
    /// 有条目的任务数
    pub tasks: usize,
    /// 存活条目数
    pub entries: usize,
    /// 日志文件行数
    pub log_lines: usize,
    /// 日志文件字节数
    pub log_bytes: u64,
    /// 打开时跳过的损坏行数
    pub corrupt_lines: usize,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, VecDeque<CacheEntry>>,
    log_lines: usize,
    corrupt_lines: usize,
    /// 日志末尾缺少换行（上次写入被截断）
    torn_tail: bool,
    writer: Option<File>,
}

impl CacheState {
    /// 插入条目：相同键后写覆盖先写，超出上限时淘汰最旧条目
    fn insert(&mut self, entry: CacheEntry, history: usize) {
        let slot = self.entries.entry(entry.task.clone()).or_default();
        slot.retain(|e| e.input != entry.input);
        slot.push_back(entry);
        while slot.len() > history {
            slot.pop_front();
        }
    }

    fn live_entries(&self) -> usize {
        self.entries.values().map(VecDeque::len).sum()
    }
}

/// 增量缓存
#[derive(Debug)]
pub struct IncrementalCache {
    /// 日志文件路径，None 表示仅内存
    log_path: Option<PathBuf>,
    /// 每个任务保留的条目数
    history: usize,
    state: Mutex<CacheState>,
}

impl IncrementalCache {
    /// 仅内存缓存
    pub fn in_memory(history: usize) -> Self {
        Self {
            log_path: None,
            history: history.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// 打开缓存目录并重放日志
    pub fn open(cache_dir: &Path, history: usize) -> Result<Self, CacheError> {
        fs::create_dir_all(cache_dir)?;
        let log_path = cache_dir.join(CACHE_LOG_FILE);
        let history = history.max(1);
        let mut state = CacheState::default();

        if log_path.exists() {
            let contents = fs::read(&log_path)?;
            state.torn_tail = contents.last().is_some_and(|b| *b != b'\n');

            // 按字节切分，单行损坏（包括非 UTF-8）不影响其余条目
            for (index, line) in contents.split(|b| *b == b'\n').enumerate() {
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                state.log_lines += 1;

                match serde_json::from_slice::<CacheEntry>(line) {
                    Ok(entry) => state.insert(entry, history),
                    Err(e) => {
                        let err = CacheError::Corruption {
                            line: index + 1,
                            reason: e.to_string(),
                        };
                        warn!(error = %err, "skipping corrupt cache entry");
                        state.corrupt_lines += 1;
                    }
                }
            }
        }

        debug!(
            path = %log_path.display(),
            entries = state.live_entries(),
            corrupt = state.corrupt_lines,
            "cache opened"
        );

        Ok(Self {
            log_path: Some(log_path),
            history,
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// 每个任务保留的条目数
    pub fn history(&self) -> usize {
        self.history
    }

    /// 查询输出指纹
    pub fn lookup(&self, task: &str, input: &Fingerprint) -> Option<Fingerprint> {
        self.lock()
            .entries
            .get(task)
            .and_then(|slot| slot.iter().rev().find(|e| &e.input == input))
            .map(|e| e.output.clone())
    }

    /// 记录一次成功执行
    pub fn record(
        &self,
        task: &str,
        input: Fingerprint,
        output: Fingerprint,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            task: task.to_string(),
            input,
            output,
        };
        let mut state = self.lock();

        if let Some(path) = &self.log_path {
            let line = serde_json::to_string(&entry)?;
            if state.writer.is_none() {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                state.writer = Some(file);
            }
            let torn_tail = std::mem::take(&mut state.torn_tail);
            if let Some(writer) = state.writer.as_mut() {
                if torn_tail {
                    writeln!(writer)?;
                }
                writeln!(writer, "{}", line)?;
                writer.flush()?;
            }
            state.log_lines += 1;
        }

        state.insert(entry, self.history);
        Ok(())
    }

    /// 在阻塞线程池中记录，供异步调用方使用
    pub async fn record_async(
        self: Arc<Self>,
        task: String,
        input: Fingerprint,
        output: Fingerprint,
    ) -> Result<(), CacheError> {
        tokio::task::spawn_blocking(move || self.record(&task, input, output))
            .await
            .map_err(io::Error::other)?
    }

    /// 任务的全部条目（从旧到新）
    pub fn entries_for(&self, task: &str) -> Vec<CacheEntry> {
        self.lock()
            .entries
            .get(task)
            .map(|slot| slot.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 用存活条目重写日志
    pub fn compact(&self) -> Result<(), CacheError> {
        let Some(path) = &self.log_path else {
            return Ok(());
        };
        let mut state = self.lock();

        let mut tasks: Vec<&String> = state.entries.keys().collect();
        tasks.sort();

        let tmp_path = path.with_extension("jsonl.tmp");
        let mut lines = 0;
        {
            let mut tmp = File::create(&tmp_path)?;
            for task in tasks {
                for entry in &state.entries[task] {
                    writeln!(tmp, "{}", serde_json::to_string(entry)?)?;
                    lines += 1;
                }
            }
            tmp.flush()?;
        }

        state.writer = None;
        fs::rename(&tmp_path, path)?;
        state.torn_tail = false;
        state.log_lines = lines;

        info!(entries = lines, "cache log compacted");
        Ok(())
    }

    /// 日志明显膨胀时压缩
    pub fn maybe_compact(&self) -> Result<bool, CacheError> {
        let needs_compaction = {
            let state = self.lock();
            state.log_lines >= COMPACT_MIN_LINES
                && state.log_lines > state.live_entries() * COMPACT_RATIO
        };
        if needs_compaction {
            self.compact()?;
        }
        Ok(needs_compaction)
    }

    /// 在阻塞线程池中按需压缩
    pub async fn maybe_compact_async(self: Arc<Self>) -> Result<bool, CacheError> {
        tokio::task::spawn_blocking(move || self.maybe_compact())
            .await
            .map_err(io::Error::other)?
    }

    /// 缓存统计
    pub fn status(&self) -> CacheStatus {
        let state = self.lock();
        let log_bytes = self
            .log_path
            .as_ref()
            .and_then(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        CacheStatus {
            tasks: state.entries.len(),
            entries: state.live_entries(),
            log_lines: state.log_lines,
            log_bytes,
            corrupt_lines: state.corrupt_lines,
        }
    }

    /// 清空缓存及日志
    pub fn clear(&self) -> Result<(), CacheError> {
        let mut state = self.lock();
        state.entries.clear();
        state.writer = None;
        state.log_lines = 0;
        state.corrupt_lines = 0;
        state.torn_tail = false;

        if let Some(path) = &self.log_path {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
