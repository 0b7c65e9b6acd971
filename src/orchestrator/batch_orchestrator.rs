//! 批量条目处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **顺序遍历**：严格按输入顺序逐个处理条目，同一时间只有一个远程操作
//! 2. **结果折叠**：把每个 `ItemOutcome` 折叠进 `RunResult`
//! 3. **进度输出**：每个条目结束后输出百分比
//! 4. **汇总输出**：列表处理完（或中途停止）后写出汇总 JSON
//!
//! 存储错误是致命的：尽量写出已有的汇总结果，然后把错误返回给调用方。

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::fs;
use tracing::{error, info, warn};

use crate::capability::{Downloader, PageAutomation};
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{CacheEntry, ItemKey, WorkItem};
use crate::utils::logging;
use crate::workflow::{ItemCtx, ItemOutcome, ItemProcessor};

/// 一次运行的汇总结果
///
/// `cache_hits` 和 `fetched` 只描述本次运行走了哪条路径，不参与相等比较：
/// 同一输入重复运行得到的结果相等。
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// 条目键 → 缓存条目
    pub entries: BTreeMap<ItemKey, CacheEntry>,
    /// 输入条目总数
    pub total: usize,
    /// 实际处理过的条目数（中途停止时小于 total）
    pub processed: usize,
    pub cache_hits: usize,
    pub fetched: usize,
    /// 条目级失败：详情获取失败，或所有文件都下载失败
    pub failure_count: usize,
    /// 文件级失败
    pub file_failure_count: usize,
    /// 汇总结果中带本地路径的文件数
    pub file_count: usize,
    pub aborted: bool,
}

impl RunResult {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// 折叠一个条目的处理结果
    pub fn absorb(mut self, outcome: ItemOutcome) -> Self {
        self.processed += 1;
        self.file_failure_count += outcome.file_failures();
        if outcome.is_failure() {
            self.failure_count += 1;
        }

        match outcome {
            ItemOutcome::CacheHit { key, entry } => {
                self.cache_hits += 1;
                self.insert(key, entry);
            }
            ItemOutcome::Completed { key, entry, .. } => {
                self.fetched += 1;
                self.insert(key, entry);
            }
            ItemOutcome::FetchFailed { .. } | ItemOutcome::PartialFailure { .. } => {}
        }

        self
    }

    fn insert(&mut self, key: ItemKey, entry: CacheEntry) {
        let files = entry.detail.files.iter().filter(|f| f.local_path.is_some()).count();
        if let Some(previous) = self.entries.insert(key, entry) {
            // 输入里出现重复条目时不重复计数
            self.file_count -= previous
                .detail
                .files
                .iter()
                .filter(|f| f.local_path.is_some())
                .count();
        }
        self.file_count += files;
    }

    /// 成功的条目数
    pub fn succeeded(&self) -> usize {
        self.processed - self.failure_count
    }

    /// 是否完整无误：没有被中止，没有失败的条目，也没有缺失的文件
    pub fn is_complete(&self) -> bool {
        !self.aborted
            && self.processed == self.total
            && self.failure_count == 0
            && self.file_failure_count == 0
    }
}

impl PartialEq for RunResult {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
            && self.total == other.total
            && self.processed == other.processed
            && self.failure_count == other.failure_count
            && self.file_failure_count == other.file_failure_count
            && self.file_count == other.file_count
            && self.aborted == other.aborted
    }
}

/// 进度文本，例如 `66.67% (2/3)`
pub fn progress_line(done: usize, total: usize) -> String {
    let percentage = if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    };
    format!("{:.2}% ({}/{})", percentage, done, total)
}

/// 批量编排器
pub struct BatchOrchestrator {
    processor: ItemProcessor,
    out_file: PathBuf,
    stop: Option<Arc<AtomicBool>>,
}

impl BatchOrchestrator {
    pub fn new(processor: ItemProcessor, out_file: impl Into<PathBuf>) -> Self {
        Self {
            processor,
            out_file: out_file.into(),
            stop: None,
        }
    }

    /// 设置停止标志，只在条目之间检查
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn out_file(&self) -> &Path {
        &self.out_file
    }

    /// 处理全部条目
    pub async fn run<P, D>(
        &self,
        page: &P,
        downloader: &D,
        items: &[WorkItem],
    ) -> ScrapeResult<RunResult>
    where
        P: PageAutomation + ?Sized,
        D: Downloader + ?Sized,
    {
        let total = items.len();
        logging::log_items_loaded(total);

        let mut result = RunResult::new(total);

        for (index, item) in items.iter().enumerate() {
            if self.stop_requested() {
                warn!("⏹️ 收到停止请求，剩余 {} 个条目留待下次运行", total - index);
                result.aborted = true;
                break;
            }

            let ctx = ItemCtx::new(index + 1, total, item.key());
            logging::log_item_start(&ctx);

            let outcome = match self.processor.process(page, downloader, item, &ctx).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("{} 💥 存储错误，运行中止: {}", ctx, e);
                    result.aborted = true;
                    if let Err(write_err) = self.write_output(&result).await {
                        error!("汇总结果也无法写出: {}", write_err);
                    }
                    return Err(e);
                }
            };

            result = result.absorb(outcome);
            info!("{}", progress_line(index + 1, total));
        }

        info!("📝 正在生成汇总文件 {} ...", self.out_file.display());
        self.write_output(&result).await?;

        logging::print_final_stats(&result, &self.out_file);

        Ok(result)
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// 写出汇总文件：条目键 → 缓存条目
    async fn write_output(&self, result: &RunResult) -> ScrapeResult<()> {
        if let Some(parent) = self.out_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ScrapeError::storage_write(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&result.entries).map_err(|e| {
            ScrapeError::storage_write(
                &self.out_file,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;

        fs::write(&self.out_file, json)
            .await
            .map_err(|e| ScrapeError::storage_write(&self.out_file, e))
    }
}
