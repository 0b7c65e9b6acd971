//! 条目处理流程 - 流程层
//!
//! 核心职责：定义"一个条目"的完整处理流程
//!
//! 流程顺序：
//! 1. 查缓存 → 命中则直接返回
//! 2. 获取详情 → 失败则记录并返回（不写缓存，下次重试）
//! 3. 逐个确保文件在本地 → 单个文件失败不影响其余文件
//! 4. 合并条目与详情 → 写缓存
//!
//! 存储错误通过 `Err` 返回，其余失败都体现在 `ItemOutcome` 里。

use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::capability::{Downloader, PageAutomation};
use crate::config::Config;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{CacheEntry, FileDescriptor, ItemKey, WorkItem};
use crate::services::{CacheStore, DetailFetcher, FileVault};
use crate::utils::logging::truncate_text;
use crate::workflow::item_ctx::ItemCtx;

/// 单个条目的处理结果
#[derive(Debug)]
pub enum ItemOutcome {
    /// 缓存命中，没有任何远程调用
    CacheHit { key: ItemKey, entry: CacheEntry },
    /// 获取详情并写入缓存（可能有部分文件失败）
    Completed {
        key: ItemKey,
        entry: CacheEntry,
        file_failures: usize,
    },
    /// 获取详情失败，未写缓存
    FetchFailed {
        key: Option<ItemKey>,
        error: ScrapeError,
    },
    /// 所有文件都下载失败，未写缓存
    PartialFailure { key: ItemKey, file_failures: usize },
}

impl ItemOutcome {
    /// 写入结果映射的条目
    pub fn entry(&self) -> Option<(&ItemKey, &CacheEntry)> {
        match self {
            ItemOutcome::CacheHit { key, entry } | ItemOutcome::Completed { key, entry, .. } => {
                Some((key, entry))
            }
            _ => None,
        }
    }

    /// 是否算作条目级失败
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ItemOutcome::FetchFailed { .. } | ItemOutcome::PartialFailure { .. }
        )
    }

    pub fn file_failures(&self) -> usize {
        match self {
            ItemOutcome::Completed { file_failures, .. }
            | ItemOutcome::PartialFailure { file_failures, .. } => *file_failures,
            _ => 0,
        }
    }
}

/// 条目处理器
///
/// - 持有缓存存储和文件库
/// - 不持有页面会话，会话由调用方按次传入
pub struct ItemProcessor {
    cache: CacheStore,
    vault: FileVault,
    fetcher: DetailFetcher,
}

impl ItemProcessor {
    pub fn new(config: &Config) -> Self {
        Self::with_stores(
            CacheStore::new(&config.data_cache_dir),
            FileVault::new(&config.file_cache_dir),
        )
    }

    pub fn with_stores(cache: CacheStore, vault: FileVault) -> Self {
        Self {
            cache,
            vault,
            fetcher: DetailFetcher::new(),
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub async fn process<P, D>(
        &self,
        page: &P,
        downloader: &D,
        item: &WorkItem,
        ctx: &ItemCtx,
    ) -> ScrapeResult<ItemOutcome>
    where
        P: PageAutomation + ?Sized,
        D: Downloader + ?Sized,
    {
        let Some(key) = ctx.key.clone() else {
            let error = ScrapeError::remote_fetch_failed(ctx.key_str(), "无法从条目推导键");
            log_item_failure(ctx, item, &error);
            return Ok(ItemOutcome::FetchFailed { key: None, error });
        };

        // ========== 1. 缓存 ==========
        if self.cache.has(&key).await {
            info!(
                "[条目 {}] 跳过，缓存已存在: {}",
                ctx.item_index,
                self.cache.path_for(&key).display()
            );
            let entry = self.cache.read(&key).await?;
            return Ok(ItemOutcome::CacheHit { key, entry });
        }

        // ========== 2. 详情 ==========
        info!(
            "[条目 {}] 🔍 获取详情: {}",
            ctx.item_index,
            truncate_text(item.label(), 80)
        );
        let mut detail = match self.fetcher.fetch(page, &key, item).await {
            Ok(detail) => detail,
            Err(error) => {
                log_item_failure(ctx, item, &error);
                return Ok(ItemOutcome::FetchFailed {
                    key: Some(key),
                    error,
                });
            }
        };

        // ========== 3. 文件 ==========
        let listed = detail.files.len();
        let mut saved: Vec<FileDescriptor> = Vec::with_capacity(listed);
        let mut file_failures = 0;
        let mut taken: HashSet<PathBuf> = HashSet::with_capacity(listed);

        for mut file in detail.files.drain(..) {
            let local_name = unique_local_name(&self.vault, &key, &file.file_name, &mut taken);
            if local_name != file.file_name {
                warn!(
                    "[条目 {}] ⚠️ 文件名 {} 重复，本地保存为 {}",
                    ctx.item_index, file.file_name, local_name
                );
            }

            match self
                .vault
                .ensure(&key, &local_name, &file.download_url, downloader)
                .await
            {
                Ok(local_path) => {
                    file.local_path = Some(local_path);
                    saved.push(file);
                }
                Err(e) => {
                    warn!("[条目 {}] ⚠️ 文件 {} 跳过: {}", ctx.item_index, file.file_name, e);
                    file_failures += 1;
                }
            }
        }

        if listed > 0 && saved.is_empty() {
            error!(
                "[条目 {}] ❌ {} 个文件全部下载失败，不写缓存",
                ctx.item_index, listed
            );
            return Ok(ItemOutcome::PartialFailure { key, file_failures });
        }

        // ========== 4. 合并并写缓存 ==========
        detail.files = saved;
        let entry = CacheEntry::merge(key.clone(), item, detail);
        self.cache.write(&key, &entry).await?;

        if file_failures > 0 {
            warn!(
                "[条目 {}] ⚠️ 完成，{}/{} 个文件失败",
                ctx.item_index, file_failures, listed
            );
        } else {
            info!("[条目 {}] ✓ 完成，{} 个文件", ctx.item_index, listed);
        }

        Ok(ItemOutcome::Completed {
            key,
            entry,
            file_failures,
        })
    }
}

/// 同一条目内本地路径冲突时，依次尝试 `name (2).ext`、`name (3).ext`……
///
/// 按列表顺序分配，同一详情重复抓取时得到相同的名字。
fn unique_local_name(
    vault: &FileVault,
    key: &ItemKey,
    file_name: &str,
    taken: &mut HashSet<PathBuf>,
) -> String {
    let mut candidate = file_name.to_string();
    let mut n = 1;
    while !taken.insert(vault.path_for(key, &candidate)) {
        n += 1;
        candidate = numbered_name(file_name, n);
    }
    candidate
}

fn numbered_name(file_name: &str, n: usize) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", file_name, n),
    }
}

fn log_item_failure(ctx: &ItemCtx, item: &WorkItem, error: &ScrapeError) {
    error!(
        "{} ❌ 处理失败: {}\n原始条目: {}",
        ctx,
        error,
        item.to_pretty_json()
    );
}
