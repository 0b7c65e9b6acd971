//! 缓存存储服务 - 业务能力层
//!
//! 只负责"条目键 → 缓存条目"的持久化，不关心流程

use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{CacheEntry, ItemKey};

/// 缓存存储
///
/// 每个条目一个 `<data_cache_dir>/<key>.json` 文件。
/// 只写入新键，不更新、不删除。
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 条目对应的缓存文件路径
    pub fn path_for(&self, key: &ItemKey) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// 是否已有缓存条目
    pub async fn has(&self, key: &ItemKey) -> bool {
        fs::try_exists(self.path_for(key)).await.unwrap_or(false)
    }

    /// 读取并解析缓存条目
    pub async fn read(&self, key: &ItemKey) -> ScrapeResult<CacheEntry> {
        let path = self.path_for(key);
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| ScrapeError::storage_read(&path, e))?;

        serde_json::from_str(&content).map_err(|source| ScrapeError::CorruptCacheEntry { path, source })
    }

    /// 写入缓存条目
    ///
    /// 先写临时文件再重命名，中断时不会留下半截的 JSON。
    pub async fn write(&self, key: &ItemKey, entry: &CacheEntry) -> ScrapeResult<PathBuf> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ScrapeError::storage_write(&self.dir, e))?;

        let path = self.path_for(key);
        let json = serde_json::to_string_pretty(entry).map_err(|e| {
            ScrapeError::storage_write(&path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        let tmp_path = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp_path, json)
            .await
            .map_err(|e| ScrapeError::storage_write(&tmp_path, e))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| ScrapeError::storage_write(&path, e))?;

        debug!("缓存已写入: {}", path.display());
        Ok(path)
    }
}
