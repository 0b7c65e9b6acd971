//! 文件库服务 - 业务能力层
//!
//! 只负责"某个条目的某个文件是否已经在本地"以及缺失时调用下载能力

use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

use crate::capability::Downloader;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::item_key::sanitize_component;
use crate::models::ItemKey;

/// 文件库
///
/// 文件位于 `<file_cache_dir>/<key>/<file_name>`。
/// 文件存在即视为已下载，没有单独的下载记录。
pub struct FileVault {
    dir: PathBuf,
}

impl FileVault {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 文件的确定性本地路径
    pub fn path_for(&self, key: &ItemKey, file_name: &str) -> PathBuf {
        let name = sanitize_component(file_name);
        let name = if name.is_empty() { "file".to_string() } else { name };
        self.dir.join(key.as_str()).join(name)
    }

    /// 本地是否已有该文件
    pub async fn has(&self, key: &ItemKey, file_name: &str) -> bool {
        fs::try_exists(self.path_for(key, file_name))
            .await
            .unwrap_or(false)
    }

    /// 确保文件在本地，返回本地路径
    ///
    /// 已存在时不发起传输。
    pub async fn ensure<D: Downloader + ?Sized>(
        &self,
        key: &ItemKey,
        file_name: &str,
        remote_url: &str,
        downloader: &D,
    ) -> ScrapeResult<PathBuf> {
        let target = self.path_for(key, file_name);

        if self.has(key, file_name).await {
            debug!("文件已在本地: {}", target.display());
            return Ok(target);
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ScrapeError::download_failed(remote_url, e))?;
        }

        info!("⬇️ 下载 {} => {}", remote_url, target.display());
        downloader
            .download(remote_url, &target)
            .await
            .map_err(|e| ScrapeError::download_failed(remote_url, format!("{:#}", e)))?;

        Ok(target)
    }
}
