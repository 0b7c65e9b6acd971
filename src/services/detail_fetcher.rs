//! 详情获取服务 - 业务能力层
//!
//! 把页面自动化能力适配成 `DetailRecord`，失败统一归类为 `RemoteFetchFailed`

use tracing::debug;

use crate::capability::PageAutomation;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{DetailRecord, FileDescriptor, ItemKey, WorkItem};

/// 详情获取器
#[derive(Debug, Default, Clone, Copy)]
pub struct DetailFetcher;

impl DetailFetcher {
    pub fn new() -> Self {
        Self
    }

    /// 获取条目详情
    ///
    /// 相册的文件地址已经在条目里，不占用页面会话。
    pub async fn fetch<P: PageAutomation + ?Sized>(
        &self,
        page: &P,
        key: &ItemKey,
        item: &WorkItem,
    ) -> ScrapeResult<DetailRecord> {
        match item {
            WorkItem::Album(album) => Ok(DetailRecord {
                message_id: None,
                files: album
                    .file_uris
                    .iter()
                    .map(|uri| FileDescriptor::from_uri(uri))
                    .collect(),
            }),
            WorkItem::Message(_) => {
                let detail = page
                    .fetch_detail(item)
                    .await
                    .map_err(|e| ScrapeError::remote_fetch_failed(key.as_str(), format!("{:#}", e)))?;
                debug!("条目 {} 详情: {} 个文件", key, detail.files.len());
                Ok(detail)
            }
        }
    }
}
