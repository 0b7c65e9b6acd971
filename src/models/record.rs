use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::item_key::{strip_query, ItemKey};
use super::work_item::WorkItem;

/// 单个附件的描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub download_url: String,
    /// 下载完成后的本地路径
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

impl FileDescriptor {
    /// 直接从下载地址构建（文件名取 `?` 之前的最后一个路径段）
    pub fn from_uri(uri: &str) -> Self {
        Self {
            file_name: file_name_from_url(uri),
            author: None,
            download_url: uri.to_string(),
            local_path: None,
        }
    }
}

/// 远程详情
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRecord {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

/// 持久化的缓存条目：原始条目 + 详情 + 条目键
///
/// JSON 形状是各字段平铺在同一层，和手工整理的输入文件保持一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub page_id: ItemKey,
    #[serde(flatten)]
    pub detail: DetailRecord,
    #[serde(flatten)]
    pub item: WorkItem,
}

impl CacheEntry {
    pub fn merge(key: ItemKey, item: &WorkItem, detail: DetailRecord) -> Self {
        Self {
            page_id: key,
            detail,
            item: item.clone(),
        }
    }
}

pub(crate) fn file_name_from_url(url: &str) -> String {
    let path = strip_query(url);
    path.rsplit('/').next().unwrap_or_default().to_string()
}
