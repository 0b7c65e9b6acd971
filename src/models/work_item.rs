use serde::{Deserialize, Serialize};

use super::item_key::ItemKey;

/// 一封带附件的邮件
///
/// 附件列表需要访问 `download_page_url` 才能拿到。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageItem {
    pub subject: String,
    pub author: String,
    pub date: String,
    pub download_page_url: String,
    #[serde(default)]
    pub file_count: u32,
}

/// 一个相册，文件地址已知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumItem {
    pub name: String,
    pub file_uris: Vec<String>,
}

/// 待处理条目（只读输入）
///
/// 邮件和相册放在同一个 JSON 数组里，按字段形状区分。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkItem {
    Message(MessageItem),
    Album(AlbumItem),
}

impl WorkItem {
    /// 推导条目键，无法推导时返回 None
    pub fn key(&self) -> Option<ItemKey> {
        match self {
            WorkItem::Message(message) => ItemKey::from_url(&message.download_page_url),
            WorkItem::Album(album) => ItemKey::from_name(&album.name),
        }
    }

    /// 用于日志显示的标题
    pub fn label(&self) -> &str {
        match self {
            WorkItem::Message(message) => &message.subject,
            WorkItem::Album(album) => &album.name,
        }
    }

    /// 原始条目的 JSON 形式，失败日志里用
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}
