use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// 清洗后追加的哈希后缀长度（十六进制字符数）
const DIGEST_SUFFIX_LEN: usize = 8;

/// 条目键
///
/// 由条目的标识字段确定性地推导，同时用作缓存文件名和结果映射的键。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(String);

impl ItemKey {
    /// 取详情页 URL 的最后一个路径段（忽略查询串和锚点）
    pub fn from_url(url: &str) -> Option<Self> {
        let path = strip_query(url.trim());
        let segment = path.trim_end_matches('/').rsplit('/').next()?;
        Self::from_component(segment)
    }

    /// 相册没有详情页，使用相册名
    pub fn from_name(name: &str) -> Option<Self> {
        Self::from_component(name.trim())
    }

    /// 清洗改变了原文时追加原文的短哈希，不同原文不会落到同一个键上
    fn from_component(raw: &str) -> Option<Self> {
        let cleaned = sanitize_component(raw);
        if cleaned.is_empty() {
            return None;
        }
        if cleaned == raw {
            return Some(Self(cleaned));
        }

        let digest = hex::encode(Sha256::digest(raw.as_bytes()));
        Some(Self(format!("{}-{}", cleaned, &digest[..DIGEST_SUFFIX_LEN])))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 去掉 URL 中 `?` 和 `#` 之后的部分
pub(crate) fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// 把任意字符串变成可以安全用作单级文件名的形式
///
/// `.` 和 `..` 会变成空串，由调用方决定如何处理。
pub(crate) fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "." | ".." => String::new(),
        _ => cleaned,
    }
}
