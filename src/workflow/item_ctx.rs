//! 条目处理上下文
//!
//! 封装"我正在处理第几个条目、它的键是什么"这一信息

use std::fmt::Display;

use crate::models::ItemKey;

/// 条目处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// 条目在输入列表中的序号（从1开始，仅用于日志）
    pub item_index: usize,

    /// 条目总数
    pub total: usize,

    /// 条目键，无法推导时为 None
    pub key: Option<ItemKey>,
}

impl ItemCtx {
    pub fn new(item_index: usize, total: usize, key: Option<ItemKey>) -> Self {
        Self {
            item_index,
            total,
            key,
        }
    }

    /// 键的显示形式
    pub fn key_str(&self) -> &str {
        self.key.as_ref().map(ItemKey::as_str).unwrap_or("<无键>")
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[条目 {}/{} 键#{}]", self.item_index, self.total, self.key_str())
    }
}
