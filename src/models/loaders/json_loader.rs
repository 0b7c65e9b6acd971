use crate::models::work_item::WorkItem;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 JSON 文件加载待处理条目列表（根元素是数组）
pub async fn load_work_items(path: &Path) -> Result<Vec<WorkItem>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取条目列表: {}", path.display()))?;

    let items: Vec<WorkItem> = serde_json::from_str(&content)
        .with_context(|| format!("无法解析条目列表: {}", path.display()))?;

    tracing::info!("成功加载 {} 个条目: {}", items.len(), path.display());

    Ok(items)
}
