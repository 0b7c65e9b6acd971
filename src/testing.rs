//! 单元测试用的内存能力实现

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::capability::{Downloader, PageAutomation};
use crate::models::{AlbumItem, DetailRecord, FileDescriptor, MessageItem, WorkItem};

pub fn message(id: &str) -> WorkItem {
    WorkItem::Message(MessageItem {
        subject: format!("Message {}", id),
        author: "tester".into(),
        date: "Dec 7, 2019".into(),
        download_page_url: format!("https://groups.example/neo/groups/g/attachments/{}", id),
        file_count: 0,
    })
}

pub fn album(name: &str, uris: &[&str]) -> WorkItem {
    WorkItem::Album(AlbumItem {
        name: name.into(),
        file_uris: uris.iter().map(|u| u.to_string()).collect(),
    })
}

/// 按条目键返回预设附件列表的页面
#[derive(Default)]
pub struct MockPage {
    files: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    fetches: AtomicUsize,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(mut self, key: &str, names: &[&str]) -> Self {
        self.files
            .insert(key.into(), names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.into());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageAutomation for MockPage {
    async fn fetch_detail(&self, item: &WorkItem) -> anyhow::Result<DetailRecord> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let key = item.key().map(|k| k.to_string()).unwrap_or_default();
        if self.failing.contains(&key) {
            anyhow::bail!("等待页面内容超时");
        }
        let names = self
            .files
            .get(&key)
            .ok_or_else(|| anyhow::anyhow!("未知页面 {}", key))?;
        Ok(DetailRecord {
            message_id: Some(format!("msg-{}", key)),
            files: names
                .iter()
                .map(|name| FileDescriptor {
                    file_name: name.clone(),
                    author: Some("tester".into()),
                    download_url: format!("https://files.example/{}/{}", key, name),
                    local_path: None,
                })
                .collect(),
        })
    }

    async fn authenticate(&self, _username: &str, _password: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// 记录调用的下载器，文件名命中 `failing_on` 时失败
#[derive(Default)]
pub struct MockDownloader {
    calls: Mutex<Vec<String>>,
    failing: HashSet<String>,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, file_name: &str) -> Self {
        self.failing.insert(file_name.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    async fn download(&self, remote_url: &str, local_path: &Path) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(remote_url.to_string());
        let name = remote_url.rsplit('/').next().unwrap_or_default();
        if self.failing.contains(name) {
            anyhow::bail!("HTTP 500 for {}", remote_url);
        }
        tokio::fs::write(local_path, remote_url.as_bytes()).await?;
        Ok(())
    }
}
