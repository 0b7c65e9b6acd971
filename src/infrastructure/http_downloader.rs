//! 会话下载器 - 基础设施层
//!
//! 用 reqwest 传输文件，带上页面会话的 Cookie 和 User-Agent，
//! 这样登录后才能访问的附件也能下载。

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::capability::Downloader;
use crate::infrastructure::PageSession;

/// 会话下载器
///
/// 借用页面会话只为读取 Cookie，不会驱动页面导航。
pub struct SessionDownloader<'a> {
    session: &'a PageSession,
    client: reqwest::Client,
}

impl<'a> SessionDownloader<'a> {
    pub async fn new(session: &'a PageSession, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(user_agent) = session.executor().user_agent().await {
            headers.insert(header::USER_AGENT, HeaderValue::from_str(&user_agent)?);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("创建 HTTP 客户端失败")?;

        Ok(Self { session, client })
    }
}

#[async_trait]
impl Downloader for SessionDownloader<'_> {
    async fn download(&self, remote_url: &str, local_path: &Path) -> Result<()> {
        // 每次都重新读取，会话过程中 Cookie 可能被刷新
        let cookie = self.session.executor().cookie_header().await?;

        let mut request = self.client.get(remote_url);
        if !cookie.is_empty() {
            request = request.header(header::COOKIE, cookie);
        }

        let mut response = request
            .send()
            .await
            .with_context(|| format!("请求 {} 失败", remote_url))?
            .error_for_status()?;

        // 先写 .part，完成后再改名，避免半截文件被当成已下载
        let part_path = part_path_for(local_path);
        let mut file = fs::File::create(&part_path)
            .await
            .with_context(|| format!("无法创建 {}", part_path.display()))?;

        let mut written = 0usize;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;
        drop(file);

        fs::rename(&part_path, local_path)
            .await
            .with_context(|| format!("无法移动到 {}", local_path.display()))?;

        debug!("已下载 {} 字节 => {}", written, local_path.display());
        Ok(())
    }
}

fn part_path_for(local_path: &Path) -> PathBuf {
    let mut name = local_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    local_path.with_file_name(name)
}
