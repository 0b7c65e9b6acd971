//! 页面会话 - 基础设施层
//!
//! 用唯一的 `JsExecutor` 实现 `PageAutomation`：
//! - 登录
//! - 打开附件详情页并抓取文件列表
//!
//! 页面选择器和脚本都封装在这里，核心流程只看到 `DetailRecord`。

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::capability::PageAutomation;
use crate::infrastructure::JsExecutor;
use crate::models::{DetailRecord, FileDescriptor, WorkItem};

const USERNAME_FIELD: &str = r#"input[name="username"]"#;
const USERNAME_SUBMIT: &str = r#"input[type="submit"][name="signin"]"#;
const PASSWORD_FIELD: &str = r#"input[name="password"]"#;
const PASSWORD_SUBMIT: &str = r#"button[type="submit"][name="verifyPassword"]"#;

/// 详情页加载完成的标志：附件所属消息的链接，或者错误提示
const DETAIL_READY: &str =
    r#".att-msg-preview a[href^="/neo/groups/"][data-rapid_p], #yg-error-container"#;

/// 抓取附件列表的脚本
///
/// 文件名取下载地址 `?` 之前的最后一段。
const EXTRACT_DETAIL_JS: &str = r#"
(() => {
    const contexts = document.querySelectorAll('.thumb-desc-context');
    const messageLink = document.querySelector('.att-msg-preview a[href^="/neo/groups/"][data-rapid_p]');
    const messageId = messageLink ? messageLink.href.trim().split('/').pop() : null;

    const files = [...contexts].map(context => {
        const meta = context.querySelector('.thumb-meta');
        const link = context.querySelector('a[href^="https://xa.yimg.com/"]');
        const downloadUrl = link ? link.href : null;
        let fileName = null;
        if (downloadUrl) {
            const qsIndex = downloadUrl.indexOf('?');
            fileName = downloadUrl.substring(
                downloadUrl.lastIndexOf('/') + 1,
                qsIndex !== -1 ? qsIndex : undefined
            );
        }
        return {
            fileName,
            author: meta ? meta.textContent.trim() : null,
            downloadUrl
        };
    });

    return {
        messageId,
        files,
        errorShown: document.querySelector('#yg-error-container') !== null
    };
})()
"#;

/// 脚本返回的原始数据
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapedDetail {
    message_id: Option<String>,
    files: Vec<ScrapedFile>,
    #[serde(default)]
    error_shown: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapedFile {
    file_name: Option<String>,
    author: Option<String>,
    download_url: Option<String>,
}

impl ScrapedDetail {
    /// 校验页面结构并转换成 `DetailRecord`
    fn into_record(self) -> Result<DetailRecord> {
        if self.error_shown && self.files.is_empty() {
            anyhow::bail!("远程页面显示错误提示");
        }

        let files = self
            .files
            .into_iter()
            .enumerate()
            .map(|(i, f)| match (f.file_name, f.download_url) {
                (Some(file_name), Some(download_url)) if !file_name.is_empty() => {
                    Ok(FileDescriptor {
                        file_name,
                        author: f.author,
                        download_url,
                        local_path: None,
                    })
                }
                _ => Err(anyhow::anyhow!("第 {} 个附件缺少下载链接，页面结构异常", i + 1)),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DetailRecord {
            message_id: self.message_id,
            files,
        })
    }
}

/// 页面会话
///
/// 同一时间只会有一个导航在进行：所有方法都通过 `&self` 顺序 await，
/// 调用方（编排层）保证不并发调用。
pub struct PageSession {
    executor: JsExecutor,
    page_timeout: Duration,
    login_url: String,
}

impl PageSession {
    pub fn new(executor: JsExecutor, page_timeout: Duration, login_url: impl Into<String>) -> Self {
        Self {
            executor,
            page_timeout,
            login_url: login_url.into(),
        }
    }

    pub fn executor(&self) -> &JsExecutor {
        &self.executor
    }

    /// 打开登录页，依次提交用户名和密码
    pub async fn log_in(&self, username: &str, password: &str) -> Result<()> {
        info!("🔐 正在打开登录页...");
        self.executor.goto(&self.login_url).await?;

        info!("🔐 提交用户名...");
        self.executor
            .wait_for_selector(USERNAME_FIELD, self.page_timeout)
            .await?;
        self.executor.type_into(USERNAME_FIELD, username).await?;
        self.executor.click(USERNAME_SUBMIT).await?;
        self.executor.wait_for_navigation().await?;

        info!("🔐 提交密码...");
        self.executor
            .wait_for_selector(PASSWORD_FIELD, self.page_timeout)
            .await?;
        self.executor.type_into(PASSWORD_FIELD, password).await?;
        self.executor.click(PASSWORD_SUBMIT).await?;
        self.executor.wait_for_navigation().await?;

        info!("✓ 登录完成");
        Ok(())
    }
}

#[async_trait]
impl PageAutomation for PageSession {
    async fn fetch_detail(&self, item: &WorkItem) -> Result<DetailRecord> {
        let WorkItem::Message(message) = item else {
            anyhow::bail!("只有邮件条目需要打开详情页");
        };

        tokio::time::timeout(self.page_timeout, self.executor.goto(&message.download_page_url))
            .await
            .with_context(|| format!("打开详情页超时 ({:?})", self.page_timeout))??;

        self.executor
            .wait_for_selector(DETAIL_READY, self.page_timeout)
            .await?;

        let scraped: ScrapedDetail = self
            .executor
            .eval_as(EXTRACT_DETAIL_JS)
            .await
            .context("执行抓取脚本失败")?;
        debug!("抓取结果: {:?}", scraped);

        scraped.into_record()
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<()> {
        self.log_in(username, password).await
    }
}
