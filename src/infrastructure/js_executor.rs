//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS / 导航 / 等待元素"这些能力

use anyhow::{Context, Result};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// 轮询页面元素的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 和基础的页面操作
/// - 不认识 WorkItem / CacheEntry
/// - 不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    ///
    /// # 参数
    /// - `js_code`: 要执行的 JS 表达式
    ///
    /// # 返回
    /// 表达式结果反序列化后的 `T`
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 导航到指定 URL，等待页面加载
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        Ok(())
    }

    /// 等待当前导航完成
    pub async fn wait_for_navigation(&self) -> Result<()> {
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    /// 轮询直到 `selector` 匹配到元素或超时
    ///
    /// # 参数
    /// - `selector`: CSS 选择器，可以是用逗号分隔的多个选择器
    /// - `timeout`: 最长等待时间
    pub async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let js_code = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        let deadline = Instant::now() + timeout;

        loop {
            // 导航过程中执行上下文可能暂时不可用，视为未找到
            if self.eval_as::<bool>(js_code.clone()).await.unwrap_or(false) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                anyhow::bail!("等待元素 {} 超时 ({:?})", selector, timeout);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 在输入框中输入文本
    pub async fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .with_context(|| format!("找不到输入框 {}", selector))?
            .click()
            .await?
            .type_str(text)
            .await?;
        Ok(())
    }

    /// 点击元素
    pub async fn click(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .with_context(|| format!("找不到元素 {}", selector))?
            .click()
            .await?;
        Ok(())
    }

    /// 当前会话的 Cookie，拼成 `Cookie` 请求头的格式
    pub async fn cookie_header(&self) -> Result<String> {
        let cookies = self.page.get_cookies().await?;
        Ok(cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; "))
    }

    /// 浏览器的 User-Agent
    pub async fn user_agent(&self) -> Result<String> {
        self.eval_as("navigator.userAgent").await
    }
}
