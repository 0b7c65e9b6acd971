//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：启动或连接浏览器、创建页面会话、登录
//! 2. **加载条目**：读取条目列表 JSON
//! 3. **停止信号**：第一次 Ctrl-C 只在条目之间生效，当前条目总会处理完；
//!    第二次 Ctrl-C 立即退出
//! 4. **资源管理**：唯一持有 Browser 和 PageSession 的模块
//! 5. **向下委托**：委托 `BatchOrchestrator` 处理全部条目

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::browser;
use crate::capability::PageAutomation;
use crate::config::Config;
use crate::infrastructure::{JsExecutor, PageSession, SessionDownloader};
use crate::models::load_work_items;
use crate::orchestrator::{BatchOrchestrator, RunResult};
use crate::utils::logging;
use crate::workflow::ItemProcessor;

/// 应用主结构
pub struct App {
    config: Config,
    browser: Browser,
    session: PageSession,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let (browser, page) = browser::open_browser(&config).await?;

        let session = PageSession::new(
            JsExecutor::new(page),
            Duration::from_secs(config.page_timeout_secs),
            config.login_url.clone(),
        );

        match config.credentials() {
            Some((username, password)) => {
                session
                    .authenticate(username, password)
                    .await
                    .context("登录失败")?;
            }
            None => warn!("⚠️ 未配置账号密码，跳过登录"),
        }

        Ok(Self {
            config,
            browser,
            session,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunResult> {
        info!("\n📁 正在读取条目列表...");
        let items = load_work_items(&self.config.input_file).await?;

        let stop = Arc::new(AtomicBool::new(false));
        spawn_stop_listener(stop.clone());

        let downloader = SessionDownloader::new(
            &self.session,
            Duration::from_secs(self.config.download_timeout_secs),
        )
        .await?;

        let orchestrator =
            BatchOrchestrator::new(ItemProcessor::new(&self.config), &self.config.out_file)
                .with_stop_flag(stop);

        let result = orchestrator
            .run(&self.session, &downloader, &items)
            .await?;

        Ok(result)
    }

    /// 关闭浏览器
    pub async fn shutdown(mut self) -> Result<()> {
        info!("正在关闭浏览器...");
        if self.config.browser_debug_port.is_none() {
            self.browser.close().await?;
        }
        Ok(())
    }
}

/// 强制退出时的进程退出码（128 + SIGINT）
const FORCED_EXIT_CODE: i32 = 130;

/// 监听 Ctrl-C
///
/// 安装监听后默认的 SIGINT 处理不再生效，第二次 Ctrl-C 由这里负责退出进程，
/// 否则正在进行的长时间下载无法被打断。
fn spawn_stop_listener(stop: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if watch_interrupts(stop, tokio::signal::ctrl_c).await {
            error!("⛔ 再次收到 Ctrl-C，立即退出");
            std::process::exit(FORCED_EXIT_CODE);
        }
    });
}

/// 第一次信号设置停止标志，第二次信号返回 `true`
///
/// # 参数
/// - `stop`: 编排器在条目之间检查的停止标志
/// - `next_signal`: 每次调用返回一个等待下一次信号的 future
///
/// # 返回
/// 收到第二次信号时返回 `true`；监听失败时返回 `false`
async fn watch_interrupts<F, Fut>(stop: Arc<AtomicBool>, mut next_signal: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = next_signal().await {
        warn!("无法监听 Ctrl-C: {}", e);
        return false;
    }
    warn!("⏹️ 收到 Ctrl-C，当前条目处理完后停止（再按一次立即退出）");
    stop.store(true, Ordering::SeqCst);

    next_signal().await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_second_interrupt_forces_exit() {
        let stop = Arc::new(AtomicBool::new(false));
        let signals = AtomicUsize::new(0);

        let forced = watch_interrupts(stop.clone(), || {
            signals.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

        assert!(forced);
        assert!(stop.load(Ordering::SeqCst));
        assert_eq!(signals.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_first_interrupt_only_requests_stop() {
        let stop = Arc::new(AtomicBool::new(false));
        let signals = AtomicUsize::new(0);

        // 第二次监听失败，不强制退出
        let forced = watch_interrupts(stop.clone(), || {
            let n = signals.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Ok(())
                } else {
                    Err(std::io::Error::new(std::io::ErrorKind::Other, "closed"))
                }
            }
        })
        .await;

        assert!(!forced);
        assert!(stop.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_listener_failure_leaves_flag_unset() {
        let stop = Arc::new(AtomicBool::new(false));

        let forced = watch_interrupts(stop.clone(), || async {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no signal support"))
        })
        .await;

        assert!(!forced);
        assert!(!stop.load(Ordering::SeqCst));
    }
}
