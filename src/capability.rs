//! 外部能力接口
//!
//! 核心流程只通过这两个 trait 接触远程世界：
//! - `PageAutomation`：驱动唯一的页面会话（导航、读取详情、登录）
//! - `Downloader`：把远程文件传输到本地路径
//!
//! 具体实现见 `infrastructure`，测试里用内存实现替换。

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::models::{DetailRecord, WorkItem};

/// 页面自动化能力
#[async_trait]
pub trait PageAutomation: Send + Sync {
    /// 读取条目的远程详情（附件列表、消息 ID）
    async fn fetch_detail(&self, item: &WorkItem) -> Result<DetailRecord>;

    /// 用账号密码登录
    async fn authenticate(&self, username: &str, password: &str) -> Result<()>;
}

/// 文件下载能力
#[async_trait]
pub trait Downloader: Send + Sync {
    /// 下载 `remote_url` 到 `local_path`，父目录由调用方保证存在
    async fn download(&self, remote_url: &str, local_path: &Path) -> Result<()>;
}
