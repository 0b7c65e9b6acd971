//! # Attachment Scraper
//!
//! 可断点续跑的附件抓取与下载工具
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner
//! - `PageSession` - 登录、抓取详情页
//! - `SessionDownloader` - 带会话 Cookie 的文件下载
//!
//! ### ② 业务能力层（Services）
//! - `CacheStore` - 条目缓存的读写
//! - `FileVault` - 文件是否已在本地、缺失时下载
//! - `DetailFetcher` - 获取条目详情
//!
//! ### ③ 流程层（Workflow）
//! - `ItemProcessor` - 一个条目的完整流程（缓存 → 详情 → 下载 → 写缓存）
//!
//! ### ④ 编排层（Orchestration）
//! - `BatchOrchestrator` - 顺序处理全部条目，汇总结果
//! - `App` - 应用生命周期

pub mod browser;
pub mod capability;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod testing;

// 重新导出常用类型
pub use capability::{Downloader, PageAutomation};
pub use config::Config;
pub use error::{ScrapeError, ScrapeResult};
pub use models::{CacheEntry, DetailRecord, FileDescriptor, ItemKey, WorkItem};
pub use orchestrator::{App, BatchOrchestrator, RunResult};
pub use services::{CacheStore, DetailFetcher, FileVault};
pub use workflow::{ItemCtx, ItemOutcome, ItemProcessor};
