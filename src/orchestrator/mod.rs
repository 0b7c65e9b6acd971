//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理浏览器和页面会话的生命周期
//! - 登录、加载条目、处理停止信号
//!
//! ### `batch_orchestrator` - 批量条目处理器
//! - 按顺序遍历条目（Vec<WorkItem>）
//! - 把每个条目的结果折叠成 RunResult
//! - 输出进度和汇总文件
//!
//! ## 层次关系
//!
//! ```text
//! app (持有 Browser / PageSession)
//!     ↓
//! batch_orchestrator (处理 Vec<WorkItem>)
//!     ↓
//! workflow::ItemProcessor (处理单个 WorkItem)
//!     ↓
//! services (能力层：cache_store / file_vault / detail_fetcher)
//!     ↓
//! infrastructure (基础设施：JsExecutor / PageSession / SessionDownloader)
//! ```

pub mod app;
pub mod batch_orchestrator;

pub use app::App;
pub use batch_orchestrator::{progress_line, BatchOrchestrator, RunResult};
