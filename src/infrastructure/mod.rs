//! 基础设施层
//!
//! 持有稀缺资源（Page），对上只暴露能力

pub mod http_downloader;
pub mod js_executor;
pub mod page_session;

pub use http_downloader::SessionDownloader;
pub use js_executor::JsExecutor;
pub use page_session::PageSession;
