pub mod item_ctx;
pub mod item_processor;

pub use item_ctx::ItemCtx;
pub use item_processor::{ItemOutcome, ItemProcessor};
