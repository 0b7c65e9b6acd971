pub mod item_key;
pub mod loaders;
pub mod record;
pub mod work_item;

pub use item_key::ItemKey;
pub use loaders::load_work_items;
pub use record::{CacheEntry, DetailRecord, FileDescriptor};
pub use work_item::{AlbumItem, MessageItem, WorkItem};
