pub mod cache_store;
pub mod detail_fetcher;
pub mod file_vault;

pub use cache_store::CacheStore;
pub use detail_fetcher::DetailFetcher;
pub use file_vault::FileVault;
