pub mod config;
pub mod keys;
pub mod logging;
pub mod request;
pub mod storage;
pub mod store;
pub mod url_utils;

// Re-export main types for library usage
pub use config::{Config, DurabilityLevel, EngineOptions, StoreConfig};
pub use request::QueuedRequest;
pub use storage::{CookieStorage, QueueStorage, VisitedStorage};
pub use store::{CrawlStore, StoreError, StoreResult};
