//! Sled Persistence - 嵌入式 KV 存储

mod state_cache;

pub use state_cache::{SledCacheConfig, SledStateCache};
