//! Memory Layer - In-Memory State Management
//!
//! 步骤缓存的内存实现

mod state_cache;

pub use state_cache::InMemoryStateCache;
