//! In-Memory State Cache Implementation
//!
//! 测试和 `cache.backend = "memory"` 时使用，进程退出即丢失

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::ports::{cache_key, CacheError, CacheStats, StateCachePort, StoredValue};

/// 内存步骤缓存
#[derive(Default)]
pub struct InMemoryStateCache {
    /// "{scope}:{step}" -> value
    entries: DashMap<String, StoredValue>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl InMemoryStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl StateCachePort for InMemoryStateCache {
    async fn get(&self, scope: &str, step: &str) -> Result<Option<StoredValue>, CacheError> {
        let key = cache_key(scope, step);
        match self.entries.get(&key) {
            Some(entry) => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "State cache hit");
                Ok(Some(entry.value().clone()))
            }
            None => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set(&self, scope: &str, step: &str, value: StoredValue) -> Result<(), CacheError> {
        self.entries.insert(cache_key(scope, step), value);
        Ok(())
    }

    async fn remove(&self, scope: &str, step: &str) -> Result<(), CacheError> {
        self.entries.remove(&cache_key(scope, step));
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.len(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}
