//! Sled-based State Cache Implementation
//!
//! 步骤结果以 JSON 字节保存在 bincode 信封中，重启后仍可复用

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::ports::{cache_key, CacheError, CacheStats, StateCachePort, StoredValue};

/// 键前缀
const KEY_PREFIX: &str = "state:";

/// Sled 缓存配置
#[derive(Debug, Clone)]
pub struct SledCacheConfig {
    /// 数据库路径
    pub db_path: String,
}

impl Default for SledCacheConfig {
    fn default() -> Self {
        Self {
            db_path: "data/cache".to_string(),
        }
    }
}

/// 内部缓存条目
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InternalCacheEntry {
    /// serde_json 编码后的值
    value_json: Vec<u8>,
    step: String,
    created_at: i64,
    updated_at: i64,
}

/// Sled 步骤缓存
pub struct SledStateCache {
    db: Db,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl SledStateCache {
    /// 创建新的缓存实例
    pub fn new(config: &SledCacheConfig) -> Result<Self, CacheError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        tracing::info!(
            db_path = %config.db_path,
            entries = db.scan_prefix(KEY_PREFIX).count(),
            "SledStateCache initialized"
        );

        Ok(Self {
            db,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        })
    }

    /// 打开现有缓存
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let config = SledCacheConfig {
            db_path: path.as_ref().to_string_lossy().to_string(),
        };
        Self::new(&config)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn db_key(scope: &str, step: &str) -> String {
        format!("{}{}", KEY_PREFIX, cache_key(scope, step))
    }

    /// 刷新数据库
    pub fn flush(&self) -> Result<(), CacheError> {
        self.db
            .flush()
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl StateCachePort for SledStateCache {
    async fn get(&self, scope: &str, step: &str) -> Result<Option<StoredValue>, CacheError> {
        let key = Self::db_key(scope, step);

        match self.db.get(&key) {
            Ok(Some(data)) => {
                let entry: InternalCacheEntry = bincode::deserialize(&data)
                    .map_err(|e| CacheError::SerializationError(e.to_string()))?;
                let value = serde_json::from_slice(&entry.value_json)
                    .map_err(|e| CacheError::SerializationError(e.to_string()))?;

                self.hit_count.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "State cache hit");
                Ok(Some(value))
            }
            Ok(None) => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Err(e) => Err(CacheError::DatabaseError(e.to_string())),
        }
    }

    async fn set(&self, scope: &str, step: &str, value: StoredValue) -> Result<(), CacheError> {
        let key = Self::db_key(scope, step);
        let now = Utc::now().timestamp();

        // 覆盖时保留首次写入时间
        let created_at = match self.db.get(&key) {
            Ok(Some(data)) => bincode::deserialize::<InternalCacheEntry>(&data)
                .map(|e| e.created_at)
                .unwrap_or(now),
            _ => now,
        };

        let entry = InternalCacheEntry {
            value_json: serde_json::to_vec(&value)
                .map_err(|e| CacheError::SerializationError(e.to_string()))?,
            step: step.to_string(),
            created_at,
            updated_at: now,
        };
        let entry_bytes =
            bincode::serialize(&entry).map_err(|e| CacheError::SerializationError(e.to_string()))?;

        self.db
            .insert(&key, entry_bytes)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        tracing::debug!(key = %key, step = %entry.step, "Step result cached");
        Ok(())
    }

    async fn remove(&self, scope: &str, step: &str) -> Result<(), CacheError> {
        self.db
            .remove(Self::db_key(scope, step))
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.db.scan_prefix(KEY_PREFIX).count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_cache_set_get() {
        let dir = tempdir().unwrap();
        let cache = SledStateCache::open(dir.path().join("test.sled")).unwrap();

        let value = json!({"status": "processing", "analysis": "核心观点数量：2个"});
        cache.set("doc-1:chapter-0", "analyzeContent", value.clone()).await.unwrap();

        let result = cache.get("doc-1:chapter-0", "analyzeContent").await.unwrap();
        assert_eq!(result, Some(value));
        assert!(cache.get("doc-1:chapter-0", "planVideos").await.unwrap().is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[tokio::test]
    async fn test_cache_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sled");

        {
            let cache = SledStateCache::open(&path).unwrap();
            cache.set("doc-1:chapter-2", "planVideos", json!("推荐视频数量：2个")).await.unwrap();
            cache.flush().unwrap();
        }

        let cache = SledStateCache::open(&path).unwrap();
        assert_eq!(
            cache.get("doc-1:chapter-2", "planVideos").await.unwrap(),
            Some(json!("推荐视频数量：2个"))
        );
    }

    #[tokio::test]
    async fn test_cache_remove_and_overwrite() {
        let dir = tempdir().unwrap();
        let cache = SledStateCache::open(dir.path().join("test.sled")).unwrap();

        cache.set("s", "step", json!(1)).await.unwrap();
        cache.set("s", "step", json!(2)).await.unwrap();
        assert_eq!(cache.get("s", "step").await.unwrap(), Some(json!(2)));

        cache.remove("s", "step").await.unwrap();
        assert!(cache.get("s", "step").await.unwrap().is_none());
        assert_eq!(cache.stats().await.total_entries, 0);
    }
}
