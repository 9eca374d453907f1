//! State Cache Port - 步骤结果缓存
//!
//! 以 (作用域, 步骤名) 为键保存每个工作流步骤的结果，重跑时直接复用。
//! 作用域通常是 `"{document_id}:{chapter_id}"`。

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// 缓存中保存的值
pub type StoredValue = serde_json::Value;

/// 步骤名
pub mod steps {
    pub const ANALYZE_CONTENT: &str = "analyzeContent";
    pub const PLAN_VIDEOS: &str = "planVideos";
    pub const GENERATE_VIDEO_SCRIPTS: &str = "generateVideoScripts";
    pub const GENERATE_AI_PROMPTS: &str = "generateAIPrompts";
}

/// State Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub hit_count: u64,
    pub miss_count: u64,
}

/// State Cache Port
#[async_trait]
pub trait StateCachePort: Send + Sync {
    /// 读取步骤结果，未命中返回 None
    async fn get(&self, scope: &str, step: &str) -> Result<Option<StoredValue>, CacheError>;

    /// 写入步骤结果（覆盖旧值）
    async fn set(&self, scope: &str, step: &str, value: StoredValue) -> Result<(), CacheError>;

    /// 删除步骤结果
    async fn remove(&self, scope: &str, step: &str) -> Result<(), CacheError>;

    /// 获取缓存统计信息
    async fn stats(&self) -> CacheStats;
}

/// 生成缓存 key
pub fn cache_key(scope: &str, step: &str) -> String {
    format!("{}:{}", scope, step)
}

/// 读取并反序列化为具体类型
pub async fn get_typed<T: DeserializeOwned>(
    cache: &dyn StateCachePort,
    scope: &str,
    step: &str,
) -> Result<Option<T>, CacheError> {
    match cache.get(scope, step).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| CacheError::SerializationError(e.to_string())),
        None => Ok(None),
    }
}

/// 序列化后写入
pub async fn set_typed<T: Serialize + ?Sized>(
    cache: &dyn StateCachePort,
    scope: &str,
    step: &str,
    value: &T,
) -> Result<(), CacheError> {
    let value =
        serde_json::to_value(value).map_err(|e| CacheError::SerializationError(e.to_string()))?;
    cache.set(scope, step, value).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_layout() {
        assert_eq!(
            cache_key("doc-1:chapter-0", steps::PLAN_VIDEOS),
            "doc-1:chapter-0:planVideos"
        );
    }
}
