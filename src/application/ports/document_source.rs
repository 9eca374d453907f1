//! Document Source Port - 文档来源
//!
//! 文档格式解析不在本系统范围内，来源只需提供已切好章节的文档

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ChapterError, Document};

/// 文档加载错误
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error(transparent)]
    Invalid(#[from] ChapterError),
}

/// Document Source Port
#[async_trait]
pub trait DocumentSourcePort: Send + Sync {
    async fn load(&self) -> Result<Document, SourceError>;
}
