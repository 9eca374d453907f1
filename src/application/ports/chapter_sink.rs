//! Chapter Sink Port - 章节结果持久化
//!
//! 保存每个已完成章节的产物以及整本书的概览

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 持久化错误
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::IoError(err.to_string())
    }
}

/// 已完成章节记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub chapter_index: usize,
    pub chapter_title: String,
    pub analysis: String,
    pub processed_text: String,
    pub plan: Option<String>,
    pub scripts: Option<String>,
    pub prompts: Option<String>,
}

/// 整本书概览
#[derive(Debug, Clone, Serialize)]
pub struct BookOverview {
    pub document_id: String,
    pub document_title: String,
    pub total_chapters: usize,
    pub skipped: usize,
    pub completed: Vec<ChapterRecord>,
    /// 失败时的错误信息
    pub error: Option<String>,
}

/// Chapter Sink Port
#[async_trait]
pub trait ChapterSinkPort: Send + Sync {
    /// 保存单个章节的产物
    async fn persist(&self, record: &ChapterRecord) -> Result<(), SinkError>;

    /// 写入整本书概览
    async fn write_overview(&self, overview: &BookOverview) -> Result<(), SinkError>;
}
