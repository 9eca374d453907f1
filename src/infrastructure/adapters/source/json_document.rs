//! JSON Document Source - 从 JSON 文件加载已切分章节的文档
//!
//! 文件格式:
//! ```json
//! {
//!   "id": "可选，缺省时由内容推导",
//!   "title": "原则",
//!   "chapters": [
//!     { "id": "可选", "title": "第一章 ...", "content": "...", "order": 0 }
//!   ]
//! }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::application::ports::{DocumentSourcePort, SourceError};
use crate::domain::{Chapter, ChapterError, ChapterId, Document, DocumentId};

#[derive(Debug, Deserialize)]
struct DocumentFile {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: String,
    chapters: Vec<ChapterEntry>,
}

#[derive(Debug, Deserialize)]
struct ChapterEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(alias = "text", alias = "raw_text")]
    content: String,
    #[serde(default)]
    order: Option<usize>,
}

/// JSON 文档来源
pub struct JsonDocumentSource {
    path: PathBuf,
}

impl JsonDocumentSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// 解析 JSON 文本为文档
///
/// 章节 ID 是步骤缓存作用域的一部分，必须唯一；缺省 ID 由 order 推导，冲突时报错。
pub fn parse_document(json: &str) -> Result<Document, SourceError> {
    let file: DocumentFile =
        serde_json::from_str(json).map_err(|e| SourceError::ParseError(e.to_string()))?;

    let id = match file.id {
        Some(id) => DocumentId::new(id.clone()).map_err(|_| ChapterError::InvalidDocumentId(id))?,
        None => {
            let body: String = file.chapters.iter().map(|c| c.content.as_str()).collect();
            DocumentId::from_content(&file.title, &body)
        }
    };

    let mut seen = HashSet::new();
    let mut chapters = Vec::with_capacity(file.chapters.len());
    for (position, entry) in file.chapters.into_iter().enumerate() {
        let order = entry.order.unwrap_or(position);
        let chapter_id = entry
            .id
            .filter(|id| !id.trim().is_empty())
            .map(ChapterId::new)
            .unwrap_or_else(|| ChapterId::from_order(order));
        if !seen.insert(chapter_id.as_str().to_string()) {
            return Err(ChapterError::DuplicateChapterId(chapter_id.as_str().to_string()).into());
        }
        chapters.push(Chapter::new(chapter_id, entry.title, entry.content, order));
    }

    Ok(Document::new(id, file.title, chapters))
}

#[async_trait]
impl DocumentSourcePort for JsonDocumentSource {
    async fn load(&self) -> Result<Document, SourceError> {
        let json = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::NotFound(self.path.display().to_string())
            } else {
                SourceError::IoError(e.to_string())
            }
        })?;

        let document = parse_document(&json)?;
        tracing::info!(
            path = %self.path.display(),
            document_id = %document.id(),
            title = %document.title(),
            chapters = document.chapter_count(),
            "Document loaded"
        );
        Ok(document)
    }
}
