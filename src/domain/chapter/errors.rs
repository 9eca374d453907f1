//! Chapter Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChapterError {
    #[error("无效的文档 ID: {0}")]
    InvalidDocumentId(String),

    #[error("章节没有文本内容: {0}")]
    EmptyText(String),

    #[error("重复的章节 ID: {0}")]
    DuplicateChapterId(String),

    #[error("章节索引越界: {index} (共 {total} 章)")]
    IndexOutOfRange { index: usize, total: usize },
}
