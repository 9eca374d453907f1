//! 应用层错误定义
//!
//! 流水线与工作流内部使用的错误类型。
//! 章节级别的错误最终都会转换成 `ChapterOutcome::Failed` 或 `Skip`。

use thiserror::Error;

use crate::application::ports::{CompletionError, SinkError, StageError};
use crate::domain::ChapterError;

/// 流水线错误
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 结构性错误（缺少必需输入、数据不合法），工作流会停止
    #[error("Structural error: {0}")]
    Structural(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    External(String),

    /// 超时
    #[error("Timed out: {0}")]
    Timeout(&'static str),

    /// 被取消
    #[error("cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural(message.into())
    }
}

impl From<CompletionError> for PipelineError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Timeout => Self::Timeout("completion request"),
            other => Self::External(other.to_string()),
        }
    }
}

impl From<StageError> for PipelineError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::Completion(e) => e.into(),
            other => Self::External(other.to_string()),
        }
    }
}

impl From<SinkError> for PipelineError {
    fn from(err: SinkError) -> Self {
        Self::External(err.to_string())
    }
}

impl From<ChapterError> for PipelineError {
    fn from(err: ChapterError) -> Self {
        Self::Structural(err.to_string())
    }
}
