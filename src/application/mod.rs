//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TextCompletion、StateCache、VideoStages 等）
//! - pipeline: 单章内容处理
//! - workflow: 整本书的章节循环
//! - error: 应用层错误定义

pub mod error;
pub mod pipeline;
pub mod ports;
pub mod workflow;

// Re-exports
pub use error::PipelineError;

pub use pipeline::{ChapterPipeline, SegmentSummarizer};

pub use ports::{
    // State cache
    cache_key,
    get_typed,
    set_typed,
    steps,
    CacheError,
    CacheStats,
    StateCachePort,
    StoredValue,
    // Text completion
    CompletionError,
    CompletionOptions,
    TextCompletionPort,
    // Video stages
    StageError,
    VideoStagesPort,
    // Chapter sink
    BookOverview,
    ChapterRecord,
    ChapterSinkPort,
    SinkError,
    // Document source
    DocumentSourcePort,
    SourceError,
};

pub use workflow::{WorkflowEngine, WorkflowReport, WorkflowStatus};
