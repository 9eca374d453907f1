//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod chapter_sink;
mod document_source;
mod state_cache;
mod text_completion;
mod video_stages;

pub use chapter_sink::{BookOverview, ChapterRecord, ChapterSinkPort, SinkError};
pub use document_source::{DocumentSourcePort, SourceError};
pub use state_cache::{
    cache_key, get_typed, set_typed, steps, CacheError, CacheStats, StateCachePort, StoredValue,
};
pub use text_completion::{CompletionError, CompletionOptions, TextCompletionPort};
pub use video_stages::{StageError, VideoStagesPort};
