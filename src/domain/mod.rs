//! Domain Layer - 领域层
//!
//! 包含:
//! - Chapter Context: 文档与章节
//! - 内容处理纯函数: 过滤、价值评分、分段
//! - 章节处理结果

pub mod chapter;
pub mod content_filter;
pub mod outcome;
pub mod text_segmenter;
pub mod value_scorer;

pub use chapter::{Chapter, ChapterError, ChapterId, Document, DocumentId};
pub use content_filter::filter_content;
pub use outcome::{ChapterOutcome, ChapterStatus, SegmentSummary, SkipReason};
pub use text_segmenter::{segment_text, SegmentConfig};
pub use value_scorer::{score_chapter, ChapterScore, ContentType, ContentTypeWeights};
