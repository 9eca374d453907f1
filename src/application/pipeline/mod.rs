//! Chapter Pipeline - 章节内容处理流水线
//!
//! 过滤 → 评分 → （长章节）分段摘要 → 章节分析

mod chapter_pipeline;
mod prompts;
mod segment_summarizer;

pub use chapter_pipeline::ChapterPipeline;
pub use segment_summarizer::{SegmentSummarizer, MIN_SUMMARIZE_CHARS, MIN_SUMMARY_CHARS};

#[inline]
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 按字符截取前 n 个字符
pub(crate) fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
