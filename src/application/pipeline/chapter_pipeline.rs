//! Chapter Pipeline - 单章处理
//!
//! 每一步的错误都会被转换为 `ChapterOutcome`，`process` 本身不返回错误。

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::prompts::chapter_analysis_prompt;
use super::segment_summarizer::SegmentSummarizer;
use super::{char_len, take_chars};
use crate::application::error::PipelineError;
use crate::application::ports::{
    get_typed, set_typed, steps, CompletionOptions, StateCachePort, TextCompletionPort,
};
use crate::config::ProcessingConfig;
use crate::domain::{
    filter_content, score_chapter, segment_text, Chapter, ChapterError, ChapterOutcome,
    SkipReason,
};

/// 章节处理流水线
pub struct ChapterPipeline {
    client: Arc<dyn TextCompletionPort>,
    cache: Arc<dyn StateCachePort>,
    summarizer: SegmentSummarizer,
    config: Arc<ProcessingConfig>,
}

impl ChapterPipeline {
    pub fn new(
        client: Arc<dyn TextCompletionPort>,
        cache: Arc<dyn StateCachePort>,
        config: Arc<ProcessingConfig>,
    ) -> Self {
        let summarizer = SegmentSummarizer::new(client.clone(), config.clone());
        Self {
            client,
            cache,
            summarizer,
            config,
        }
    }

    /// 处理单个章节
    ///
    /// 缓存中已有 `analyzeContent` 结果时直接返回；非失败结果写回缓存。
    pub async fn process(
        &self,
        cache_scope: &str,
        chapter: &Chapter,
        cancel: &CancellationToken,
    ) -> ChapterOutcome {
        match get_typed::<ChapterOutcome>(self.cache.as_ref(), cache_scope, steps::ANALYZE_CONTENT)
            .await
        {
            Ok(Some(cached)) => {
                tracing::info!(
                    scope = %cache_scope,
                    status = %cached.status(),
                    "Chapter analysis loaded from cache"
                );
                return cached;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(scope = %cache_scope, error = %e, "Cache read failed, recomputing");
            }
        }

        let outcome = match self.run(chapter, cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(chapter = %chapter.display_title(), error = %e, "Chapter processing failed");
                ChapterOutcome::failed(e.to_string())
            }
        };

        if !outcome.is_failed() {
            if let Err(e) =
                set_typed(self.cache.as_ref(), cache_scope, steps::ANALYZE_CONTENT, &outcome).await
            {
                tracing::warn!(scope = %cache_scope, error = %e, "Failed to cache chapter analysis");
            }
        }

        outcome
    }

    async fn run(
        &self,
        chapter: &Chapter,
        cancel: &CancellationToken,
    ) -> Result<ChapterOutcome, PipelineError> {
        let cfg = &self.config;
        let title = chapter.display_title();

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        if chapter.raw_text().trim().is_empty() {
            return Err(ChapterError::EmptyText(title).into());
        }

        // 1. 过滤
        let filtered = filter_content(chapter.raw_text(), &title);
        let filtered_len = char_len(&filtered);
        if filtered_len < cfg.min_content_length {
            tracing::info!(chapter = %title, length = filtered_len, "Chapter too short, skipped");
            return Ok(ChapterOutcome::skip(SkipReason::TooShort {
                length: filtered_len,
                min: cfg.min_content_length,
            }));
        }

        // 2. 评分
        let score = score_chapter(&filtered, chapter.title(), &cfg.content_type_weights);
        if score.value < cfg.min_chapter_score {
            tracing::info!(
                chapter = %title,
                score = score.value,
                content_type = ?score.content_type,
                "Chapter value too low, skipped"
            );
            return Ok(ChapterOutcome::skip(SkipReason::LowScore {
                score: score.value,
                min: cfg.min_chapter_score,
            }));
        }

        // 3. 长章节分段摘要
        let processed = if filtered_len <= cfg.long_chapter_threshold {
            filtered
        } else {
            self.condense(&title, &filtered, cancel).await?
        };

        if char_len(processed.trim()) < cfg.min_processed_length {
            tracing::info!(chapter = %title, "Nothing left after summarization, skipped");
            return Ok(ChapterOutcome::skip(SkipReason::EmptyAfterSummarization));
        }

        // 4. 章节分析
        match self.analyze(&title, &processed, cancel).await {
            Ok(analysis) if char_len(analysis.trim()) >= cfg.min_analysis_length => {
                tracing::info!(
                    chapter = %title,
                    processed_chars = char_len(&processed),
                    "Chapter analyzed"
                );
                Ok(ChapterOutcome::Processing {
                    processed_text: processed,
                    analysis: analysis.trim().to_string(),
                })
            }
            Ok(_) => {
                tracing::warn!(chapter = %title, "Analysis result unusable, skipped");
                Ok(ChapterOutcome::skip(SkipReason::AnalysisUnusable))
            }
            Err(PipelineError::Timeout(_)) => {
                tracing::warn!(
                    chapter = %title,
                    timeout_ms = cfg.chapter_analysis_timeout_ms,
                    "Analysis timed out, skipped"
                );
                Ok(ChapterOutcome::skip(SkipReason::AnalysisTimeout))
            }
            Err(e) => Err(e),
        }
    }

    /// 分段并并发摘要，结果按 `Segment N: ...` 拼接
    async fn condense(
        &self,
        title: &str,
        filtered: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let segments = segment_text(filtered, &self.config.segment_config());
        tracing::info!(chapter = %title, segments = segments.len(), "Long chapter segmented");

        let summaries = match tokio::time::timeout(
            self.config.total_processing_timeout(),
            self.summarizer.summarize(segments, cancel),
        )
        .await
        {
            Ok(summaries) => summaries,
            Err(_) => {
                tracing::warn!(
                    chapter = %title,
                    timeout_ms = self.config.total_processing_timeout_ms,
                    "Segment processing timed out, using chapter excerpt"
                );
                return Ok(self.excerpt(filtered));
            }
        };

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        if summaries.is_empty() {
            tracing::warn!(chapter = %title, "No segment summaries, using chapter excerpt");
            return Ok(self.excerpt(filtered));
        }

        Ok(summaries
            .iter()
            .map(|s| format!("Segment {}: {}", s.segment_index + 1, s.text))
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    fn excerpt(&self, filtered: &str) -> String {
        format!(
            "{}...",
            take_chars(filtered, self.config.fallback_excerpt_length)
        )
    }

    async fn analyze(
        &self,
        title: &str,
        processed: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let prompt = chapter_analysis_prompt(title, processed);
        let timeout = self.config.chapter_analysis_timeout();
        let options = CompletionOptions::new(self.config.analysis_temperature).with_timeout(timeout);

        tokio::select! {
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            result = tokio::time::timeout(timeout, self.client.complete(&prompt, options)) => {
                match result {
                    Ok(completed) => completed.map_err(PipelineError::from),
                    Err(_) => Err(PipelineError::Timeout("chapter analysis")),
                }
            }
        }
    }
}
