//! Segment Summarizer - 并发片段摘要
//!
//! 每个片段一个 tokio 任务，统一汇合；单个片段超时、出错或被取消时
//! 使用原文开头作为回退，不影响其他片段。

use futures_util::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::prompts::segment_summary_prompt;
use super::{char_len, take_chars};
use crate::application::ports::{CompletionOptions, TextCompletionPort};
use crate::config::ProcessingConfig;
use crate::domain::SegmentSummary;

/// 短于此长度的片段直接原样返回
pub const MIN_SUMMARIZE_CHARS: usize = 100;

/// 摘要结果短于此长度视为无效
pub const MIN_SUMMARY_CHARS: usize = 10;

/// 片段摘要器
pub struct SegmentSummarizer {
    client: Arc<dyn TextCompletionPort>,
    config: Arc<ProcessingConfig>,
}

impl SegmentSummarizer {
    pub fn new(client: Arc<dyn TextCompletionPort>, config: Arc<ProcessingConfig>) -> Self {
        Self { client, config }
    }

    /// 并发摘要全部片段
    ///
    /// 输出与输入一一对应且顺序一致。`cancel` 被触发后，未完成的片段全部回退。
    /// 返回的 future 被提前丢弃时（例如外层总超时），所有未完成的任务会收到取消。
    pub async fn summarize(
        &self,
        segments: Vec<String>,
        cancel: &CancellationToken,
    ) -> Vec<SegmentSummary> {
        let total = segments.len();
        let group = cancel.child_token();
        let _abort_on_drop = group.clone().drop_guard();

        let handles: Vec<_> = segments
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                tokio::spawn(summarize_segment(
                    self.client.clone(),
                    self.config.clone(),
                    index,
                    segment.clone(),
                    group.child_token(),
                ))
            })
            .collect();

        tracing::debug!(segments = total, "Segment tasks spawned");

        let summaries: Vec<SegmentSummary> = join_all(handles)
            .await
            .into_iter()
            .zip(segments.iter())
            .enumerate()
            .map(|(index, (joined, segment))| match joined {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::error!(segment_index = index, error = %e, "Segment task aborted");
                    let bounded = bound_segment(segment, self.config.max_segment_length);
                    SegmentSummary::fallback(
                        index,
                        fallback_text(&bounded, self.config.max_summary_length),
                    )
                }
            })
            .collect();

        let succeeded = summaries.iter().filter(|s| s.succeeded).count();
        tracing::info!(
            segments = total,
            succeeded,
            fallbacks = total - succeeded,
            "Segment summarization finished"
        );

        summaries
    }
}

/// 摘要单个片段（在独立任务中运行）
async fn summarize_segment(
    client: Arc<dyn TextCompletionPort>,
    config: Arc<ProcessingConfig>,
    index: usize,
    segment: String,
    token: CancellationToken,
) -> SegmentSummary {
    if char_len(&segment) < MIN_SUMMARIZE_CHARS {
        return SegmentSummary::success(index, segment.trim());
    }

    let bounded = bound_segment(&segment, config.max_segment_length);
    let prompt = segment_summary_prompt(&bounded, config.max_summary_length);
    let timeout = config.single_segment_timeout();
    let options = CompletionOptions::new(config.segment_temperature).with_timeout(timeout);

    let result: Result<String, String> = tokio::select! {
        _ = token.cancelled() => Err("cancelled".to_string()),
        completed = tokio::time::timeout(timeout, client.complete(&prompt, options)) => {
            match completed {
                Ok(Ok(text)) if char_len(text.trim()) >= MIN_SUMMARY_CHARS => {
                    Ok(text.trim().to_string())
                }
                Ok(Ok(_)) => Err("summary too short".to_string()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!("timed out after {}ms", config.single_segment_timeout_ms)),
            }
        }
    };

    match result {
        Ok(summary) => {
            tracing::debug!(
                segment_index = index,
                summary_chars = char_len(&summary),
                "Segment summarized"
            );
            SegmentSummary::success(index, summary)
        }
        Err(reason) => {
            tracing::warn!(segment_index = index, reason = %reason, "Segment summary failed, using excerpt");
            SegmentSummary::fallback(index, fallback_text(&bounded, config.max_summary_length))
        }
    }
}

/// 超过上限的片段截断并加省略号
fn bound_segment(segment: &str, max_chars: usize) -> String {
    if char_len(segment) > max_chars {
        format!("{}...", take_chars(segment, max_chars))
    } else {
        segment.to_string()
    }
}

fn fallback_text(bounded: &str, max_summary_length: usize) -> String {
    format!("{}...", take_chars(bounded, max_summary_length))
}
