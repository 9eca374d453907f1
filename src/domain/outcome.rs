//! Chapter Outcome - 章节处理结果
//!
//! 章节流水线的最终产物：跳过、进入下游处理、或失败。
//! 低价值内容不是错误，用 `Skip` 表达。

use serde::{Deserialize, Serialize};

/// 单个片段的摘要结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    /// 片段在输入中的位置（从 0 开始）
    pub segment_index: usize,
    pub text: String,
    /// false 表示使用了回退文本
    pub succeeded: bool,
}

impl SegmentSummary {
    pub fn success(segment_index: usize, text: impl Into<String>) -> Self {
        Self {
            segment_index,
            text: text.into(),
            succeeded: true,
        }
    }

    pub fn fallback(segment_index: usize, text: impl Into<String>) -> Self {
        Self {
            segment_index,
            text: text.into(),
            succeeded: false,
        }
    }
}

/// 跳过原因
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// 过滤后内容太短
    TooShort { length: usize, min: usize },
    /// 价值评分低于阈值
    LowScore { score: f64, min: f64 },
    /// 分段摘要后文本为空
    EmptyAfterSummarization,
    /// 分析结果不可用
    AnalysisUnusable,
    /// 分析超时
    AnalysisTimeout,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::TooShort { length, min } => {
                write!(f, "content too short ({} < {})", length, min)
            }
            SkipReason::LowScore { score, min } => {
                write!(f, "low chapter score ({:.2} < {:.2})", score, min)
            }
            SkipReason::EmptyAfterSummarization => write!(f, "empty after summarization"),
            SkipReason::AnalysisUnusable => write!(f, "analysis result unusable"),
            SkipReason::AnalysisTimeout => write!(f, "analysis timed out"),
        }
    }
}

/// 章节状态（`ChapterOutcome` 的判别值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStatus {
    Skip,
    Processing,
    Failed,
}

impl std::fmt::Display for ChapterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChapterStatus::Skip => "skip",
            ChapterStatus::Processing => "processing",
            ChapterStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// 章节处理结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChapterOutcome {
    Skip {
        reason: SkipReason,
    },
    Processing {
        processed_text: String,
        analysis: String,
    },
    Failed {
        message: String,
    },
}

impl ChapterOutcome {
    pub fn skip(reason: SkipReason) -> Self {
        Self::Skip { reason }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    pub fn status(&self) -> ChapterStatus {
        match self {
            ChapterOutcome::Skip { .. } => ChapterStatus::Skip,
            ChapterOutcome::Processing { .. } => ChapterStatus::Processing,
            ChapterOutcome::Failed { .. } => ChapterStatus::Failed,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ChapterOutcome::Failed { .. })
    }
}
