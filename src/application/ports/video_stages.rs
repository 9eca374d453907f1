//! Video Stages Port - 下游视频生产步骤
//!
//! 章节分析完成后的三个生成步骤：视频规划、视频脚本、AI 绘图提示词

use async_trait::async_trait;
use thiserror::Error;

use super::text_completion::CompletionError;

/// 下游步骤错误
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("Stage {0} produced empty output")]
    EmptyOutput(&'static str),
}

/// Video Stages Port
#[async_trait]
pub trait VideoStagesPort: Send + Sync {
    /// 根据章节分析和处理后的正文规划短视频
    async fn plan_videos(
        &self,
        chapter_title: &str,
        analysis: &str,
        processed_text: &str,
    ) -> Result<String, StageError>;

    /// 根据规划撰写视频脚本
    async fn write_scripts(&self, chapter_title: &str, plan: &str) -> Result<String, StageError>;

    /// 根据脚本生成画面提示词
    async fn generate_prompts(&self, chapter_title: &str, scripts: &str)
        -> Result<String, StageError>;
}
