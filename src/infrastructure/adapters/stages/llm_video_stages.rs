//! LLM Video Stages - 基于文本补全的下游生成步骤
//!
//! 实现 VideoStagesPort trait：视频规划、脚本、画面提示词各一次补全调用

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    CompletionOptions, StageError, TextCompletionPort, VideoStagesPort,
};

/// 下游步骤配置
#[derive(Debug, Clone)]
pub struct VideoStagesConfig {
    pub plan_temperature: f32,
    pub script_temperature: f32,
    pub prompt_temperature: f32,
    /// 单次请求的传输层超时
    pub request_timeout: Duration,
}

impl Default for VideoStagesConfig {
    fn default() -> Self {
        Self {
            plan_temperature: 0.6,
            script_temperature: 0.7,
            prompt_temperature: 0.5,
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// LLM 下游步骤
pub struct LlmVideoStages {
    client: Arc<dyn TextCompletionPort>,
    config: VideoStagesConfig,
}

impl LlmVideoStages {
    pub fn new(client: Arc<dyn TextCompletionPort>, config: VideoStagesConfig) -> Self {
        Self { client, config }
    }

    async fn generate(
        &self,
        stage: &'static str,
        prompt: String,
        temperature: f32,
    ) -> Result<String, StageError> {
        let options = CompletionOptions::new(temperature).with_timeout(self.config.request_timeout);
        let output = self.client.complete(&prompt, options).await?;
        let output = output.trim();
        if output.is_empty() {
            return Err(StageError::EmptyOutput(stage));
        }

        tracing::debug!(stage, output_chars = output.chars().count(), "Stage generated");
        Ok(output.to_string())
    }
}

fn plan_prompt(chapter_title: &str, analysis: &str, processed_text: &str) -> String {
    format!(
        "基于章节分析，制定具体的视频制作计划：\n\n\
         章节标题：{chapter_title}\n\
         章节分析：\n{analysis}\n\n\
         章节要点汇总：\n{processed_text}\n\n\
         制作原则：每个视频专注1个核心观点，每个视频2-3分钟。\n\n\
         输出格式：\n\
         推荐视频数量：X个\n\
         视频1：\n标题：[15字以内]\n核心观点：[20字以内]\n故事角度：[怎么讲更有趣]\n\
         （以此类推）"
    )
}

fn script_prompt(chapter_title: &str, plan: &str) -> String {
    format!(
        "根据视频规划，为每个视频撰写完整的口播视频脚本：\n\n\
         章节标题：{chapter_title}\n\
         视频规划：\n{plan}\n\n\
         脚本结构：\n\
         **开头（15秒）**：[抓住注意力的问题或故事]\n\
         **主体（2分钟）**：[展开核心观点，配合案例]\n\
         **结尾（30秒）**：[总结和思考]"
    )
}

fn prompts_prompt(chapter_title: &str, scripts: &str) -> String {
    format!(
        "根据视频脚本，为每个关键画面生成 AI 视频提示词：\n\n\
         章节标题：{chapter_title}\n\
         视频脚本：\n{scripts}\n\n\
         每个画面输出：\n\
         **画面描述**：[场景、人物、动作]\n\
         **情绪**：[画面情绪]\n\
         即梦提示词：\n[一段可直接用于即梦AI的中文提示词]\n"
    )
}

#[async_trait]
impl VideoStagesPort for LlmVideoStages {
    async fn plan_videos(
        &self,
        chapter_title: &str,
        analysis: &str,
        processed_text: &str,
    ) -> Result<String, StageError> {
        self.generate(
            "planVideos",
            plan_prompt(chapter_title, analysis, processed_text),
            self.config.plan_temperature,
        )
        .await
    }

    async fn write_scripts(&self, chapter_title: &str, plan: &str) -> Result<String, StageError> {
        self.generate(
            "generateVideoScripts",
            script_prompt(chapter_title, plan),
            self.config.script_temperature,
        )
        .await
    }

    async fn generate_prompts(
        &self,
        chapter_title: &str,
        scripts: &str,
    ) -> Result<String, StageError> {
        self.generate(
            "generateAIPrompts",
            prompts_prompt(chapter_title, scripts),
            self.config.prompt_temperature,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::CompletionError;
    use crate::infrastructure::adapters::completion::{FakeCompletionClient, FakeReply};

    fn stages(client: FakeCompletionClient) -> LlmVideoStages {
        LlmVideoStages::new(Arc::new(client), VideoStagesConfig::default())
    }

    #[tokio::test]
    async fn test_each_stage_uses_its_prompt() {
        let client = FakeCompletionClient::fixed("unexpected")
            .with_rule("视频制作计划", FakeReply::text("推荐视频数量：2个"))
            .with_rule("口播视频脚本", FakeReply::text("**开头**：你知道吗？"))
            .with_rule("AI 视频提示词", FakeReply::text("即梦提示词：\n清晨的城市"));
        let stages = stages(client);

        assert_eq!(
            stages.plan_videos("第一章", "分析", "正文").await.unwrap(),
            "推荐视频数量：2个"
        );
        assert_eq!(
            stages.write_scripts("第一章", "规划").await.unwrap(),
            "**开头**：你知道吗？"
        );
        assert_eq!(
            stages.generate_prompts("第一章", "脚本").await.unwrap(),
            "即梦提示词：\n清晨的城市"
        );
    }

    #[tokio::test]
    async fn test_empty_output_is_error() {
        let stages = stages(FakeCompletionClient::fixed("   "));
        let err = stages.write_scripts("第一章", "规划").await.unwrap_err();
        assert!(matches!(err, StageError::EmptyOutput("generateVideoScripts")));
    }

    #[tokio::test]
    async fn test_completion_error_propagates() {
        let stages = stages(FakeCompletionClient::failing(CompletionError::Timeout));
        let err = stages.plan_videos("t", "a", "p").await.unwrap_err();
        assert!(matches!(err, StageError::Completion(CompletionError::Timeout)));
    }
}
