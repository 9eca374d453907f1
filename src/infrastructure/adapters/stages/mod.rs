//! Video Stages Adapter - 下游生成步骤实现

mod llm_video_stages;

pub use llm_video_stages::{LlmVideoStages, VideoStagesConfig};
