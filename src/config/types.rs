//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{ContentTypeWeights, SegmentConfig};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 章节处理阈值与超时
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// 文本补全服务配置
    #[serde(default)]
    pub llm: LlmConfig,

    /// 步骤缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 输入配置
    #[serde(default)]
    pub input: InputConfig,

    /// 输出配置
    #[serde(default)]
    pub output: OutputConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 章节处理配置
///
/// 所有长度单位都是字符数，超时单位是毫秒。
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    /// 过滤后最小内容长度
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,

    /// 超过此长度的章节走分段摘要
    #[serde(default = "default_long_chapter_threshold")]
    pub long_chapter_threshold: usize,

    /// 单个片段的硬上限（提示词中的片段也按此截断）
    #[serde(default = "default_max_segment_length")]
    pub max_segment_length: usize,

    /// 分段时的贪心累积预算，不得超过 max_segment_length
    #[serde(default = "default_segment_budget")]
    pub segment_budget: usize,

    /// 片段回退文本长度
    #[serde(default = "default_max_summary_length")]
    pub max_summary_length: usize,

    /// 摘要后最小文本长度
    #[serde(default = "default_min_processed_length")]
    pub min_processed_length: usize,

    /// 分析结果最小长度
    #[serde(default = "default_min_analysis_length")]
    pub min_analysis_length: usize,

    /// 整章回退摘录长度
    #[serde(default = "default_fallback_excerpt_length")]
    pub fallback_excerpt_length: usize,

    #[serde(default = "default_single_segment_timeout_ms")]
    pub single_segment_timeout_ms: u64,

    #[serde(default = "default_total_processing_timeout_ms")]
    pub total_processing_timeout_ms: u64,

    #[serde(default = "default_chapter_analysis_timeout_ms")]
    pub chapter_analysis_timeout_ms: u64,

    #[serde(default = "default_segment_temperature")]
    pub segment_temperature: f32,

    #[serde(default = "default_analysis_temperature")]
    pub analysis_temperature: f32,

    /// 章节价值分数阈值，范围 [0, 1]
    #[serde(default = "default_min_chapter_score")]
    pub min_chapter_score: f64,

    #[serde(default)]
    pub content_type_weights: ContentTypeWeights,
}

fn default_min_content_length() -> usize {
    500
}

fn default_long_chapter_threshold() -> usize {
    3000
}

fn default_max_segment_length() -> usize {
    3000
}

fn default_segment_budget() -> usize {
    2000
}

fn default_max_summary_length() -> usize {
    300
}

fn default_min_processed_length() -> usize {
    50
}

fn default_min_analysis_length() -> usize {
    20
}

fn default_fallback_excerpt_length() -> usize {
    1000
}

fn default_single_segment_timeout_ms() -> u64 {
    20_000
}

fn default_total_processing_timeout_ms() -> u64 {
    30_000
}

fn default_chapter_analysis_timeout_ms() -> u64 {
    25_000
}

fn default_segment_temperature() -> f32 {
    1.0
}

fn default_analysis_temperature() -> f32 {
    0.4
}

fn default_min_chapter_score() -> f64 {
    0.6
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            min_content_length: default_min_content_length(),
            long_chapter_threshold: default_long_chapter_threshold(),
            max_segment_length: default_max_segment_length(),
            segment_budget: default_segment_budget(),
            max_summary_length: default_max_summary_length(),
            min_processed_length: default_min_processed_length(),
            min_analysis_length: default_min_analysis_length(),
            fallback_excerpt_length: default_fallback_excerpt_length(),
            single_segment_timeout_ms: default_single_segment_timeout_ms(),
            total_processing_timeout_ms: default_total_processing_timeout_ms(),
            chapter_analysis_timeout_ms: default_chapter_analysis_timeout_ms(),
            segment_temperature: default_segment_temperature(),
            analysis_temperature: default_analysis_temperature(),
            min_chapter_score: default_min_chapter_score(),
            content_type_weights: ContentTypeWeights::default(),
        }
    }
}

impl ProcessingConfig {
    pub fn single_segment_timeout(&self) -> Duration {
        Duration::from_millis(self.single_segment_timeout_ms)
    }

    pub fn total_processing_timeout(&self) -> Duration {
        Duration::from_millis(self.total_processing_timeout_ms)
    }

    pub fn chapter_analysis_timeout(&self) -> Duration {
        Duration::from_millis(self.chapter_analysis_timeout_ms)
    }

    /// 分段器配置
    pub fn segment_config(&self) -> SegmentConfig {
        SegmentConfig::with_max_chars(self.segment_budget)
    }
}

/// 文本补全服务提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI 兼容的 chat completions 接口
    #[default]
    Openai,
    /// 本地假客户端（演示/离线运行）
    Fake,
}

/// 文本补全服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    /// 服务基础 URL
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// 最大重试次数
    #[serde(default)]
    pub max_retries: u32,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: None,
            max_retries: 0,
        }
    }
}

/// 缓存后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Sled,
    Memory,
}

/// 步骤缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Sled 数据目录
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/cache")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            path: default_cache_path(),
        }
    }
}

/// 输入配置
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// 章节 JSON 文件
    #[serde(default = "default_input_path")]
    pub path: PathBuf,
}

fn default_input_path() -> PathBuf {
    PathBuf::from("data/chapters.json")
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
        }
    }
}

/// 输出配置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Markdown 输出根目录
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
