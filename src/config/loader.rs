//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（bookreel.toml / bookreel.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, CacheBackend, LlmProvider};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["bookreel", "bookreel.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `BOOKREEL_`，层级分隔符 `__`）
/// 2. 配置文件（bookreel.toml 或 bookreel.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `BOOKREEL_PROCESSING__MIN_CONTENT_LENGTH=800`
/// - `BOOKREEL_LLM__BASE_URL=http://localhost:11434/v1`
/// - `BOOKREEL_LLM__API_KEY=sk-...`
/// - `BOOKREEL_CACHE__BACKEND=memory`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("processing.min_content_length", 500)?
        .set_default("processing.long_chapter_threshold", 3000)?
        .set_default("processing.max_segment_length", 3000)?
        .set_default("processing.segment_budget", 2000)?
        .set_default("processing.max_summary_length", 300)?
        .set_default("processing.min_processed_length", 50)?
        .set_default("processing.min_analysis_length", 20)?
        .set_default("processing.fallback_excerpt_length", 1000)?
        .set_default("processing.single_segment_timeout_ms", 20_000)?
        .set_default("processing.total_processing_timeout_ms", 30_000)?
        .set_default("processing.chapter_analysis_timeout_ms", 25_000)?
        .set_default("processing.segment_temperature", 1.0)?
        .set_default("processing.analysis_temperature", 0.4)?
        .set_default("processing.min_chapter_score", 0.6)?
        .set_default("llm.provider", "openai")?
        .set_default("llm.base_url", "https://api.openai.com/v1")?
        .set_default("llm.model", "gpt-4o-mini")?
        .set_default("llm.max_retries", 0)?
        .set_default("cache.backend", "sled")?
        .set_default("cache.path", "data/cache")?
        .set_default("input.path", "data/chapters.json")?
        .set_default("output.dir", "output")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: BOOKREEL_LLM__MODEL=qwen-plus
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("BOOKREEL")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let p = &config.processing;

    if p.single_segment_timeout_ms == 0
        || p.total_processing_timeout_ms == 0
        || p.chapter_analysis_timeout_ms == 0
    {
        return Err(ConfigError::ValidationError(
            "Processing timeouts cannot be 0".to_string(),
        ));
    }

    if p.segment_budget == 0 || p.segment_budget > p.max_segment_length {
        return Err(ConfigError::ValidationError(format!(
            "segment_budget ({}) must be in 1..={} (max_segment_length)",
            p.segment_budget, p.max_segment_length
        )));
    }

    if !(0.0..=1.0).contains(&p.min_chapter_score) {
        return Err(ConfigError::ValidationError(format!(
            "min_chapter_score must be within [0, 1], got {}",
            p.min_chapter_score
        )));
    }

    if config.llm.provider == LlmProvider::Openai && config.llm.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "LLM base URL cannot be empty".to_string(),
        ));
    }

    if config.output.dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    let p = &config.processing;
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Input: {:?}", config.input.path);
    tracing::info!("Output Directory: {:?}", config.output.dir);
    tracing::info!("LLM Provider: {:?}", config.llm.provider);
    tracing::info!("LLM Base URL: {}", config.llm.base_url);
    tracing::info!("LLM Model: {}", config.llm.model);
    tracing::info!("LLM API Key: {}", if config.llm.api_key.is_some() { "set" } else { "unset" });
    tracing::info!("Cache Backend: {:?}", config.cache.backend);
    if config.cache.backend == CacheBackend::Sled {
        tracing::info!("Cache Path: {:?}", config.cache.path);
    }
    tracing::info!(
        "Thresholds: min_content={} long_chapter={} min_score={}",
        p.min_content_length,
        p.long_chapter_threshold,
        p.min_chapter_score
    );
    tracing::info!(
        "Segments: budget={} max={} summary_fallback={}",
        p.segment_budget,
        p.max_segment_length,
        p.max_summary_length
    );
    tracing::info!(
        "Timeouts: segment={}ms total={}ms analysis={}ms",
        p.single_segment_timeout_ms,
        p.total_processing_timeout_ms,
        p.chapter_analysis_timeout_ms
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_timeout() {
        let mut config = AppConfig::default();
        config.processing.single_segment_timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_budget_above_max() {
        let mut config = AppConfig::default();
        config.processing.segment_budget = 3500;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_score_out_of_range() {
        let mut config = AppConfig::default();
        config.processing.min_chapter_score = 1.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_base_url() {
        let mut config = AppConfig::default();
        config.llm.base_url = String::new();
        assert!(validate_config(&config).is_err());

        // 假客户端不需要 URL
        config.llm.provider = LlmProvider::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_empty_output_dir() {
        let mut config = AppConfig::default();
        config.output.dir = std::path::PathBuf::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[processing]\nmin_content_length = 800\n\n[processing.content_type_weights]\npractical = 0.5\n\n[llm]\nprovider = \"fake\"\n\n[cache]\nbackend = \"memory\""
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.processing.min_content_length, 800);
        assert_eq!(config.processing.long_chapter_threshold, 3000);
        assert_eq!(config.processing.content_type_weights.practical, 0.5);
        assert_eq!(config.processing.content_type_weights.academic, 0.25);
        assert_eq!(config.llm.provider, LlmProvider::Fake);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
    }
}
