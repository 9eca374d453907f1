//! Bookreel - 书籍章节 → 短视频素材
//!
//! 用法: `bookreel [chapters.json]`
//!
//! 读取已切好章节的 JSON 文档，逐章处理并把结果写入输出目录。

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use bookreel::application::ports::{
    DocumentSourcePort, StateCachePort, TextCompletionPort,
};
use bookreel::application::{ChapterPipeline, WorkflowEngine};
use bookreel::config::{load_config, print_config, AppConfig, CacheBackend, LlmProvider};
use bookreel::infrastructure::adapters::{
    FakeCompletionClient, HttpCompletionClient, HttpCompletionClientConfig, JsonDocumentSource,
    LlmVideoStages, MarkdownWriter, VideoStagesConfig,
};
use bookreel::infrastructure::memory::InMemoryStateCache;
use bookreel::infrastructure::persistence::sled::{SledCacheConfig, SledStateCache};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let mut config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 命令行参数覆盖输入路径
    if let Some(path) = std::env::args().nth(1) {
        config.input.path = PathBuf::from(path);
    }

    init_tracing(&config);

    tracing::info!("Bookreel - 书籍章节短视频素材生成");
    print_config(&config);

    // 创建文本补全客户端
    let client: Arc<dyn TextCompletionPort> = match config.llm.provider {
        LlmProvider::Openai => {
            let client_config =
                HttpCompletionClientConfig::new(&config.llm.base_url, &config.llm.model)
                    .with_api_key(config.llm.api_key.clone())
                    .with_max_retries(config.llm.max_retries);
            let client = HttpCompletionClient::new(client_config)?;
            if !client.health_check().await {
                tracing::warn!(
                    base_url = %config.llm.base_url,
                    "Completion service health check failed, requests may fail"
                );
            }
            Arc::new(client)
        }
        LlmProvider::Fake => {
            tracing::warn!("Using fake completion client, outputs are placeholders");
            Arc::new(FakeCompletionClient::echo())
        }
    };

    // 创建步骤缓存
    let cache: Arc<dyn StateCachePort> = match config.cache.backend {
        CacheBackend::Sled => {
            if let Some(parent) = config.cache.path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let cache_config = SledCacheConfig {
                db_path: config.cache.path.display().to_string(),
            };
            Arc::new(SledStateCache::new(&cache_config)?)
        }
        CacheBackend::Memory => InMemoryStateCache::new().arc(),
    };

    // 加载文档
    let source = JsonDocumentSource::new(&config.input.path);
    let document = source.load().await?;

    let processing = Arc::new(config.processing.clone());
    let pipeline = ChapterPipeline::new(client.clone(), cache.clone(), processing);
    let stages = Arc::new(LlmVideoStages::new(client, VideoStagesConfig::default()));
    let writer = Arc::new(MarkdownWriter::new(&config.output.dir).await?);
    let engine = WorkflowEngine::new(pipeline, stages, cache, writer);

    // Ctrl-C 取消当前运行
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal");
            signal_token.cancel();
        }
    });

    let report = engine.run(&document, &cancel).await;

    tracing::info!(
        completed = report.completed.len(),
        skipped = report.skipped,
        total = report.total_chapters,
        output = %config.output.dir.display(),
        "Run finished"
    );

    if !report.is_success() {
        anyhow::bail!(
            "Workflow failed at chapter {}: {}",
            report.stopped_at.map(|i| i + 1).unwrap_or_default(),
            report.error.unwrap_or_default()
        );
    }

    Ok(())
}

/// 初始化日志，`RUST_LOG` 优先于配置
fn init_tracing(config: &AppConfig) {
    let log_filter = format!("{},bookreel={}", config.log.level, config.log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
