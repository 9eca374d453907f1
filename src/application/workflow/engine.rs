//! Workflow Engine - 整本书的章节循环
//!
//! AnalyzeChapter → PlanVideos → GenerateScripts → GeneratePrompts → SaveAndContinue，
//! 每个节点执行后合并状态并路由。

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::state::{route, Node, Route, StateUpdate, WorkflowState, WorkflowStatus};
use crate::application::error::PipelineError;
use crate::application::pipeline::ChapterPipeline;
use crate::application::ports::{
    get_typed, set_typed, steps, BookOverview, ChapterRecord, ChapterSinkPort, StageError,
    StateCachePort, VideoStagesPort,
};
use crate::domain::{Chapter, ChapterError, ChapterOutcome, Document};

/// 一次运行的结果
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub document_id: String,
    pub document_title: String,
    pub status: WorkflowStatus,
    pub total_chapters: usize,
    pub completed: Vec<ChapterRecord>,
    pub skipped: usize,
    pub error: Option<String>,
    /// 失败时所在的章节索引
    pub stopped_at: Option<usize>,
}

impl WorkflowReport {
    pub fn is_success(&self) -> bool {
        self.status == WorkflowStatus::Completed
    }

    pub fn overview(&self) -> BookOverview {
        BookOverview {
            document_id: self.document_id.clone(),
            document_title: self.document_title.clone(),
            total_chapters: self.total_chapters,
            skipped: self.skipped,
            completed: self.completed.clone(),
            error: self.error.clone(),
        }
    }
}

/// 工作流引擎
pub struct WorkflowEngine {
    pipeline: ChapterPipeline,
    stages: Arc<dyn VideoStagesPort>,
    cache: Arc<dyn StateCachePort>,
    sink: Arc<dyn ChapterSinkPort>,
}

impl WorkflowEngine {
    pub fn new(
        pipeline: ChapterPipeline,
        stages: Arc<dyn VideoStagesPort>,
        cache: Arc<dyn StateCachePort>,
        sink: Arc<dyn ChapterSinkPort>,
    ) -> Self {
        Self {
            pipeline,
            stages,
            cache,
            sink,
        }
    }

    /// 处理整本书
    ///
    /// 失败或取消时停止，已完成的章节仍会写入概览。
    pub async fn run(&self, document: &Document, cancel: &CancellationToken) -> WorkflowReport {
        let span = tracing::info_span!(
            "workflow",
            run_id = %Uuid::new_v4(),
            document = %document.id()
        );
        self.run_inner(document, cancel).instrument(span).await
    }

    async fn run_inner(&self, document: &Document, cancel: &CancellationToken) -> WorkflowReport {
        let mut state = WorkflowState::new(document.chapter_count());
        tracing::info!(
            title = %document.title(),
            chapters = state.total_chapters,
            "Workflow started"
        );

        let mut node = Node::AnalyzeChapter;
        loop {
            match route(&state) {
                Route::Halt => break,
                Route::Complete => {
                    state.status = WorkflowStatus::Completed;
                    break;
                }
                Route::Skip => node = Node::SaveAndContinue,
                Route::Continue => {}
            }

            let update = if cancel.is_cancelled() {
                StateUpdate::failed(PipelineError::Cancelled.to_string())
            } else {
                match self.execute(node, document, &state, cancel).await {
                    Ok(update) => update,
                    Err(e) => {
                        tracing::error!(
                            node = node.name(),
                            chapter_index = state.current_chapter_index,
                            error = %e,
                            "Workflow node failed"
                        );
                        StateUpdate::failed(e.to_string())
                    }
                }
            };

            state.merge(update);
            node = node.next();
        }

        let report = WorkflowReport {
            document_id: document.id().to_string(),
            document_title: document.title().to_string(),
            status: state.status,
            total_chapters: state.total_chapters,
            stopped_at: (state.status == WorkflowStatus::Failed)
                .then_some(state.current_chapter_index),
            completed: state.completed,
            skipped: state.skipped,
            error: state.error,
        };

        if let Err(e) = self.sink.write_overview(&report.overview()).await {
            tracing::error!(error = %e, "Failed to write overview");
        }

        let stats = self.cache.stats().await;
        tracing::info!(
            status = %report.status,
            completed = report.completed.len(),
            skipped = report.skipped,
            cache_hits = stats.hit_count,
            cache_misses = stats.miss_count,
            "Workflow finished"
        );

        report
    }

    async fn execute(
        &self,
        node: Node,
        document: &Document,
        state: &WorkflowState,
        cancel: &CancellationToken,
    ) -> Result<StateUpdate, PipelineError> {
        let index = state.current_chapter_index;
        let chapter = current_chapter(document, index)?;
        let scope = chapter_scope(document, chapter);
        let title = chapter.display_title();

        tracing::debug!(node = node.name(), chapter_index = index, "Running node");

        match node {
            Node::AnalyzeChapter => {
                let update = match self.pipeline.process(&scope, chapter, cancel).await {
                    ChapterOutcome::Processing {
                        processed_text,
                        analysis,
                    } => StateUpdate::processing(processed_text, analysis),
                    ChapterOutcome::Skip { reason } => {
                        tracing::info!(chapter = %title, reason = %reason, "Chapter skipped");
                        StateUpdate::skip()
                    }
                    ChapterOutcome::Failed { message } => StateUpdate::failed(message),
                };
                Ok(update)
            }
            Node::PlanVideos => {
                let analysis = require(&state.analysis, "analysis", node)?;
                let processed = require(&state.processed_text, "processed text", node)?;
                let plan = self
                    .cached_stage(
                        &scope,
                        steps::PLAN_VIDEOS,
                        cancel,
                        self.stages.plan_videos(&title, analysis, processed),
                    )
                    .await?;
                Ok(StateUpdate::plan(plan))
            }
            Node::GenerateScripts => {
                let plan = require(&state.plan, "video plan", node)?;
                let scripts = self
                    .cached_stage(
                        &scope,
                        steps::GENERATE_VIDEO_SCRIPTS,
                        cancel,
                        self.stages.write_scripts(&title, plan),
                    )
                    .await?;
                Ok(StateUpdate::scripts(scripts))
            }
            Node::GeneratePrompts => {
                let scripts = require(&state.scripts, "video scripts", node)?;
                let prompts = self
                    .cached_stage(
                        &scope,
                        steps::GENERATE_AI_PROMPTS,
                        cancel,
                        self.stages.generate_prompts(&title, scripts),
                    )
                    .await?;
                Ok(StateUpdate::prompts(prompts))
            }
            Node::SaveAndContinue => self.save_and_continue(index, title, state).await,
        }
    }

    async fn save_and_continue(
        &self,
        index: usize,
        title: String,
        state: &WorkflowState,
    ) -> Result<StateUpdate, PipelineError> {
        if state.status != WorkflowStatus::Processing {
            return Ok(StateUpdate::advance(None, state.status == WorkflowStatus::Skip));
        }

        let record = ChapterRecord {
            chapter_index: index,
            chapter_title: title,
            analysis: state.analysis.clone().unwrap_or_default(),
            processed_text: state.processed_text.clone().unwrap_or_default(),
            plan: state.plan.clone(),
            scripts: state.scripts.clone(),
            prompts: state.prompts.clone(),
        };
        self.sink.persist(&record).await?;

        tracing::info!(
            chapter_index = index,
            chapter = %record.chapter_title,
            progress = %format!("{}/{}", index + 1, state.total_chapters),
            "Chapter completed"
        );
        Ok(StateUpdate::advance(Some(record), false))
    }

    /// 带缓存执行下游步骤
    async fn cached_stage<F>(
        &self,
        scope: &str,
        step: &'static str,
        cancel: &CancellationToken,
        stage: F,
    ) -> Result<String, PipelineError>
    where
        F: Future<Output = Result<String, StageError>>,
    {
        match get_typed::<String>(self.cache.as_ref(), scope, step).await {
            Ok(Some(cached)) => {
                tracing::info!(scope = %scope, step, "Step loaded from cache");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(scope = %scope, step, error = %e, "Cache read failed"),
        }

        let output = tokio::select! {
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            result = stage => result?,
        };

        if let Err(e) = set_typed(self.cache.as_ref(), scope, step, output.as_str()).await {
            tracing::warn!(scope = %scope, step, error = %e, "Failed to cache step result");
        }
        Ok(output)
    }
}

/// 章节缓存作用域
pub fn chapter_scope(document: &Document, chapter: &Chapter) -> String {
    format!("{}:{}", document.id(), chapter.id())
}

fn current_chapter(document: &Document, index: usize) -> Result<&Chapter, ChapterError> {
    document
        .get_chapter(index)
        .ok_or(ChapterError::IndexOutOfRange {
            index,
            total: document.chapter_count(),
        })
}

fn require<'a>(
    value: &'a Option<String>,
    what: &str,
    node: Node,
) -> Result<&'a str, PipelineError> {
    value
        .as_deref()
        .ok_or_else(|| PipelineError::structural(format!("Missing {} for {}", what, node.name())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{CacheError, CacheStats, CompletionError, SinkError, StoredValue};
    use crate::config::ProcessingConfig;
    use crate::domain::{ChapterId, DocumentId};
    use crate::infrastructure::adapters::completion::{FakeCompletionClient, FakeReply};
    use crate::infrastructure::adapters::stages::{LlmVideoStages, VideoStagesConfig};
    use crate::infrastructure::memory::InMemoryStateCache;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    const ANALYSIS: &str = "核心观点数量：2个\n推荐视频数量：2个\n主要观点：决策需要数据支撑。";
    const PLAN: &str = "推荐视频数量：2个\n视频1：\n标题：用数据做决定";
    const SCRIPTS: &str = "**开头（15秒）**：你做决定靠直觉吗？";
    const PROMPTS: &str = "**画面描述**：会议室\n即梦提示词：\n明亮的会议室里，团队围着数据图表讨论";

    #[derive(Default)]
    struct RecordingSink {
        records: Mutex<Vec<ChapterRecord>>,
        overviews: Mutex<Vec<BookOverview>>,
    }

    #[async_trait]
    impl ChapterSinkPort for RecordingSink {
        async fn persist(&self, record: &ChapterRecord) -> Result<(), SinkError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn write_overview(&self, overview: &BookOverview) -> Result<(), SinkError> {
            self.overviews.lock().unwrap().push(overview.clone());
            Ok(())
        }
    }

    /// 读写都失败的缓存
    struct BrokenCache;

    #[async_trait]
    impl StateCachePort for BrokenCache {
        async fn get(&self, _: &str, _: &str) -> Result<Option<StoredValue>, CacheError> {
            Err(CacheError::DatabaseError("unavailable".into()))
        }

        async fn set(&self, _: &str, _: &str, _: StoredValue) -> Result<(), CacheError> {
            Err(CacheError::DatabaseError("unavailable".into()))
        }

        async fn remove(&self, _: &str, _: &str) -> Result<(), CacheError> {
            Err(CacheError::DatabaseError("unavailable".into()))
        }

        async fn stats(&self) -> CacheStats {
            CacheStats::default()
        }
    }

    struct Harness {
        engine: WorkflowEngine,
        client: Arc<FakeCompletionClient>,
        cache: Arc<InMemoryStateCache>,
        sink: Arc<RecordingSink>,
    }

    fn scripted_client() -> FakeCompletionClient {
        FakeCompletionClient::fixed(ANALYSIS)
            .with_rule("AI 视频提示词", FakeReply::text(PROMPTS))
            .with_rule("口播视频脚本", FakeReply::text(SCRIPTS))
            .with_rule("视频制作计划", FakeReply::text(PLAN))
    }

    fn harness_with(client: FakeCompletionClient, cache: Arc<InMemoryStateCache>) -> Harness {
        let client = Arc::new(client);
        let sink = Arc::new(RecordingSink::default());
        let pipeline = ChapterPipeline::new(
            client.clone(),
            cache.clone(),
            Arc::new(ProcessingConfig::default()),
        );
        let stages = Arc::new(LlmVideoStages::new(client.clone(), VideoStagesConfig::default()));
        let engine = WorkflowEngine::new(pipeline, stages, cache.clone(), sink.clone());
        Harness {
            engine,
            client,
            cache,
            sink,
        }
    }

    fn harness(client: FakeCompletionClient) -> Harness {
        harness_with(client, InMemoryStateCache::new().arc())
    }

    fn valuable_text(seed: usize) -> String {
        (0..20)
            .map(|i| format!("这项研究分析了团队管理中的决策方法，并用实验数据验证了结论（案例{}-{}）。", seed, i))
            .collect()
    }

    fn document(chapters: Vec<Chapter>) -> Document {
        Document::new(DocumentId::new("doc-1").unwrap(), "决策之书", chapters)
    }

    fn valuable(order: usize) -> Chapter {
        Chapter::new(ChapterId::from_order(order), format!("第{}章 决策", order + 1), valuable_text(order), order)
    }

    fn too_short(order: usize) -> Chapter {
        Chapter::new(ChapterId::from_order(order), "前言", "很短的前言。", order)
    }

    #[tokio::test]
    async fn test_all_chapters_flow_through_stages() {
        let h = harness(scripted_client());
        let doc = document(vec![valuable(0), valuable(1)]);

        let report = h.engine.run(&doc, &CancellationToken::new()).await;

        assert!(report.is_success());
        assert_eq!(report.completed.len(), 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.completed[1].chapter_index, 1);

        let record = &report.completed[0];
        assert_eq!(record.analysis, ANALYSIS);
        assert_eq!(record.plan.as_deref(), Some(PLAN));
        assert_eq!(record.scripts.as_deref(), Some(SCRIPTS));
        assert_eq!(record.prompts.as_deref(), Some(PROMPTS));

        // 每章：分析 + 3 个下游步骤
        assert_eq!(h.client.call_count(), 8);
        assert_eq!(h.sink.records.lock().unwrap().len(), 2);
        assert_eq!(h.sink.overviews.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_skipped_chapter_goes_straight_to_save() {
        let h = harness(scripted_client());
        let doc = document(vec![too_short(0), valuable(1)]);

        let report = h.engine.run(&doc, &CancellationToken::new()).await;

        assert!(report.is_success());
        assert_eq!(report.skipped, 1);
        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.completed[0].chapter_index, 1);
        // 跳过的章节不调用任何服务
        assert_eq!(h.client.call_count(), 4);
    }

    #[tokio::test]
    async fn test_stage_failure_halts_workflow() {
        let client = FakeCompletionClient::fixed(ANALYSIS).with_rule(
            "视频制作计划",
            FakeReply::Error(CompletionError::ServiceError("quota exceeded".into())),
        );
        let h = harness(client);
        let doc = document(vec![valuable(0), valuable(1)]);

        let report = h.engine.run(&doc, &CancellationToken::new()).await;

        assert_eq!(report.status, WorkflowStatus::Failed);
        assert_eq!(report.stopped_at, Some(0));
        assert!(report.error.as_deref().unwrap().contains("quota exceeded"));
        assert!(report.completed.is_empty());
        // 第二章不会被处理
        assert_eq!(h.client.call_count(), 2);
        assert!(h.sink.records.lock().unwrap().is_empty());
        assert_eq!(h.sink.overviews.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_chapter_halts_workflow() {
        let h = harness(scripted_client());
        let blank = Chapter::new(ChapterId::from_order(0), "第一章", "   ", 0);
        let doc = document(vec![blank, valuable(1)]);

        let report = h.engine.run(&doc, &CancellationToken::new()).await;

        assert_eq!(report.status, WorkflowStatus::Failed);
        assert_eq!(report.stopped_at, Some(0));
        assert_eq!(h.client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_document_completes_immediately() {
        let h = harness(scripted_client());
        let report = h.engine.run(&document(Vec::new()), &CancellationToken::new()).await;

        assert!(report.is_success());
        assert_eq!(report.total_chapters, 0);
        assert_eq!(h.client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let h = harness(scripted_client());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = h.engine.run(&document(vec![valuable(0)]), &cancel).await;

        assert_eq!(report.status, WorkflowStatus::Failed);
        assert_eq!(report.error.as_deref(), Some("cancelled"));
        assert_eq!(h.client.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_stage_halts() {
        let client = FakeCompletionClient::fixed(ANALYSIS).with_rule(
            "视频制作计划",
            FakeReply::delayed(Duration::from_secs(60), FakeReply::text(PLAN)),
        );
        let h = harness(client);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });

        let report = h.engine.run(&document(vec![valuable(0)]), &cancel).await;

        assert_eq!(report.status, WorkflowStatus::Failed);
        assert_eq!(report.error.as_deref(), Some("cancelled"));
        assert!(h
            .cache
            .get("doc-1:chapter-0", steps::PLAN_VIDEOS)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_rerun_reuses_cached_steps() {
        let cache = InMemoryStateCache::new().arc();
        let doc = document(vec![valuable(0)]);

        let first = harness_with(scripted_client(), cache.clone());
        first.engine.run(&doc, &CancellationToken::new()).await;
        assert_eq!(first.client.call_count(), 4);

        let second = harness_with(scripted_client(), cache.clone());
        let report = second.engine.run(&doc, &CancellationToken::new()).await;

        assert!(report.is_success());
        assert_eq!(report.completed[0].prompts.as_deref(), Some(PROMPTS));
        assert_eq!(second.client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cached_plan_is_used_for_scripts() {
        let cache = InMemoryStateCache::new().arc();
        set_typed(cache.as_ref(), "doc-1:chapter-0", steps::PLAN_VIDEOS, "缓存中的规划")
            .await
            .unwrap();
        let h = harness_with(scripted_client(), cache);

        let report = h.engine.run(&document(vec![valuable(0)]), &CancellationToken::new()).await;

        assert_eq!(report.completed[0].plan.as_deref(), Some("缓存中的规划"));
        // 分析 + 脚本 + 提示词
        assert_eq!(h.client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_cache_failures_do_not_fail_the_run() {
        let client = Arc::new(scripted_client());
        let cache: Arc<dyn StateCachePort> = Arc::new(BrokenCache);
        let sink = Arc::new(RecordingSink::default());
        let pipeline = ChapterPipeline::new(
            client.clone(),
            cache.clone(),
            Arc::new(ProcessingConfig::default()),
        );
        let stages = Arc::new(LlmVideoStages::new(client.clone(), VideoStagesConfig::default()));
        let engine = WorkflowEngine::new(pipeline, stages, cache, sink.clone());

        let report = engine.run(&document(vec![valuable(0)]), &CancellationToken::new()).await;

        assert!(report.is_success());
        assert_eq!(report.completed[0].prompts.as_deref(), Some(PROMPTS));
        assert_eq!(client.call_count(), 4);
        assert_eq!(sink.records.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_chapter_scope_layout() {
        let doc = document(vec![valuable(3)]);
        assert_eq!(chapter_scope(&doc, &doc.chapters()[0]), "doc-1:chapter-3");
    }
}
