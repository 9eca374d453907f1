//! Workflow State - 工作流状态与路由
//!
//! 每个节点只读 `WorkflowState`，返回 `StateUpdate`，由引擎合并。

use serde::{Deserialize, Serialize};

use crate::application::ports::ChapterRecord;

/// 工作流状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[default]
    Pending,
    Processing,
    Skip,
    Failed,
    Completed,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::Processing => "processing",
            WorkflowStatus::Skip => "skip",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

/// 整本书处理过程中的共享状态
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    pub current_chapter_index: usize,
    pub total_chapters: usize,

    // 当前章节的中间结果
    pub processed_text: Option<String>,
    pub analysis: Option<String>,
    pub plan: Option<String>,
    pub scripts: Option<String>,
    pub prompts: Option<String>,

    pub completed: Vec<ChapterRecord>,
    pub skipped: usize,
    pub status: WorkflowStatus,
    pub error: Option<String>,
}

impl WorkflowState {
    pub fn new(total_chapters: usize) -> Self {
        Self {
            total_chapters,
            ..Default::default()
        }
    }

    /// 合并节点输出，已设置的字段后写覆盖
    pub fn merge(&mut self, update: StateUpdate) {
        if let Some(v) = update.processed_text {
            self.processed_text = Some(v);
        }
        if let Some(v) = update.analysis {
            self.analysis = Some(v);
        }
        if let Some(v) = update.plan {
            self.plan = Some(v);
        }
        if let Some(v) = update.scripts {
            self.scripts = Some(v);
        }
        if let Some(v) = update.prompts {
            self.prompts = Some(v);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
        if let Some(record) = update.record {
            self.completed.push(record);
        }
        if update.count_skip {
            self.skipped += 1;
        }
        if update.advance {
            self.advance();
        }
    }

    /// 进入下一章：索引加一并清空章节字段
    fn advance(&mut self) {
        self.current_chapter_index = (self.current_chapter_index + 1).min(self.total_chapters);
        self.processed_text = None;
        self.analysis = None;
        self.plan = None;
        self.scripts = None;
        self.prompts = None;
        self.status = WorkflowStatus::Pending;
    }
}

/// 节点输出
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub processed_text: Option<String>,
    pub analysis: Option<String>,
    pub plan: Option<String>,
    pub scripts: Option<String>,
    pub prompts: Option<String>,
    pub status: Option<WorkflowStatus>,
    pub error: Option<String>,
    /// 追加到已完成列表
    pub record: Option<ChapterRecord>,
    pub count_skip: bool,
    pub advance: bool,
}

impl StateUpdate {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(WorkflowStatus::Failed),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn skip() -> Self {
        Self {
            status: Some(WorkflowStatus::Skip),
            ..Default::default()
        }
    }

    pub fn processing(processed_text: String, analysis: String) -> Self {
        Self {
            processed_text: Some(processed_text),
            analysis: Some(analysis),
            status: Some(WorkflowStatus::Processing),
            ..Default::default()
        }
    }

    pub fn plan(plan: String) -> Self {
        Self {
            plan: Some(plan),
            ..Default::default()
        }
    }

    pub fn scripts(scripts: String) -> Self {
        Self {
            scripts: Some(scripts),
            ..Default::default()
        }
    }

    pub fn prompts(prompts: String) -> Self {
        Self {
            prompts: Some(prompts),
            ..Default::default()
        }
    }

    /// 结束当前章节
    pub fn advance(record: Option<ChapterRecord>, skipped: bool) -> Self {
        Self {
            record,
            count_skip: skipped,
            advance: true,
            ..Default::default()
        }
    }
}

/// 路由结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// 失败，停止
    Halt,
    /// 所有章节处理完毕
    Complete,
    /// 跳到 SaveAndContinue
    Skip,
    /// 按顺序执行下一个节点
    Continue,
}

pub fn route(state: &WorkflowState) -> Route {
    if state.status == WorkflowStatus::Failed {
        Route::Halt
    } else if state.current_chapter_index >= state.total_chapters {
        Route::Complete
    } else if state.status == WorkflowStatus::Skip {
        Route::Skip
    } else {
        Route::Continue
    }
}

/// 工作流节点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    AnalyzeChapter,
    PlanVideos,
    GenerateScripts,
    GeneratePrompts,
    SaveAndContinue,
}

impl Node {
    pub fn next(self) -> Node {
        match self {
            Node::AnalyzeChapter => Node::PlanVideos,
            Node::PlanVideos => Node::GenerateScripts,
            Node::GenerateScripts => Node::GeneratePrompts,
            Node::GeneratePrompts => Node::SaveAndContinue,
            Node::SaveAndContinue => Node::AnalyzeChapter,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Node::AnalyzeChapter => "analyzeChapter",
            Node::PlanVideos => "planVideos",
            Node::GenerateScripts => "generateScripts",
            Node::GeneratePrompts => "generatePrompts",
            Node::SaveAndContinue => "saveAndContinue",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_order() {
        let mut state = WorkflowState::new(2);
        assert_eq!(route(&state), Route::Continue);

        state.merge(StateUpdate::skip());
        assert_eq!(route(&state), Route::Skip);

        state.merge(StateUpdate::failed("boom"));
        assert_eq!(route(&state), Route::Halt);
    }

    #[test]
    fn test_failed_wins_over_complete() {
        let mut state = WorkflowState::new(0);
        assert_eq!(route(&state), Route::Complete);
        state.merge(StateUpdate::failed("boom"));
        assert_eq!(route(&state), Route::Halt);
    }

    #[test]
    fn test_merge_is_last_write_wins() {
        let mut state = WorkflowState::new(1);
        state.merge(StateUpdate::processing("p1".into(), "a1".into()));
        state.merge(StateUpdate::plan("plan".into()));
        state.merge(StateUpdate::processing("p2".into(), "a2".into()));

        assert_eq!(state.processed_text.as_deref(), Some("p2"));
        assert_eq!(state.analysis.as_deref(), Some("a2"));
        assert_eq!(state.plan.as_deref(), Some("plan"));
        assert_eq!(state.status, WorkflowStatus::Processing);
    }

    #[test]
    fn test_advance_clears_chapter_fields() {
        let mut state = WorkflowState::new(2);
        state.merge(StateUpdate::processing("p".into(), "a".into()));
        state.merge(StateUpdate::scripts("s".into()));
        state.merge(StateUpdate::advance(None, true));

        assert_eq!(state.current_chapter_index, 1);
        assert_eq!(state.skipped, 1);
        assert!(state.processed_text.is_none());
        assert!(state.scripts.is_none());
        assert_eq!(state.status, WorkflowStatus::Pending);

        state.merge(StateUpdate::advance(None, false));
        state.merge(StateUpdate::advance(None, false));
        assert_eq!(state.current_chapter_index, 2);
        assert_eq!(route(&state), Route::Complete);
    }

    #[test]
    fn test_node_cycle() {
        let mut node = Node::AnalyzeChapter;
        let mut names = Vec::new();
        for _ in 0..5 {
            names.push(node.name());
            node = node.next();
        }
        assert_eq!(node, Node::AnalyzeChapter);
        assert_eq!(names[4], "saveAndContinue");
    }
}
