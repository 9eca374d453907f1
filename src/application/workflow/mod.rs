//! Workflow - 章节循环与下游视频步骤编排

mod engine;
mod state;

pub use engine::{chapter_scope, WorkflowEngine, WorkflowReport};
pub use state::{route, Node, Route, StateUpdate, WorkflowState, WorkflowStatus};
