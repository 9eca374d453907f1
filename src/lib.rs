//! Bookreel - 书籍章节到短视频素材的处理流水线
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Chapter Context: 文档与章节
//! - 内容过滤、价值评分、分段
//!
//! 应用层 (application/):
//! - Ports: 端口定义（TextCompletion, StateCache, VideoStages, ChapterSink, DocumentSource）
//! - Pipeline: 单章处理（过滤 → 评分 → 分段摘要 → 分析）
//! - Workflow: 章节循环与下游视频步骤
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: 补全客户端、视频步骤、Markdown 输出、JSON 文档来源
//! - Memory: 内存步骤缓存
//! - Persistence: Sled 步骤缓存

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
