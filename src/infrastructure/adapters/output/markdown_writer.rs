//! Markdown Writer - 章节产物的文件系统输出
//!
//! 实现 ChapterSinkPort trait。每个章节一个目录：
//!
//! ```text
//! {output}/01-第一章 习惯/
//!   1-analysis.md
//!   2-video-plans.md
//!   3-video-scripts.md
//!   4-ai-prompts.md
//!   jimeng-prompts.txt
//! {output}/overview.md
//! ```

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{BookOverview, ChapterRecord, ChapterSinkPort, SinkError};

/// 概览文件名
pub const OVERVIEW_FILE: &str = "overview.md";

/// 即梦提示词文件名
pub const JIMENG_FILE: &str = "jimeng-prompts.txt";

static RECOMMENDED_VIDEOS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"推荐视频数量[：:]\s*(\d+)").expect("valid recommended video pattern")
});

/// Markdown 文件输出
pub struct MarkdownWriter {
    /// 输出根目录
    base_dir: PathBuf,
}

impl MarkdownWriter {
    /// 创建输出器并确保目录存在
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, SinkError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 章节目录
    pub fn chapter_dir(&self, record: &ChapterRecord) -> PathBuf {
        self.base_dir.join(format!(
            "{:02}-{}",
            record.chapter_index + 1,
            sanitize_file_name(&record.chapter_title)
        ))
    }

    async fn write_section(
        &self,
        dir: &Path,
        file_name: &str,
        heading: String,
        body: &str,
    ) -> Result<(), SinkError> {
        let content = format!("# {}\n\n{}\n", heading, body.trim_end());
        fs::write(dir.join(file_name), content).await?;
        Ok(())
    }
}

/// 把标题转换为安全的目录名
fn sanitize_file_name(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned
    }
}

/// 从提示词文本中提取即梦提示词块
///
/// 以包含「即梦提示词」或「即梦AI」的行开始，到空行、`#` 标题或 `---` 分隔线结束
pub fn extract_jimeng_prompts(prompts: &str) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_block = false;

    for line in prompts.lines() {
        if line.contains("即梦提示词") || line.contains("即梦AI") {
            in_block = true;
            continue;
        }
        if !in_block {
            continue;
        }
        if line.trim().is_empty() || line.starts_with('#') || line.starts_with("---") {
            if !current.trim().is_empty() {
                blocks.push(current.trim().to_string());
            }
            current.clear();
            in_block = false;
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    if !current.trim().is_empty() {
        blocks.push(current.trim().to_string());
    }

    blocks.join("\n\n---\n\n")
}

/// 从视频规划中解析推荐视频数量
pub fn recommended_video_count(plan: &str) -> Option<usize> {
    RECOMMENDED_VIDEOS
        .captures(plan)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn render_overview(overview: &BookOverview) -> String {
    let total_videos: usize = overview
        .completed
        .iter()
        .filter_map(|r| r.plan.as_deref().and_then(recommended_video_count))
        .sum();

    let mut out = format!("# {} - 概览\n\n", overview.document_title);
    out.push_str(&format!("- 文档 ID：{}\n", overview.document_id));
    out.push_str(&format!("- 章节总数：{}\n", overview.total_chapters));
    out.push_str(&format!("- 已完成章节：{}\n", overview.completed.len()));
    out.push_str(&format!("- 跳过章节：{}\n", overview.skipped));
    out.push_str(&format!("- 推荐视频总数：{}\n", total_videos));
    if let Some(error) = &overview.error {
        out.push_str(&format!("- 错误：{}\n", error));
    }

    out.push_str("\n## 章节\n\n");
    for record in &overview.completed {
        let videos = record
            .plan
            .as_deref()
            .and_then(recommended_video_count)
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{}. {}（推荐视频：{}）\n",
            record.chapter_index + 1,
            record.chapter_title,
            videos
        ));
    }
    out
}

#[async_trait]
impl ChapterSinkPort for MarkdownWriter {
    async fn persist(&self, record: &ChapterRecord) -> Result<(), SinkError> {
        let dir = self.chapter_dir(record);
        fs::create_dir_all(&dir).await?;
        let title = &record.chapter_title;

        self.write_section(&dir, "1-analysis.md", format!("{} - 章节分析", title), &record.analysis)
            .await?;
        if let Some(plan) = &record.plan {
            self.write_section(&dir, "2-video-plans.md", format!("{} - 视频规划", title), plan)
                .await?;
        }
        if let Some(scripts) = &record.scripts {
            self.write_section(&dir, "3-video-scripts.md", format!("{} - 视频脚本", title), scripts)
                .await?;
        }
        if let Some(prompts) = &record.prompts {
            self.write_section(&dir, "4-ai-prompts.md", format!("{} - AI视频提示词", title), prompts)
                .await?;
            fs::write(dir.join(JIMENG_FILE), extract_jimeng_prompts(prompts)).await?;
        }

        tracing::info!(
            chapter_index = record.chapter_index,
            dir = %dir.display(),
            "Chapter output saved"
        );
        Ok(())
    }

    async fn write_overview(&self, overview: &BookOverview) -> Result<(), SinkError> {
        let path = self.base_dir.join(OVERVIEW_FILE);
        fs::write(&path, render_overview(overview)).await?;
        tracing::info!(path = %path.display(), "Overview written");
        Ok(())
    }
}
