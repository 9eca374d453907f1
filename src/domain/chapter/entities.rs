//! Chapter Context - Entities

use serde::{Deserialize, Serialize};

use super::{ChapterId, DocumentId};

/// 章节 - 流水线的最小处理单位
///
/// 不变量:
/// - 由外部文档解析器产生后不可修改
/// - order 决定处理顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    id: ChapterId,
    title: String,
    raw_text: String,
    order: usize,
}

impl Chapter {
    pub fn new(id: ChapterId, title: impl Into<String>, raw_text: impl Into<String>, order: usize) -> Self {
        Self {
            id,
            title: title.into(),
            raw_text: raw_text.into(),
            order,
        }
    }

    pub fn id(&self) -> &ChapterId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// 标题为空时的展示名称
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            format!("第{}章", self.order + 1)
        } else {
            self.title.trim().to_string()
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// 原始文本字符数
    pub fn char_count(&self) -> usize {
        self.raw_text.chars().count()
    }
}

/// 文档 - 一本书的章节集合
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    id: DocumentId,
    title: String,
    chapters: Vec<Chapter>,
}

impl Document {
    /// 创建文档，章节按 order 排序
    pub fn new(id: DocumentId, title: impl Into<String>, mut chapters: Vec<Chapter>) -> Self {
        chapters.sort_by_key(|c| c.order());
        Self {
            id,
            title: title.into(),
            chapters,
        }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn get_chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }
}
