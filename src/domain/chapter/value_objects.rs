//! Chapter Context - Value Objects

use serde::{Deserialize, Serialize};

/// 文档唯一标识
///
/// 由外部解析器给出；缺省时由标题和全文的 md5 推导，保证同一本书重复运行时缓存可命中
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Result<Self, &'static str> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("文档 ID 不能为空");
        }
        Ok(Self(id))
    }

    /// 根据内容生成稳定的文档 ID
    pub fn from_content(title: &str, body: &str) -> Self {
        let mut hasher = md5::Context::new();
        hasher.consume(title.as_bytes());
        hasher.consume(b"\n");
        hasher.consume(body.as_bytes());
        Self(format!("{:x}", hasher.compute()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 章节标识（文档内唯一）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChapterId(String);

impl ChapterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 使用章节顺序作为缺省 ID
    pub fn from_order(order: usize) -> Self {
        Self(format!("chapter-{}", order))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_from_content_is_stable() {
        let a = DocumentId::from_content("书名", "正文");
        let b = DocumentId::from_content("书名", "正文");
        let c = DocumentId::from_content("书名", "另一段正文");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_document_id_rejects_blank() {
        assert!(DocumentId::new("  ").is_err());
        assert!(DocumentId::new("doc-1").is_ok());
    }
}
