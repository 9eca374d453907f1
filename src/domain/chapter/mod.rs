//! Chapter Context - 章节限界上下文
//!
//! 职责:
//! - 文档与章节实体
//! - 标识值对象

mod entities;
mod errors;
mod value_objects;

pub use entities::{Chapter, Document};
pub use errors::ChapterError;
pub use value_objects::{ChapterId, DocumentId};
