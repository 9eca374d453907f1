//! Document Source Adapter

mod json_document;

pub use json_document::{parse_document, JsonDocumentSource};
