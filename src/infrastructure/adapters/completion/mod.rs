//! Completion Adapter - 文本补全客户端实现

mod fake_completion_client;
mod http_completion_client;

pub use fake_completion_client::{FakeCompletionClient, FakeReply};
pub use http_completion_client::{HttpCompletionClient, HttpCompletionClientConfig};
