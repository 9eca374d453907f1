//! Fake Completion Client - 用于测试和离线运行的补全客户端
//!
//! 不访问网络，按脚本返回固定文本、回显、错误或延迟后的回复

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::application::ports::{CompletionError, CompletionOptions, TextCompletionPort};

/// 回显时保留的提示词字符数
const ECHO_CHARS: usize = 200;

/// 脚本化的回复
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// 固定文本
    Text(String),
    /// 回显提示词开头
    Echo,
    /// 返回错误
    Error(CompletionError),
    /// 等待一段时间后按内部回复处理
    Delayed(Duration, Box<FakeReply>),
}

impl FakeReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn delayed(delay: Duration, reply: FakeReply) -> Self {
        Self::Delayed(delay, Box::new(reply))
    }
}

/// Fake Completion Client
///
/// 规则按添加顺序匹配：第一个 needle 出现在提示词中的规则生效，否则使用默认回复
pub struct FakeCompletionClient {
    default_reply: FakeReply,
    rules: Vec<(String, FakeReply)>,
    calls: AtomicUsize,
}

impl FakeCompletionClient {
    pub fn new(default_reply: FakeReply) -> Self {
        Self {
            default_reply,
            rules: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// 始终返回固定文本
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::new(FakeReply::text(text))
    }

    /// 回显提示词
    pub fn echo() -> Self {
        Self::new(FakeReply::Echo)
    }

    /// 始终失败
    pub fn failing(error: CompletionError) -> Self {
        Self::new(FakeReply::Error(error))
    }

    /// 添加匹配规则
    pub fn with_rule(mut self, needle: impl Into<String>, reply: FakeReply) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    /// 已收到的请求数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn reply_for(&self, prompt: &str) -> FakeReply {
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default_reply.clone())
    }
}

#[async_trait]
impl TextCompletionPort for FakeCompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            prompt_chars = prompt.chars().count(),
            temperature = options.temperature,
            "FakeCompletionClient: scripted reply"
        );

        let mut reply = self.reply_for(prompt);
        loop {
            match reply {
                FakeReply::Text(text) => return Ok(text),
                FakeReply::Echo => {
                    let head: String = prompt.chars().take(ECHO_CHARS).collect();
                    return Ok(format!("[fake] {}", head));
                }
                FakeReply::Error(err) => return Err(err),
                FakeReply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
            }
        }
    }
}
