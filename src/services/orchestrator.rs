//! 回复编排
//!
//! 状态流转：Idle → Validating → Delegating → Resolved。调用方总能拿到一段非空文本，
//! 任何阶段的失败都会落到本地兜底。
//!
//! 内容审核不在这里做，由 HTTP 层在调用前完成。

use futures_util::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::{AppConfig, ResponseMode};
use crate::models::profile::KnowledgeProfile;
use crate::services::completion::{CompletionOutcome, CompletionService};
use crate::services::picker::ReplyPicker;
use crate::services::responder::{DEFAULT_REPLIES, DEFLECTIONS, PatternResponder};

/// 编排阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Validating,
    Delegating,
    Resolved,
}

/// 回复来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    /// 空消息的固定问候
    Greeting,
    /// 远程模型
    Remote,
    /// 远程失败后的类别兜底
    Fallback,
    /// 本地模式规则表
    Pattern,
    /// 随机默认回复
    Default,
}

impl std::fmt::Display for ReplySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReplySource::Greeting => "greeting",
            ReplySource::Remote => "remote",
            ReplySource::Fallback => "fallback",
            ReplySource::Pattern => "pattern",
            ReplySource::Default => "default",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedReply {
    pub text: String,
    pub source: ReplySource,
}

impl ResolvedReply {
    fn new(text: impl Into<String>, source: ReplySource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}

/// 回复编排器
pub struct ResponseOrchestrator {
    completion: Arc<dyn CompletionService>,
    assistant: PatternResponder,
    fallback: PatternResponder,
    picker: Arc<ReplyPicker>,
    mode: ResponseMode,
    think_delay: (u64, u64),
    delegation_timeout: Duration,
}

impl std::fmt::Debug for ResponseOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseOrchestrator")
            .field("completion", &"Arc<dyn CompletionService>")
            .field("mode", &self.mode)
            .field("think_delay", &self.think_delay)
            .field("delegation_timeout", &self.delegation_timeout)
            .finish()
    }
}

impl ResponseOrchestrator {
    pub fn new(
        config: &AppConfig,
        profile: Arc<KnowledgeProfile>,
        completion: Arc<dyn CompletionService>,
        picker: Arc<ReplyPicker>,
    ) -> Self {
        Self {
            completion,
            assistant: PatternResponder::assistant(profile.clone()),
            fallback: PatternResponder::fallback(profile),
            picker,
            mode: config.effective_mode(),
            think_delay: (config.chat.think_delay_min_ms, config.chat.think_delay_max_ms),
            delegation_timeout: config.delegation_timeout(),
        }
    }

    /// 覆盖委托超时
    pub fn with_delegation_timeout(mut self, timeout: Duration) -> Self {
        self.delegation_timeout = timeout;
        self
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    /// 建议问题列表
    pub fn suggested_questions(&self) -> &'static [&'static str] {
        self.assistant.suggestions()
    }

    /// 空消息的固定问候
    pub fn greeting(&self) -> String {
        format!(
            "👋 Hi! I'm {}'s AI assistant. Ask me anything, though I know the most about work experience, technical skills, and career goals. What would you like to know?",
            self.assistant.first_name()
        )
    }

    /// 只返回文本
    pub async fn get_response(&self, message: &str) -> String {
        self.resolve(message).await.text
    }

    /// 解析一条消息，返回回复及其来源
    pub async fn resolve(&self, message: &str) -> ResolvedReply {
        let mut stage = Stage::Idle;

        if message.trim().is_empty() {
            return ResolvedReply::new(self.greeting(), ReplySource::Greeting);
        }

        self.advance(&mut stage, Stage::Validating);
        self.think().await;

        self.advance(&mut stage, Stage::Delegating);
        let reply = match self.mode {
            ResponseMode::Remote => self.delegate_remote(message).await,
            ResponseMode::Local => self.resolve_locally(message),
        };

        self.advance(&mut stage, Stage::Resolved);
        debug!("Resolved reply via {}", reply.source);
        reply
    }

    fn advance(&self, stage: &mut Stage, next: Stage) {
        debug!("Orchestrator stage {:?} -> {:?}", stage, next);
        *stage = next;
    }

    async fn think(&self) {
        let (min, max) = self.think_delay;
        let delay = self.picker.delay_between(min, max);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn delegate_remote(&self, message: &str) -> ResolvedReply {
        let call = AssertUnwindSafe(self.completion.complete(message)).catch_unwind();

        let outcome = match tokio::time::timeout(self.delegation_timeout, call).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                error!("Completion client panicked, using fallback reply");
                CompletionOutcome::unavailable()
            }
            Err(_) => {
                warn!(
                    "Completion timed out after {:?}, using fallback reply",
                    self.delegation_timeout
                );
                CompletionOutcome::unavailable()
            }
        };

        match outcome {
            CompletionOutcome::Answered(text) if !text.trim().is_empty() => {
                ResolvedReply::new(text, ReplySource::Remote)
            }
            _ => self.fallback_reply(message),
        }
    }

    /// 远程失败后的兜底：类别段落，否则随机通用回复
    fn fallback_reply(&self, message: &str) -> ResolvedReply {
        match self.fallback.respond(message) {
            Some(text) => ResolvedReply::new(text, ReplySource::Fallback),
            None => ResolvedReply::new(self.default_reply(DEFLECTIONS), ReplySource::Default),
        }
    }

    fn resolve_locally(&self, message: &str) -> ResolvedReply {
        match self.assistant.respond(message) {
            Some(text) => ResolvedReply::new(text, ReplySource::Pattern),
            None => ResolvedReply::new(self.default_reply(DEFAULT_REPLIES), ReplySource::Default),
        }
    }

    /// 随机通用回复 + 一个随机建议问题
    fn default_reply(&self, replies: &[&str]) -> String {
        let reply = self.picker.pick(replies).copied().unwrap_or_default();
        match self.picker.pick(self.suggested_questions()) {
            Some(question) => format!("{}\n\n**Try asking**: \"{}\"", reply, question),
            None => reply.to_string(),
        }
    }
}
