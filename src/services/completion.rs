//! 远程补全客户端
//!
//! 调用 OpenAI 兼容的 `chat/completions` 接口。首次使用时抓取个人网站并让模型
//! 生成知识摘要，结果在进程生命周期内缓存；任一步失败则缓存内置摘要，不再重试。
//!
//! 所有失败都以 [`CompletionOutcome::Unavailable`] 返回，不向调用方抛错。

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::config::{CompletionConfig, KnowledgeConfig};
use crate::error::{AppError, Result};
use crate::models::profile::KnowledgeProfile;
use crate::services::knowledge::PageFetcher;

/// 远程调用失败时展示给用户的道歉文本
pub const APOLOGY: &str = "I'm experiencing technical difficulties. Please try again.";

/// 补全结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// 模型给出的回复
    Answered(String),
    /// 软失败，附带可展示的道歉文本
    Unavailable { apology: String },
}

impl CompletionOutcome {
    pub fn unavailable() -> Self {
        CompletionOutcome::Unavailable {
            apology: APOLOGY.to_string(),
        }
    }
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// 基于知识摘要回答用户消息，永不返回错误
    async fn complete(&self, user_message: &str) -> CompletionOutcome;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// 知识摘要的来源网站
#[derive(Debug, Clone)]
struct ProfileSource {
    url: String,
    fetcher: PageFetcher,
}

/// OpenAI 兼容接口客户端
pub struct ChatCompletionClient {
    client: reqwest::Client,
    config: CompletionConfig,
    profile: Arc<KnowledgeProfile>,
    source: Option<ProfileSource>,
    knowledge: OnceCell<String>,
}

impl std::fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("authenticated", &self.config.api_token.is_some())
            .field("source", &self.source.as_ref().map(|s| s.url.as_str()))
            .field("knowledge_cached", &self.knowledge.initialized())
            .finish()
    }
}

impl ChatCompletionClient {
    pub fn new(
        config: CompletionConfig,
        knowledge: &KnowledgeConfig,
        profile: Arc<KnowledgeProfile>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let source = match &knowledge.source_url {
            Some(url) if !url.trim().is_empty() => Some(ProfileSource {
                url: url.clone(),
                fetcher: PageFetcher::new(
                    Duration::from_secs(knowledge.fetch_timeout_secs),
                    knowledge.max_page_chars,
                )?,
            }),
            _ => None,
        };

        if config.api_token.is_none() {
            warn!("No completion API token configured; requests will be sent unauthenticated");
        }

        Ok(Self {
            client,
            config,
            profile,
            source,
            knowledge: OnceCell::new(),
        })
    }

    /// 知识摘要，首次调用时计算并缓存
    pub async fn knowledge_summary(&self) -> &str {
        self.knowledge
            .get_or_init(|| self.load_knowledge_summary())
            .await
            .as_str()
    }

    async fn load_knowledge_summary(&self) -> String {
        let Some(source) = &self.source else {
            info!("No profile source configured, using built-in knowledge summary");
            return self.profile.default_summary();
        };

        info!("Loading knowledge summary from {}", source.url);
        match self.summarize_source(source).await {
            Ok(summary) => {
                info!("Knowledge summary loaded ({} chars)", summary.len());
                summary
            }
            Err(e) => {
                error!("Failed to build knowledge summary, using built-in summary: {}", e);
                self.profile.default_summary()
            }
        }
    }

    async fn summarize_source(&self, source: &ProfileSource) -> Result<String> {
        let page = source.fetcher.fetch_text(&source.url).await?;

        let prompt = format!(
            "Extract key professional information about {name} from this website content.\n\
             Focus on: work experience, skills, education, projects, contact info.\n\
             Provide a concise summary in 2-3 paragraphs that I can use to answer questions about {name}.\n\n\
             Website content: {page}",
            name = self.profile.personal.name,
            page = page
        );

        self.call_model(&[ChatMessage::user(prompt)], self.config.summary_max_tokens)
            .await
    }

    /// 系统提示词：当前时间、知识摘要和行为约束
    pub fn build_system_prompt(&self, summary: &str, now: DateTime<FixedOffset>) -> String {
        let name = &self.profile.personal.name;
        let first_name = name.split_whitespace().next().unwrap_or(name);

        format!(
            "You are {name}'s professional AI assistant. You represent {first_name} professionally and can answer any questions.\n\
             \n\
             CURRENT CONTEXT:\n\
             - Current Date & Time: {time} (UTC{offset})\n\
             - You are running live on {first_name}'s portfolio website\n\
             - This is a real-time conversation happening now\n\
             \n\
             CORE KNOWLEDGE - {name}'s Background:\n\
             {summary}\n\
             \n\
             INSTRUCTIONS:\n\
             - For work/career questions: use specific details from the background above\n\
             - For general questions: answer helpfully while keeping a professional context\n\
             - For time/date questions: use the current date/time provided above\n\
             - For technical questions: reference the specific technologies in the background above\n\
             - For personal questions: be friendly but steer back to professional topics\n\
             - Always keep a professional, knowledgeable tone\n\
             - If asked about availability, confirm that {first_name} is actively seeking opportunities\n\
             - You are powered by {model}\n\
             \n\
             Speak in the first person as {first_name} (\"I have experience with...\" not \"{first_name} has experience with...\").",
            name = name,
            first_name = first_name,
            time = now.format("%A, %B %-d, %Y at %-I:%M %p"),
            offset = now.format("%:z"),
            summary = summary,
            model = self.config.model,
        )
    }

    /// 发送一次补全请求，返回第一条 choice 的内容
    pub async fn call_model(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens,
            temperature: self.config.temperature,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Completion(format!(
                "completion endpoint returned {}: {}",
                status, error_text
            )));
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::Completion("completion response had no content".into()))
    }
}

#[async_trait]
impl CompletionService for ChatCompletionClient {
    async fn complete(&self, user_message: &str) -> CompletionOutcome {
        let summary = self.knowledge_summary().await;
        let system_prompt = self.build_system_prompt(summary, Local::now().fixed_offset());
        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(user_message)];

        match self.call_model(&messages, self.config.max_tokens).await {
            Ok(text) => {
                debug!("Completion answered ({} chars)", text.len());
                CompletionOutcome::Answered(text)
            }
            Err(e) => {
                error!("Error calling chat completion: {}", e);
                CompletionOutcome::unavailable()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_config(base_url: &str) -> CompletionConfig {
        CompletionConfig {
            base_url: base_url.to_string(),
            timeout_secs: 2,
            ..CompletionConfig::default()
        }
    }

    fn client(base_url: &str, source_url: Option<String>) -> ChatCompletionClient {
        let knowledge = KnowledgeConfig {
            source_url,
            fetch_timeout_secs: 2,
            ..KnowledgeConfig::default()
        };
        ChatCompletionClient::new(
            completion_config(base_url),
            &knowledge,
            Arc::new(KnowledgeProfile::builtin()),
        )
        .unwrap()
    }

    fn answer(text: &str) -> serde_json::Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
    }

    #[test]
    fn test_system_prompt_contents() {
        let client = client("http://127.0.0.1:9", None);
        let now = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 7, 15, 4, 0)
            .unwrap();

        let prompt = client.build_system_prompt("SUMMARY-TEXT", now);

        assert!(prompt.contains("Friday, March 7, 2025 at 3:04 PM (UTC+02:00)"));
        assert!(prompt.contains("SUMMARY-TEXT"));
        assert!(prompt.contains("first person as Jordan"));
        assert!(prompt.contains("actively seeking opportunities"));
        assert!(prompt.contains("openai/gpt-4.1-mini"));
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "openai/gpt-4.1-mini",
                "max_tokens": 800
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("I build Rust services.")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server.uri(), None);
        let outcome = client.complete("What do you do?").await;

        assert_eq!(outcome, CompletionOutcome::Answered("I build Rust services.".into()));

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "What do you do?");
    }

    #[tokio::test]
    async fn test_bearer_token_sent_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = completion_config(&server.uri());
        config.api_token = Some("secret-token".into());
        let client = ChatCompletionClient::new(
            config,
            &KnowledgeConfig::default(),
            Arc::new(KnowledgeProfile::builtin()),
        )
        .unwrap();

        assert!(matches!(
            client.complete("hi").await,
            CompletionOutcome::Answered(_)
        ));
    }

    #[tokio::test]
    async fn test_non_success_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let outcome = client(&server.uri(), None).complete("hello").await;

        assert_eq!(
            outcome,
            CompletionOutcome::Unavailable {
                apology: APOLOGY.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_and_empty_bodies_are_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("   ")))
            .mount(&server)
            .await;

        let client = client(&server.uri(), None);
        for _ in 0..3 {
            assert_eq!(client.complete("hello").await, CompletionOutcome::unavailable());
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        // port 9 (discard) is not listening
        let outcome = client("http://127.0.0.1:9", None).complete("hello").await;
        assert_eq!(outcome, CompletionOutcome::unavailable());
    }

    #[tokio::test]
    async fn test_knowledge_summary_uses_builtin_without_source() {
        let client = client("http://127.0.0.1:9", None);
        let summary = client.knowledge_summary().await;

        assert_eq!(summary, KnowledgeProfile::builtin().default_summary());
    }

    #[tokio::test]
    async fn test_knowledge_summary_fetched_once() {
        let site = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Jordan Avery</h1><p>Rust</p>"))
            .expect(1)
            .mount(&site)
            .await;

        let api = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "max_tokens": 1000 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer("Jordan writes Rust.")))
            .expect(1)
            .mount(&api)
            .await;

        let client = client(&api.uri(), Some(site.uri()));
        assert_eq!(client.knowledge_summary().await, "Jordan writes Rust.");
        assert_eq!(client.knowledge_summary().await, "Jordan writes Rust.");
    }

    #[tokio::test]
    async fn test_failed_source_caches_builtin_summary() {
        let site = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&site)
            .await;

        let client = client("http://127.0.0.1:9", Some(site.uri()));
        let expected = KnowledgeProfile::builtin().default_summary();

        assert_eq!(client.knowledge_summary().await, expected);
        // second call must not hit the site again
        assert_eq!(client.knowledge_summary().await, expected);
    }
}
