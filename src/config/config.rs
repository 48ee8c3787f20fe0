use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 请求超时（秒）
    pub request_timeout: u64,
    /// 最大请求体大小（字节）
    pub max_request_size: usize,
    /// CORS 允许的来源，`*` 表示任意来源
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            request_timeout: 60,
            max_request_size: 64 * 1024,
            cors_allowed_origins: vec!["*".into()],
        }
    }
}

/// 远程补全接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// 是否启用远程模型
    pub enabled: bool,
    /// OpenAI 兼容接口地址（不含 `chat/completions`）
    pub base_url: String,
    /// 模型名称
    pub model: String,
    /// Bearer token，缺省时回退到 `GITHUB_TOKEN`
    pub api_token: Option<String>,
    /// 采样温度
    pub temperature: f32,
    /// 对话回复的 token 上限
    pub max_tokens: u32,
    /// 知识摘要请求的 token 上限
    pub summary_max_tokens: u32,
    /// 单次外呼超时（秒）
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://models.github.ai/inference".into(),
            model: "openai/gpt-4.1-mini".into(),
            api_token: None,
            temperature: 0.7,
            max_tokens: 800,
            summary_max_tokens: 1000,
            timeout_secs: 20,
        }
    }
}

/// 知识库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// 个人网站地址，用于生成知识摘要；未配置时直接使用内置摘要
    pub source_url: Option<String>,
    /// 网站抓取超时（秒）
    pub fetch_timeout_secs: u64,
    /// 网页正文字符上限
    pub max_page_chars: usize,
    /// JSON 格式的简历文件，未配置时使用内置简历
    pub profile_path: Option<PathBuf>,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            source_url: None,
            fetch_timeout_secs: 10,
            max_page_chars: 8000,
            profile_path: None,
        }
    }
}

/// 回复模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// 先调用远程模型，失败后走关键词兜底
    #[default]
    Remote,
    /// 只使用本地规则表
    Local,
}

impl std::fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseMode::Remote => write!(f, "remote"),
            ResponseMode::Local => write!(f, "local"),
        }
    }
}

/// 对话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// 模拟思考延迟下限（毫秒）
    pub think_delay_min_ms: u64,
    /// 模拟思考延迟上限（毫秒）
    pub think_delay_max_ms: u64,
    /// 随机数种子，未设置时使用系统熵
    pub rng_seed: Option<u64>,
    /// 回复模式
    pub mode: ResponseMode,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            think_delay_min_ms: 500,
            think_delay_max_ms: 1500,
            rng_seed: None,
            mode: ResponseMode::Remote,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            structured: false,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 远程补全配置
    pub completion: CompletionConfig,
    /// 知识库配置
    pub knowledge: KnowledgeConfig,
    /// 对话配置
    pub chat: ChatConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".into();
        config
    }

    /// 创建测试配置：无延迟、固定种子、不访问网络
    pub fn testing() -> Self {
        let mut config = Self::default();
        config.chat.think_delay_min_ms = 0;
        config.chat.think_delay_max_ms = 0;
        config.chat.rng_seed = Some(7);
        config.completion.timeout_secs = 2;
        config.knowledge.fetch_timeout_secs = 2;
        config
    }

    /// 实际生效的回复模式；远程模型关闭时强制本地模式
    pub fn effective_mode(&self) -> ResponseMode {
        if self.completion.enabled {
            self.chat.mode
        } else {
            ResponseMode::Local
        }
    }

    /// 远程委托的总时限
    ///
    /// 首次调用最多串行三次外呼：抓取网站、生成摘要、回答问题，外加 1 秒余量。
    /// 超时值来自环境变量，按饱和运算避免溢出。
    pub fn delegation_timeout(&self) -> Duration {
        let secs = self
            .knowledge
            .fetch_timeout_secs
            .saturating_add(self.completion.timeout_secs.saturating_mul(2))
            .saturating_add(1);
        Duration::from_secs(secs)
    }

    /// 单次对话请求的最长耗时：思考延迟上限，远程模式再加委托时限
    pub fn reply_budget(&self) -> Duration {
        let think = Duration::from_millis(self.chat.think_delay_max_ms);
        match self.effective_mode() {
            ResponseMode::Remote => think.saturating_add(self.delegation_timeout()),
            ResponseMode::Local => think,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_portfolio_deployment() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.completion.max_tokens, 800);
        assert_eq!(config.knowledge.max_page_chars, 8000);
        assert_eq!(config.chat.mode, ResponseMode::Remote);
    }

    #[test]
    fn test_disabled_completion_forces_local_mode() {
        let mut config = AppConfig::testing();
        assert_eq!(config.effective_mode(), ResponseMode::Remote);

        config.completion.enabled = false;
        assert_eq!(config.effective_mode(), ResponseMode::Local);
    }

    #[test]
    fn test_reply_budget_covers_delegation_and_think_delay() {
        let config = AppConfig::default();
        assert_eq!(config.delegation_timeout(), Duration::from_secs(51));
        assert_eq!(config.reply_budget(), Duration::from_millis(52_500));

        let mut config = AppConfig::default();
        config.completion.enabled = false;
        assert_eq!(config.reply_budget(), Duration::from_millis(1500));
    }

    #[test]
    fn test_delegation_timeout_saturates() {
        let mut config = AppConfig::default();
        config.knowledge.fetch_timeout_secs = u64::MAX;
        config.completion.timeout_secs = u64::MAX / 2 + 1;

        assert_eq!(config.delegation_timeout(), Duration::from_secs(u64::MAX));
        assert!(config.reply_budget() >= Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_response_mode_deserializes_lowercase() {
        let mode: ResponseMode = serde_json::from_str("\"local\"").unwrap();
        assert_eq!(mode, ResponseMode::Local);
        assert_eq!(mode.to_string(), "local");
    }
}
