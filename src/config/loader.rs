use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 合并顺序：
    /// 1. 内置默认值
    /// 2. ./folio.toml
    /// 3. `FOLIO_` 前缀的环境变量（`__` 分隔层级）
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::load_from(default_config_path())
    }

    /// 从指定路径加载配置
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig, figment::Error> {
        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("FOLIO_").split("__"));

        let mut config: AppConfig = figment.extract()?;
        Self::apply_token_fallback(&mut config, std::env::var("GITHUB_TOKEN").ok());
        Ok(config)
    }

    /// 未显式配置 token 时使用 `GITHUB_TOKEN`
    fn apply_token_fallback(config: &mut AppConfig, env_token: Option<String>) {
        let missing = config
            .completion
            .api_token
            .as_deref()
            .map(|t| t.trim().is_empty())
            .unwrap_or(true);

        if missing {
            config.completion.api_token = env_token.filter(|t| !t.trim().is_empty());
        }
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.chat.think_delay_min_ms > config.chat.think_delay_max_ms {
            return Err(ConfigValidationError::InvalidDelayRange {
                min: config.chat.think_delay_min_ms,
                max: config.chat.think_delay_max_ms,
            });
        }

        let completion = &config.completion;
        if !(0.0..=2.0).contains(&completion.temperature) {
            return Err(ConfigValidationError::InvalidTemperature(
                completion.temperature,
            ));
        }

        if completion.max_tokens == 0 || completion.summary_max_tokens == 0 {
            return Err(ConfigValidationError::InvalidTokenLimit);
        }

        if completion.enabled && (completion.base_url.trim().is_empty() || completion.model.trim().is_empty()) {
            return Err(ConfigValidationError::MissingCompletionEndpoint);
        }

        // HTTP 层超时必须晚于编排器自身的兜底，否则访客收到空的 408
        let required = config.reply_budget();
        if Duration::from_secs(config.server.request_timeout) <= required {
            return Err(ConfigValidationError::RequestTimeoutTooShort {
                request_secs: config.server.request_timeout,
                required_ms: required.as_millis(),
            });
        }

        if let Some(path) = &config.knowledge.profile_path {
            if !path.exists() {
                return Err(ConfigValidationError::InvalidPath(
                    path.display().to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("思考延迟区间无效: min={min}ms > max={max}ms")]
    InvalidDelayRange { min: u64, max: u64 },

    #[error("采样温度无效，必须在 0 到 2 之间: {0}")]
    InvalidTemperature(f32),

    #[error("token 上限必须大于 0")]
    InvalidTokenLimit,

    #[error("远程模型已启用，但未配置接口地址或模型名称")]
    MissingCompletionEndpoint,

    #[error("请求超时过短: {request_secs}s，必须大于单次回复的最长耗时 {required_ms}ms")]
    RequestTimeoutTooShort { request_secs: u64, required_ms: u128 },

    #[error("配置路径无效: {0}")]
    InvalidPath(String),
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("folio.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let config = ConfigLoader::load_from("does-not-exist.toml").unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.completion.model, "openai/gpt-4.1-mini");
    }

    #[test]
    fn test_load_from_toml_overrides_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8088

[chat]
mode = "local"
rng_seed = 42

[knowledge]
source_url = "https://portfolio.test"
"#
        )
        .unwrap();

        let config = ConfigLoader::load_from(file.path()).unwrap();

        assert_eq!(config.server.port, 8088);
        assert_eq!(config.chat.mode, crate::config::config::ResponseMode::Local);
        assert_eq!(config.chat.rng_seed, Some(42));
        assert_eq!(
            config.knowledge.source_url.as_deref(),
            Some("https://portfolio.test")
        );
        // untouched sections keep their defaults
        assert_eq!(config.completion.max_tokens, 800);
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("folio.example.toml");
        let config = ConfigLoader::load_from(&path).unwrap();

        assert!(ConfigLoader::validate(&config).is_ok());
        assert_eq!(config.server.request_timeout, 60);
        assert_eq!(config.completion.timeout_secs, 20);
        assert!(config.knowledge.source_url.is_none());
    }

    #[test]
    fn test_token_fallback_only_when_unset() {
        let mut config = AppConfig::default();
        ConfigLoader::apply_token_fallback(&mut config, Some("env-token".into()));
        assert_eq!(config.completion.api_token.as_deref(), Some("env-token"));

        config.completion.api_token = Some("configured".into());
        ConfigLoader::apply_token_fallback(&mut config, Some("env-token".into()));
        assert_eq!(config.completion.api_token.as_deref(), Some("configured"));

        let mut config = AppConfig::default();
        ConfigLoader::apply_token_fallback(&mut config, Some("  ".into()));
        assert!(config.completion.api_token.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::testing();
        assert!(ConfigLoader::validate(&config).is_ok());

        config.chat.think_delay_min_ms = 10;
        config.chat.think_delay_max_ms = 5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidDelayRange { .. })
        ));

        let mut config = AppConfig::testing();
        config.completion.temperature = 3.5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidTemperature(_))
        ));

        let mut config = AppConfig::testing();
        config.completion.model = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::MissingCompletionEndpoint)
        ));

        config.completion.enabled = false;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_requires_request_timeout_above_reply_budget() {
        assert!(ConfigLoader::validate(&AppConfig::default()).is_ok());

        // 2s 抓取 + 2 * 3s 补全 + 1s = 9s
        let mut config = AppConfig::testing();
        config.completion.timeout_secs = 3;
        config.server.request_timeout = 2;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::RequestTimeoutTooShort {
                request_secs: 2,
                required_ms: 9000,
            })
        ));

        config.server.request_timeout = 9;
        assert!(ConfigLoader::validate(&config).is_err());

        config.server.request_timeout = 10;
        assert!(ConfigLoader::validate(&config).is_ok());

        // 思考延迟同样计入
        config.chat.think_delay_max_ms = 1500;
        assert!(ConfigLoader::validate(&config).is_err());

        // 本地模式只需覆盖思考延迟
        config.completion.enabled = false;
        config.server.request_timeout = 2;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_rejects_overflowing_timeouts() {
        let mut config = AppConfig::testing();
        config.completion.timeout_secs = u64::MAX;
        config.knowledge.fetch_timeout_secs = u64::MAX;
        config.server.request_timeout = u64::MAX;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::RequestTimeoutTooShort { .. })
        ));
    }
}
