//! 配置管理模块
//!
//! 提供应用程序配置加载和管理功能，支持 TOML 配置文件和环境变量覆盖。
//! 仓库根目录的 `folio.example.toml` 列出全部配置项及默认值，复制为
//! `folio.toml` 即可生效。
//!
//! 网站知识摘要默认关闭。设置个人网站地址后，首次对话会抓取该页面并让模型
//! 生成摘要：
//!
//! ```toml
//! [knowledge]
//! source_url = "https://example.com/about"
//! ```
//!
//! 或使用环境变量 `FOLIO_KNOWLEDGE__SOURCE_URL`。

pub mod config;
pub mod loader;

pub use config::{AppConfig, ChatConfig, CompletionConfig, KnowledgeConfig, ResponseMode};
pub use loader::ConfigLoader;
