//! 个人网站抓取
//!
//! 抓取网页并做简单的去标签处理，供远程模型生成知识摘要。

use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::debug;

use crate::error::{AppError, Result};

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));
static WHITESPACE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// 读取网页时的字节上限为 `max_chars` 的倍数，标签和多字节字符会占去大部分
const BYTES_PER_CHAR: usize = 8;

const USER_AGENT: &str = concat!("Mozilla/5.0 (compatible; folio/", env!("CARGO_PKG_VERSION"), ")");

/// 网页正文抓取器
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    max_chars: usize,
}

impl PageFetcher {
    pub fn new(timeout: Duration, max_chars: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, max_chars })
    }

    /// GET 页面并返回去标签后的文本
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!("Fetching profile source: {}", url);

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Transport(format!(
                "profile source {} returned {}",
                url, status
            )));
        }

        let cap = self.max_chars.saturating_mul(BYTES_PER_CHAR);
        if let Some(length) = response.content_length() {
            if length > cap as u64 {
                debug!("Profile source is {} bytes, reading the first {}", length, cap);
            }
        }

        let body = read_capped(&mut response, cap).await?;
        let text = strip_markup(&body, self.max_chars);
        if text.is_empty() {
            return Err(AppError::Completion(format!(
                "profile source {} has no readable text",
                url
            )));
        }

        Ok(text)
    }
}

/// 按块读取响应体，最多保留 `cap` 字节
///
/// 截断时丢弃末尾不完整的标签。
async fn read_capped(response: &mut reqwest::Response, cap: usize) -> Result<String> {
    let mut buf: Vec<u8> = Vec::with_capacity(cap.min(64 * 1024));
    let mut truncated = false;

    while let Some(chunk) = response.chunk().await? {
        let room = cap - buf.len();
        if chunk.len() > room {
            buf.extend_from_slice(&chunk[..room]);
            truncated = true;
            break;
        }
        buf.extend_from_slice(&chunk);
    }

    let mut body = String::from_utf8_lossy(&buf).into_owned();
    if truncated {
        if let Some(open) = body.rfind('<') {
            if body[open..].find('>').is_none() {
                body.truncate(open);
            }
        }
    }

    Ok(body)
}

/// 去除标签、压缩空白，超过 `max_chars` 个字符时截断并追加 `...`
pub fn strip_markup(html: &str, max_chars: usize) -> String {
    let without_tags = TAG_PATTERN.replace_all(html, " ");
    let collapsed = WHITESPACE_PATTERN.replace_all(&without_tags, " ");
    let text = collapsed.trim();

    if text.chars().count() > max_chars {
        let mut truncated: String = text.chars().take(max_chars).collect();
        truncated.push_str("...");
        truncated
    } else {
        text.to_string()
    }
}
