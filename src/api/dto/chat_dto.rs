//! 聊天 DTO

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::turn::ChatTurn;

/// 聊天请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    /// 访客消息
    pub message: String,
}

/// 聊天响应，字段为 camelCase
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// 回复文本
    pub message: String,
    /// UTC RFC 3339 时间戳
    pub timestamp: String,
    pub is_bot: bool,
}

impl ChatResponse {
    pub fn new(message: impl Into<String>, responded_at: DateTime<Utc>) -> Self {
        Self {
            message: message.into(),
            timestamp: responded_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            is_bot: true,
        }
    }
}

impl From<ChatTurn> for ChatResponse {
    fn from(turn: ChatTurn) -> Self {
        Self {
            is_bot: turn.is_bot_reply,
            ..Self::new(turn.reply, turn.responded_at)
        }
    }
}
