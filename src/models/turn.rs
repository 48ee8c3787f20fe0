use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单次问答轮次
///
/// 只在一次请求内存在，不持久化，也不被后续请求引用。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// 用户原始消息
    pub user_message: String,

    /// 回复内容
    pub reply: String,

    /// 回复时间
    pub responded_at: DateTime<Utc>,

    /// 是否为机器人回复
    pub is_bot_reply: bool,
}

impl ChatTurn {
    /// 记录一次机器人回复
    pub fn bot_reply(user_message: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            reply: reply.into(),
            responded_at: Utc::now(),
            is_bot_reply: true,
        }
    }
}
