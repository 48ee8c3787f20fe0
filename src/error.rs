//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 参数验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 内容审核拒绝，携带面向用户的原因
    #[error("{0}")]
    Rejected(String),

    /// 远程补全接口返回异常
    #[error("远程补全失败: {0}")]
    Completion(String),

    /// 网络传输错误
    #[error("网络请求失败: {0}")]
    Transport(String),

    /// 超时错误
    #[error("操作超时: {0}")]
    Timeout(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Timeout(e.to_string())
        } else if e.is_decode() {
            AppError::Serialization(e.to_string())
        } else {
            AppError::Transport(e.to_string())
        }
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let body = match &self {
            AppError::Rejected(reason) => ErrorResponse::new(&code, reason),
            other => ErrorResponse::new(&code, &other.to_string()),
        };
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body),
        )
            .into_response()
    }
}

/// 错误响应
///
/// 序列化为 `{"error": ..., "reason": ...}`，前端据此展示拒绝原因。
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub error: String,
    /// 错误原因
    pub reason: String,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, reason: &str) -> Self {
        Self {
            error: code.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::Validation(_) => (400, "bad_request".to_string()),
            AppError::Rejected(_) => (400, "message_rejected".to_string()),
            AppError::Timeout(_) => (504, "upstream_timeout".to_string()),
            AppError::Completion(_) | AppError::Transport(_) => {
                (502, "upstream_unavailable".to_string())
            }
            _ => (500, "internal_error".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;
