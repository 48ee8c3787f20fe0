//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod chat_handler;
pub mod profile_handler;

pub use chat_handler::*;
pub use profile_handler::*;
