//! Folio - 作品集聊天服务
//!
//! 代表作品集主人回答访客关于简历的问题：先审核内容，再交给远程模型，
//! 模型不可用时退回本地关键词规则，保证总有回复。

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod security;
pub mod services;
