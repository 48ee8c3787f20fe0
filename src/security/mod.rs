//! Security Module
//!
//! Guards the chat endpoint:
//! - Content moderation of inbound messages
//! - Security headers middleware

pub mod middleware;
pub mod moderation;

pub use middleware::security_headers_middleware;
pub use moderation::{BlockReason, MAX_MESSAGE_LENGTH, ModerationResult, moderate};
