//! 核心数据模型模块
//!
//! 简历知识库、关键词规则与单次问答轮次。

pub mod pattern;
pub mod profile;
pub mod turn;

pub use pattern::*;
pub use profile::*;
pub use turn::*;
