//! Profile Routes
//!
//! 定义简历相关的 API 路由。

use crate::api::handlers::profile_handler::*;
use axum::{Router, routing::get};

use crate::api::app_state::AppState;

/// 创建简历路由器
pub fn create_profile_router() -> Router<AppState> {
    Router::new()
        .route("/cv", get(get_cv))
        .route("/cv/summary", get(get_cv_summary))
}
