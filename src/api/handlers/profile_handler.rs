//! Profile API Handlers
//!
//! Read-only views of the portfolio owner's CV.

use axum::{Json, extract::State, response::IntoResponse};

use crate::api::{app_state::AppState, dto::profile_dto::CvSummaryResponse};

/// Full profile
///
/// GET /api/cv
pub async fn get_cv(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.profile.as_ref().clone())
}

/// GET /api/cv/summary
pub async fn get_cv_summary(State(state): State<AppState>) -> impl IntoResponse {
    Json(CvSummaryResponse::from(state.profile.as_ref()))
}
