//! 可观测性模块
//!
//! 提供 Prometheus 文本格式指标、结构化日志和健康检查。

use axum::{
    Json, Router,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::config::LoggingConfig;
use crate::services::orchestrator::ReplySource;

// ===== Simple Metrics =====

/// 聊天服务指标
#[derive(Debug, Default)]
pub struct AppMetrics {
    pub http_requests_total: AtomicU64,
    pub http_request_duration_sum: AtomicU64,
    pub chat_requests_total: AtomicU64,
    pub moderation_rejections_total: AtomicU64,
    pub completion_failures_total: AtomicU64,
    pub fallback_replies_total: AtomicU64,
}

impl AppMetrics {
    /// 记录 HTTP 请求
    pub fn record_http_request(&self, duration_ms: u64) {
        self.http_requests_total.fetch_add(1, Ordering::SeqCst);
        self.http_request_duration_sum
            .fetch_add(duration_ms, Ordering::SeqCst);
    }

    pub fn record_chat_request(&self) {
        self.chat_requests_total.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_rejection(&self) {
        self.moderation_rejections_total
            .fetch_add(1, Ordering::SeqCst);
    }

    /// 按回复来源记录：远程失败后的回复同时计入失败和兜底
    pub fn record_reply(&self, source: ReplySource, remote_mode: bool) {
        match source {
            ReplySource::Fallback | ReplySource::Default if remote_mode => {
                self.completion_failures_total.fetch_add(1, Ordering::SeqCst);
                self.fallback_replies_total.fetch_add(1, Ordering::SeqCst);
            }
            ReplySource::Default => {
                self.fallback_replies_total.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self) -> String {
        let http_requests = self.http_requests_total.load(Ordering::SeqCst);
        format!(
            r#"# HELP http_requests_total Total HTTP requests
# TYPE http_requests_total counter
http_requests_total {}
# HELP http_request_duration_seconds HTTP request duration in seconds
# TYPE http_request_duration_seconds summary
http_request_duration_seconds_sum {}
http_request_duration_seconds_count {}
# HELP chat_requests_total Chat messages received
# TYPE chat_requests_total counter
chat_requests_total {}
# HELP moderation_rejections_total Chat messages rejected by moderation
# TYPE moderation_rejections_total counter
moderation_rejections_total {}
# HELP completion_failures_total Remote completions that did not produce an answer
# TYPE completion_failures_total counter
completion_failures_total {}
# HELP fallback_replies_total Replies served from local fallbacks
# TYPE fallback_replies_total counter
fallback_replies_total {}
"#,
            http_requests,
            self.http_request_duration_sum.load(Ordering::SeqCst) as f64 / 1000.0,
            http_requests,
            self.chat_requests_total.load(Ordering::SeqCst),
            self.moderation_rejections_total.load(Ordering::SeqCst),
            self.completion_failures_total.load(Ordering::SeqCst),
            self.fallback_replies_total.load(Ordering::SeqCst),
        )
    }
}

// ===== Health Check =====

/// 健康检查状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
    pub checks: Vec<HealthCheck>,
}

/// 单个健康检查项
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    pub message: Option<String>,
}

/// 启动时登记的检查结果
#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub name: String,
    pub healthy: bool,
    pub message: String,
}

impl HealthCheckResult {
    pub fn healthy(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            healthy: true,
            message: message.into(),
        }
    }
}

/// 可观测性状态
#[derive(Debug, Clone)]
pub struct ObservabilityState {
    pub metrics: Arc<AppMetrics>,
    pub health_checks: Arc<Mutex<Vec<HealthCheckResult>>>,
    pub start_time: DateTime<Utc>,
    pub version: String,
}

impl ObservabilityState {
    pub fn new(version: impl Into<String>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            metrics,
            health_checks: Arc::new(Mutex::new(Vec::new())),
            start_time: Utc::now(),
            version: version.into(),
        }
    }

    /// 添加健康检查结果，同名项覆盖
    pub async fn add_health_check(&self, result: HealthCheckResult) {
        let mut checks = self.health_checks.lock().await;
        checks.retain(|c| c.name != result.name);
        checks.push(result);
    }

    /// 获取应用正常运行时间
    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_seconds() as f64
    }
}

// ===== Health Check Handlers =====

/// 获取完整健康状态
pub async fn health_check(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let checks = state.health_checks.lock().await;
    let all_healthy = checks.iter().all(|c| c.healthy);

    let health_status = HealthStatus {
        status: if all_healthy { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        checks: checks
            .iter()
            .map(|c| HealthCheck {
                name: c.name.clone(),
                status: if c.healthy { "healthy" } else { "unhealthy" }.to_string(),
                message: Some(c.message.clone()),
            })
            .collect(),
    };

    let status_code = if all_healthy {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_status))
}

/// 简单存活检查
pub async fn liveness() -> impl IntoResponse {
    "OK"
}

/// Prometheus 指标端点
pub async fn metrics(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    (axum::http::StatusCode::OK, state.metrics.gather())
}

/// 版本信息端点
pub async fn version(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "version": state.version,
        "uptime_seconds": state.uptime_seconds(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// 创建可观测性路由
pub fn create_observability_router(state: Arc<ObservabilityState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
        .route("/metrics", get(metrics))
        .route("/version", get(version))
        .with_state(state)
}

// ===== Structured Logging =====

/// 初始化日志
///
/// `RUST_LOG` 优先，其次是配置中的级别。重复初始化时保持已有订阅者。
pub fn init_tracing(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = if config.structured {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_current_span(false)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_line_number(true)
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already set: {}", e);
    }
}

// ===== Request Metrics Middleware =====

/// 记录请求指标的中间件
pub async fn metrics_middleware(
    State(metrics): State<Arc<AppMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    let start = std::time::Instant::now();
    let response = next.run(req).await;
    metrics.record_http_request(start.elapsed().as_millis() as u64);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[test]
    fn test_metrics_gather() {
        let metrics = AppMetrics::default();
        metrics.record_http_request(100);
        metrics.record_chat_request();
        metrics.record_chat_request();
        metrics.record_rejection();
        metrics.record_reply(ReplySource::Fallback, true);
        metrics.record_reply(ReplySource::Remote, true);

        let output = metrics.gather();
        assert!(output.contains("http_requests_total 1"));
        assert!(output.contains("chat_requests_total 2"));
        assert!(output.contains("moderation_rejections_total 1"));
        assert!(output.contains("completion_failures_total 1"));
        assert!(output.contains("fallback_replies_total 1"));
    }

    #[test]
    fn test_local_default_reply_is_not_a_completion_failure() {
        let metrics = AppMetrics::default();
        metrics.record_reply(ReplySource::Default, false);
        metrics.record_reply(ReplySource::Pattern, false);

        assert_eq!(metrics.completion_failures_total.load(Ordering::SeqCst), 0);
        assert_eq!(metrics.fallback_replies_total.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_health_reports_registered_checks() {
        let state = Arc::new(ObservabilityState::new("1.0.0", Arc::default()));
        state
            .add_health_check(HealthCheckResult::healthy("profile", "Jordan Avery"))
            .await;
        state
            .add_health_check(HealthCheckResult::healthy("profile", "reloaded"))
            .await;

        let response = create_observability_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["checks"].as_array().unwrap().len(), 1);
        assert_eq!(json["checks"][0]["message"], "reloaded");
    }

    #[tokio::test]
    async fn test_liveness() {
        let state = Arc::new(ObservabilityState::new("1.0.0", Arc::default()));
        let response = create_observability_router(state)
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
