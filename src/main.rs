use anyhow::Context;
use folio::api::{self, app_state::AppState};
use folio::config::ConfigLoader;
use folio::models::profile::KnowledgeProfile;
use folio::observability::{HealthCheckResult, ObservabilityState, init_tracing};
use folio::services::completion::ChatCompletionClient;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    ConfigLoader::validate(&config).context("invalid configuration")?;
    info!("Configuration loaded successfully");

    let profile = Arc::new(KnowledgeProfile::load(&config.knowledge)?);
    info!(
        "Profile loaded for {} ({} skills, {} projects)",
        profile.personal.name,
        profile.skills.len(),
        profile.projects.len()
    );

    let completion = Arc::new(ChatCompletionClient::new(
        config.completion.clone(),
        &config.knowledge,
        profile.clone(),
    )?);
    info!(
        "Completion client initialized: {} via {}",
        config.completion.model, config.completion.base_url
    );

    let mode = config.effective_mode();
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let app_state = AppState::with_completion(config, profile.clone(), completion);
    info!("Application state created (response mode: {})", mode);

    let observability_state = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION"),
        app_state.metrics.clone(),
    ));
    observability_state
        .add_health_check(HealthCheckResult::healthy(
            "profile",
            profile.personal.name.clone(),
        ))
        .await;
    observability_state
        .add_health_check(HealthCheckResult::healthy(
            "responder",
            format!("{} mode", mode),
        ))
        .await;

    let router = api::create_router(app_state, observability_state);
    info!("API router created with observability endpoints");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
