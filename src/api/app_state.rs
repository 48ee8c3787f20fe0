use crate::config::AppConfig;
use crate::models::profile::KnowledgeProfile;
use crate::observability::AppMetrics;
use crate::services::completion::CompletionService;
use crate::services::orchestrator::ResponseOrchestrator;
use crate::services::picker::ReplyPicker;
use std::sync::Arc;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Portfolio owner's profile, read-only after start-up
    pub profile: Arc<KnowledgeProfile>,
    /// Reply pipeline
    pub orchestrator: Arc<ResponseOrchestrator>,
    /// Counters rendered at /metrics
    pub metrics: Arc<AppMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("profile", &self.profile.personal.name)
            .field("orchestrator", &self.orchestrator)
            .field("metrics", &"Arc<AppMetrics>")
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: AppConfig,
        profile: Arc<KnowledgeProfile>,
        orchestrator: ResponseOrchestrator,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            profile,
            orchestrator: Arc::new(orchestrator),
            metrics,
        }
    }

    /// Wire the reply pipeline around a completion service
    pub fn with_completion(
        config: AppConfig,
        profile: Arc<KnowledgeProfile>,
        completion: Arc<dyn CompletionService>,
    ) -> Self {
        let picker = Arc::new(ReplyPicker::new(config.chat.rng_seed));
        let orchestrator =
            ResponseOrchestrator::new(&config, profile.clone(), completion, picker);
        Self::new(config, profile, orchestrator, Arc::new(AppMetrics::default()))
    }
}
