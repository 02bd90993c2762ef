use chrono::{DateTime, Utc};
use docvoice_core::AssistantService;

/// Handed to every handler through axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub service: AssistantService,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: AssistantService) -> Self {
        Self {
            service,
            started_at: Utc::now(),
        }
    }
}
