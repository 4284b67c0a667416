//! Health check endpoint.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use event_store::EventStore;
use projections::ReadModel;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub projections: Vec<&'static str>,
    /// Current size of each read model, keyed by name.
    pub read_models: BTreeMap<&'static str, usize>,
    pub notification_subscribers: usize,
}

/// GET /health: projection names, read model sizes and live subscribers.
pub async fn check<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    let read_models = state
        .views
        .read_models()
        .into_iter()
        .map(|model| (model.name(), model.count()))
        .collect();

    Json(HealthResponse {
        status: "ok",
        projections: state.processor.projection_names(),
        read_models,
        notification_subscribers: state.hub.subscriber_count(),
    })
}
