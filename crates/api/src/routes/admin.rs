//! Operational endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use event_store::EventStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RebuildParams {
    /// Rebuild only this projection; all of them when absent.
    pub projection: Option<String>,
}

#[derive(Serialize)]
pub struct RebuildResponse {
    pub rebuilt: Vec<String>,
}

/// POST /admin/projections/rebuild
///
/// Resets and replays the selected projections, then drops every cached
/// query since cached results may predate the rebuild.
#[tracing::instrument(skip(state))]
pub async fn rebuild<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<RebuildParams>,
) -> Result<Json<RebuildResponse>, ApiError> {
    let rebuilt = match params.projection {
        Some(name) => {
            state.processor.rebuild(&name).await?;
            vec![name]
        }
        None => {
            state.processor.rebuild_all().await?;
            state
                .processor
                .projection_names()
                .into_iter()
                .map(str::to_string)
                .collect()
        }
    };

    if let Err(e) = state.cache.clear().await {
        tracing::warn!(error = %e, "cache clear after rebuild failed");
    }

    Ok(Json(RebuildResponse { rebuilt }))
}
