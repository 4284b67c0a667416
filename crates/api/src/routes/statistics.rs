//! Reference statistics endpoints.
//!
//! Served straight from the asynchronous statistics view and never cached,
//! so they may trail the latest commits by the worker's queue depth.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use event_store::EventStore;
use projections::{ReferenceKind, ReferenceStatistics};

use super::parse_aggregate_id;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /statistics/{kind}/{id}, where kind is `authors`, `categories` or
/// `publishers`.
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<ReferenceStatistics>, ApiError> {
    let kind = match kind.as_str() {
        "authors" => ReferenceKind::Author,
        "categories" => ReferenceKind::Category,
        "publishers" => ReferenceKind::Publisher,
        other => {
            return Err(ApiError::invalid_field(
                "kind",
                format!("Unknown statistics kind: {other}"),
            ));
        }
    };
    let id = parse_aggregate_id(&id)?;

    Ok(Json(state.views.statistics.statistics(kind, id).await))
}
