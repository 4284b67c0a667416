//! Publisher endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cache::CacheKey;
use domain::{CreatePublisher, RestorePublisher, SoftDeletePublisher, UpdatePublisher};
use event_store::{ETag, EventStore};
use projections::PublisherDocument;
use serde::Deserialize;

use super::{command_response, context, entity_tag, parse_aggregate_id};
use crate::error::ApiError;
use crate::extract::{IfMatch, RequestScope, etag_header};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PublisherRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub include_deleted: bool,
}

/// POST /publishers
#[tracing::instrument(skip(state, if_match, req))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    if_match: IfMatch,
    Json(req): Json<PublisherRequest>,
) -> Result<Response, ApiError> {
    let cmd = CreatePublisher::new(req.name);
    let publisher_id = cmd.publisher_id;
    let result = state.publishers.create_publisher(cmd, &context(if_match)).await?;
    Ok(command_response(StatusCode::CREATED, publisher_id, &result))
}

/// GET /publishers
#[tracing::instrument(skip(state, scope))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    scope: RequestScope,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PublisherDocument>>, ApiError> {
    let include_deleted = params.include_deleted && scope.admin;
    let key = CacheKey::new("publishers.list", &scope.locale(&state.settings), scope.tenant.as_str())
        .admin(scope.admin)
        .param("include_deleted", include_deleted);

    let publishers = state
        .cache
        .get_or_load(&key, &["Publishers".to_string()], || async {
            Ok::<_, ApiError>(state.views.directory.list_publishers(include_deleted).await)
        })
        .await?;
    Ok(Json(publishers))
}

/// GET /publishers/{id}
#[tracing::instrument(skip(state, scope))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    scope: RequestScope,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let publisher_id = parse_aggregate_id(&id)?;
    let key = CacheKey::new("publishers.get", &scope.locale(&state.settings), scope.tenant.as_str())
        .admin(scope.admin)
        .param("id", publisher_id);

    let publisher = state
        .cache
        .get_or_load(&key, &[entity_tag("Publisher", publisher_id)], || async {
            state
                .views
                .directory
                .get_publisher(publisher_id)
                .await
                .ok_or_else(|| ApiError::NotFound(format!("Publisher {id} not found")))
        })
        .await?;
    if publisher.lifecycle.is_deleted() && !scope.admin {
        return Err(ApiError::NotFound(format!("Publisher {id} not found")));
    }

    Ok((etag_header(ETag::from_version(publisher.version)), Json(publisher)).into_response())
}

/// PUT /publishers/{id}
#[tracing::instrument(skip(state, if_match, req))]
pub async fn update<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
    Json(req): Json<PublisherRequest>,
) -> Result<Response, ApiError> {
    let publisher_id = parse_aggregate_id(&id)?;
    let cmd = UpdatePublisher {
        publisher_id,
        name: req.name,
    };
    let result = state.publishers.update_publisher(cmd, &context(if_match)).await?;
    Ok(command_response(StatusCode::OK, publisher_id, &result))
}

/// DELETE /publishers/{id}
#[tracing::instrument(skip(state, if_match))]
pub async fn soft_delete<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
) -> Result<Response, ApiError> {
    let publisher_id = parse_aggregate_id(&id)?;
    let result = state
        .publishers
        .soft_delete_publisher(SoftDeletePublisher { publisher_id }, &context(if_match))
        .await?;
    Ok(command_response(StatusCode::OK, publisher_id, &result))
}

/// POST /publishers/{id}/restore
#[tracing::instrument(skip(state, if_match))]
pub async fn restore<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
) -> Result<Response, ApiError> {
    let publisher_id = parse_aggregate_id(&id)?;
    let result = state
        .publishers
        .restore_publisher(RestorePublisher { publisher_id }, &context(if_match))
        .await?;
    Ok(command_response(StatusCode::OK, publisher_id, &result))
}
