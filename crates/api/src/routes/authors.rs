//! Author endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cache::CacheKey;
use domain::{CreateAuthor, RestoreAuthor, SoftDeleteAuthor, UpdateAuthor};
use event_store::{ETag, EventStore};
use projections::AuthorDocument;
use serde::Deserialize;

use super::{command_response, context, entity_tag, parse_aggregate_id, translations};
use crate::error::ApiError;
use crate::extract::{IfMatch, RequestScope, etag_header};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AuthorRequest {
    pub name: String,
    #[serde(default)]
    pub biography: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub include_deleted: bool,
}

/// POST /authors
#[tracing::instrument(skip(state, if_match, req))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    if_match: IfMatch,
    Json(req): Json<AuthorRequest>,
) -> Result<Response, ApiError> {
    let cmd = CreateAuthor::new(req.name, translations("biography", req.biography)?);
    let author_id = cmd.author_id;
    let result = state.authors.create_author(cmd, &context(if_match)).await?;
    Ok(command_response(StatusCode::CREATED, author_id, &result))
}

/// GET /authors
#[tracing::instrument(skip(state, scope))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    scope: RequestScope,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<AuthorDocument>>, ApiError> {
    let include_deleted = params.include_deleted && scope.admin;
    let key = CacheKey::new("authors.list", &scope.locale(&state.settings), scope.tenant.as_str())
        .admin(scope.admin)
        .param("include_deleted", include_deleted);

    let authors = state
        .cache
        .get_or_load(&key, &["Authors".to_string()], || async {
            Ok::<_, ApiError>(state.views.directory.list_authors(include_deleted).await)
        })
        .await?;
    Ok(Json(authors))
}

/// GET /authors/{id}
#[tracing::instrument(skip(state, scope))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    scope: RequestScope,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let author_id = parse_aggregate_id(&id)?;
    let key = CacheKey::new("authors.get", &scope.locale(&state.settings), scope.tenant.as_str())
        .admin(scope.admin)
        .param("id", author_id);

    let author = state
        .cache
        .get_or_load(&key, &[entity_tag("Author", author_id)], || async {
            state
                .views
                .directory
                .get_author(author_id)
                .await
                .ok_or_else(|| ApiError::NotFound(format!("Author {id} not found")))
        })
        .await?;
    if author.lifecycle.is_deleted() && !scope.admin {
        return Err(ApiError::NotFound(format!("Author {id} not found")));
    }

    Ok((etag_header(ETag::from_version(author.version)), Json(author)).into_response())
}

/// PUT /authors/{id}
#[tracing::instrument(skip(state, if_match, req))]
pub async fn update<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
    Json(req): Json<AuthorRequest>,
) -> Result<Response, ApiError> {
    let author_id = parse_aggregate_id(&id)?;
    let cmd = UpdateAuthor {
        author_id,
        name: req.name,
        biography: translations("biography", req.biography)?,
    };
    let result = state.authors.update_author(cmd, &context(if_match)).await?;
    Ok(command_response(StatusCode::OK, author_id, &result))
}

/// DELETE /authors/{id}
#[tracing::instrument(skip(state, if_match))]
pub async fn soft_delete<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
) -> Result<Response, ApiError> {
    let author_id = parse_aggregate_id(&id)?;
    let result = state
        .authors
        .soft_delete_author(SoftDeleteAuthor { author_id }, &context(if_match))
        .await?;
    Ok(command_response(StatusCode::OK, author_id, &result))
}

/// POST /authors/{id}/restore
#[tracing::instrument(skip(state, if_match))]
pub async fn restore<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
) -> Result<Response, ApiError> {
    let author_id = parse_aggregate_id(&id)?;
    let result = state
        .authors
        .restore_author(RestoreAuthor { author_id }, &context(if_match))
        .await?;
    Ok(command_response(StatusCode::OK, author_id, &result))
}
