//! Category endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cache::CacheKey;
use domain::{CreateCategory, RestoreCategory, SoftDeleteCategory, UpdateCategory};
use event_store::{ETag, EventStore};
use projections::CategoryDocument;
use serde::Deserialize;

use super::{command_response, context, entity_tag, parse_aggregate_id, translations};
use crate::error::ApiError;
use crate::extract::{IfMatch, RequestScope, etag_header};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CategoryRequest {
    pub name: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub include_deleted: bool,
}

/// POST /categories
#[tracing::instrument(skip(state, if_match, req))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    if_match: IfMatch,
    Json(req): Json<CategoryRequest>,
) -> Result<Response, ApiError> {
    let cmd = CreateCategory::new(translations("name", req.name)?);
    let category_id = cmd.category_id;
    let result = state.categories.create_category(cmd, &context(if_match)).await?;
    Ok(command_response(StatusCode::CREATED, category_id, &result))
}

/// GET /categories
#[tracing::instrument(skip(state, scope))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    scope: RequestScope,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<CategoryDocument>>, ApiError> {
    let include_deleted = params.include_deleted && scope.admin;
    let locale = scope.locale(&state.settings);
    let key = CacheKey::new("categories.list", &locale, scope.tenant.as_str())
        .admin(scope.admin)
        .param("include_deleted", include_deleted);

    let categories = state
        .cache
        .get_or_load(&key, &["Categories".to_string()], || async {
            Ok::<_, ApiError>(state.views.directory.list_categories(include_deleted, &locale).await)
        })
        .await?;
    Ok(Json(categories))
}

/// GET /categories/{id}
#[tracing::instrument(skip(state, scope))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    scope: RequestScope,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let category_id = parse_aggregate_id(&id)?;
    let key = CacheKey::new("categories.get", &scope.locale(&state.settings), scope.tenant.as_str())
        .admin(scope.admin)
        .param("id", category_id);

    let category = state
        .cache
        .get_or_load(&key, &[entity_tag("Category", category_id)], || async {
            state
                .views
                .directory
                .get_category(category_id)
                .await
                .ok_or_else(|| ApiError::NotFound(format!("Category {id} not found")))
        })
        .await?;
    if category.lifecycle.is_deleted() && !scope.admin {
        return Err(ApiError::NotFound(format!("Category {id} not found")));
    }

    Ok((etag_header(ETag::from_version(category.version)), Json(category)).into_response())
}

/// PUT /categories/{id}
#[tracing::instrument(skip(state, if_match, req))]
pub async fn update<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
    Json(req): Json<CategoryRequest>,
) -> Result<Response, ApiError> {
    let category_id = parse_aggregate_id(&id)?;
    let cmd = UpdateCategory {
        category_id,
        name: translations("name", req.name)?,
    };
    let result = state.categories.update_category(cmd, &context(if_match)).await?;
    Ok(command_response(StatusCode::OK, category_id, &result))
}

/// DELETE /categories/{id}
#[tracing::instrument(skip(state, if_match))]
pub async fn soft_delete<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
) -> Result<Response, ApiError> {
    let category_id = parse_aggregate_id(&id)?;
    let result = state
        .categories
        .soft_delete_category(SoftDeleteCategory { category_id }, &context(if_match))
        .await?;
    Ok(command_response(StatusCode::OK, category_id, &result))
}

/// POST /categories/{id}/restore
#[tracing::instrument(skip(state, if_match))]
pub async fn restore<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
) -> Result<Response, ApiError> {
    let category_id = parse_aggregate_id(&id)?;
    let result = state
        .categories
        .restore_category(RestoreCategory { category_id }, &context(if_match))
        .await?;
    Ok(command_response(StatusCode::OK, category_id, &result))
}
