//! Book endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cache::CacheKey;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{
    BookDetails, CancelSale, CreateBook, Prices, RestoreBook, ScheduleSale, SoftDeleteBook,
    UpdateBook, UpdateCover,
};
use event_store::{ETag, EventStore};
use projections::{BookDocument, BookQuery};
use serde::{Deserialize, Serialize};

use super::{command_response, context, entity_tag, parse_aggregate_id, prices, translations};
use crate::error::ApiError;
use crate::extract::{IfMatch, RequestScope, etag_header};
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct BookRequest {
    pub title: BTreeMap<String, String>,
    #[serde(default)]
    pub description: BTreeMap<String, String>,
    pub isbn: String,
    pub publisher_id: Option<AggregateId>,
    #[serde(default)]
    pub author_ids: Vec<AggregateId>,
    #[serde(default)]
    pub category_ids: Vec<AggregateId>,
    #[serde(default)]
    pub prices: BTreeMap<String, i64>,
}

impl BookRequest {
    fn into_details(self) -> Result<BookDetails, ApiError> {
        Ok(BookDetails {
            title: translations("title", self.title)?,
            description: translations("description", self.description)?,
            isbn: self.isbn,
            publisher_id: self.publisher_id,
            author_ids: self.author_ids.into_iter().collect(),
            category_ids: self.category_ids.into_iter().collect(),
            prices: prices(self.prices)?,
        })
    }
}

#[derive(Deserialize)]
pub struct SaleRequest {
    pub discount_percent: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CoverRequest {
    pub blob_key: String,
    pub content_type: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub author: Option<AggregateId>,
    pub category: Option<AggregateId>,
    pub publisher: Option<AggregateId>,
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(default)]
    pub offset: usize,
    pub limit: Option<usize>,
}

// -- Response types --

/// A book document with its title resolved for the request locale.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    #[serde(flatten)]
    pub document: BookDocument,
    pub display_title: Option<String>,
    /// Discounted prices while a sale is running.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sale_prices: Option<Prices>,
}

impl BookResponse {
    /// Fills `sale_prices` for `now`. Applied after the cache so a sale
    /// starting or ending is visible without waiting for eviction.
    fn priced_at(mut self, now: DateTime<Utc>) -> Self {
        self.sale_prices = self
            .document
            .sale
            .as_ref()
            .filter(|sale| sale.is_active_at(now))
            .map(|sale| sale.discount(&self.document.prices));
        self
    }
}

/// Response type for event envelope data.
#[derive(Serialize)]
pub struct EventEnvelopeResponse {
    pub event_id: String,
    pub event_type: String,
    pub schema_version: i32,
    pub version: i64,
    pub timestamp: String,
    pub correlation_id: Option<String>,
    pub payload: serde_json::Value,
}

// -- Handlers --

/// POST /books
#[tracing::instrument(skip(state, if_match, req))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    if_match: IfMatch,
    Json(req): Json<BookRequest>,
) -> Result<Response, ApiError> {
    let cmd = CreateBook::new(req.into_details()?);
    let book_id = cmd.book_id;
    let result = state.books.create_book(cmd, &context(if_match)).await?;
    Ok(command_response(StatusCode::CREATED, book_id, &result))
}

/// GET /books
#[tracing::instrument(skip(state, scope))]
pub async fn search<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    scope: RequestScope,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let locale = scope.locale(&state.settings);
    let include_deleted = params.include_deleted && scope.admin;

    let key = CacheKey::new("books.search", &locale, scope.tenant.as_str())
        .admin(scope.admin)
        .param_opt("q", params.q.as_deref())
        .param_opt("author", params.author)
        .param_opt("category", params.category)
        .param_opt("publisher", params.publisher)
        .param("include_deleted", include_deleted)
        .param("offset", params.offset)
        .param_opt("limit", params.limit);

    let query = BookQuery {
        text: params.q,
        author_id: params.author,
        category_id: params.category,
        publisher_id: params.publisher,
        include_deleted,
        locale: Some(locale.clone()),
        offset: params.offset,
        limit: params.limit,
    };

    let books = state
        .cache
        .get_or_load(&key, &["Books".to_string()], || async {
            let documents = state.views.books.search(&query).await;
            Ok::<_, ApiError>(
                documents
                    .into_iter()
                    .map(|document| respond(document, &state, &locale))
                    .collect::<Vec<_>>(),
            )
        })
        .await?;
    let now = Utc::now();

    Ok(Json(
        books
            .into_iter()
            .map(|book| book.priced_at(now))
            .collect::<Vec<_>>(),
    ))
}

/// GET /books/{id}
#[tracing::instrument(skip(state, scope))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    scope: RequestScope,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let book_id = parse_aggregate_id(&id)?;
    let locale = scope.locale(&state.settings);
    let key = CacheKey::new("books.get", &locale, scope.tenant.as_str())
        .admin(scope.admin)
        .param("id", book_id);

    // Misses are not cached: a missing book yields an error, not a value.
    let book = state
        .cache
        .get_or_load(&key, &[entity_tag("Book", book_id)], || async {
            state
                .views
                .books
                .get(book_id)
                .await
                .map(|document| respond(document, &state, &locale))
                .ok_or_else(|| ApiError::NotFound(format!("Book {id} not found")))
        })
        .await?;
    if book.document.lifecycle.is_deleted() && !scope.admin {
        return Err(ApiError::NotFound(format!("Book {id} not found")));
    }

    let etag = ETag::from_version(book.document.version);
    Ok((etag_header(etag), Json(book.priced_at(Utc::now()))).into_response())
}

/// PUT /books/{id}
#[tracing::instrument(skip(state, if_match, req))]
pub async fn update<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
    Json(req): Json<BookRequest>,
) -> Result<Response, ApiError> {
    let book_id = parse_aggregate_id(&id)?;
    let cmd = UpdateBook {
        book_id,
        details: req.into_details()?,
    };
    let result = state.books.update_book(cmd, &context(if_match)).await?;
    Ok(command_response(StatusCode::OK, book_id, &result))
}

/// DELETE /books/{id}
#[tracing::instrument(skip(state, if_match))]
pub async fn soft_delete<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
) -> Result<Response, ApiError> {
    let book_id = parse_aggregate_id(&id)?;
    let result = state
        .books
        .soft_delete_book(SoftDeleteBook { book_id }, &context(if_match))
        .await?;
    Ok(command_response(StatusCode::OK, book_id, &result))
}

/// POST /books/{id}/restore
#[tracing::instrument(skip(state, if_match))]
pub async fn restore<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
) -> Result<Response, ApiError> {
    let book_id = parse_aggregate_id(&id)?;
    let result = state
        .books
        .restore_book(RestoreBook { book_id }, &context(if_match))
        .await?;
    Ok(command_response(StatusCode::OK, book_id, &result))
}

/// POST /books/{id}/sale
#[tracing::instrument(skip(state, if_match, req))]
pub async fn schedule_sale<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
    Json(req): Json<SaleRequest>,
) -> Result<Response, ApiError> {
    let book_id = parse_aggregate_id(&id)?;
    let cmd = ScheduleSale {
        book_id,
        discount_percent: req.discount_percent,
        starts_at: req.starts_at,
        ends_at: req.ends_at,
    };
    let result = state.books.schedule_sale(cmd, &context(if_match)).await?;
    Ok(command_response(StatusCode::OK, book_id, &result))
}

/// DELETE /books/{id}/sale
#[tracing::instrument(skip(state, if_match))]
pub async fn cancel_sale<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
) -> Result<Response, ApiError> {
    let book_id = parse_aggregate_id(&id)?;
    let result = state
        .books
        .cancel_sale(CancelSale { book_id }, &context(if_match))
        .await?;
    Ok(command_response(StatusCode::OK, book_id, &result))
}

/// PUT /books/{id}/cover
#[tracing::instrument(skip(state, if_match, req))]
pub async fn update_cover<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    if_match: IfMatch,
    Json(req): Json<CoverRequest>,
) -> Result<Response, ApiError> {
    let book_id = parse_aggregate_id(&id)?;
    let cmd = UpdateCover {
        book_id,
        blob_key: req.blob_key,
        content_type: req.content_type,
    };
    let result = state.books.update_cover(cmd, &context(if_match)).await?;
    Ok(command_response(StatusCode::OK, book_id, &result))
}

/// GET /books/{id}/events
#[tracing::instrument(skip(state))]
pub async fn events<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<EventEnvelopeResponse>>, ApiError> {
    let book_id = parse_aggregate_id(&id)?;
    let envelopes = state.books.book_history(book_id).await?;
    if envelopes.is_empty() {
        return Err(ApiError::NotFound(format!("Book {id} not found")));
    }

    let responses = envelopes
        .into_iter()
        .map(|e| EventEnvelopeResponse {
            event_id: e.event_id.to_string(),
            event_type: e.event_type,
            schema_version: e.schema_version,
            version: e.version.as_i64(),
            timestamp: e.timestamp.to_rfc3339(),
            correlation_id: e.correlation_id.map(|c| c.to_string()),
            payload: e.payload,
        })
        .collect();

    Ok(Json(responses))
}

fn respond<S: EventStore + Clone + 'static>(
    document: BookDocument,
    state: &AppState<S>,
    locale: &common::Locale,
) -> BookResponse {
    let display_title = document
        .title
        .resolve(locale, state.settings.default_locale())
        .map(str::to_string);
    BookResponse {
        document,
        display_title,
        sale_prices: None,
    }
}
