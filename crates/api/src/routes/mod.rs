//! HTTP route handlers.

pub mod admin;
pub mod authors;
pub mod books;
pub mod categories;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod publishers;
pub mod statistics;

use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{AggregateId, Currency, Locale};
use domain::{Aggregate, CommandContext, CommandResult, Prices, Translations};
use serde::Serialize;

use crate::error::ApiError;
use crate::extract::{IfMatch, etag_header};

/// Body returned by every successful mutation, next to the new `ETag`.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub id: AggregateId,
    pub version: i64,
}

pub(crate) fn command_response<A: Aggregate>(
    status: StatusCode,
    id: AggregateId,
    result: &CommandResult<A>,
) -> Response {
    (
        status,
        etag_header(result.etag()),
        Json(CommandResponse {
            id,
            version: result.new_version.as_i64(),
        }),
    )
        .into_response()
}

pub(crate) fn context(IfMatch(etag): IfMatch) -> CommandContext {
    match etag {
        Some(etag) => CommandContext::new().with_expected_etag(etag),
        None => CommandContext::new(),
    }
}

pub(crate) fn parse_aggregate_id(id: &str) -> Result<AggregateId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::invalid_field("id", format!("Invalid ID format: {e}")))
}

pub(crate) fn translations(
    field: &'static str,
    raw: BTreeMap<String, String>,
) -> Result<Translations, ApiError> {
    raw.into_iter().try_fold(Translations::new(), |acc, (code, text)| {
        let locale =
            Locale::parse(&code).map_err(|e| ApiError::invalid_field(field, e.to_string()))?;
        Ok(acc.with(locale, text))
    })
}

pub(crate) fn prices(raw: BTreeMap<String, i64>) -> Result<Prices, ApiError> {
    raw.into_iter().try_fold(Prices::new(), |acc, (code, minor_units)| {
        let currency =
            Currency::parse(&code).map_err(|e| ApiError::invalid_field("prices", e.to_string()))?;
        Ok(acc.with(currency, minor_units))
    })
}

/// Cache tag for one entity, matching the invalidation registry's keys.
pub(crate) fn entity_tag(kind: &str, id: AggregateId) -> String {
    format!("{kind}:{id}")
}
