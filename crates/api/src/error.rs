//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, ErrorKind};
use projections::ProjectionError;
use serde::Serialize;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Malformed request input, optionally naming the field.
    BadRequest {
        message: String,
        field: Option<String>,
    },
    Domain(DomainError),
    Projection(ProjectionError),
    /// Internal server error.
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            field: None,
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, body(msg, None)),
            ApiError::BadRequest { message, field } => {
                (StatusCode::BAD_REQUEST, body(message, field))
            }
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Projection(ProjectionError::UnknownProjection(name)) => (
                StatusCode::NOT_FOUND,
                body(format!("Unknown projection: {name}"), None),
            ),
            ApiError::Projection(err) => {
                tracing::error!(error = %err, "projection failure");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody {
                        error: err.to_string(),
                        field: None,
                        retryable: true,
                    },
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, body(msg, None))
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

fn body(error: String, field: Option<String>) -> ErrorBody {
    ErrorBody {
        error,
        field,
        retryable: false,
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, ErrorBody) {
    let status = match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Domain => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Concurrency => StatusCode::PRECONDITION_FAILED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Infrastructure => {
            tracing::error!(error = %err, "infrastructure failure");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    (
        status,
        ErrorBody {
            error: err.to_string(),
            field: err.field().map(str::to_string),
            retryable: err.is_retryable(),
        },
    )
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        ApiError::Projection(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{BookError, ValidationError};
    use event_store::{ETag, EventStoreError, Version};

    fn status_of(err: DomainError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn domain_kinds_map_to_statuses() {
        assert_eq!(
            status_of(DomainError::Book(BookError::Invalid(ValidationError::new(
                "isbn", "bad"
            )))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::Book(BookError::Deleted)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(DomainError::PreconditionFailed {
                expected: ETag::from_version(Version::new(1)),
                actual: ETag::from_version(Version::new(2)),
            }),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            status_of(DomainError::AggregateNotFound {
                aggregate_type: "Book",
                aggregate_id: "x".into(),
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::EventStore(EventStoreError::InvalidAppend(
                "empty".into()
            ))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn unknown_projection_is_not_found() {
        let response =
            ApiError::from(ProjectionError::UnknownProjection("Nope".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
