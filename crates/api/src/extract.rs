//! Request extractors for concurrency and cache scope headers.

use std::collections::HashMap;

use axum::extract::{FromRequestParts, Query};
use axum::http::HeaderMap;
use axum::http::header::{ACCEPT_LANGUAGE, ETAG, IF_MATCH};
use axum::http::request::Parts;
use common::{CatalogSettings, Locale};
use event_store::ETag;

use crate::error::ApiError;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const ADMIN_HEADER: &str = "x-catalog-admin";
pub const DEFAULT_TENANT: &str = "default";

/// The caller's `If-Match` tag. Absent means "no precondition".
#[derive(Debug, Clone, Copy, Default)]
pub struct IfMatch(pub Option<ETag>);

impl<S: Send + Sync> FromRequestParts<S> for IfMatch {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(IF_MATCH) else {
            return Ok(IfMatch(None));
        };
        let raw = raw
            .to_str()
            .map_err(|_| ApiError::invalid_field("If-Match", "header is not valid text"))?;
        if raw.trim() == "*" {
            return Ok(IfMatch(None));
        }
        ETag::parse(raw)
            .map(|etag| IfMatch(Some(etag)))
            .map_err(|e| ApiError::invalid_field("If-Match", e.to_string()))
    }
}

/// Everything that partitions cached reads: locale, tenant and role.
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    requested_locale: Option<String>,
    pub tenant: String,
    pub admin: bool,
}

impl RequestScope {
    /// The requested locale if supported, otherwise the default locale.
    pub fn locale(&self, settings: &CatalogSettings) -> Locale {
        settings.resolve_locale(self.requested_locale.as_deref())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        let requested_locale = params
            .get("locale")
            .cloned()
            .or_else(|| first_language(&parts.headers));

        let tenant = header_text(&parts.headers, TENANT_HEADER)
            .unwrap_or(DEFAULT_TENANT)
            .to_string();
        let admin = header_text(&parts.headers, ADMIN_HEADER)
            .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1");

        Ok(RequestScope {
            requested_locale,
            tenant,
            admin,
        })
    }
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// First tag of an `Accept-Language` header, ignoring quality weights.
fn first_language(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ACCEPT_LANGUAGE)?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .and_then(|tag| tag.split(';').next())
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && *tag != "*")
        .map(str::to_string)
}

/// `ETag` response header for a stream version.
pub fn etag_header(etag: ETag) -> [(axum::http::HeaderName, String); 1] {
    [(ETAG, etag.to_header_value())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use event_store::Version;

    async fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn if_match_forms() {
        let mut p = parts(Request::builder().header(IF_MATCH, "\"3\"")).await;
        let IfMatch(tag) = IfMatch::from_request_parts(&mut p, &()).await.unwrap();
        assert_eq!(tag, Some(ETag::from_version(Version::new(3))));

        let mut p = parts(Request::builder()).await;
        let IfMatch(tag) = IfMatch::from_request_parts(&mut p, &()).await.unwrap();
        assert_eq!(tag, None);

        let mut p = parts(Request::builder().header(IF_MATCH, "abc")).await;
        assert!(IfMatch::from_request_parts(&mut p, &()).await.is_err());
    }

    #[tokio::test]
    async fn scope_reads_query_and_headers() {
        let settings = CatalogSettings::default();
        let mut p = parts(
            Request::builder()
                .uri("/books?locale=de")
                .header(TENANT_HEADER, "acme")
                .header(ADMIN_HEADER, "true"),
        )
        .await;

        let scope = RequestScope::from_request_parts(&mut p, &()).await.unwrap();

        assert_eq!(scope.locale(&settings).as_str(), "de");
        assert_eq!(scope.tenant, "acme");
        assert!(scope.admin);
    }

    #[tokio::test]
    async fn scope_falls_back_to_accept_language_and_defaults() {
        let settings = CatalogSettings::default();
        let mut p = parts(
            Request::builder()
                .uri("/books")
                .header(ACCEPT_LANGUAGE, "fr-CH, fr;q=0.9"),
        )
        .await;

        let scope = RequestScope::from_request_parts(&mut p, &()).await.unwrap();

        // fr-ch is not supported, so the default applies.
        assert_eq!(scope.locale(&settings).as_str(), "en");
        assert_eq!(scope.tenant, DEFAULT_TENANT);
        assert!(!scope.admin);
    }
}
