//! Entity tags derived from stream versions.

use std::str::FromStr;

use thiserror::Error;

use crate::Version;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed entity tag: {0:?}")]
pub struct ETagParseError(pub String);

/// Opaque concurrency token handed to clients.
///
/// It encodes nothing but the stream version observed at read time, so two
/// reads of an unchanged stream always produce the same tag. It is never
/// stored as domain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ETag(Version);

impl ETag {
    pub fn from_version(version: Version) -> Self {
        Self(version)
    }

    pub fn version(&self) -> Version {
        self.0
    }

    /// Quoted form used in `ETag` response headers: `"3"`.
    pub fn to_header_value(&self) -> String {
        format!("\"{}\"", self.0)
    }

    /// Parses a tag as sent in `If-Match`, accepting the quoted, bare and
    /// weak (`W/"3"`) forms.
    pub fn parse(raw: &str) -> Result<Self, ETagParseError> {
        let trimmed = raw.trim();
        let unweak = trimmed.strip_prefix("W/").unwrap_or(trimmed);
        let unquoted = unweak
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(unweak);

        unquoted
            .parse::<i64>()
            .ok()
            .filter(|v| *v >= 0)
            .map(|v| Self(Version::new(v)))
            .ok_or_else(|| ETagParseError(raw.to_string()))
    }
}

impl FromStr for ETag {
    type Err = ETagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Version> for ETag {
    fn from(version: Version) -> Self {
        Self(version)
    }
}

impl std::fmt::Display for ETag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
