//! Catalog-wide lookups built once at startup and passed by reference.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing locales, currencies or building settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("invalid locale code: {0:?}")]
    InvalidLocale(String),

    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),
}

/// A culture code such as `en` or `pt-br`.
///
/// Stored lowercased with `-` as the separator so that `pt_BR`, `PT-br` and
/// `pt-br` all compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    pub fn parse(code: &str) -> Result<Self, SettingsError> {
        let normalized = code.trim().replace('_', "-").to_ascii_lowercase();
        let mut parts = normalized.split('-');
        let language = parts.next().unwrap_or_default();
        let language_ok = (2..=3).contains(&language.len())
            && language.chars().all(|c| c.is_ascii_alphabetic());
        let rest_ok = parts
            .all(|p| (2..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()));
        if language_ok && rest_ok {
            Ok(Self(normalized))
        } else {
            Err(SettingsError::InvalidLocale(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Locale {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = SettingsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// ISO 4217 currency code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn parse(code: &str) -> Result<Self, SettingsError> {
        let code_trimmed = code.trim();
        if code_trimmed.len() == 3 && code_trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code_trimmed.to_ascii_uppercase()))
        } else {
            Err(SettingsError::InvalidCurrency(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Currency {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = SettingsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only catalog lookups: which locales and currencies are accepted and
/// which of them are the defaults that every entity must carry.
///
/// Built once at startup from configuration and shared behind an `Arc`.
/// The default locale and currency are always members of their supported
/// sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    default_locale: Locale,
    supported_locales: BTreeSet<Locale>,
    default_currency: Currency,
    supported_currencies: BTreeSet<Currency>,
}

impl CatalogSettings {
    pub fn new(
        default_locale: Locale,
        supported_locales: impl IntoIterator<Item = Locale>,
        default_currency: Currency,
        supported_currencies: impl IntoIterator<Item = Currency>,
    ) -> Self {
        let mut supported_locales: BTreeSet<Locale> = supported_locales.into_iter().collect();
        supported_locales.insert(default_locale.clone());
        let mut supported_currencies: BTreeSet<Currency> =
            supported_currencies.into_iter().collect();
        supported_currencies.insert(default_currency.clone());

        Self {
            default_locale,
            supported_locales,
            default_currency,
            supported_currencies,
        }
    }

    /// Builds settings from comma-separated code lists, as found in
    /// environment variables.
    pub fn from_codes(
        default_locale: &str,
        supported_locales: &str,
        default_currency: &str,
        supported_currencies: &str,
    ) -> Result<Self, SettingsError> {
        let locales = split_codes(supported_locales)
            .map(Locale::parse)
            .collect::<Result<Vec<_>, _>>()?;
        let currencies = split_codes(supported_currencies)
            .map(Currency::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(
            Locale::parse(default_locale)?,
            locales,
            Currency::parse(default_currency)?,
            currencies,
        ))
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    pub fn default_currency(&self) -> &Currency {
        &self.default_currency
    }

    pub fn supported_locales(&self) -> impl Iterator<Item = &Locale> {
        self.supported_locales.iter()
    }

    pub fn supported_currencies(&self) -> impl Iterator<Item = &Currency> {
        self.supported_currencies.iter()
    }

    pub fn is_supported_locale(&self, locale: &Locale) -> bool {
        self.supported_locales.contains(locale)
    }

    pub fn is_supported_currency(&self, currency: &Currency) -> bool {
        self.supported_currencies.contains(currency)
    }

    /// Resolves a requested locale to a supported one, falling back to the
    /// default locale when the request is missing, malformed or unsupported.
    pub fn resolve_locale(&self, requested: Option<&str>) -> Locale {
        requested
            .and_then(|code| Locale::parse(code).ok())
            .filter(|locale| self.is_supported_locale(locale))
            .unwrap_or_else(|| self.default_locale.clone())
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self::new(
            Locale("en".to_string()),
            ["de", "es", "fr"].map(|c| Locale(c.to_string())),
            Currency("EUR".to_string()),
            ["USD", "GBP"].map(|c| Currency(c.to_string())),
        )
    }
}

fn split_codes(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|c| !c.is_empty())
}
