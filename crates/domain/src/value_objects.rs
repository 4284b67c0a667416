//! Value objects shared by the catalog aggregates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{CatalogSettings, Currency, Locale};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const MAX_TITLE_CHARS: usize = 250;
pub const MAX_DESCRIPTION_CHARS: usize = 4000;
pub const MAX_NAME_CHARS: usize = 200;
pub const MAX_CATEGORY_NAME_CHARS: usize = 100;

/// Trims a required single-language name and checks its length.
pub fn validate_name(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max_chars} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Text keyed by locale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Translations(BTreeMap<Locale, String>);

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, locale: Locale, text: impl Into<String>) -> Self {
        self.0.insert(locale, text.into());
        self
    }

    pub fn get(&self, locale: &Locale) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    /// Text in `locale`, falling back to `default_locale`.
    pub fn resolve(&self, locale: &Locale, default_locale: &Locale) -> Option<&str> {
        self.get(locale).or_else(|| self.get(default_locale))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Locale, &str)> {
        self.0.iter().map(|(l, t)| (l, t.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks locales, lengths and, when `required`, the default-locale entry.
    pub fn validate(
        &self,
        field: &'static str,
        settings: &CatalogSettings,
        max_chars: usize,
        required: bool,
    ) -> Result<(), ValidationError> {
        for (locale, text) in &self.0 {
            if !settings.is_supported_locale(locale) {
                return Err(ValidationError::new(
                    field,
                    format!("unsupported locale {locale}"),
                ));
            }
            if text.trim().is_empty() {
                return Err(ValidationError::new(
                    field,
                    format!("translation for {locale} must not be empty"),
                ));
            }
            if text.chars().count() > max_chars {
                return Err(ValidationError::new(
                    field,
                    format!("translation for {locale} must be at most {max_chars} characters"),
                ));
            }
        }

        if required && self.get(settings.default_locale()).is_none() {
            return Err(ValidationError::new(
                field,
                format!(
                    "a translation for the default locale {} is required",
                    settings.default_locale()
                ),
            ));
        }

        Ok(())
    }
}

impl FromIterator<(Locale, String)> for Translations {
    fn from_iter<T: IntoIterator<Item = (Locale, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Prices in minor units (cents) keyed by currency.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prices(BTreeMap<Currency, i64>);

impl Prices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, currency: Currency, minor_units: i64) -> Self {
        self.0.insert(currency, minor_units);
        self
    }

    pub fn get(&self, currency: &Currency) -> Option<i64> {
        self.0.get(currency).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Currency, i64)> {
        self.0.iter().map(|(c, a)| (c, *a))
    }

    pub fn validate(&self, settings: &CatalogSettings) -> Result<(), ValidationError> {
        for (currency, amount) in &self.0 {
            if !settings.is_supported_currency(currency) {
                return Err(ValidationError::new(
                    "prices",
                    format!("unsupported currency {currency}"),
                ));
            }
            if *amount <= 0 {
                return Err(ValidationError::new(
                    "prices",
                    format!("price in {currency} must be positive"),
                ));
            }
        }

        if self.get(settings.default_currency()).is_none() {
            return Err(ValidationError::new(
                "prices",
                format!(
                    "a price in the default currency {} is required",
                    settings.default_currency()
                ),
            ));
        }

        Ok(())
    }
}

impl FromIterator<(Currency, i64)> for Prices {
    fn from_iter<T: IntoIterator<Item = (Currency, i64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An ISBN-10 or ISBN-13, stored without separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isbn(String);

impl Isbn {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, '-' | ' '))
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let valid = match normalized.len() {
            10 => isbn10_checksum_ok(&normalized),
            13 => isbn13_checksum_ok(&normalized),
            _ => false,
        };

        if valid {
            Ok(Self(normalized))
        } else {
            Err(ValidationError::new(
                "isbn",
                format!("{raw:?} is not a valid ISBN-10 or ISBN-13"),
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn isbn10_checksum_ok(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in digits.chars().enumerate() {
        let value = match c {
            '0'..='9' => c as u32 - '0' as u32,
            'X' if i == 9 => 10,
            _ => return false,
        };
        sum += value * (10 - i as u32);
    }
    sum % 11 == 0
}

fn isbn13_checksum_ok(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in digits.chars().enumerate() {
        let Some(value) = c.to_digit(10) else {
            return false;
        };
        sum += if i % 2 == 0 { value } else { value * 3 };
    }
    sum % 10 == 0
}

impl TryFrom<String> for Isbn {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Isbn> for String {
    fn from(isbn: Isbn) -> Self {
        isbn.0
    }
}

impl std::fmt::Display for Isbn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scheduled percentage discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub discount_percent: u8,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl Sale {
    pub fn new(
        discount_percent: i32,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let discount_percent = u8::try_from(discount_percent)
            .ok()
            .filter(|d| *d <= 100)
            .ok_or_else(|| {
                ValidationError::new("discount_percent", "must be between 0 and 100")
            })?;

        if starts_at >= ends_at {
            return Err(ValidationError::new(
                "ends_at",
                "sale must end after it starts",
            ));
        }

        Ok(Self {
            discount_percent,
            starts_at,
            ends_at,
        })
    }

    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.starts_at <= at && at < self.ends_at
    }

    /// Discounted amount, rounded down to the minor unit. `None` on overflow.
    pub fn apply_to(&self, minor_units: i64) -> Option<i64> {
        minor_units
            .checked_mul(100 - i64::from(self.discount_percent))
            .map(|scaled| scaled / 100)
    }

    /// Every price with the discount applied. Amounts that cannot be
    /// discounted without overflow are left out.
    pub fn discount(&self, prices: &Prices) -> Prices {
        prices
            .iter()
            .filter_map(|(currency, amount)| {
                self.apply_to(amount).map(|discounted| (currency.clone(), discounted))
            })
            .collect()
    }
}

/// Reference to a cover image held in blob storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverRef {
    pub blob_key: String,
    pub content_type: String,
}

impl CoverRef {
    pub fn new(
        blob_key: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let blob_key = blob_key.into().trim().to_string();
        let content_type = content_type.into().trim().to_ascii_lowercase();

        if blob_key.is_empty() {
            return Err(ValidationError::new("blob_key", "must not be empty"));
        }
        if !content_type.starts_with("image/") {
            return Err(ValidationError::new(
                "content_type",
                "cover must be an image",
            ));
        }

        Ok(Self {
            blob_key,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn locale(code: &str) -> Locale {
        Locale::parse(code).unwrap()
    }

    fn currency(code: &str) -> Currency {
        Currency::parse(code).unwrap()
    }

    #[test]
    fn isbn_accepts_valid_checksums_and_normalizes() {
        assert_eq!(Isbn::parse("978-0-441-01359-3").unwrap().as_str(), "9780441013593");
        assert_eq!(Isbn::parse("0-8044-2957-X").unwrap().as_str(), "080442957X");
    }

    #[test]
    fn isbn_rejects_bad_checksum_and_length() {
        assert!(Isbn::parse("978-0-441-01359-4").is_err());
        assert!(Isbn::parse("0-8044-2957-1").is_err());
        assert!(Isbn::parse("12345").is_err());
        assert!(Isbn::parse("X804429570").is_err());
    }

    #[test]
    fn translations_require_default_locale() {
        let settings = CatalogSettings::default();
        let only_german = Translations::new().with(locale("de"), "Dune");

        let err = only_german
            .validate("title", &settings, MAX_TITLE_CHARS, true)
            .unwrap_err();
        assert_eq!(err.field, "title");

        assert!(
            only_german
                .validate("description", &settings, MAX_DESCRIPTION_CHARS, false)
                .is_ok()
        );
    }

    #[test]
    fn translations_reject_unsupported_locale_and_long_text() {
        let settings = CatalogSettings::default();

        let japanese = Translations::new()
            .with(locale("en"), "Dune")
            .with(locale("ja"), "デューン");
        assert!(japanese.validate("title", &settings, MAX_TITLE_CHARS, true).is_err());

        let long = Translations::new().with(locale("en"), "x".repeat(MAX_TITLE_CHARS + 1));
        assert!(long.validate("title", &settings, MAX_TITLE_CHARS, true).is_err());
    }

    #[test]
    fn translations_resolve_falls_back_to_default() {
        let title = Translations::new().with(locale("en"), "Dune");
        assert_eq!(title.resolve(&locale("fr"), &locale("en")), Some("Dune"));
    }

    #[test]
    fn prices_validation() {
        let settings = CatalogSettings::default();

        let ok = Prices::new().with(currency("EUR"), 1999).with(currency("USD"), 2199);
        assert!(ok.validate(&settings).is_ok());

        let missing_default = Prices::new().with(currency("USD"), 2199);
        assert!(missing_default.validate(&settings).is_err());

        let unsupported = Prices::new().with(currency("EUR"), 1999).with(currency("JPY"), 300);
        assert!(unsupported.validate(&settings).is_err());

        let zero = Prices::new().with(currency("EUR"), 0);
        assert!(zero.validate(&settings).is_err());
    }

    #[test]
    fn sale_bounds() {
        let start = Utc::now();
        let end = start + Duration::days(7);

        assert!(Sale::new(0, start, end).is_ok());
        assert!(Sale::new(100, start, end).is_ok());
        assert_eq!(Sale::new(101, start, end).unwrap_err().field, "discount_percent");
        assert!(Sale::new(-1, start, end).is_err());
        assert_eq!(Sale::new(10, end, start).unwrap_err().field, "ends_at");
        assert!(Sale::new(10, start, start).is_err());
    }

    #[test]
    fn sale_discount_math() {
        let start = Utc::now();
        let sale = Sale::new(25, start, start + Duration::days(1)).unwrap();
        assert_eq!(sale.apply_to(1999), Some(1499));
        assert!(sale.is_active_at(start));
        assert!(!sale.is_active_at(start + Duration::days(1)));
    }

    #[test]
    fn sale_discount_never_overflows() {
        let start = Utc::now();
        let sale = Sale::new(10, start, start + Duration::days(1)).unwrap();
        assert_eq!(sale.apply_to(i64::MAX), None);

        let prices = Prices::new()
            .with(currency("EUR"), 2000)
            .with(currency("USD"), i64::MAX);
        let discounted = sale.discount(&prices);

        assert_eq!(discounted.get(&currency("EUR")), Some(1800));
        assert_eq!(discounted.get(&currency("USD")), None);
    }

    #[test]
    fn cover_requires_image_content_type() {
        assert!(CoverRef::new("covers/dune.jpg", "image/jpeg").is_ok());
        assert!(CoverRef::new("", "image/png").is_err());
        assert!(CoverRef::new("covers/dune.pdf", "application/pdf").is_err());
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(validate_name("name", "  Tor  ", MAX_NAME_CHARS).unwrap(), "Tor");
        assert!(validate_name("name", "   ", MAX_NAME_CHARS).is_err());
        assert!(validate_name("name", &"a".repeat(MAX_NAME_CHARS + 1), MAX_NAME_CHARS).is_err());
    }
}
