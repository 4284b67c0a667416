//! Deterministic cache keys.

use std::collections::BTreeMap;
use std::fmt;

use common::Locale;

/// Identifies one cached query result.
///
/// Rendered as `operation|k1=v1&k2=v2|locale=..|tenant=..|admin=0|1`.
/// Parameters are sorted by name, so two logically identical requests
/// always produce the same key whatever order they were built in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: String,
    params: BTreeMap<String, String>,
    locale: String,
    tenant: String,
    admin: bool,
}

impl CacheKey {
    pub fn new(operation: impl Into<String>, locale: &Locale, tenant: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            params: BTreeMap::new(),
            locale: locale.as_str().to_string(),
            tenant: tenant.into(),
            admin: false,
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// Adds the parameter only when a value is present.
    pub fn param_opt<V: fmt::Display>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    pub fn admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|", escape(&self.operation))?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", escape(name), escape(value))?;
        }
        write!(
            f,
            "|locale={}|tenant={}|admin={}",
            escape(&self.locale),
            escape(&self.tenant),
            u8::from(self.admin)
        )
    }
}

/// Percent-encodes the separators so user input cannot forge another key.
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            '|' => out.push_str("%7C"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> Locale {
        Locale::parse("en").unwrap()
    }

    #[test]
    fn renders_the_documented_layout() {
        let key = CacheKey::new("books.search", &en(), "acme")
            .param("q", "dune")
            .param("limit", 20)
            .admin(true);

        assert_eq!(
            key.to_string(),
            "books.search|limit=20&q=dune|locale=en|tenant=acme|admin=1"
        );
    }

    #[test]
    fn parameter_order_does_not_matter() {
        let a = CacheKey::new("books.search", &en(), "t")
            .param("author", "x")
            .param("category", "y");
        let b = CacheKey::new("books.search", &en(), "t")
            .param("category", "y")
            .param("author", "x");

        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn scope_changes_the_key() {
        let base = CacheKey::new("books.get", &en(), "t").param("id", 1);

        assert_ne!(
            base.to_string(),
            CacheKey::new("books.get", &Locale::parse("de").unwrap(), "t")
                .param("id", 1)
                .to_string()
        );
        assert_ne!(base.to_string(), base.clone().admin(true).to_string());
        assert_ne!(
            base.to_string(),
            CacheKey::new("books.get", &en(), "u").param("id", 1).to_string()
        );
    }

    #[test]
    fn separators_in_values_are_escaped() {
        let forged = CacheKey::new("books.search", &en(), "t").param("q", "a&limit=1");
        let honest = CacheKey::new("books.search", &en(), "t")
            .param("q", "a")
            .param("limit", 1);

        assert_ne!(forged.to_string(), honest.to_string());
        assert!(forged.to_string().contains("q=a%26limit%3D1"));
    }

    #[test]
    fn absent_optional_params_are_omitted() {
        let key = CacheKey::new("authors.list", &en(), "t").param_opt::<u32>("page", None);

        assert_eq!(key.to_string(), "authors.list||locale=en|tenant=t|admin=0");
    }
}
