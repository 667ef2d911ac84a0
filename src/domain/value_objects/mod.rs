//! Value Objects for the storefront

use serde::{Deserialize, Serialize};
use std::fmt;

/// URL slug value object (`"Honey Jar 250g"` -> `"honey-jar-250g"`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    fn new(value: impl Into<String>) -> Result<Self, SlugError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(SlugError::Empty); }
        if value.len() > 200 { return Err(SlugError::TooLong); }
        Ok(Self(value))
    }

    /// Derives a slug from a display name: lowercase, runs of anything outside
    /// `[a-z0-9]` collapse to one `-`, no leading or trailing dashes.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(name.len());
        let mut pending_dash = false;
        for ch in name.to_lowercase().chars() {
            if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
                if pending_dash && !slug.is_empty() { slug.push('-'); }
                pending_dash = false;
                slug.push(ch);
            } else {
                pending_dash = true;
            }
        }
        Self::new(slug)
    }

    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    #[error("slug empty")]
    Empty,
    #[error("slug too long")]
    TooLong,
}

/// Which catalog table a record lives in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Product,
    Bundle,
}

impl ItemKind {
    pub fn table(self) -> &'static str {
        match self { Self::Product => "products", Self::Bundle => "bundles" }
    }

    /// Path segment used by the third-party catalog (`/api/{kind}s/slug/..`).
    pub fn as_str(self) -> &'static str {
        match self { Self::Product => "product", Self::Bundle => "bundle" }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "product" => Some(Self::Product),
            "bundle" => Some(Self::Bundle),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_slug_from_name() {
        assert_eq!(Slug::from_name("  Madu Hutan 250g! ").unwrap().as_str(), "madu-hutan-250g");
        assert_eq!(Slug::from_name("--Raw & Wild--").unwrap().as_str(), "raw-wild");
    }
    #[test]
    fn test_slug_rejects_symbols_only() {
        assert_eq!(Slug::from_name("!!!"), Err(SlugError::Empty));
    }
    #[test]
    fn test_item_kind() {
        assert_eq!(ItemKind::parse("bundle"), Some(ItemKind::Bundle));
        assert_eq!(ItemKind::parse("combo"), None);
        assert_eq!(ItemKind::Bundle.table(), "bundles");
        assert_eq!(ItemKind::default(), ItemKind::Product);
    }
}
