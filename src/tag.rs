//! Splitting mapping keys into a base name and an optional locale pattern.
//!
//! Key forms:
//!
//! | Raw key          | Base    | Pattern   | Legacy |
//! |------------------|---------|-----------|--------|
//! | `title`          | `title` | none      | no     |
//! | `title@fr`       | `title` | `fr`      | no     |
//! | `title@fr.*`     | `title` | `fr.*`    | no     |
//! | `title@`         | `title` | none      | yes    |
//! | `title@fr@`      | `title` | `fr`      | yes    |
//!
//! The split happens on the first `@`, so the base never contains one. Any
//! string is a valid key; parsing cannot fail.

use crate::compat;

/// A mapping key broken into its parts. Borrows from the raw key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedKey<'a> {
    /// Untagged name shared by every variant of this key.
    pub base: &'a str,
    /// Locale pattern after the `@`, if there is a non-empty one.
    pub pattern: Option<&'a str>,
    /// Written in a legacy form (`key@` or `key@pattern@`). Groups with a
    /// legacy member also emit the `key@` alias in resolved output.
    pub legacy: bool,
}

impl<'a> TaggedKey<'a> {
    /// `key@` with no pattern: always active, ranked just above the base.
    pub fn is_bare(&self) -> bool {
        self.legacy && self.pattern.is_none()
    }

    pub fn is_untagged(&self) -> bool {
        !self.legacy && self.pattern.is_none()
    }
}

/// Parse a raw mapping key.
pub fn parse_key(raw: &str) -> TaggedKey<'_> {
    let normalized = compat::normalize_key(raw);
    match normalized.key.split_once('@') {
        None => TaggedKey {
            base: normalized.key,
            pattern: None,
            legacy: normalized.legacy,
        },
        Some((base, "")) => TaggedKey {
            base,
            pattern: None,
            legacy: true,
        },
        Some((base, pattern)) => TaggedKey {
            base,
            pattern: Some(pattern),
            legacy: normalized.legacy,
        },
    }
}
