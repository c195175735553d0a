//! Compatibility with content written before locale patterns existed.
//!
//! Older content marks override slots with a trailing `@`: `title@` means
//! "the localizable value", and `title@fr@` is the French override of that
//! slot. Two things keep that content working:
//!
//! - [`normalize_key`] strips the trailing `@` of the doubled form before the
//!   key reaches the tag parser, remembering that it was there.
//! - [`retain_alias`] re-emits the resolved value under `base@` next to
//!   `base`, since templates written against the old syntax read the tagged
//!   name directly.

use crate::field::{Field, Fields};
use serde::{Deserialize, Serialize};

/// When a resolution group with a legacy member also emits `base@`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BareTagRetention {
    /// Always emit the alias.
    #[default]
    Always,
    /// Only when the resolved value is a sequence.
    Sequences,
}

/// A raw key with the legacy trailing `@` removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedKey<'a> {
    pub key: &'a str,
    pub legacy: bool,
}

/// Strip the trailing `@` from `key@pattern@`. A lone trailing `@` (`key@`)
/// is left for the tag parser, which reads it as a bare tag.
pub fn normalize_key(raw: &str) -> NormalizedKey<'_> {
    match raw.strip_suffix('@') {
        Some(stripped) if stripped.contains('@') => NormalizedKey {
            key: stripped,
            legacy: true,
        },
        _ => NormalizedKey {
            key: raw,
            legacy: false,
        },
    }
}

/// The bare-tag spelling of a base key.
pub fn alias_key(base: &str) -> String {
    format!("{base}@")
}

/// Emit `base@ -> value` into `output` when the policy calls for it.
pub fn retain_alias(output: &mut Fields, base: &str, value: &Field, policy: BareTagRetention) {
    let keep = match policy {
        BareTagRetention::Always => true,
        BareTagRetention::Sequences => value.is_sequence(),
    };
    if keep {
        output.insert(alias_key(base), value.clone());
    }
}
