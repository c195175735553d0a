//! # Locale Fields
//!
//! Resolves locale-specific overrides embedded in content field trees.
//!
//! Content documents are nested mappings and sequences. Any key may carry a
//! locale tag, `key@<pattern>`; given a target locale, the tree collapses to a
//! single untagged view where every key holds its most appropriate override:
//!
//! ```
//! use locale_fields::{Fields, untag_fields};
//!
//! let tree: Fields = serde_json::from_str(r#"{
//!     "foo": "bar-base",
//!     "foo@de": "bar-de",
//!     "foo@fr.*": "bar-fr"
//! }"#).unwrap();
//!
//! let fr = untag_fields(&tree, Some("fr")).unwrap();
//! assert_eq!(fr["foo"].as_str(), Some("bar-fr"));
//!
//! let de = untag_fields(&tree, Some("de")).unwrap();
//! assert_eq!(de["foo"].as_str(), Some("bar-de"));
//! ```
//!
//! # Resolution Pipeline
//!
//! ```text
//! raw key ──▶ compat (legacy `@` forms) ──▶ tag (base, pattern)
//!                                               │
//!                                               ▼
//! field tree ──▶ resolve (group by base, rank via pattern) ──▶ untagged tree
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`field`] | The field tree: `Field` union, `Scalar`, ordered `Fields` mapping |
//! | [`tag`] | Splits `base@pattern` keys |
//! | [`compat`] | Legacy `key@` / `key@pattern@` handling and alias retention |
//! | [`pattern`] | Locale pattern grammar (exact, alternation, wildcard) and ranking |
//! | [`resolve`] | Recursive resolver, options and errors |
//! | [`cache`] | Document cache with content fingerprints for incremental builds |
//! | [`storage`] | File storage capability and the local filesystem backend |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`localize`] | Content-directory pipeline: discover, resolve per locale, write |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Precedence
//!
//! Within a group of keys sharing a base name, an exact locale (or one
//! alternative of `a|b`) beats a wildcard, which beats the bare `key@` tag,
//! which beats the untagged base. Ties go to the key declared last, which is
//! why mappings are insertion-ordered [`indexmap::IndexMap`]s rather than
//! hash maps.
//!
//! ## Wildcard Anchoring
//!
//! Wildcards are regular expressions matched against the whole locale string
//! (`fr.*` matches `fr`, `fr_FR` and `fr_CA`, but `de` never matches
//! `de_AT`). The alternative rule, matching only the language subtag, is
//! available as [`WildcardAnchoring::LanguageSubtag`].
//!
//! ## Legacy Aliases
//!
//! Keys written as `key@` or `key@pattern@` come from content authored before
//! locale patterns existed. Their groups emit the resolved value under both
//! `key` and `key@`, so templates reading either spelling keep working.
//!
//! ## Bounded Recursion
//!
//! Resolution recurses once per container level. Trees nested deeper than
//! [`ResolveOptions::max_depth`] are rejected with an error instead of risking
//! the stack.

pub mod cache;
pub mod compat;
pub mod config;
pub mod field;
pub mod localize;
pub mod output;
pub mod pattern;
pub mod resolve;
pub mod storage;
pub mod tag;

pub use compat::BareTagRetention;
pub use field::{Field, Fields, Scalar};
pub use pattern::{LocalePattern, MatchRank, PatternError, WildcardAnchoring};
pub use resolve::{ResolveError, ResolveOptions, Resolver, untag_fields};

#[cfg(test)]
pub(crate) mod test_helpers;
