//! Locale patterns and how well they match a target locale.
//!
//! The text after `@` in a key is parsed into a small closed grammar:
//!
//! - **Exact** (`de_AT`): matches only that locale.
//! - **Alternation** (`fr|it`): matches any listed locale exactly.
//! - **Wildcard** (`fr.*`, `(de|at)_.*`): a regular expression, always matched
//!   against the whole subject. What the subject is depends on
//!   [`WildcardAnchoring`].
//!
//! A pattern is classified as a wildcard as soon as it contains a regex
//! metacharacter; alternation is only the plain `a|b` form.
//!
//! ## Ranking
//!
//! Candidates in a resolution group are compared by [`MatchRank`]:
//!
//! ```text
//! Exact     pattern (or one alternative) equals the locale
//! Pattern   wildcard matches the locale
//! Default   bare `key@` tag, active for every locale
//! Base      untagged key
//! ```
//!
//! Without a target locale only `Default` and `Base` candidates exist; every
//! pattern-tagged key is ignored.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

const WILDCARD_CHARS: &[char] = &[
    '.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '^', '$', '\\',
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("invalid locale pattern `{pattern}`: {reason}")]
    Invalid { pattern: String, reason: String },
}

impl PatternError {
    fn invalid(pattern: &str, reason: impl Into<String>) -> Self {
        PatternError::Invalid {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// How specific a candidate is for the requested locale. Higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchRank {
    Base,
    Default,
    Pattern,
    Exact,
}

/// What a wildcard pattern is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WildcardAnchoring {
    /// The full locale string: `fr.*` matches `fr`, `fr_FR` and `fr_CA`.
    #[default]
    FullLocale,
    /// Only the language subtag, the part before the first `_` or `-`:
    /// `fr.*` matches `fr_FR` through `fr`, and `de_.*` matches nothing.
    LanguageSubtag,
}

impl WildcardAnchoring {
    fn subject<'a>(&self, locale: &'a str) -> &'a str {
        match self {
            WildcardAnchoring::FullLocale => locale,
            WildcardAnchoring::LanguageSubtag => {
                locale.split(['_', '-']).next().unwrap_or(locale)
            }
        }
    }
}

/// A parsed locale pattern.
#[derive(Debug, Clone)]
pub enum LocalePattern {
    Exact(String),
    Alternation(Vec<String>),
    Wildcard { source: String, regex: Regex },
}

impl LocalePattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::invalid(pattern, "empty pattern"));
        }
        if pattern.chars().any(char::is_whitespace) {
            return Err(PatternError::invalid(pattern, "contains whitespace"));
        }
        if pattern.contains(WILDCARD_CHARS) {
            let regex = Regex::new(&format!("^(?:{pattern})$"))
                .map_err(|e| PatternError::invalid(pattern, e.to_string()))?;
            return Ok(LocalePattern::Wildcard {
                source: pattern.to_string(),
                regex,
            });
        }
        if pattern.contains('|') {
            let alternatives: Vec<String> = pattern.split('|').map(str::to_string).collect();
            if alternatives.iter().any(String::is_empty) {
                return Err(PatternError::invalid(pattern, "empty alternative"));
            }
            return Ok(LocalePattern::Alternation(alternatives));
        }
        Ok(LocalePattern::Exact(pattern.to_string()))
    }

    /// The pattern as written.
    pub fn source(&self) -> String {
        match self {
            LocalePattern::Exact(s) => s.clone(),
            LocalePattern::Alternation(alts) => alts.join("|"),
            LocalePattern::Wildcard { source, .. } => source.clone(),
        }
    }

    /// Rank this pattern against `locale`, or `None` if it does not apply.
    pub fn matches(&self, locale: &str, anchoring: WildcardAnchoring) -> Option<MatchRank> {
        match self {
            LocalePattern::Exact(s) => (s == locale).then_some(MatchRank::Exact),
            LocalePattern::Alternation(alts) => alts
                .iter()
                .any(|alt| alt == locale)
                .then_some(MatchRank::Exact),
            LocalePattern::Wildcard { source, regex } => {
                if source == locale {
                    Some(MatchRank::Exact)
                } else if regex.is_match(anchoring.subject(locale)) {
                    Some(MatchRank::Pattern)
                } else {
                    None
                }
            }
        }
    }
}

/// Rank one candidate key.
///
/// `pattern` is the parsed pattern of a tagged key (`None` for untagged and
/// bare keys); `bare` marks a `key@` candidate.
pub fn rank(
    pattern: Option<&LocalePattern>,
    bare: bool,
    locale: Option<&str>,
    anchoring: WildcardAnchoring,
) -> Option<MatchRank> {
    match (pattern, locale) {
        (Some(p), Some(l)) => p.matches(l, anchoring),
        (Some(_), None) => None,
        (None, _) if bare => Some(MatchRank::Default),
        (None, _) => Some(MatchRank::Base),
    }
}

/// Patterns parsed so far in one resolution pass.
///
/// The same few patterns repeat across every level of a document, so each
/// distinct source string is parsed and compiled once.
#[derive(Debug, Default)]
pub struct PatternTable {
    parsed: HashMap<String, LocalePattern>,
}

impl PatternTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, pattern: &str) -> Result<&LocalePattern, PatternError> {
        if !self.parsed.contains_key(pattern) {
            let parsed = LocalePattern::parse(pattern)?;
            self.parsed.insert(pattern.to_string(), parsed);
        }
        self.parsed
            .get(pattern)
            .ok_or_else(|| PatternError::invalid(pattern, "pattern table lookup failed"))
    }

    pub fn len(&self) -> usize {
        self.parsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty()
    }
}
