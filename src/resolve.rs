//! Collapsing a tagged field tree into the view for one locale.
//!
//! Every mapping level is partitioned into resolution groups by base key
//! (`title`, `title@fr`, `title@fr.*` and `title@` all belong to `title`).
//! Each group elects one winner by [`MatchRank`], with the later-declared
//! key winning ties, and only the winner's value is resolved further and
//! emitted under the untagged base. Groups without a matching candidate are
//! dropped from that level.
//!
//! ```text
//! { foo: "base", foo@de: "de", foo@fr.*: "fr" }
//!     locale fr  →  { foo: "fr" }
//!     locale de  →  { foo: "de" }
//!     locale ja  →  { foo: "base" }
//! ```
//!
//! Sequences are resolved element by element, keeping their length and
//! order; scalars pass through. The input is only borrowed, and the result
//! is a freshly built tree.
//!
//! Nesting deeper than [`ResolveOptions::max_depth`] is rejected with
//! [`ResolveError::DepthExceeded`] rather than recursing without bound.

use crate::compat::{self, BareTagRetention};
use crate::field::{Field, Fields};
use crate::pattern::{self, MatchRank, PatternError, PatternTable, WildcardAnchoring};
use crate::tag;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Upper bound accepted for [`ResolveOptions::max_depth`].
pub const MAX_DEPTH_CEILING: usize = 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid locale pattern in key `{key}` at {path}: {source}")]
    InvalidPattern {
        key: String,
        path: String,
        #[source]
        source: PatternError,
    },
    #[error("field tree at {path} nests deeper than {limit} levels")]
    DepthExceeded { path: String, limit: usize },
}

/// Resolution settings, read from the `[resolve]` table of `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveOptions {
    /// Deepest container nesting accepted. The top-level mapping is level 1.
    pub max_depth: usize,
    /// Subject that wildcard patterns are matched against.
    pub wildcard: WildcardAnchoring,
    /// When groups with a legacy member also emit `key@`.
    pub bare_tags: BareTagRetention,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: 128,
            wildcard: WildcardAnchoring::default(),
            bare_tags: BareTagRetention::default(),
        }
    }
}

/// Resolves field trees with a fixed set of options.
///
/// Holds no per-call state, so one resolver can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    options: ResolveOptions,
}

impl Resolver {
    pub fn new(options: ResolveOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolve a mapping for `locale`. An empty locale is treated as none.
    pub fn resolve(&self, fields: &Fields, locale: Option<&str>) -> Result<Fields, ResolveError> {
        let mut pass = Pass::new(&self.options, locale);
        pass.enter()?;
        pass.mapping(fields)
    }

    /// Resolve any field; scalars come back unchanged.
    pub fn resolve_field(
        &self,
        field: &Field,
        locale: Option<&str>,
    ) -> Result<Field, ResolveError> {
        Pass::new(&self.options, locale).field(field)
    }
}

/// Resolve with default options.
pub fn untag_fields(fields: &Fields, locale: Option<&str>) -> Result<Fields, ResolveError> {
    Resolver::default().resolve(fields, locale)
}

#[derive(Debug, Clone)]
enum Segment {
    Key(String),
    Index(usize),
}

struct FieldPath<'a>(&'a [Segment]);

impl fmt::Display for FieldPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Best candidate seen so far for one base key.
#[derive(Default)]
struct Group<'a> {
    winner: Option<(MatchRank, &'a str, &'a Field)>,
    legacy: bool,
}

/// State for a single resolution call.
struct Pass<'o> {
    options: &'o ResolveOptions,
    locale: Option<&'o str>,
    patterns: PatternTable,
    path: Vec<Segment>,
    depth: usize,
}

impl<'o> Pass<'o> {
    fn new(options: &'o ResolveOptions, locale: Option<&'o str>) -> Self {
        Self {
            options,
            locale: locale.filter(|l| !l.is_empty()),
            patterns: PatternTable::new(),
            path: Vec::new(),
            depth: 0,
        }
    }

    fn enter(&mut self) -> Result<(), ResolveError> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(ResolveError::DepthExceeded {
                path: FieldPath(&self.path).to_string(),
                limit: self.options.max_depth,
            });
        }
        Ok(())
    }

    fn field(&mut self, field: &Field) -> Result<Field, ResolveError> {
        match field {
            Field::Scalar(_) => Ok(field.clone()),
            Field::Sequence(items) => {
                self.enter()?;
                let resolved = self.sequence(items)?;
                self.depth -= 1;
                Ok(Field::Sequence(resolved))
            }
            Field::Mapping(fields) => {
                self.enter()?;
                let resolved = self.mapping(fields)?;
                self.depth -= 1;
                Ok(Field::Mapping(resolved))
            }
        }
    }

    fn sequence(&mut self, items: &[Field]) -> Result<Vec<Field>, ResolveError> {
        let mut resolved = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            self.path.push(Segment::Index(index));
            resolved.push(self.field(item)?);
            self.path.pop();
        }
        Ok(resolved)
    }

    fn mapping(&mut self, fields: &Fields) -> Result<Fields, ResolveError> {
        let mut groups: IndexMap<&str, Group<'_>> = IndexMap::new();

        for (raw, value) in fields {
            let key = tag::parse_key(raw);
            let rank = match key.pattern {
                Some(p) => match self.patterns.get(p) {
                    Ok(parsed) => {
                        pattern::rank(Some(parsed), false, self.locale, self.options.wildcard)
                    }
                    Err(source) => {
                        return Err(ResolveError::InvalidPattern {
                            key: raw.clone(),
                            path: FieldPath(&self.path).to_string(),
                            source,
                        });
                    }
                },
                None => pattern::rank(None, key.is_bare(), self.locale, self.options.wildcard),
            };

            let group = groups.entry(key.base).or_default();
            group.legacy |= key.legacy;
            if let Some(rank) = rank
                && group.winner.is_none_or(|(best, _, _)| rank >= best)
            {
                group.winner = Some((rank, raw.as_str(), value));
            }
        }

        let mut out = Fields::with_capacity(groups.len());
        for (base, group) in groups {
            let Some((rank, raw, value)) = group.winner else {
                log::debug!(
                    "dropping `{}` at {}: no candidate for locale {:?}",
                    base,
                    FieldPath(&self.path),
                    self.locale
                );
                continue;
            };
            log::trace!("`{base}` resolved from `{raw}` ({rank:?})");

            self.path.push(Segment::Key(raw.to_string()));
            let resolved = self.field(value)?;
            self.path.pop();

            if group.legacy {
                out.insert(base.to_string(), resolved.clone());
                compat::retain_alias(&mut out, base, &resolved, self.options.bare_tags);
            } else {
                out.insert(base.to_string(), resolved);
            }
        }
        Ok(out)
    }
}
