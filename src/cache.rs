//! Document cache for incremental builds.
//!
//! Resolving a document is cheap, but a content tree has many documents and
//! every one is resolved once per locale. This module keeps previously
//! computed payloads keyed by document identity (the document's path within
//! the content root, e.g. `/pages/intro.json`) so unchanged documents can be
//! written straight from the cache.
//!
//! # Design
//!
//! A payload is an arbitrary [`Fields`] mapping; the pipeline stores one
//! property per locale holding that locale's resolved tree. The plain
//! operations (`add`, `add_property`, `get`, `delete`, `export`, ...) carry
//! no freshness information.
//!
//! ## Fingerprints
//!
//! Entries written through [`DocumentCache::add_fingerprinted`] also record:
//!
//! - **`source_hash`**: SHA-256 of the document's raw bytes. Content-based
//!   rather than mtime-based so it survives `git checkout`.
//! - **`params_hash`**: SHA-256 of everything else that shapes the output:
//!   the locale list and the resolve options.
//!
//! [`DocumentCache::find_fresh`] only returns a payload when both match.
//!
//! ## Storage
//!
//! The cache manifest is a JSON file at `<output_dir>/.locale-cache.json`,
//! next to the localized output it describes.

use crate::field::{Field, Fields};
use crate::resolve::ResolveOptions;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the cache manifest file within the output directory.
const MANIFEST_FILENAME: &str = ".locale-cache.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A cached payload and the fingerprints it was computed from.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CacheEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params_hash: Option<String>,
    pub payload: Fields,
}

/// Payloads keyed by document identity, in insertion order.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DocumentCache {
    version: u32,
    entries: IndexMap<String, CacheEntry>,
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentCache {
    pub fn new() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store `payload` for `doc_id`, replacing any previous entry.
    pub fn add(&mut self, doc_id: &str, payload: Fields) {
        self.entries.insert(
            doc_id.to_string(),
            CacheEntry {
                payload,
                ..CacheEntry::default()
            },
        );
    }

    pub fn add_all(&mut self, payloads: IndexMap<String, Fields>) {
        for (doc_id, payload) in payloads {
            self.add(&doc_id, payload);
        }
    }

    /// Set one key of a document's payload, creating the entry if needed.
    pub fn add_property(&mut self, doc_id: &str, key: &str, value: Field) {
        self.entries
            .entry(doc_id.to_string())
            .or_default()
            .payload
            .insert(key.to_string(), value);
    }

    pub fn get(&self, doc_id: &str) -> Option<&Fields> {
        self.entries.get(doc_id).map(|e| &e.payload)
    }

    pub fn get_property(&self, doc_id: &str, key: &str) -> Option<&Field> {
        self.get(doc_id)?.get(key)
    }

    /// Remove a document, returning its payload.
    pub fn delete(&mut self, doc_id: &str) -> Option<Fields> {
        self.entries.shift_remove(doc_id).map(|e| e.payload)
    }

    /// Every payload, keyed by document identity.
    pub fn export(&self) -> IndexMap<String, Fields> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.payload.clone()))
            .collect()
    }

    /// Store a payload together with the fingerprints it was built from.
    pub fn add_fingerprinted(
        &mut self,
        doc_id: &str,
        source_hash: String,
        params_hash: String,
        payload: Fields,
    ) {
        self.entries.insert(
            doc_id.to_string(),
            CacheEntry {
                source_hash: Some(source_hash),
                params_hash: Some(params_hash),
                payload,
            },
        );
    }

    /// The cached payload for `doc_id` if it was built from exactly these
    /// fingerprints.
    pub fn find_fresh(
        &self,
        doc_id: &str,
        source_hash: &str,
        params_hash: &str,
    ) -> Option<&Fields> {
        let entry = self.entries.get(doc_id)?;
        let fresh = entry.source_hash.as_deref() == Some(source_hash)
            && entry.params_hash.as_deref() == Some(params_hash);
        fresh.then_some(&entry.payload)
    }

    /// Drop every entry whose id is not in `live`.
    pub fn retain_ids(&mut self, live: &[&str]) {
        self.entries.retain(|id, _| live.contains(&id.as_str()));
    }

    /// Load from the output directory. Returns an empty cache if the file
    /// doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(output_dir: &Path) -> Self {
        let path = manifest_path(output_dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::new(),
        };
        let cache: Self = match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("discarding unreadable cache {}: {}", path.display(), e);
                return Self::new();
            }
        };
        if cache.version != MANIFEST_VERSION {
            log::warn!(
                "discarding cache {} with version {} (expected {})",
                path.display(),
                cache.version,
                MANIFEST_VERSION
            );
            return Self::new();
        }
        cache
    }

    /// Save to the output directory.
    pub fn save(&self, output_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(output_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)?;
        Ok(())
    }
}

/// SHA-256 of raw document bytes, as a hex string.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 of the settings that shape resolved output.
pub fn hash_resolve_params(locales: &[String], options: &ResolveOptions) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"resolve\0");
    for locale in locales {
        hasher.update(locale.as_bytes());
        hasher.update(b"\0");
    }
    hasher.update((options.max_depth as u64).to_le_bytes());
    hasher.update(format!("{:?}\0{:?}", options.wildcard, options.bare_tags).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} resolved ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} resolved", self.misses)
        }
    }
}

/// Resolve the cache manifest path for an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}
