//! Localizing a content directory.
//!
//! Walks the content root for field documents, resolves each one for every
//! configured locale, and writes the untagged trees to the output directory:
//!
//! ```text
//! content/                        dist/
//! ├── config.toml                 ├── .locale-cache.json
//! ├── home.json          →        ├── en/home.json
//! └── pages/                      ├── en/pages/about.json
//!     └── about.toml              ├── fr/home.json
//!                                 └── fr/pages/about.json
//! ```
//!
//! Documents are JSON files or TOML tables; output is always pretty JSON.
//! `config.toml` at the content root is configuration, not content.
//!
//! ## Parallel Processing
//!
//! Documents are parsed and resolved in parallel using
//! [rayon](https://docs.rs/rayon). A single [`Resolver`] is shared by all
//! workers. Writing output and updating the cache happen afterwards, in
//! document order.
//!
//! ## Caching
//!
//! A document whose bytes and resolve settings match the cached fingerprints
//! is written from the cache without being parsed. See [`crate::cache`].

use crate::cache::{self, CacheError, CacheStats, DocumentCache};
use crate::config::{CONFIG_FILENAME, SiteConfig};
use crate::field::{self, Field, Fields};
use crate::resolve::{ResolveError, ResolveOptions, Resolver};
use crate::storage::{LocalStorage, Storage, StorageError};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// File extensions treated as field documents.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["json", "toml"];

#[derive(Error, Debug)]
pub enum LocalizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{path}: {message}")]
    Parse { path: String, message: String },
    #[error("{path}: {source}")]
    Resolve {
        path: String,
        #[source]
        source: ResolveError,
    },
    #[error("Unsupported document type: {0}")]
    UnsupportedDocument(String),
    #[error("{first} and {second} would both be written to {output}")]
    OutputCollision {
        output: String,
        first: String,
        second: String,
    },
}

/// What happened to one document during a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentResult {
    /// Path relative to the content root.
    pub path: String,
    /// Output files written, relative to the output directory.
    pub outputs: Vec<String>,
    /// Whether the resolved trees came from the cache.
    pub cached: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LocalizeReport {
    pub locales: Vec<String>,
    pub documents: Vec<DocumentResult>,
    pub cache_stats: CacheStats,
}

/// A document that failed `check`, with its first error.
#[derive(Debug)]
pub struct CheckProblem {
    pub path: String,
    pub error: LocalizeError,
}

#[derive(Debug, Default)]
pub struct CheckReport {
    pub documents: usize,
    pub problems: Vec<CheckProblem>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

fn extension(path: &str) -> Option<&str> {
    Path::new(path).extension().and_then(|e| e.to_str())
}

/// Paths of all field documents below the storage root, sorted.
///
/// Fails when two documents differ only in extension (`home.json` and
/// `home.toml`), since both would be written to the same output file.
pub fn discover_documents(storage: &impl Storage) -> Result<Vec<String>, LocalizeError> {
    let mut docs: Vec<String> = storage
        .list_dir("", true)?
        .into_iter()
        .filter(|path| path != CONFIG_FILENAME)
        .filter(|path| extension(path).is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext)))
        .collect();
    docs.sort();

    let mut outputs: HashMap<String, &str> = HashMap::with_capacity(docs.len());
    for doc in &docs {
        let output = output_stem(doc);
        if let Some(first) = outputs.insert(output.clone(), doc) {
            return Err(LocalizeError::OutputCollision {
                output: format!("{output}.json"),
                first: first.to_string(),
                second: doc.clone(),
            });
        }
    }
    Ok(docs)
}

/// Parse a document's text according to its extension.
pub fn parse_document(path: &str, content: &str) -> Result<Fields, LocalizeError> {
    let parse_error = |message: String| LocalizeError::Parse {
        path: path.to_string(),
        message,
    };
    match extension(path) {
        Some("json") => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Some("toml") => toml::from_str(content)
            .map(field::fields_from_toml)
            .map_err(|e| parse_error(e.to_string())),
        _ => Err(LocalizeError::UnsupportedDocument(path.to_string())),
    }
}

/// Document path without its extension, `/`-separated.
fn output_stem(doc_path: &str) -> String {
    Path::new(doc_path)
        .with_extension("")
        .to_string_lossy()
        .replace('\\', "/")
}

/// Output location for a document in one locale: `<locale>/<path>.json`.
pub fn output_path(locale: &str, doc_path: &str) -> String {
    format!("{}/{}.json", locale, output_stem(doc_path))
}

/// Identity of a document in the cache.
fn doc_id(doc_path: &str) -> String {
    format!("/{doc_path}")
}

/// Read, parse and resolve a single document file.
pub fn resolve_document(
    path: &Path,
    locale: Option<&str>,
    options: &ResolveOptions,
) -> Result<Fields, LocalizeError> {
    let display = path.to_string_lossy();
    let content = std::fs::read_to_string(path)?;
    let fields = parse_document(&display, &content)?;
    Resolver::new(options.clone())
        .resolve(&fields, locale)
        .map_err(|source| LocalizeError::Resolve {
            path: display.into_owned(),
            source,
        })
}

/// Per-document result of the parallel phase.
struct Resolved {
    path: String,
    source_hash: String,
    payload: Fields,
    cached: bool,
}

fn resolve_all_locales(
    path: &str,
    content: &str,
    resolver: &Resolver,
    locales: &[String],
) -> Result<Fields, LocalizeError> {
    let fields = parse_document(path, content)?;
    let mut payload = Fields::with_capacity(locales.len());
    for locale in locales {
        let resolved = resolver
            .resolve(&fields, Some(locale))
            .map_err(|source| LocalizeError::Resolve {
                path: path.to_string(),
                source,
            })?;
        payload.insert(locale.clone(), Field::Mapping(resolved));
    }
    Ok(payload)
}

/// Localize every document under `source` into `output`.
pub fn localize(
    source: &Path,
    output: &Path,
    config: &SiteConfig,
    use_cache: bool,
) -> Result<LocalizeReport, LocalizeError> {
    let input = LocalStorage::new(source);
    let out = LocalStorage::new(output);
    let docs = discover_documents(&input)?;
    log::info!("found {} documents in {}", docs.len(), source.display());

    let mut cache = if use_cache {
        DocumentCache::load(output)
    } else {
        DocumentCache::new()
    };
    let resolver = Resolver::new(config.resolve.clone());
    let params_hash = cache::hash_resolve_params(&config.locales, &config.resolve);

    let resolved: Vec<Resolved> = docs
        .par_iter()
        .map(|path| -> Result<Resolved, LocalizeError> {
            let content = input.read_file(path)?;
            let source_hash = cache::hash_bytes(content.as_bytes());
            if let Some(payload) = cache.find_fresh(&doc_id(path), &source_hash, &params_hash) {
                log::debug!("{path}: cache hit");
                return Ok(Resolved {
                    path: path.clone(),
                    source_hash,
                    payload: payload.clone(),
                    cached: true,
                });
            }
            let payload = resolve_all_locales(path, &content, &resolver, &config.locales)?;
            Ok(Resolved {
                path: path.clone(),
                source_hash,
                payload,
                cached: false,
            })
        })
        .collect::<Result<_, LocalizeError>>()?;

    let mut report = LocalizeReport {
        locales: config.locales.clone(),
        ..LocalizeReport::default()
    };
    for doc in resolved {
        let mut outputs = Vec::with_capacity(doc.payload.len());
        for (locale, tree) in &doc.payload {
            let target = output_path(locale, &doc.path);
            out.write_file(&target, &serde_json::to_string_pretty(tree)?)?;
            outputs.push(target);
        }
        if doc.cached {
            report.cache_stats.hit();
        } else {
            report.cache_stats.miss();
        }
        cache.add_fingerprinted(
            &doc_id(&doc.path),
            doc.source_hash,
            params_hash.clone(),
            doc.payload,
        );
        report.documents.push(DocumentResult {
            path: doc.path,
            outputs,
            cached: doc.cached,
        });
    }

    if use_cache {
        let live: Vec<String> = docs.iter().map(|d| doc_id(d)).collect();
        let live: Vec<&str> = live.iter().map(String::as_str).collect();
        cache.retain_ids(&live);
        cache.save(output)?;
    }
    log::info!("localized {} documents: {}", report.documents.len(), report.cache_stats);
    Ok(report)
}

/// Resolve every document without writing anything, for no locale and for
/// each configured locale. Records the first error per document.
pub fn check(source: &Path, config: &SiteConfig) -> Result<CheckReport, LocalizeError> {
    let input = LocalStorage::new(source);
    let docs = discover_documents(&input)?;
    let resolver = Resolver::new(config.resolve.clone());

    let problems: Vec<CheckProblem> = docs
        .par_iter()
        .filter_map(|path| {
            check_document(&input, &resolver, &config.locales, path)
                .err()
                .map(|error| CheckProblem {
                    path: path.clone(),
                    error,
                })
        })
        .collect();

    Ok(CheckReport {
        documents: docs.len(),
        problems,
    })
}

fn check_document(
    input: &LocalStorage,
    resolver: &Resolver,
    locales: &[String],
    path: &str,
) -> Result<(), LocalizeError> {
    let content = input.read_file(path)?;
    let fields = parse_document(path, &content)?;
    let targets = std::iter::once(None).chain(locales.iter().map(|l| Some(l.as_str())));
    for locale in targets {
        resolver
            .resolve(&fields, locale)
            .map_err(|source| LocalizeError::Resolve {
                path: path.to_string(),
                source,
            })?;
    }
    Ok(())
}
