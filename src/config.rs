//! Project configuration module.
//!
//! Handles loading, validating, and merging `config.toml` from the content
//! root. Stock defaults are overridden by whatever the user file sets.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! locales = ["en"]          # Locales produced by `build`
//!
//! [resolve]
//! max_depth = 128           # Deepest nesting accepted in a document
//! wildcard = "full-locale"  # Or "language-subtag"
//! bare_tags = "always"      # Or "sequences"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! locales = ["en", "de", "fr"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::resolve::{MAX_DEPTH_CEILING, ResolveOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the configuration file in the content root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Target locales written by `build`, in output order.
    pub locales: Vec<String>,
    /// Resolution settings shared by every document.
    pub resolve: ResolveOptions,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            locales: vec!["en".to_string()],
            resolve: ResolveOptions::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolve.max_depth == 0 || self.resolve.max_depth > MAX_DEPTH_CEILING {
            return Err(ConfigError::Validation(format!(
                "resolve.max_depth must be 1-{MAX_DEPTH_CEILING}"
            )));
        }
        if self.locales.is_empty() {
            return Err(ConfigError::Validation("locales must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for locale in &self.locales {
            if locale.is_empty() || locale.contains('@') || locale.chars().any(char::is_whitespace)
            {
                return Err(ConfigError::Validation(format!(
                    "invalid locale `{locale}`: must be non-empty without `@` or whitespace"
                )));
            }
            if !seen.insert(locale.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "locale `{locale}` listed twice"
                )));
            }
        }
        Ok(())
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# locale-fields configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Locales written by `build`. Each document is resolved once per locale into
# <output>/<locale>/<document>.json
locales = ["en"]

# ---------------------------------------------------------------------------
# Resolution
# ---------------------------------------------------------------------------
[resolve]
# Deepest container nesting accepted in a document (1-1024). Deeper
# documents are rejected instead of resolved.
max_depth = 128

# What wildcard patterns such as `title@fr.*` are matched against:
#   "full-locale"     - the whole locale: fr.* matches fr, fr_FR, fr_CA
#   "language-subtag" - only the part before `_` or `-`
wildcard = "full-locale"

# When keys written as `key@` or `key@locale@` keep a `key@` copy of the
# resolved value next to `key`:
#   "always"    - for every value
#   "sequences" - only for lists
bare_tags = "always"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
