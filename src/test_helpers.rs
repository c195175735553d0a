//! Shared test utilities for the locale-fields test suite.
//!
//! # Usage
//!
//! ```text
//! use crate::test_helpers::*;
//!
//! let tree = fields(json!({"title": "Home", "title@fr": "Accueil"}));
//!
//! let tmp = setup_fixtures();
//! let report = localize(tmp.path(), out.path(), &config, true).unwrap();
//! assert_eq!(read_json(&out.path().join("fr/home.json"))["title"], "Accueil");
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::field::Fields;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Field trees
// =========================================================================

/// Build a field mapping from a `json!` literal. Key order is preserved.
pub fn fields(value: serde_json::Value) -> Fields {
    serde_json::from_value(value).unwrap_or_else(|e| panic!("not a field mapping: {e}"))
}

/// Read a JSON output file.
pub fn read_json(path: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_str(&content).unwrap()
}
