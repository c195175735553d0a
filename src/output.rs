//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.
//!
//! ## Build
//!
//! ```text
//! Documents
//! 001 home.json
//!     en → en/home.json
//!     fr → fr/home.json
//! 002 pages/about.toml (cached)
//!     en → en/pages/about.json
//!     fr → fr/pages/about.json
//!
//! Localized 2 documents into 2 locales (en, fr)
//! Cache: 1 cached, 1 resolved (2 total)
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 broken.json
//!     broken.json: invalid locale pattern in key `t@fr(` at <root>: ...
//!
//! 1 of 5 documents failed
//! ```

use crate::localize::{CheckReport, LocalizeReport};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Format the result of `build`.
pub fn format_build_output(report: &LocalizeReport) -> Vec<String> {
    let mut lines = vec!["Documents".to_string()];
    for (i, doc) in report.documents.iter().enumerate() {
        let marker = if doc.cached { " (cached)" } else { "" };
        lines.push(format!("{} {}{}", format_index(i + 1), doc.path, marker));
        for output in &doc.outputs {
            let locale = output.split('/').next().unwrap_or(output);
            lines.push(format!("{}{} → {}", indent(1), locale, output));
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "Localized {} into {} ({})",
        plural(report.documents.len(), "document"),
        plural(report.locales.len(), "locale"),
        report.locales.join(", ")
    ));
    lines.push(format!("Cache: {}", report.cache_stats));
    lines
}

pub fn print_build_output(report: &LocalizeReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

/// Format the result of `check`: one entry per failing document.
pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = Vec::new();
    let mut problems: Vec<_> = report.problems.iter().collect();
    problems.sort_by(|a, b| a.path.cmp(&b.path));
    for (i, problem) in problems.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), problem.path));
        lines.push(format!("{}{}", indent(1), problem.error));
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    if report.is_ok() {
        lines.push(format!("{} OK", plural(report.documents, "document")));
    } else {
        lines.push(format!(
            "{} of {} failed",
            report.problems.len(),
            plural(report.documents, "document")
        ));
    }
    lines
}

pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}
