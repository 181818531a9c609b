//! Document categories: named groups of reference files used to check
//! issues for relevance and alignment.

use crate::config::{Config, DocumentCategory};
use crate::error::{BacklogError, Result};
use serde::Serialize;
use std::path::Path;

pub fn ensure_enabled(cfg: &Config) -> Result<()> {
    if !cfg.documents.enabled {
        return Err(BacklogError::DocumentsDisabled);
    }
    Ok(())
}

/// Look up a category by name. An explicit miss halts the operation.
pub fn category<'a>(cfg: &'a Config, name: &str) -> Result<&'a DocumentCategory> {
    ensure_enabled(cfg)?;
    cfg.documents
        .categories
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| BacklogError::CategoryNotFound(name.to_string()))
}

#[derive(Debug, Serialize)]
pub struct CategoryReport {
    pub name: String,
    pub present: Vec<String>,
    /// Referenced files that don't exist: reported, then skipped.
    pub missing: Vec<String>,
}

/// Check one category's files against the tree.
pub fn check_category(root: &Path, cat: &DocumentCategory) -> CategoryReport {
    let mut report = CategoryReport {
        name: cat.name.clone(),
        present: Vec::new(),
        missing: Vec::new(),
    };
    for file in &cat.files {
        if root.join(file).exists() {
            report.present.push(file.clone());
        } else {
            tracing::warn!(category = %cat.name, %file, "referenced document missing");
            report.missing.push(file.clone());
        }
    }
    report
}

/// Check every category, or a single named one.
pub fn check(root: &Path, cfg: &Config, name: Option<&str>) -> Result<Vec<CategoryReport>> {
    ensure_enabled(cfg)?;
    match name {
        Some(n) => Ok(vec![check_category(root, category(cfg, n)?)]),
        None => Ok(cfg
            .documents
            .categories
            .iter()
            .map(|c| check_category(root, c))
            .collect()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
