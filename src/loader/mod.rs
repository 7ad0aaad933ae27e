//! Loads saved page snapshots for offline re-extraction.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn load_snapshot(path: &Path) -> Result<String> {
    debug!("Loading snapshot {:?}", path);
    std::fs::read_to_string(path).with_context(|| format!("Failed to read snapshot {:?}", path))
}

/// `.html` files in `dir`, sorted by name (snapshot names sort chronologically).
pub fn discover_snapshots(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to list {:?}", dir))? {
        let path = entry?.path();
        if path.is_file() && path.extension().map(|e| e == "html").unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn latest_snapshot(dir: &Path) -> Result<Option<PathBuf>> {
    Ok(discover_snapshots(dir)?.pop())
}
