//! Output side of a scrape: the ranking CSV and best-effort debug snapshots.

use crate::models::CompanyRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const BASIC_HEADER: [&str; 2] = ["rank", "company_name"];
pub const ENRICHED_HEADER: [&str; 4] = ["rank", "company_name", "detail_url", "website"];

// ── Debug snapshots ───────────────────────────────────────────────────────────

/// Writes rendered page snapshots for offline inspection. Failures are logged
/// and swallowed.
#[derive(Debug, Clone)]
pub struct DebugSink {
    dir: PathBuf,
    enabled: bool,
}

impl DebugSink {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self { dir: dir.into(), enabled }
    }

    pub fn snapshot_name(at: DateTime<Utc>) -> String {
        format!("snapshot_{}.html", at.format("%Y%m%dT%H%M%S"))
    }

    pub fn write_file(&self, filename: &str, content: &str) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }

        let path = self.dir.join(filename);
        let written = std::fs::create_dir_all(&self.dir)
            .and_then(|_| std::fs::write(&path, content));

        match written {
            Ok(()) => {
                info!("Debug HTML saved: {:?}", path);
                Some(path)
            }
            Err(e) => {
                warn!("Could not write debug HTML {:?}: {}", path, e);
                None
            }
        }
    }
}

// ── Ranking CSV ───────────────────────────────────────────────────────────────

/// `data/fortune500.csv` or `data/fortune500_2025.csv`
pub fn output_path(dir: &Path, stem: &str, year: Option<u16>) -> PathBuf {
    match year {
        Some(y) => dir.join(format!("{}_{}.csv", stem, y)),
        None => dir.join(format!("{}.csv", stem)),
    }
}

pub struct CsvSink;

impl CsvSink {
    /// Write the ranking; `enriched` adds the detail URL and website columns.
    pub fn write_rows(path: &Path, records: &[CompanyRecord], enriched: bool) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create dir {:?}", parent))?;
        }

        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to open {:?}", path))?;

        if enriched {
            writer.write_record(ENRICHED_HEADER)?;
        } else {
            writer.write_record(BASIC_HEADER)?;
        }

        for r in records {
            let rank = r.rank.to_string();
            if enriched {
                writer.write_record([
                    rank.as_str(),
                    r.company_name.as_str(),
                    r.detail_url.as_deref().unwrap_or(""),
                    r.website.as_deref().unwrap_or(""),
                ])?;
            } else {
                writer.write_record([rank.as_str(), r.company_name.as_str()])?;
            }
        }

        writer.flush().with_context(|| format!("Failed to flush {:?}", path))?;
        info!("Saved {} companies to {:?}", records.len(), path);
        Ok(())
    }
}
