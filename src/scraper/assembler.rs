use crate::models::{CompanyRecord, ExtractionResult, RawRow, RawTable, RowOutcome};
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;

use super::classifier::{classify, next_running_rank, normalise_name};

/// Folds classified rows from every qualifying table into one ranking.
#[derive(Debug, Clone)]
pub struct Assembler {
    /// Tables with fewer `tr` rows are skipped as navigation/footer tables.
    pub min_table_rows: usize,
    /// Page the tables came from; relative detail links are joined onto it.
    pub base_url: Option<Url>,
}

impl Assembler {
    pub fn new(min_table_rows: usize, base_url: Option<Url>) -> Self {
        Self { min_table_rows, base_url }
    }

    pub fn assemble(&self, tables: &[RawTable]) -> ExtractionResult {
        let mut records = Vec::new();

        for (i, table) in tables.iter().enumerate() {
            if table.rows.len() < self.min_table_rows {
                debug!("Table {}: {} rows, below threshold — skipped", i, table.rows.len());
                continue;
            }

            let before = records.len();
            let mut running_rank = Some(1u32);

            for row in &table.rows {
                let outcome = classify(row, running_rank);
                running_rank = next_running_rank(&outcome, running_rank);

                if let RowOutcome::Data { rank, name, name_cell, .. } = outcome {
                    records.push(CompanyRecord {
                        rank,
                        company_name: name,
                        detail_url: self.detail_url(row, name_cell),
                        website: None,
                    });
                }
            }

            debug!("Table {}: {} data rows", i, records.len() - before);
        }

        let total = records.len();
        let records = dedupe(records);
        info!("Extracted {} companies ({} duplicates dropped)", records.len(), total - records.len());
        records
    }

    /// Link in the name cell, else the first link anywhere in the row.
    fn detail_url(&self, row: &RawRow, name_cell: usize) -> Option<String> {
        let href = row.cell_href(name_cell).or_else(|| row.first_href())?;
        resolve_href(self.base_url.as_ref(), href)
    }
}

/// Absolute URL for `href`; relative links need a base.
fn resolve_href(base: Option<&Url>, href: &str) -> Option<String> {
    match base {
        Some(base) => base.join(href).ok().map(String::from),
        None => Url::parse(href).ok().map(String::from),
    }
}

/// Keep the first record for every case-insensitive company name.
pub fn dedupe(records: Vec<CompanyRecord>) -> Vec<CompanyRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(normalise_name(&r.company_name)))
        .collect()
}
