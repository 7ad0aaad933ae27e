use serde::{Deserialize, Serialize};

// ── Company record ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanyRecord {
    pub rank: u32,
    pub company_name: String,
    pub detail_url: Option<String>,  // per-company profile page on the ranking site
    pub website: Option<String>,     // filled by enrichment only
}

#[cfg(test)]
impl CompanyRecord {
    pub fn new(rank: u32, company_name: impl Into<String>) -> Self {
        Self {
            rank,
            company_name: company_name.into(),
            detail_url: None,
            website: None,
        }
    }
}

/// Ranking order is the insertion order.
pub type ExtractionResult = Vec<CompanyRecord>;

// ── Raw table rows ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCell {
    pub text: String,
    pub href: Option<String>,  // first <a href> inside the cell
}

#[cfg(test)]
impl RawCell {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), href: None }
    }

    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self { text: text.into(), href: Some(href.into()) }
    }
}

/// One `<tr>` as rendered: cells in document order, `td` and `th` alike.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub cells: Vec<RawCell>,
}

#[cfg(test)]
impl RawRow {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { cells: texts.into_iter().map(RawCell::text).collect() }
    }
}

impl RawRow {
    pub fn cell_text(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).map(|c| c.text.as_str())
    }

    pub fn cell_href(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).and_then(|c| c.href.as_deref())
    }

    /// First link anywhere in the row.
    pub fn first_href(&self) -> Option<&str> {
        self.cells.iter().find_map(|c| c.href.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
}

// ── Classification outcome ────────────────────────────────────────────────────

/// Where a classified row's rank came from; drives the running-rank update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankSource {
    /// Leading integer column.
    Explicit,
    /// Caller's running counter.
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Skip,
    Data {
        rank: u32,
        name: String,
        source: RankSource,
        /// Index of the cell the name was taken from.
        name_cell: usize,
    },
}
