//! Row classification: decide whether a raw `tr` is a ranking entry and pull
//! out its rank and company name.
//!
//! Rules, first match wins:
//!   1. fewer than 2 cells                         → Skip
//!   2. first cell is a bare positive integer       → Data(that rank, cell[1])
//!   3. first of cells[0..3] with a letter, no % / $ → Data(running rank, that cell)
//!   4. empty candidate name                        → Skip
//!
//! The running rank is `None` once it has run past `u32::MAX`; heuristic rows
//! are skipped from then on so ranks within a table never repeat.

use crate::models::{RankSource, RawRow, RowOutcome};

/// Cells examined by the heuristic tier.
const SCAN_WIDTH: usize = 3;

/// Parse a leading rank cell: one or more ASCII digits and nothing else.
/// "42" → 42 | " 7 " → 7 | "0" / "1st" / "1,000" → None
pub fn parse_rank(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().filter(|r| *r > 0)
}

/// Cell text that can pass as a company name in the heuristic tier.
pub fn looks_like_name(s: &str) -> bool {
    let s = s.trim();
    s.chars().any(char::is_alphabetic) && !s.contains('%') && !s.contains('$')
}

pub fn classify(row: &RawRow, running_rank: Option<u32>) -> RowOutcome {
    if row.cells.len() < 2 {
        return RowOutcome::Skip;
    }

    let first = row.cell_text(0).unwrap_or_default();

    let (rank, name_cell, source) = match parse_rank(first) {
        Some(rank) => (rank, 1, RankSource::Explicit),
        None => {
            let found = row
                .cells
                .iter()
                .take(SCAN_WIDTH)
                .position(|c| looks_like_name(&c.text));
            match (found, running_rank) {
                (Some(idx), Some(rank)) => (rank, idx, RankSource::Running),
                _ => return RowOutcome::Skip,
            }
        }
    };

    let name = row.cell_text(name_cell).unwrap_or_default().trim();
    if name.is_empty() {
        return RowOutcome::Skip;
    }

    RowOutcome::Data {
        rank,
        name: name.to_string(),
        source,
        name_cell,
    }
}

/// Running rank to hand to the next row; `None` on overflow.
pub fn next_running_rank(outcome: &RowOutcome, running_rank: Option<u32>) -> Option<u32> {
    match outcome {
        RowOutcome::Skip => running_rank,
        RowOutcome::Data { rank, source: RankSource::Explicit, .. } => rank.checked_add(1),
        RowOutcome::Data { source: RankSource::Running, .. } => running_rank?.checked_add(1),
    }
}

/// Key used for case-insensitive de-duplication.
pub fn normalise_name(name: &str) -> String {
    name.trim().to_lowercase()
}
