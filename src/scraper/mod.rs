pub mod assembler;
pub mod browser;
pub mod classifier;
pub mod enrich;
pub mod error;
pub mod parsers;
pub mod waiter;

use crate::models::ExtractionResult;
use anyhow::Result;
use tracing::info;
use url::Url;

use self::assembler::Assembler;
use self::parsers::{count_table_rows, parse_tables};

pub use self::browser::{BrowserSession, ChromeSession};
pub use self::enrich::WebsiteResolver;
pub use self::error::ScrapeError;
pub use self::waiter::RenderWaiter;

/// Turn a rendered page snapshot into the ranking.
///
/// `page_url` is where the snapshot came from; detail links are resolved
/// against it.
pub fn extract_ranking(
    html: &str,
    page_url: Option<&str>,
    min_table_rows: usize,
) -> Result<ExtractionResult> {
    info!("Final table has {} rows", count_table_rows(html)?);

    let tables = parse_tables(html)?;
    let base_url = page_url.and_then(|u| Url::parse(u).ok());

    Ok(Assembler::new(min_table_rows, base_url).assemble(&tables))
}
