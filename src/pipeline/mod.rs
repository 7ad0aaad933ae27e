//! Pipeline orchestrator: ties browser → extraction → enrichment → storage together.
//!
//! ## Run shape
//!
//! `run()` — one scrape of one ranking page:
//!   1. Open a Chrome session, load the ranking page and let it fully render
//!   2. Snapshot the DOM (optionally saved to the debug dir) and extract the ranking
//!   3. Optionally resolve websites for the first N records via their detail pages
//!
//! The session is released on every path out of step 1–3. A failure in steps
//! 1–2 fails the whole run; step 3 failures only leave `website` empty.

use crate::config::AppConfig;
use crate::models::{CompanyRecord, ExtractionResult};
use crate::scraper::{
    extract_ranking, BrowserSession, ChromeSession, RenderWaiter, ScrapeError, WebsiteResolver,
};
use crate::storage::{output_path, CsvSink, DebugSink};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What to scrape on this invocation.
#[derive(Debug, Clone, Default)]
pub struct ScrapePlan {
    pub year: Option<u16>,
    /// `Some(n)`: enrich the first `n` records with their website.
    pub enrich: Option<usize>,
}

pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self, plan: &ScrapePlan) -> Result<ScrapeReport> {
        let session = ChromeSession::connect(&self.config.browser)
            .await
            .context("Browser session unavailable")?;

        self.run_session(&session, plan).await
    }

    /// Scrape with an already-open session and quit it afterwards, whatever
    /// the outcome. A panic during the scrape is re-raised after the quit.
    pub async fn run_session<S>(&self, session: &S, plan: &ScrapePlan) -> Result<ScrapeReport>
    where
        S: BrowserSession + ?Sized,
    {
        let outcome = AssertUnwindSafe(self.scrape(session, plan))
            .catch_unwind()
            .await;

        if let Err(e) = session.quit().await {
            warn!("Failed to quit browser: {}", e);
        }

        match outcome {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    async fn scrape<S>(&self, session: &S, plan: &ScrapePlan) -> Result<ScrapeReport>
    where
        S: BrowserSession + ?Sized,
    {
        let started_at = Utc::now();
        let url = self.config.scraper.target_url(plan.year);

        // ── 1. Materialize the table ─────────────────────────────────────────
        info!("=== Step 1: Rendering ranking page ===");
        RenderWaiter::new(&self.config.scraper)
            .load(session, &url)
            .await
            .with_context(|| format!("Ranking table never loaded from {}", url))?;

        // ── 2. Extract ────────────────────────────────────────────────────────
        info!("=== Step 2: Extracting ranking ===");
        let html = session
            .html_snapshot()
            .await
            .context("Could not read rendered page")?;

        let snapshot = DebugSink::new(&self.config.output.debug_dir, self.config.output.save_debug_html)
            .write_file(&DebugSink::snapshot_name(started_at), &html);

        let mut records = extract_ranking(&html, Some(&url), self.config.scraper.min_table_rows)?;
        if records.is_empty() {
            warn!("Page rendered but no ranking rows were recognised");
        }

        // ── 3. Enrich ─────────────────────────────────────────────────────────
        let mut lookups = 0;
        let mut found = 0;
        if let Some(limit) = plan.enrich {
            info!("=== Step 3: Resolving websites (first {}) ===", limit);
            let resolver = WebsiteResolver::new(&self.config.scraper, &url);
            (lookups, found) = enrich(session, &resolver, &mut records, limit).await;
        }

        let report = ScrapeReport {
            url,
            records,
            enriched: plan.enrich.is_some(),
            lookups,
            websites_found: found,
            snapshot,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            "=== Done: {} companies | {} website lookups | {} websites found | {}ms ===",
            report.records.len(),
            report.lookups,
            report.websites_found,
            (report.finished_at - report.started_at).num_milliseconds(),
        );

        Ok(report)
    }

    /// Write the report's ranking CSV; returns where it went.
    pub fn save(&self, report: &ScrapeReport, year: Option<u16>, output: Option<&Path>) -> Result<PathBuf> {
        let path = match output {
            Some(p) => p.to_path_buf(),
            None => output_path(&self.config.output.data_dir, &self.config.output.file_stem, year),
        };
        CsvSink::write_rows(&path, &report.records, report.enriched)?;
        Ok(path)
    }
}

/// Resolve websites for the first `limit` records, one after another.
/// Returns (lookups attempted, websites found).
async fn enrich<S>(
    session: &S,
    resolver: &WebsiteResolver,
    records: &mut [CompanyRecord],
    limit: usize,
) -> (usize, usize)
where
    S: BrowserSession + ?Sized,
{
    let mut lookups = 0;
    let mut found = 0;

    for record in records.iter_mut().take(limit) {
        info!("Getting website for {}", record.company_name);
        lookups += 1;
        record.website = resolver
            .resolve_website(session, record.detail_url.as_deref())
            .await;
        if record.website.is_some() {
            found += 1;
        }
    }

    (lookups, found)
}

#[derive(Debug)]
pub struct ScrapeReport {
    pub url: String,
    pub records: ExtractionResult,
    /// Whether the enriched (website) variant was requested.
    pub enriched: bool,
    pub lookups: usize,
    pub websites_found: usize,
    pub snapshot: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Root scrape failure behind an error chain, if any.
pub fn scrape_failure(err: &anyhow::Error) -> Option<&ScrapeError> {
    err.chain().find_map(|e| e.downcast_ref::<ScrapeError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputConfig, ScraperConfig};
    use crate::scraper::browser::fake::FakeSession;

    const URL: &str = "https://fortune.com/ranking/fortune500/2025/";

    fn test_config() -> AppConfig {
        AppConfig {
            scraper: ScraperConfig {
                initial_settle_ms: 0,
                settle_delay_ms: 0,
                detail_settle_ms: 0,
                ..Default::default()
            },
            output: OutputConfig {
                save_debug_html: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn ranking_page() -> String {
        let rows: String = (1..=10)
            .map(|i| {
                format!(r#"<tr><td>{i}</td><td><a href="/company/co-{i}/">Co {i}</a></td><td>${i}</td></tr>"#)
            })
            .collect();
        format!("<html><body><table>{rows}</table></body></html>")
    }

    fn detail_page(site: &str) -> String {
        format!(
            r#"<a href="https://fortune.com/">Fortune</a>
               <a href="https://twitter.com/co">tw</a>
               <a href="{site}">Website</a>"#
        )
    }

    #[tokio::test]
    async fn test_render_failure_still_quits_once() {
        let session = FakeSession::new().without_table();
        let plan = ScrapePlan { year: Some(2025), enrich: None };

        let err = Pipeline::new(test_config())
            .run_session(&session, &plan)
            .await
            .unwrap_err();

        assert!(matches!(scrape_failure(&err), Some(ScrapeError::RenderTimeout(_))));
        assert_eq!(session.quit_count(), 1);
        assert!(!session.calls().contains(&"snapshot".to_string()));
    }

    #[tokio::test]
    async fn test_main_navigation_failure_is_fatal() {
        let session = FakeSession::new().failing(URL);
        let plan = ScrapePlan { year: Some(2025), enrich: Some(5) };

        let err = Pipeline::new(test_config())
            .run_session(&session, &plan)
            .await
            .unwrap_err();

        assert!(matches!(scrape_failure(&err), Some(ScrapeError::Navigation { .. })));
        assert_eq!(session.quit_count(), 1);
    }

    #[tokio::test]
    async fn test_base_variant_does_not_visit_detail_pages() {
        let session = FakeSession::new().with_page(URL, &ranking_page());
        let plan = ScrapePlan { year: Some(2025), enrich: None };

        let report = Pipeline::new(test_config())
            .run_session(&session, &plan)
            .await
            .unwrap();

        assert_eq!(report.records.len(), 10);
        assert!(!report.enriched);
        assert_eq!(report.lookups, 0);
        let navigations = session.calls().iter().filter(|c| c.starts_with("navigate")).count();
        assert_eq!(navigations, 1);
        assert_eq!(session.quit_count(), 1);
    }

    #[tokio::test]
    async fn test_enrichment_is_capped_and_isolated_per_record() {
        let session = FakeSession::new()
            .with_page(URL, &ranking_page())
            .with_page("https://fortune.com/company/co-1/", &detail_page("https://co1.example/"))
            .failing("https://fortune.com/company/co-2/")
            .with_page("https://fortune.com/company/co-3/", &detail_page("https://co3.example/"))
            .with_page("https://fortune.com/company/co-4/", &detail_page("https://co4.example/"));
        let plan = ScrapePlan { year: Some(2025), enrich: Some(3) };

        let report = Pipeline::new(test_config())
            .run_session(&session, &plan)
            .await
            .unwrap();

        let websites: Vec<Option<&str>> =
            report.records.iter().map(|r| r.website.as_deref()).collect();
        assert_eq!(websites[0], Some("https://co1.example/"));
        assert_eq!(websites[1], None);
        assert_eq!(websites[2], Some("https://co3.example/"));
        assert!(websites[3..].iter().all(|w| w.is_none()));

        assert!(report.enriched);
        assert_eq!(report.lookups, 3);
        assert_eq!(report.websites_found, 2);
        assert_eq!(report.records.len(), 10);
        assert_eq!(session.quit_count(), 1);
    }

    #[tokio::test]
    async fn test_panic_mid_scrape_still_quits() {
        let session = FakeSession::new()
            .with_page(URL, &ranking_page())
            .panicking_scripts();
        let plan = ScrapePlan { year: Some(2025), enrich: None };
        let pipeline = Pipeline::new(test_config());

        let caught = AssertUnwindSafe(pipeline.run_session(&session, &plan))
            .catch_unwind()
            .await;

        assert!(caught.is_err());
        assert_eq!(session.quit_count(), 1);
        assert_eq!(session.calls().last().map(String::as_str), Some("quit"));
    }

    #[tokio::test]
    async fn test_unreachable_driver_is_init_failure() {
        let mut config = test_config();
        config.browser.webdriver_url = "http://127.0.0.1:1".into();
        let plan = ScrapePlan { year: Some(2025), enrich: None };

        let err = Pipeline::new(config).run(&plan).await.unwrap_err();

        assert!(matches!(scrape_failure(&err), Some(ScrapeError::DriverInit(_))));
        assert!(format!("{:#}", err).starts_with("Browser session unavailable"));
    }

    #[test]
    fn test_run_session_blocking() {
        // Same flow driven from a sync context.
        let session = FakeSession::new().with_page(URL, &ranking_page());
        let plan = ScrapePlan { year: Some(2025), enrich: None };
        let pipeline = Pipeline::new(test_config());

        let report = tokio_test::block_on(pipeline.run_session(&session, &plan)).unwrap();
        assert_eq!(report.records[0].company_name, "Co 1");
        assert_eq!(report.url, URL);
    }

    #[test]
    fn test_save_uses_year_in_default_path() {
        let dir = std::env::temp_dir().join(format!("ranking_scraper_pipeline_{}", std::process::id()));
        let mut config = test_config();
        config.output.data_dir = dir.clone();
        let pipeline = Pipeline::new(config);

        let report = ScrapeReport {
            url: URL.into(),
            records: vec![CompanyRecord::new(1, "Walmart")],
            enriched: false,
            lookups: 0,
            websites_found: 0,
            snapshot: None,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };

        let path = pipeline.save(&report, Some(2025), None).unwrap();
        assert_eq!(path, dir.join("fortune500_2025.csv"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "rank,company_name\n1,Walmart\n");
        std::fs::remove_dir_all(&dir).ok();
    }
}
