//! Render-completion protocol for client-side rendered ranking tables.
//!
//! 1. Poll for the first `table` (bounded by `table_timeout`).
//! 2. One fixed settle delay for the initial async population.
//! 3. Exactly `scroll_rounds` scroll-to-bottom + `settle_delay` rounds.
//!
//! Step 3 never exits early: it does not look at row counts, so lazy rows
//! that arrive late are still given every round.

use crate::config::ScraperConfig;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use super::browser::BrowserSession;
use super::error::ScrapeError;

pub const TABLE_SELECTOR: &str = "table";
pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";

#[derive(Debug, Clone)]
pub struct RenderWaiter {
    pub table_timeout: Duration,
    pub initial_settle: Duration,
    pub scroll_rounds: u32,
    pub settle_delay: Duration,
}

impl RenderWaiter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            table_timeout: config.table_timeout(),
            initial_settle: config.initial_settle(),
            scroll_rounds: config.scroll_rounds,
            settle_delay: config.settle_delay(),
        }
    }

    /// Navigate to `url` and run the render-completion protocol.
    pub async fn load<S>(&self, session: &S, url: &str) -> Result<(), ScrapeError>
    where
        S: BrowserSession + ?Sized,
    {
        info!("Loading page: {}", url);
        session.navigate(url).await?;
        self.ensure_fully_loaded(session).await
    }

    pub async fn ensure_fully_loaded<S>(&self, session: &S) -> Result<(), ScrapeError>
    where
        S: BrowserSession + ?Sized,
    {
        if !session.wait_for(TABLE_SELECTOR, self.table_timeout).await? {
            return Err(ScrapeError::RenderTimeout(self.table_timeout));
        }
        info!("Initial table found");

        sleep(self.initial_settle).await;

        for round in 1..=self.scroll_rounds {
            debug!("Scroll round {}/{}", round, self.scroll_rounds);
            session.execute_script(SCROLL_TO_BOTTOM).await?;
            sleep(self.settle_delay).await;
        }

        Ok(())
    }
}
