use crate::config::BrowserConfig;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;
use thirtyfour::ChromiumLikeCapabilities;
use tracing::{debug, info, warn};

use super::error::ScrapeError;

/// How often an element wait re-checks the DOM.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

// ── Session trait ─────────────────────────────────────────────────────────────

/// Swappable browser session. One session is held per scrape and is only
/// ever driven from a single control flow.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), ScrapeError>;

    /// Serialized DOM of the current page, after client-side rendering.
    async fn html_snapshot(&self) -> Result<String, ScrapeError>;

    async fn execute_script(&self, source: &str) -> Result<(), ScrapeError>;

    /// Poll until an element matching `css` exists. `Ok(false)` on timeout.
    async fn wait_for(&self, css: &str, timeout: Duration) -> Result<bool, ScrapeError>;

    /// Tear down the remote session. Safe to call more than once.
    async fn quit(&self) -> Result<(), ScrapeError>;
}

// ── Chrome via WebDriver ──────────────────────────────────────────────────────

pub struct ChromeSession {
    driver: WebDriver,
    closed: AtomicBool,
}

/// Chrome command-line switches for the configured session.
pub fn chrome_args(config: &BrowserConfig) -> Vec<String> {
    let mut args = Vec::new();
    if config.headless {
        args.push("--headless=new".to_string());
    }
    args.push("--no-sandbox".to_string());
    args.push("--disable-dev-shm-usage".to_string());
    args.push("--disable-gpu".to_string());
    args.push(format!("--window-size={}", config.window_size));
    args.push(format!("--user-agent={}", config.user_agent));
    args
}

impl ChromeSession {
    pub async fn connect(config: &BrowserConfig) -> Result<Self, ScrapeError> {
        let mut caps = DesiredCapabilities::chrome();
        for arg in chrome_args(config) {
            caps.add_arg(&arg)
                .map_err(|e| ScrapeError::DriverInit(format!("chrome arg {}: {}", arg, e)))?;
        }

        let driver = WebDriver::new(&config.webdriver_url, caps)
            .await
            .map_err(|e| ScrapeError::DriverInit(format!("{}: {}", config.webdriver_url, e)))?;

        if let Err(e) = driver
            .set_page_load_timeout(Duration::from_secs(config.page_load_timeout_secs))
            .await
        {
            warn!("Could not set page load timeout: {}", e);
        }

        info!("Chrome driver initialized (headless={})", config.headless);
        Ok(Self {
            driver,
            closed: AtomicBool::new(false),
        })
    }
}

fn driver_err(e: WebDriverError) -> ScrapeError {
    ScrapeError::Driver(e.to_string())
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<(), ScrapeError> {
        debug!("GET {}", url);
        self.driver
            .goto(url.to_string())
            .await
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn html_snapshot(&self) -> Result<String, ScrapeError> {
        self.driver.source().await.map_err(driver_err)
    }

    async fn execute_script(&self, source: &str) -> Result<(), ScrapeError> {
        self.driver
            .execute(source.to_string(), Vec::new())
            .await
            .map(|_| ())
            .map_err(driver_err)
    }

    async fn wait_for(&self, css: &str, timeout: Duration) -> Result<bool, ScrapeError> {
        self.driver
            .query(By::Css(css.to_string()))
            .wait(timeout, POLL_INTERVAL)
            .exists()
            .await
            .map_err(driver_err)
    }

    async fn quit(&self) -> Result<(), ScrapeError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.driver.clone().quit().await.map_err(driver_err)?;
        info!("Chrome driver closed");
        Ok(())
    }
}

// ── Test double ───────────────────────────────────────────────────────────────
