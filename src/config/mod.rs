use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// WebDriver / Chrome session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_window_size")]
    pub window_size: String,

    #[serde(default = "default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,
}

/// Ranking page + extraction heuristics
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_ranking_url")]
    pub ranking_url: String,

    #[serde(default = "default_table_timeout_secs")]
    pub table_timeout_secs: u64,

    #[serde(default = "default_initial_settle_ms")]
    pub initial_settle_ms: u64,

    #[serde(default = "default_scroll_rounds")]
    pub scroll_rounds: u32,

    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_detail_settle_ms")]
    pub detail_settle_ms: u64,

    /// Tables with fewer `tr` rows are treated as navigation/footer tables.
    #[serde(default = "default_min_table_rows")]
    pub min_table_rows: usize,

    #[serde(default = "default_excluded_link_hosts")]
    pub excluded_link_hosts: Vec<String>,

    /// Enrichment cap used when the CLI does not pass `--enrich`.
    #[serde(default)]
    pub enrich_limit: Option<usize>,
}

/// Output files
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_file_stem")]
    pub file_stem: String,

    #[serde(default = "default_debug_dir")]
    pub debug_dir: PathBuf,

    #[serde(default = "default_true")]
    pub save_debug_html: bool,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}
fn default_true() -> bool {
    true
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)".to_string()
}
fn default_window_size() -> String {
    "1920,1080".to_string()
}
fn default_page_load_timeout_secs() -> u64 {
    30
}
fn default_ranking_url() -> String {
    "https://fortune.com/ranking/fortune500/".to_string()
}
fn default_table_timeout_secs() -> u64 {
    10
}
fn default_initial_settle_ms() -> u64 {
    3000
}
fn default_scroll_rounds() -> u32 {
    5
}
fn default_settle_delay_ms() -> u64 {
    2000
}
fn default_detail_settle_ms() -> u64 {
    2000
}
fn default_min_table_rows() -> usize {
    10
}
fn default_excluded_link_hosts() -> Vec<String> {
    ["facebook", "twitter", "linkedin", "instagram"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_file_stem() -> String {
    "fortune500".to_string()
}
fn default_debug_dir() -> PathBuf {
    PathBuf::from("debug_html")
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: true,
            user_agent: default_user_agent(),
            window_size: default_window_size(),
            page_load_timeout_secs: default_page_load_timeout_secs(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            ranking_url: default_ranking_url(),
            table_timeout_secs: default_table_timeout_secs(),
            initial_settle_ms: default_initial_settle_ms(),
            scroll_rounds: default_scroll_rounds(),
            settle_delay_ms: default_settle_delay_ms(),
            detail_settle_ms: default_detail_settle_ms(),
            min_table_rows: default_min_table_rows(),
            excluded_link_hosts: default_excluded_link_hosts(),
            enrich_limit: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_stem: default_file_stem(),
            debug_dir: default_debug_dir(),
            save_debug_html: true,
        }
    }
}

impl ScraperConfig {
    /// Ranking page for `year`, e.g. `.../fortune500/2025/`.
    pub fn target_url(&self, year: Option<u16>) -> String {
        let base = self.ranking_url.trim_end_matches('/');
        match year {
            Some(y) => format!("{}/{}/", base, y),
            None => format!("{}/", base),
        }
    }

    pub fn table_timeout(&self) -> Duration {
        Duration::from_secs(self.table_timeout_secs)
    }

    pub fn initial_settle(&self) -> Duration {
        Duration::from_millis(self.initial_settle_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn detail_settle(&self) -> Duration {
        Duration::from_millis(self.detail_settle_ms)
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::Environment::with_prefix("RANKING")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration sources")?;

        cfg.try_deserialize()
            .context("Invalid configuration")
    }
}
