use std::time::Duration;
use thiserror::Error;

/// Failures of the browser-facing steps of a scrape.
///
/// Row classification never fails; noise rows are simply skipped.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to initialise browser session: {0}")]
    DriverInit(String),

    #[error("no table rendered within {0:?}")]
    RenderTimeout(Duration),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("browser driver error: {0}")]
    Driver(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = ScrapeError::Navigation {
            url: "https://example.com".into(),
            reason: "net::ERR_NAME_NOT_RESOLVED".into(),
        };
        assert_eq!(
            e.to_string(),
            "navigation to https://example.com failed: net::ERR_NAME_NOT_RESOLVED"
        );
        assert_eq!(
            ScrapeError::RenderTimeout(Duration::from_secs(10)).to_string(),
            "no table rendered within 10s"
        );
    }
}
