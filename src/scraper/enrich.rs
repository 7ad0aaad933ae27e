//! Website enrichment: visit a company's detail page on the ranking site and
//! pick the first outbound link that is neither the ranking site itself nor a
//! social network.

use crate::config::ScraperConfig;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use super::browser::BrowserSession;
use super::parsers::parse_links;

/// Exclusion-based outbound link filter.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    origin_host: Option<String>,
    excluded_hosts: Vec<String>,
}

impl LinkFilter {
    /// `origin` is the ranking page URL; links on its registrable host are internal.
    pub fn new(origin: &str, excluded_hosts: &[String]) -> Self {
        let origin_host = Url::parse(origin)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_lowercase()));

        Self {
            origin_host,
            excluded_hosts: excluded_hosts.iter().map(|h| h.to_lowercase()).collect(),
        }
    }

    fn is_origin(&self, host: &str) -> bool {
        match &self.origin_host {
            Some(origin) => host == origin || host.ends_with(&format!(".{}", origin)),
            None => false,
        }
    }

    fn is_excluded(&self, host: &str) -> bool {
        self.excluded_hosts.iter().any(|p| host.contains(p.as_str()))
    }

    /// Whether `href` could be the company's own website.
    pub fn accepts(&self, href: &str) -> bool {
        let lower = href.to_ascii_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return false;
        }

        let Some(host) = Url::parse(href)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
        else {
            return false;
        };

        !self.is_origin(&host) && !self.is_excluded(&host)
    }

    /// First acceptable link in document order.
    pub fn first_match<'a, I>(&self, hrefs: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        hrefs.into_iter().find(|h| self.accepts(h))
    }
}

pub struct WebsiteResolver {
    filter: LinkFilter,
    settle: Duration,
}

impl WebsiteResolver {
    pub fn new(config: &ScraperConfig, origin: &str) -> Self {
        Self {
            filter: LinkFilter::new(origin, &config.excluded_link_hosts),
            settle: config.detail_settle(),
        }
    }

    /// Resolve one record's website. Any failure on the way yields `None`;
    /// nothing here aborts the scrape.
    pub async fn resolve_website<S>(&self, session: &S, detail_url: Option<&str>) -> Option<String>
    where
        S: BrowserSession + ?Sized,
    {
        let url = detail_url?;

        if let Err(e) = session.navigate(url).await {
            warn!("{}", e);
            return None;
        }
        sleep(self.settle).await;

        let html = match session.html_snapshot().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Snapshot of {} failed: {}", url, e);
                return None;
            }
        };

        let links = match parse_links(&html) {
            Ok(links) => links,
            Err(e) => {
                warn!("Link scan of {} failed: {:#}", url, e);
                return None;
            }
        };

        let website = self
            .filter
            .first_match(links.iter().map(String::as_str))
            .map(str::to_string);
        debug!("{} → {:?} ({} links scanned)", url, website, links.len());
        website
    }
}
