//! Source page title lookup.

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

use transdoc_core::PageTitleSource;
use transdoc_shared::{Result, TitleConfig};

use crate::build_client;

/// Fetches a page and reads its `<title>` element.
///
/// Every failure (network, status, missing element) degrades to `None`.
pub struct HtmlTitleFetcher {
    client: Client,
    enabled: bool,
}

impl HtmlTitleFetcher {
    pub fn new(config: &TitleConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config.user_agent, config.timeout_secs)?,
            enabled: config.enabled,
        })
    }
}

impl PageTitleSource for HtmlTitleFetcher {
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch_title(&self, url: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let response = match self.client.get(url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!(status = %r.status(), "title fetch returned non-success status");
                return None;
            }
            Err(e) => {
                debug!(error = %e, "title fetch failed");
                return None;
            }
        };

        let body = response.text().await.ok()?;
        extract_title(&body)
    }
}

/// First `<title>` text with whitespace collapsed, if non-empty.
fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    let raw: String = document.select(&selector).next()?.text().collect();
    let title = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}
