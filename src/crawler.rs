use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, UPGRADE_INSECURE_REQUESTS};
use reqwest::Url;
use tracing::{debug, warn};

use crate::config::{FetchSettings, ScraperConfig};
use crate::error::FetchError;
use crate::models::SearchTerm;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Marketplace keyword query parameter
pub const KEYWORD_PARAM: &str = "k";

/// Characters of an unexpected upstream body kept in logs
const BODY_PREVIEW_CHARS: usize = 300;

/// Retrieves the raw markup of one search results page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, term: &SearchTerm) -> Result<String, FetchError>;
}

/// Plain HTTP fetcher dressed up as a desktop browser
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Url,
    settings: FetchSettings,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let settings = config.fetch.clone();
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            // `limited(n)` follows at most n - 1 redirects
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects + 1))
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            settings,
        })
    }

    pub fn search_url(&self, term: &SearchTerm) -> Url {
        search_url(&self.base_url, term)
    }
}

/// `<base>/s?k=<term>`; any path or query on the base is replaced
pub fn search_url(base_url: &Url, term: &SearchTerm) -> Url {
    let mut url = base_url.clone();
    url.set_path("/s");
    url.set_query(None);
    url.set_fragment(None);
    url.query_pairs_mut().append_pair(KEYWORD_PARAM, term.as_str());
    url
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, term: &SearchTerm) -> Result<String, FetchError> {
        let url = self.search_url(term);
        debug!(%url, "Fetching search page");

        let resp = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, self.settings.accept_language.as_str())
            .header(REFERER, self.base_url.as_str())
            .header(UPGRADE_INSECURE_REQUESTS, "1")
            .send()
            .await
            .map_err(|e| {
                let err = FetchError::from(e);
                if err.is_timeout() {
                    warn!(
                        term = %term,
                        timeout = ?self.settings.timeout,
                        "Search request timed out"
                    );
                }
                err
            })?;

        let status = resp.status();
        let final_url = resp.url().to_string();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
            warn!(
                status = status.as_u16(),
                url = %final_url,
                body = %preview,
                "⚠️ Marketplace answered with an error status"
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: final_url,
            });
        }

        let html = resp.text().await?;
        debug!(bytes = html.len(), url = %final_url, "Fetched search page");
        Ok(html)
    }
}
