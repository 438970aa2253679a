use thiserror::Error;

/// Transport-level failure while fetching a search page
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or redirect-limit failure reported by the client
    #[error("{0}")]
    Request(#[from] reqwest::Error),
    /// The marketplace answered with a non-2xx status
    #[error("request to {url} failed with status {status}")]
    Status { status: u16, url: String },
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Request(e) if e.is_timeout())
    }
}

/// Failures surfaced by a scrape request
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A challenge page was served for one of the terms
    #[error("Captcha detected by the marketplace. Try again later.")]
    Blocked,
    #[error("Failed to fetch data from the marketplace")]
    Upstream(#[from] FetchError),
    #[error("Unexpected error while processing the request")]
    Internal(String),
}

impl ScrapeError {
    /// Underlying cause attached to the error payload, if any
    pub fn details(&self) -> Option<String> {
        match self {
            ScrapeError::Blocked => None,
            ScrapeError::Upstream(e) => Some(e.to_string()),
            ScrapeError::Internal(msg) => Some(msg.clone()),
        }
    }
}
