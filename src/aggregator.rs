use scraper::Html;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::ScraperConfig;
use crate::crawler::PageFetcher;
use crate::detect;
use crate::error::ScrapeError;
use crate::extractor::Extractor;
use crate::models::{DedupeKey, FetchOutcome, ProductRecord, SearchResponse, SearchTerm};

// ============================================================================
// Dedupe Accumulator
// ============================================================================

/// Insertion-ordered set of products keyed by `DedupeKey`
#[derive(Debug, Default)]
pub struct ProductAccumulator {
    seen: HashSet<DedupeKey>,
    products: Vec<ProductRecord>,
}

impl ProductAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the record unless its key was already seen
    pub fn push(&mut self, record: ProductRecord) -> bool {
        if self.seen.insert(record.dedupe_key()) {
            self.products.push(record);
            true
        } else {
            false
        }
    }

    /// Returns how many records were new
    pub fn extend(&mut self, records: impl IntoIterator<Item = ProductRecord>) -> usize {
        let mut added = 0;
        for record in records {
            if self.push(record) {
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn into_products(self) -> Vec<ProductRecord> {
        self.products
    }
}

/// Default term first, then fallbacks, case-insensitive duplicates removed
pub fn build_term_list(default_term: &SearchTerm, fallbacks: &[SearchTerm]) -> Vec<SearchTerm> {
    let mut tried = HashSet::new();
    std::iter::once(default_term)
        .chain(fallbacks)
        .filter(|term| tried.insert(term.identity()))
        .cloned()
        .collect()
}

/// Parses one page, checking for a challenge before extracting
pub fn scan_page(extractor: &Extractor, html: &str) -> FetchOutcome {
    let document = Html::parse_document(html);
    if detect::is_blocked(&document) {
        return FetchOutcome::Blocked;
    }
    FetchOutcome::Products(extractor.extract(&document))
}

// ============================================================================
// Aggregator
// ============================================================================

/// Runs single-term or multi-term searches against the marketplace
pub struct Aggregator {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<Extractor>,
    default_term: SearchTerm,
    fallback_terms: Vec<SearchTerm>,
}

impl Aggregator {
    pub fn new(config: &ScraperConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::with_extractor(config, fetcher, Extractor::new(config.base_url.clone()))
    }

    pub fn with_extractor(
        config: &ScraperConfig,
        fetcher: Arc<dyn PageFetcher>,
        extractor: Extractor,
    ) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(extractor),
            default_term: config.default_term.clone(),
            fallback_terms: config.fallback_terms.clone(),
        }
    }

    /// Terms visited in aggregate mode, in order
    pub fn term_list(&self) -> Vec<SearchTerm> {
        build_term_list(&self.default_term, &self.fallback_terms)
    }

    /// Searches `keyword` alone, or every configured term when it is blank or absent
    pub async fn search(&self, keyword: Option<&str>) -> Result<SearchResponse, ScrapeError> {
        let request_id = Uuid::new_v4();
        match keyword.and_then(SearchTerm::parse) {
            Some(term) => {
                self.search_single(term)
                    .instrument(info_span!("scrape", %request_id, mode = "single"))
                    .await
            }
            None => {
                self.search_aggregate()
                    .instrument(info_span!("scrape", %request_id, mode = "aggregate"))
                    .await
            }
        }
    }

    async fn search_single(&self, term: SearchTerm) -> Result<SearchResponse, ScrapeError> {
        match self.scrape_term(&term).await? {
            FetchOutcome::Blocked => {
                warn!(term = %term, "⚠️ Challenge page served, giving up");
                Err(ScrapeError::Blocked)
            }
            FetchOutcome::Products(products) => {
                info!(term = %term, count = products.len(), "✅ Search completed");
                Ok(SearchResponse::new(term.as_str(), products))
            }
        }
    }

    async fn search_aggregate(&self) -> Result<SearchResponse, ScrapeError> {
        let terms = self.term_list();
        let mut accumulator = ProductAccumulator::new();

        // Strictly sequential: a block on any term discards everything gathered so far
        for (idx, term) in terms.iter().enumerate() {
            match self.scrape_term(term).await? {
                FetchOutcome::Blocked => {
                    warn!(
                        term = %term,
                        position = idx + 1,
                        total = terms.len(),
                        "⚠️ Challenge page served, aborting aggregate search"
                    );
                    return Err(ScrapeError::Blocked);
                }
                FetchOutcome::Products(products) => {
                    let found = products.len();
                    let added = accumulator.extend(products);
                    info!(term = %term, found, added, "Term processed");
                }
            }
        }

        info!(terms = terms.len(), count = accumulator.len(), "✅ Aggregate search completed");
        Ok(SearchResponse::new("", accumulator.into_products()))
    }

    async fn scrape_term(&self, term: &SearchTerm) -> Result<FetchOutcome, ScrapeError> {
        let html = self.fetcher.fetch(term).await.map_err(|e| {
            warn!(term = %term, error = %e, "Fetch failed");
            ScrapeError::from(e)
        })?;

        // Parsing is CPU bound and `Html` is not Send
        let extractor = Arc::clone(&self.extractor);
        tokio::task::spawn_blocking(move || scan_page(&extractor, &html))
            .await
            .map_err(|e| ScrapeError::Internal(format!("page scan for '{}' failed: {}", term, e)))
    }
}
