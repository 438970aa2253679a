//! Product listing scraper for marketplace search-results pages.
//!
//! A search term is fetched with browser-like headers, checked for a
//! challenge page, and parsed into normalized [`models::ProductRecord`]s.
//! Without an explicit keyword the default and fallback terms are all
//! searched and their results merged without duplicates.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod crawler;
pub mod detect;
pub mod error;
pub mod extractor;
pub mod models;
pub mod selectors;

pub use aggregator::Aggregator;
pub use config::ScraperConfig;
pub use crawler::{HttpFetcher, PageFetcher};
pub use error::{FetchError, ScrapeError};
pub use models::{ProductRecord, SearchResponse, SearchTerm};
