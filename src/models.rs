use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

// ============================================================================
// Search Terms
// ============================================================================

/// A single keyword submitted to the marketplace search page.
/// Always trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm(String);

impl SearchTerm {
    /// Trims the input, returning `None` when nothing is left
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identity used when collapsing duplicate terms ("Laptop" == "laptop")
    pub fn identity(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Product Records
// ============================================================================

/// Normalized listing extracted from one search result card
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ProductRecord {
    pub title: String,
    /// Star rating in `[0, 5]`
    pub rating: Option<f64>,
    /// Number of customer ratings
    pub reviews: Option<u64>,
    /// Thumbnail URL
    pub image: Option<String>,
    /// Absolute product detail URL
    pub url: Option<String>,
}

impl ProductRecord {
    pub fn dedupe_key(&self) -> DedupeKey {
        DedupeKey::for_record(self)
    }
}

/// Identity used to collapse the same listing seen under several terms
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupeKey(String);

impl DedupeKey {
    /// URL when present, otherwise `title::image`
    pub fn for_record(record: &ProductRecord) -> Self {
        match record.url.as_deref() {
            Some(url) if !url.is_empty() => Self(url.to_string()),
            _ => Self(format!(
                "{}::{}",
                record.title,
                record.image.as_deref().unwrap_or("")
            )),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Outcomes & Responses
// ============================================================================

/// What a single term produced once its page was fetched and scanned.
/// Transport failures travel separately as `Err(FetchError)`.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The marketplace answered with a challenge page
    Blocked,
    /// Records in document order
    Products(Vec<ProductRecord>),
}

/// Payload returned by `/api/scrape`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct SearchResponse {
    /// Requested keyword, empty when aggregating across several terms
    pub keyword: String,
    pub count: usize,
    pub products: Vec<ProductRecord>,
}

impl SearchResponse {
    pub fn new(keyword: impl Into<String>, products: Vec<ProductRecord>) -> Self {
        Self {
            keyword: keyword.into(),
            count: products.len(),
            products,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, url: Option<&str>, image: Option<&str>) -> ProductRecord {
        ProductRecord {
            title: title.to_string(),
            rating: None,
            reviews: None,
            image: image.map(str::to_string),
            url: url.map(str::to_string),
        }
    }

    #[test]
    fn search_term_is_trimmed() {
        let term = SearchTerm::parse("  usb hub \n").unwrap();
        assert_eq!(term.as_str(), "usb hub");
        assert!(SearchTerm::parse("   ").is_none());
        assert!(SearchTerm::parse("").is_none());
    }

    #[test]
    fn search_term_identity_ignores_case() {
        let a = SearchTerm::parse("Laptop").unwrap();
        let b = SearchTerm::parse("LAPTOP").unwrap();
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a, b);
    }

    #[test]
    fn dedupe_key_prefers_url() {
        let r = record("Mouse", Some("https://www.amazon.com/dp/B01"), Some("img.jpg"));
        assert_eq!(r.dedupe_key().as_str(), "https://www.amazon.com/dp/B01");
    }

    #[test]
    fn dedupe_key_falls_back_to_title_and_image() {
        assert_eq!(
            record("Mouse", None, Some("img.jpg")).dedupe_key().as_str(),
            "Mouse::img.jpg"
        );
        assert_eq!(record("Mouse", Some(""), None).dedupe_key().as_str(), "Mouse::");
    }

    #[test]
    fn response_count_matches_products() {
        let products = vec![record("A", None, None), record("B", None, None)];
        let response = SearchResponse::new("laptop", products);
        assert_eq!(response.count, 2);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["keyword"], "laptop");
        assert_eq!(json["products"][0]["rating"], serde_json::Value::Null);
    }
}
