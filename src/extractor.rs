use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::models::ProductRecord;
use crate::selectors::{self, ASIN_ATTR};

static RATING_EN: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\d.]+)\s+out of 5").unwrap());
static RATING_PT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\d,]+)\s+de 5").unwrap());

/// Video, audiobook, music and app-store entries interleaved with products
const NON_PRODUCT_URL_SIGNALS: &[&str] = &[
    "primevideo",
    "/gp/video",
    "/watch/",
    "audible",
    "music",
    "apps",
];
const NON_PRODUCT_TITLE_SIGNALS: &[&str] = &["prime video", "audible"];

// ============================================================================
// Container Strategies
// ============================================================================

/// One way of locating result cards in a search page.
///
/// Strategies are tried in order; the first one matching at least one
/// container wins, the rest are never consulted for that document.
pub trait ResultStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>>;
}

/// Cards tagged with the search-result component marker
pub struct ComponentMarker;

impl ResultStrategy for ComponentMarker {
    fn name(&self) -> &'static str {
        "component-marker"
    }

    fn containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&selectors::RESULT_COMPONENT).collect()
    }
}

/// Generic result items that carry a non-empty identifier
pub struct ResultItemClass;

impl ResultStrategy for ResultItemClass {
    fn name(&self) -> &'static str {
        "result-item-class"
    }

    fn containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document
            .select(&selectors::RESULT_ITEM)
            .filter(|el| el.value().attr(ASIN_ATTR).is_some_and(|asin| !asin.trim().is_empty()))
            .collect()
    }
}

/// Strategies used when none are supplied
pub fn default_strategies() -> Vec<Box<dyn ResultStrategy>> {
    vec![Box::new(ComponentMarker), Box::new(ResultItemClass)]
}

// ============================================================================
// Extractor
// ============================================================================

/// Turns a parsed search page into product records, in page order
pub struct Extractor {
    base_url: Url,
    strategies: Vec<Box<dyn ResultStrategy>>,
}

impl Extractor {
    pub fn new(base_url: Url) -> Self {
        Self::with_strategies(base_url, default_strategies())
    }

    pub fn with_strategies(base_url: Url, strategies: Vec<Box<dyn ResultStrategy>>) -> Self {
        Self { base_url, strategies }
    }

    pub fn extract(&self, document: &Html) -> Vec<ProductRecord> {
        let matched = self.strategies.iter().find_map(|strategy| {
            let containers = strategy.containers(document);
            (!containers.is_empty()).then(|| (strategy.name(), containers))
        });

        let Some((strategy, containers)) = matched else {
            debug!("No result containers matched any strategy");
            return Vec::new();
        };

        let products: Vec<ProductRecord> = containers
            .into_iter()
            .filter_map(|card| self.extract_card(card))
            .collect();
        debug!(strategy, count = products.len(), "Extracted products");
        products
    }

    fn extract_card(&self, card: ElementRef<'_>) -> Option<ProductRecord> {
        // Editorial and promo blocks carry no identifier
        let asin = card
            .value()
            .attr(ASIN_ATTR)
            .map(str::trim)
            .filter(|asin| !asin.is_empty())?;

        let title = card
            .select(&selectors::TITLE)
            .next()
            .map(text_of)
            .filter(|t| !t.is_empty());
        let linked = card
            .select(&selectors::TITLE_LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve(&self.base_url, href));

        // Checked before the link is swapped for the canonical detail URL
        if is_non_product(linked.as_deref(), title.as_deref()) {
            return None;
        }
        let url = self.product_url(linked, asin);

        let rating = card
            .select(&selectors::RATING)
            .next()
            .and_then(|el| parse_rating(&text_of(el)));
        let reviews = card.select(&selectors::REVIEW_COUNT).next().and_then(review_count_of);
        let image = card
            .select(&selectors::IMAGE)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| resolve(&self.base_url, src));

        Some(ProductRecord {
            title: title?,
            rating,
            reviews,
            image,
            url,
        })
    }

    /// Title link when it points at a detail page, otherwise `/dp/<asin>`
    fn product_url(&self, linked: Option<String>, asin: &str) -> Option<String> {
        match linked {
            Some(url) if url.contains("/dp/") => Some(url),
            _ => resolve(&self.base_url, &format!("/dp/{}", asin)),
        }
    }
}

// ============================================================================
// Field Parsers
// ============================================================================

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(String::from)
}

/// "4.5 out of 5 stars" or "4,5 de 5 estrelas"
pub fn parse_rating(text: &str) -> Option<f64> {
    let raw = if let Some(caps) = RATING_EN.captures(text) {
        caps[1].to_string()
    } else if let Some(caps) = RATING_PT.captures(text) {
        caps[1].replacen(',', ".", 1)
    } else {
        return None;
    };

    raw.parse::<f64>()
        .ok()
        .filter(|r| r.is_finite() && (0.0..=5.0).contains(r))
}

/// Keeps only the digits: "1,234 ratings" -> 1234
pub fn parse_review_count(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn review_count_of(el: ElementRef<'_>) -> Option<u64> {
    parse_review_count(&text_of(el))
        .or_else(|| el.value().attr("aria-label").and_then(parse_review_count))
}

pub fn is_non_product(url: Option<&str>, title: Option<&str>) -> bool {
    let url = url.unwrap_or_default().to_lowercase();
    let title = title.unwrap_or_default().to_lowercase();
    NON_PRODUCT_URL_SIGNALS.iter().any(|s| url.contains(s))
        || NON_PRODUCT_TITLE_SIGNALS.iter().any(|s| title.contains(s))
}
