//! CSS selectors for the marketplace search results page.
//!
//! Markup drifts between page variants and experiments; when extraction
//! starts coming back empty, capture a sample page, adjust the selectors
//! here and add the sample as a test fixture.

use once_cell::sync::Lazy;
use scraper::Selector;

fn compile(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

/// Product identifier attribute on every genuine result card
pub const ASIN_ATTR: &str = "data-asin";

/// Search result component marker (current layout)
pub static RESULT_COMPONENT: Lazy<Selector> =
    Lazy::new(|| compile(r#"div[data-component-type="s-search-result"]"#));

/// Result item class carrying an identifier (older layouts)
pub static RESULT_ITEM: Lazy<Selector> = Lazy::new(|| compile("div.s-result-item[data-asin]"));

pub static TITLE: Lazy<Selector> = Lazy::new(|| compile("h2 a span, h2 span.a-text-normal"));

pub static TITLE_LINK: Lazy<Selector> = Lazy::new(|| compile("h2 a"));

pub static RATING: Lazy<Selector> = Lazy::new(|| compile("span.a-icon-alt"));

pub static REVIEW_COUNT: Lazy<Selector> = Lazy::new(|| {
    compile(
        r#"span[aria-label$="ratings"], span[aria-label$="rating"], span.a-size-base.s-underline-text"#,
    )
});

pub static IMAGE: Lazy<Selector> = Lazy::new(|| compile("img.s-image"));

/// Challenge page markers
pub static CAPTCHA: Lazy<Selector> =
    Lazy::new(|| compile(r#"form[action*="validateCaptcha"], #captchacharacters"#));
