use scraper::Html;

use crate::selectors;

/// True when the document is a CAPTCHA/bot-check page instead of results
pub fn is_blocked(document: &Html) -> bool {
    document.select(&selectors::CAPTCHA).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_captcha_form() {
        let doc = Html::parse_document(
            r#"<html><body>
                <form method="get" action="/errors/validateCaptcha">
                    <input type="hidden" name="amzn" value="x">
                </form>
            </body></html>"#,
        );
        assert!(is_blocked(&doc));
    }

    #[test]
    fn detects_captcha_input() {
        let doc = Html::parse_document(
            r#"<html><body><input id="captchacharacters" name="field-keywords"></body></html>"#,
        );
        assert!(is_blocked(&doc));
    }

    #[test]
    fn results_page_is_not_blocked() {
        let doc = Html::parse_document(
            r#"<html><body>
                <form action="/s"><input name="k"></form>
                <div data-component-type="s-search-result" data-asin="B0001"></div>
            </body></html>"#,
        );
        assert!(!is_blocked(&doc));
    }
}
