// Price-container probing over parsed HTML
use scraper::{Html, Selector};
use tracing::{debug, warn};

/// Ordered list of price-container selectors. The first one that matches wins.
pub struct PriceSelectors {
    selectors: Vec<(String, Selector)>,
}

impl PriceSelectors {
    /// Compiles the given CSS selectors, keeping their order.
    /// Selectors that fail to parse are skipped with a warning.
    pub fn new<S: AsRef<str>>(raw: &[S]) -> Self {
        let selectors = raw
            .iter()
            .filter_map(|s| {
                let s = s.as_ref();
                match Selector::parse(s) {
                    Ok(sel) => Some((s.to_string(), sel)),
                    Err(e) => {
                        warn!("Skipping invalid price selector {:?}: {}", s, e);
                        None
                    }
                }
            })
            .collect();
        Self { selectors }
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Probes the document with each selector in order and returns the first
    /// non-empty match together with the selector that produced it.
    pub fn probe(&self, html: &str) -> Option<(String, String)> {
        let document = Html::parse_document(html);
        self.selectors.iter().find_map(|(raw, selector)| {
            let text = find_by_selector(&document, selector)?;
            debug!("Selector {} matched: {}", raw, text);
            Some((raw.clone(), text))
        })
    }
}

/// Text of the first element matching `selector`, trimmed. Empty text counts as no match.
pub fn find_by_selector(document: &Html, selector: &Selector) -> Option<String> {
    let element = document.select(selector).next()?;
    let text = element.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PRICE_SELECTORS;

    fn defaults() -> PriceSelectors {
        PriceSelectors::new(&DEFAULT_PRICE_SELECTORS[..])
    }

    #[test]
    fn id_selector_beats_class_selectors() {
        let html = r#"<html><body>
            <span class="a-price-whole">999.</span>
            <span id="priceblock_dealprice"> $1,234.56 </span>
        </body></html>"#;
        let (selector, text) = defaults().probe(html).unwrap();
        assert_eq!(selector, "#priceblock_dealprice");
        assert_eq!(text, "$1,234.56");
    }

    #[test]
    fn third_selector_wins_over_later_ones() {
        let html = r#"<div>
            <span class="a-price"><span class="a-offscreen">$5.00</span></span>
            <span class="a-price-whole">1,299.</span>
        </div>"#;
        let (selector, text) = defaults().probe(html).unwrap();
        assert_eq!(selector, "span.a-price-whole");
        assert_eq!(text, "1,299.");
    }

    #[test]
    fn multi_class_variant_requires_both_classes() {
        let only_one = r#"<span class="a-color-price">12.00</span>"#;
        assert!(defaults().probe(only_one).is_none());

        let both = r#"<span class="a-size-medium a-color-price">12.00</span>"#;
        let (selector, _) = defaults().probe(both).unwrap();
        assert_eq!(selector, "span.a-size-medium.a-color-price");
    }

    #[test]
    fn empty_container_falls_through() {
        let html = r#"<span id="priceblock_ourprice">  </span><span class="a-offscreen">$7.10</span>"#;
        let (selector, text) = defaults().probe(html).unwrap();
        assert_eq!(selector, "span.a-offscreen");
        assert_eq!(text, "$7.10");
    }

    #[test]
    fn invalid_selectors_are_skipped() {
        let selectors = PriceSelectors::new(&["span[", "#price"][..]);
        assert_eq!(selectors.len(), 1);
        let (_, text) = selectors.probe(r#"<b id="price">3</b>"#).unwrap();
        assert_eq!(text, "3");
    }
}
