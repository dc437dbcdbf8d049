use crate::model::{PriceMatch, PriceResult, Strategy};
use crate::parser::PriceSelectors;
use crate::scraper::traits::{PageFetcher, PageRenderer};

use std::sync::Arc;
use tracing::{debug, info, warn};

/// Best-effort price extraction: static fetch first, rendered DOM second.
///
/// Both phases probe the same ordered selector list. Network and render
/// failures are logged and treated as "no match" for that phase.
pub struct PriceExtractor {
    fetcher: Arc<dyn PageFetcher>,
    renderer: Option<Arc<dyn PageRenderer>>,
    selectors: PriceSelectors,
}

impl PriceExtractor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        renderer: Option<Arc<dyn PageRenderer>>,
        selectors: PriceSelectors,
    ) -> Self {
        Self {
            fetcher,
            renderer,
            selectors,
        }
    }

    pub async fn extract(&self, url: &str) -> PriceResult {
        if let Some(found) = self.try_static(url).await {
            return PriceResult::Found(found);
        }
        if let Some(found) = self.try_rendered(url).await {
            return PriceResult::Found(found);
        }
        info!("No price found for {}", url);
        PriceResult::NotFound
    }

    async fn try_static(&self, url: &str) -> Option<PriceMatch> {
        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Static fetch failed for {}: {}", url, e);
                return None;
            }
        };
        self.probe(&html, Strategy::Static)
    }

    async fn try_rendered(&self, url: &str) -> Option<PriceMatch> {
        let renderer = self.renderer.as_ref()?;
        debug!("Falling back to rendered DOM for {}", url);
        let dom = match renderer.render(url).await {
            Ok(dom) => dom,
            Err(e) => {
                warn!("Render failed for {}: {}", url, e);
                return None;
            }
        };
        self.probe(&dom, Strategy::Rendered)
    }

    fn probe(&self, html: &str, strategy: Strategy) -> Option<PriceMatch> {
        let (selector, text) = self.selectors.probe(html)?;
        info!("Price found ({:?}, {}): {}", strategy, selector, text);
        Some(PriceMatch {
            text,
            selector,
            strategy,
        })
    }
}
