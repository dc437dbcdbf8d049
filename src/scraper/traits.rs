use crate::model::{RenderError, ScraperError};

/// Fetches the raw markup of a product page.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScraperError>;
}

/// Renders a product page in a browser and returns the resulting DOM as HTML.
#[async_trait::async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, RenderError>;
}
