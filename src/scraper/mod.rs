// Scraper module: page fetching, headless rendering and the price extraction chain.

pub mod extractor;
pub mod fetcher;
pub mod renderer;
pub mod traits;

pub use extractor::PriceExtractor;
pub use fetcher::HttpFetcher;
pub use renderer::HeadlessBrowser;
pub use traits::{PageFetcher, PageRenderer};
