// Tracking pipeline: extract -> persist -> forecast -> project
use crate::analyzer::{chart, Forecaster, TrendForecaster};
use crate::config::AppConfig;
use crate::model::{Observation, PriceResult, ScraperError, StorageError, TrackError, TrackResult};
use crate::normalizer::normalize_price;
use crate::parser::PriceSelectors;
use crate::scraper::{HeadlessBrowser, HttpFetcher, PageRenderer, PriceExtractor};
use crate::storage::SqliteStorage;

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Everything both callers (interactive and periodic) share. Built once at startup.
pub struct PipelineContext {
    pub storage: Arc<Mutex<SqliteStorage>>,
    pub extractor: PriceExtractor,
    pub forecaster: TrendForecaster,
}

/// Per-address outcome of a periodic run.
#[derive(Debug)]
pub struct TrackAllReport {
    pub url: String,
    pub outcome: Result<f64, TrackError>,
}

impl PipelineContext {
    pub fn new(storage: Arc<Mutex<SqliteStorage>>, extractor: PriceExtractor, forecaster: TrendForecaster) -> Self {
        Self {
            storage,
            extractor,
            forecaster,
        }
    }

    /// Wires the real HTTP fetcher and headless browser from configuration.
    pub fn from_config(config: &AppConfig, storage: Arc<Mutex<SqliteStorage>>) -> Result<Self, ScraperError> {
        let fetcher = Arc::new(HttpFetcher::new(
            config.request_timeout_seconds,
            config.user_agents.clone(),
        )?);
        let renderer: Option<Arc<dyn PageRenderer>> = if config.render.enabled {
            Some(Arc::new(HeadlessBrowser::new(&config.render)))
        } else {
            None
        };
        let selectors = PriceSelectors::new(&config.price_selectors[..]);
        if selectors.is_empty() {
            warn!("No usable price selectors configured; every extraction will fail");
        } else {
            info!("{} price selectors configured", selectors.len());
        }

        Ok(Self::new(
            storage,
            PriceExtractor::new(fetcher, renderer, selectors),
            TrendForecaster::from_hours(config.forecast_horizon_hours),
        ))
    }

    /// Interactive path: record the current price and report advice, stats and chart.
    pub async fn track(&self, url: &str) -> Result<TrackResult, TrackError> {
        let (price_text, price) = self.observe(url).await?;

        let history = self.history(url).await?;
        let forecast = self.forecaster.forecast(&history);
        let chart = chart::project(&history);

        info!(
            "Tracked {}: {} ({} observations, advice: {})",
            url,
            price,
            history.len(),
            forecast.advice
        );

        Ok(TrackResult {
            url: url.to_string(),
            price,
            price_text,
            advice: forecast.advice.to_string(),
            predicted: forecast.predicted,
            stats: forecast.stats,
            chart,
        })
    }

    /// Periodic path: extract and persist every address independently.
    pub async fn track_all(&self, urls: &[String]) -> Vec<TrackAllReport> {
        let tasks = urls.iter().map(|url| async move {
            let outcome = self.observe(url).await.map(|(_, price)| price);
            if let Err(e) = &outcome {
                warn!("Periodic tracking of {} failed: {}", url, e);
            }
            TrackAllReport {
                url: url.clone(),
                outcome,
            }
        });
        join_all(tasks).await
    }

    pub async fn history(&self, url: &str) -> Result<Vec<Observation>, StorageError> {
        self.storage.lock().await.history(url)
    }

    /// Extract, normalize and append one observation.
    async fn observe(&self, url: &str) -> Result<(String, f64), TrackError> {
        let found = match self.extractor.extract(url).await {
            PriceResult::Found(found) => found,
            PriceResult::NotFound => return Err(TrackError::NotFound),
        };
        let price = normalize_price(&found.text)?;

        self.storage
            .lock()
            .await
            .append(&Observation::new(url, price))?;
        Ok((found.text, price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Advice;
    use crate::config::DEFAULT_PRICE_SELECTORS;
    use crate::model::ScraperError;
    use crate::scraper::PageFetcher;
    use crate::scraper::extractor::tests::{extractor, FixturePage};
    use std::collections::HashMap;

    /// Serves a different page per address; unknown addresses fail like a dead host.
    struct PagesByUrl(HashMap<String, String>);

    #[async_trait::async_trait]
    impl PageFetcher for PagesByUrl {
        async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| ScraperError::HttpError(format!("no route to {}", url)))
        }
    }

    const URL: &str = "https://www.amazon.in/dp/B08N5WRWNW";

    fn page(price: &str) -> String {
        format!(r#"<html><body><span id="priceblock_ourprice"> {price} </span></body></html>"#)
    }

    fn context(storage: Arc<Mutex<SqliteStorage>>, fetched: Option<&str>) -> PipelineContext {
        PipelineContext::new(
            storage,
            extractor(FixturePage::new(fetched), Some(FixturePage::new(None))),
            TrendForecaster::default(),
        )
    }

    fn memory_store() -> Arc<Mutex<SqliteStorage>> {
        Arc::new(Mutex::new(SqliteStorage::in_memory().unwrap()))
    }

    #[tokio::test]
    async fn first_and_second_observation() {
        let storage = memory_store();

        let first = context(storage.clone(), Some(&page("$1,234.56"))).track(URL).await.unwrap();
        assert_eq!(first.price, 1234.56);
        assert_eq!(first.price_text, "$1,234.56");
        assert_eq!(first.advice, Advice::InsufficientData.to_string());
        assert!(first.stats.is_none());
        assert_eq!(first.chart[0].y, vec![1234.56]);

        let second = context(storage.clone(), Some(&page("1,100.00"))).track(URL).await.unwrap();
        assert_eq!(second.price, 1100.0);
        assert_eq!(second.chart[0].y, vec![1234.56, 1100.0]);

        let predicted = second.predicted.unwrap();
        let expected = if predicted < 1100.0 { Advice::Wait } else { Advice::BuyNow };
        assert_eq!(second.advice, expected.to_string());

        let stats = second.stats.unwrap();
        assert_eq!(stats.highest, 1234.56);
        assert_eq!(stats.lowest, 1100.0);
        assert!((stats.average - 1167.28).abs() < 1e-9);
    }

    #[tokio::test]
    async fn not_found_does_not_append() {
        let storage = memory_store();
        storage.lock().await.append(&Observation::new(URL, 10.0)).unwrap();

        let ctx = context(storage.clone(), Some("<html><body>Robot check</body></html>"));
        let err = ctx.track(URL).await.unwrap_err();
        assert!(matches!(err, TrackError::NotFound));
        assert_eq!(storage.lock().await.count(URL).unwrap(), 1);
    }

    #[tokio::test]
    async fn unparseable_price_is_a_failed_result() {
        let storage = memory_store();
        let ctx = context(storage.clone(), Some(&page("Currently unavailable")));
        let err = ctx.track(URL).await.unwrap_err();
        assert!(matches!(err, TrackError::Parse(_)));
        assert_eq!(storage.lock().await.count(URL).unwrap(), 0);
    }

    #[tokio::test]
    async fn track_all_records_each_address() {
        let storage = memory_store();
        let ctx = context(storage.clone(), Some(&page("₹ 899")));
        let urls = vec![URL.to_string(), "https://www.amazon.in/dp/B08N5VSQNG".to_string()];

        let reports = ctx.track_all(&urls).await;
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| matches!(r.outcome, Ok(p) if p == 899.0)));
        assert_eq!(storage.lock().await.all().unwrap().len(), 2);

        let broken = context(storage.clone(), None);
        let reports = broken.track_all(&urls).await;
        assert!(reports.iter().all(|r| matches!(r.outcome, Err(TrackError::NotFound))));
        assert_eq!(storage.lock().await.all().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn one_bad_address_does_not_block_the_others() {
        let storage = memory_store();
        let good = "https://shop.test/good".to_string();
        let no_price = "https://shop.test/captcha".to_string();
        let dead = "https://shop.test/dead".to_string();

        let pages = HashMap::from([
            (good.clone(), page("$42.00")),
            (no_price.clone(), "<html><body>Type the characters</body></html>".to_string()),
        ]);
        let ctx = PipelineContext::new(
            storage.clone(),
            PriceExtractor::new(
                Arc::new(PagesByUrl(pages)),
                Some(FixturePage::new(None) as Arc<dyn PageRenderer>),
                PriceSelectors::new(&DEFAULT_PRICE_SELECTORS[..]),
            ),
            TrendForecaster::default(),
        );

        let urls = vec![dead.clone(), good.clone(), no_price.clone()];
        let reports = ctx.track_all(&urls).await;

        let outcome = |url: &str| &reports.iter().find(|r| r.url == url).unwrap().outcome;
        assert!(matches!(outcome(&dead), Err(TrackError::NotFound)));
        assert!(matches!(outcome(&good), Ok(p) if *p == 42.0));
        assert!(matches!(outcome(&no_price), Err(TrackError::NotFound)));

        let guard = storage.lock().await;
        assert_eq!(guard.all().unwrap().len(), 1);
        assert_eq!(guard.count(&good).unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_append_is_a_persistence_error() {
        let storage = memory_store();
        storage.lock().await.execute_raw("DROP TABLE observations").unwrap();

        let ctx = context(storage.clone(), Some(&page("$10.00")));
        let err = ctx.track(URL).await.unwrap_err();
        assert!(matches!(err, TrackError::Persistence(_)));

        let reports = ctx.track_all(&[URL.to_string()]).await;
        assert!(matches!(reports[0].outcome, Err(TrackError::Persistence(_))));
    }
}
