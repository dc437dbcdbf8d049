// Core structs: Observation, PriceResult, TrackResult and the error types
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::analyzer::{ChartSeries, PriceStats};

/// One recorded price for one address at one moment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub price: f64,
}

impl Observation {
    pub fn new(url: impl Into<String>, price: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            url: url.into(),
            price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Static,
    Rendered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceMatch {
    pub text: String,
    pub selector: String,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceResult {
    Found(PriceMatch),
    NotFound,
}

/// Everything the front end needs to render a tracking result.
#[derive(Debug, Clone, Serialize)]
pub struct TrackResult {
    pub url: String,
    pub price: f64,
    pub price_text: String,
    pub advice: String,
    pub predicted: Option<f64>,
    pub stats: Option<PriceStats>,
    pub chart: ChartSeries,
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("http error: {0}")]
    HttpError(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected status {0}")]
    InvalidResponse(u16),
}

impl From<reqwest::Error> for ScraperError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScraperError::Timeout
        } else {
            ScraperError::HttpError(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch browser: {0}")]
    Launch(#[from] std::io::Error),
    #[error("render timed out after {0}s")]
    Timeout(u64),
    #[error("browser exited with {0}")]
    Failed(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("price text {0:?} is not numeric")]
    NotNumeric(String),
    #[error("price {0} is negative")]
    Negative(f64),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Price not found. Please check the URL or try again later.")]
    NotFound,
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("failed to persist observation: {0}")]
    Persistence(#[from] StorageError),
}
