// Analyzer module: forecasting, descriptive statistics and chart projection.

pub mod chart;
pub mod price_analysis;
pub mod trend;

pub use chart::{ChartData, ChartSeries};
pub use price_analysis::{Advice, Forecast, Forecaster, PriceStats, TrendForecaster};
