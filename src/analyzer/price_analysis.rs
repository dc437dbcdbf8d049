use crate::analyzer::trend::{median_spacing, LinearTrend};
use crate::model::Observation;
use chrono::Duration;
use serde::Serialize;
use std::fmt;

/// Directional recommendation derived from the forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Advice {
    InsufficientData,
    Wait,
    BuyNow,
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Advice::InsufficientData => "Not enough data to make a prediction.",
            Advice::Wait => "Wait, the price may drop.",
            Advice::BuyNow => "Buy now, the price is unlikely to drop.",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceStats {
    pub highest: f64,
    pub lowest: f64,
    pub average: f64,
}

impl PriceStats {
    /// Highest, lowest and mean price. `None` for an empty history.
    pub fn from_history(history: &[Observation]) -> Option<Self> {
        if history.is_empty() {
            return None;
        }
        let prices = history.iter().map(|o| o.price);
        let highest = prices.clone().fold(f64::MIN, f64::max);
        let lowest = prices.clone().fold(f64::MAX, f64::min);
        let average = prices.sum::<f64>() / history.len() as f64;
        Some(Self {
            highest,
            lowest,
            // Rounding in the sum can push the mean a hair outside the range
            average: average.clamp(lowest, highest),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub advice: Advice,
    pub predicted: Option<f64>,
    pub stats: Option<PriceStats>,
}

pub trait Forecaster {
    fn forecast(&self, history: &[Observation]) -> Forecast;
}

/// Linear-trend forecaster projecting one step past the last observation.
///
/// The step is `horizon` when set, otherwise the median spacing of the
/// history, so irregular sampling projects by a typical gap.
pub struct TrendForecaster {
    horizon: Option<Duration>,
}

impl TrendForecaster {
    pub fn new(horizon: Option<Duration>) -> Self {
        Self { horizon }
    }

    pub fn from_hours(hours: Option<f64>) -> Self {
        let horizon = hours
            .filter(|h| h.is_finite() && *h > 0.0)
            .and_then(|h| Duration::try_milliseconds((h * 3_600_000.0) as i64));
        Self::new(horizon)
    }

    /// Predicted next price. Falls back to the last observed price when the
    /// trend is degenerate. Never negative.
    pub fn predict_next(&self, history: &[Observation]) -> Option<f64> {
        let last = history.last()?;
        let points: Vec<_> = history.iter().map(|o| (o.timestamp, o.price)).collect();
        let timestamps: Vec<_> = history.iter().map(|o| o.timestamp).collect();

        let step = self
            .horizon
            .or_else(|| median_spacing(&timestamps))
            .filter(|d| *d > Duration::zero());

        // A step past the representable calendar has no projection
        let target = step.and_then(|step| last.timestamp.checked_add_signed(step));
        let predicted = match (LinearTrend::fit(&points), target) {
            (Some(trend), Some(target)) => trend.predict(target),
            _ => last.price,
        };
        if predicted.is_finite() {
            Some(predicted.max(0.0))
        } else {
            Some(last.price)
        }
    }
}

impl Default for TrendForecaster {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Forecaster for TrendForecaster {
    fn forecast(&self, history: &[Observation]) -> Forecast {
        if history.len() < 2 {
            return Forecast {
                advice: Advice::InsufficientData,
                predicted: None,
                stats: None,
            };
        }

        let current = history[history.len() - 1].price;
        let predicted = self.predict_next(history).unwrap_or(current);
        tracing::debug!("Predicted price: {:.2}, current price: {:.2}", predicted, current);

        let advice = if predicted < current {
            Advice::Wait
        } else {
            Advice::BuyNow
        };

        Forecast {
            advice,
            predicted: Some(predicted),
            stats: PriceStats::from_history(history),
        }
    }
}
