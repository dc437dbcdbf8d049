use chrono::{DateTime, Utc};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Least-squares line `price = intercept + slope * t`, with `t` in days since `origin`.
#[derive(Debug, Clone, Copy)]
pub struct LinearTrend {
    pub origin: DateTime<Utc>,
    pub intercept: f64,
    pub slope: f64,
}

impl LinearTrend {
    /// Fits the trend. Returns `None` for fewer than two points or when every
    /// point shares the same timestamp.
    pub fn fit(points: &[(DateTime<Utc>, f64)]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let origin = points.iter().map(|(t, _)| *t).min()?;
        let xs: Vec<f64> = points.iter().map(|(t, _)| days_between(origin, *t)).collect();
        let ys: Vec<f64> = points.iter().map(|(_, p)| *p).collect();

        let n = xs.len() as f64;
        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = ys.iter().sum::<f64>() / n;
        let sxx: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
        let sxy: f64 = xs.iter().zip(&ys).map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();

        if sxx <= f64::EPSILON {
            return None;
        }
        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        if !slope.is_finite() || !intercept.is_finite() {
            return None;
        }
        Some(Self {
            origin,
            intercept,
            slope,
        })
    }

    pub fn predict(&self, at: DateTime<Utc>) -> f64 {
        self.intercept + self.slope * days_between(self.origin, at)
    }
}

/// Median gap between consecutive timestamps. `None` with fewer than two.
pub fn median_spacing(timestamps: &[DateTime<Utc>]) -> Option<chrono::Duration> {
    let mut gaps: Vec<chrono::Duration> = timestamps.windows(2).map(|w| w[1] - w[0]).collect();
    if gaps.is_empty() {
        return None;
    }
    gaps.sort();
    let mid = gaps.len() / 2;
    let median = if gaps.len() % 2 == 0 {
        let d1 = gaps[mid - 1];
        let d2 = gaps[mid];
        d1 + (d2 - d1) / 2
    } else {
        gaps[mid]
    };
    Some(median)
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let d = to - from;
    (d.num_seconds() as f64 + d.subsec_nanos() as f64 / 1e9) / SECONDS_PER_DAY
}
