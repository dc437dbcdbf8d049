use crate::model::Observation;
use serde::Serialize;

/// One plot trace: dates on `x`, prices on `y`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub x: Vec<String>,
    pub y: Vec<f64>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Plot payload as a list of traces, ready to hand to the charting front end.
pub type ChartSeries = Vec<ChartData>;

/// Projects a history onto a single scatter trace, keeping its order.
pub fn project(history: &[Observation]) -> ChartSeries {
    let (x, y) = history
        .iter()
        .map(|o| (o.timestamp.format("%Y-%m-%d").to_string(), o.price))
        .unzip();
    vec![ChartData {
        x,
        y,
        kind: "scatter",
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn pairs_dates_with_prices() {
        let history = vec![
            Observation {
                timestamp: Utc.with_ymd_and_hms(2024, 2, 28, 23, 0, 0).unwrap(),
                url: "u".into(),
                price: 10.0,
            },
            Observation {
                timestamp: Utc.with_ymd_and_hms(2024, 2, 29, 1, 0, 0).unwrap(),
                url: "u".into(),
                price: 9.5,
            },
        ];
        let chart = project(&history);
        assert_eq!(chart.len(), 1);
        assert_eq!(chart[0].x, vec!["2024-02-28", "2024-02-29"]);
        assert_eq!(chart[0].y, vec![10.0, 9.5]);
        assert_eq!(project(&history), chart);

        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json[0]["type"], "scatter");
    }

    #[test]
    fn empty_history_gives_empty_trace() {
        let chart = project(&[]);
        assert!(chart[0].x.is_empty() && chart[0].y.is_empty());
    }
}
