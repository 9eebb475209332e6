use serde::{Deserialize, Serialize};

/// Granularity of a connected-calls time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartBucket {
    Hour,
    Day,
    Week,
    Month,
    #[serde(rename = "15min")]
    Live15Min,
    #[serde(rename = "30min")]
    Live30Min,
    #[serde(rename = "1hour")]
    Live1Hour,
}

impl ChartBucket {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "hour" => Some(Self::Hour),
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "15min" => Some(Self::Live15Min),
            "30min" | "live" => Some(Self::Live30Min),
            "1hour" => Some(Self::Live1Hour),
            _ => None,
        }
    }

    /// Value of the `timeframe` query parameter.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Live15Min => "15min",
            Self::Live30Min => "30min",
            Self::Live1Hour => "1hour",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live15Min | Self::Live30Min | Self::Live1Hour)
    }

    /// Backend path serving this bucket.
    pub fn endpoint(&self) -> &'static str {
        if self.is_live() {
            "/chart/connected-calls-live"
        } else {
            "/chart/asr"
        }
    }
}

impl std::fmt::Display for ChartBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Axis label as sent by the backend ("14:05", "Mon", "Day 3")
    pub time: String,
    pub connected_calls: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub bucket: ChartBucket,
    pub points: Vec<ChartPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_connected: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl ChartSeries {
    pub fn peak(&self) -> u64 {
        self.points.iter().map(|p| p.connected_calls).max().unwrap_or(0)
    }

    pub fn values(&self) -> Vec<u64> {
        self.points.iter().map(|p| p.connected_calls).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_ids_round_trip() {
        for bucket in [
            ChartBucket::Hour,
            ChartBucket::Day,
            ChartBucket::Week,
            ChartBucket::Month,
            ChartBucket::Live15Min,
            ChartBucket::Live30Min,
            ChartBucket::Live1Hour,
        ] {
            assert_eq!(ChartBucket::from_id(bucket.id()), Some(bucket));
        }
    }

    #[test]
    fn live_buckets_use_live_endpoint() {
        assert_eq!(ChartBucket::Live15Min.endpoint(), "/chart/connected-calls-live");
        assert_eq!(ChartBucket::Week.endpoint(), "/chart/asr");
    }

    #[test]
    fn peak_of_empty_series_is_zero() {
        let series = ChartSeries {
            bucket: ChartBucket::Day,
            points: vec![],
            total_connected: None,
            last_updated: None,
        };
        assert_eq!(series.peak(), 0);
    }

    #[test]
    fn peak_and_values() {
        let series = ChartSeries {
            bucket: ChartBucket::Day,
            points: vec![
                ChartPoint { time: "10:00".into(), connected_calls: 4 },
                ChartPoint { time: "11:00".into(), connected_calls: 9 },
                ChartPoint { time: "12:00".into(), connected_calls: 1 },
            ],
            total_connected: None,
            last_updated: None,
        };
        assert_eq!(series.peak(), 9);
        assert_eq!(series.values(), vec![4, 9, 1]);
    }
}
