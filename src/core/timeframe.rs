use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::models::chart::ChartBucket;

/// Reporting window selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Timeframe {
    /// Today's business day, polled while selected.
    #[serde(alias = "today")]
    Live,
    Yesterday,
    #[serde(rename = "last-7-days")]
    Last7Days,
    #[serde(rename = "last-30-days")]
    Last30Days,
    Custom,
}

impl Timeframe {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "live" | "today" => Some(Self::Live),
            "yesterday" => Some(Self::Yesterday),
            "last-7-days" | "last_7_days" | "7d" | "week" => Some(Self::Last7Days),
            "last-30-days" | "last_30_days" | "30d" | "month" => Some(Self::Last30Days),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Yesterday => "yesterday",
            Self::Last7Days => "last-7-days",
            Self::Last30Days => "last-30-days",
            Self::Custom => "custom",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Live => "Live (today)",
            Self::Yesterday => "Yesterday",
            Self::Last7Days => "Last 7 days",
            Self::Last30Days => "Last 30 days",
            Self::Custom => "Custom range",
        }
    }

    pub fn all() -> &'static [Timeframe] {
        &[
            Self::Live,
            Self::Yesterday,
            Self::Last7Days,
            Self::Last30Days,
            Self::Custom,
        ]
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// Chart series matching this window.
    pub fn chart_bucket(&self) -> ChartBucket {
        match self {
            Self::Live => ChartBucket::Live30Min,
            Self::Yesterday | Self::Custom => ChartBucket::Day,
            Self::Last7Days => ChartBucket::Week,
            Self::Last30Days => ChartBucket::Month,
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Inclusive calendar date range sent to the report endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    /// Custom ranges may be entered backwards; nothing rejects them.
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_single_day() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} to {}", self.start, self.end)
        }
    }
}

fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// Derive the concrete query range for a timeframe.
///
/// `server_date` is the backend's business day; the local clock is never
/// consulted. Custom bounds that are missing fall back to `server_date`.
pub fn derive_range(
    timeframe: Timeframe,
    server_date: NaiveDate,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
) -> DateRange {
    match timeframe {
        Timeframe::Live => DateRange::single(server_date),
        Timeframe::Yesterday => DateRange::single(days_before(server_date, 1)),
        Timeframe::Last7Days => DateRange::new(days_before(server_date, 7), server_date),
        Timeframe::Last30Days => DateRange::new(days_before(server_date, 30), server_date),
        Timeframe::Custom => DateRange::new(
            custom_start.unwrap_or(server_date),
            custom_end.unwrap_or(server_date),
        ),
    }
}

/// Parse a `YYYY-MM-DD` date as typed on the command line.
pub fn parse_date(input: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid date '{}' (expected YYYY-MM-DD): {}", input, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn non_custom_ranges_end_on_server_date() {
        let server = d("2024-03-10");
        for tf in Timeframe::all().iter().filter(|t| **t != Timeframe::Custom) {
            let range = derive_range(*tf, server, None, None);
            if *tf == Timeframe::Yesterday {
                assert_eq!(range.end, d("2024-03-09"));
            } else {
                assert_eq!(range.end, server, "{} should end on server date", tf);
            }
        }
    }

    #[test]
    fn live_is_single_server_day() {
        let range = derive_range(Timeframe::Live, d("2024-03-10"), None, None);
        assert_eq!(range, DateRange::single(d("2024-03-10")));
    }

    #[test]
    fn yesterday_example() {
        let range = derive_range(Timeframe::Yesterday, d("2024-03-10"), None, None);
        assert_eq!(range, DateRange::new(d("2024-03-09"), d("2024-03-09")));
    }

    #[test]
    fn last_7_days_example() {
        let range = derive_range(Timeframe::Last7Days, d("2024-03-10"), None, None);
        assert_eq!(range, DateRange::new(d("2024-03-03"), d("2024-03-10")));
    }

    #[test]
    fn last_30_days_crosses_month_boundary() {
        let range = derive_range(Timeframe::Last30Days, d("2024-03-10"), None, None);
        assert_eq!(range.start, d("2024-02-09"));
        assert_eq!(range.end, d("2024-03-10"));
    }

    #[test]
    fn yesterday_crosses_year_boundary() {
        let range = derive_range(Timeframe::Yesterday, d("2024-01-01"), None, None);
        assert_eq!(range.start, d("2023-12-31"));
    }

    #[test]
    fn custom_uses_supplied_dates() {
        let range = derive_range(
            Timeframe::Custom,
            d("2024-03-10"),
            Some(d("2024-02-01")),
            Some(d("2024-02-15")),
        );
        assert_eq!(range, DateRange::new(d("2024-02-01"), d("2024-02-15")));
    }

    #[test]
    fn custom_falls_back_to_server_date() {
        let server = d("2024-03-10");
        let only_start = derive_range(Timeframe::Custom, server, Some(d("2024-03-01")), None);
        assert_eq!(only_start, DateRange::new(d("2024-03-01"), server));

        let neither = derive_range(Timeframe::Custom, server, None, None);
        assert_eq!(neither, DateRange::single(server));
    }

    #[test]
    fn custom_range_may_be_backwards() {
        let range = derive_range(
            Timeframe::Custom,
            d("2024-03-10"),
            Some(d("2024-03-08")),
            Some(d("2024-03-01")),
        );
        assert!(!range.is_ordered());
    }

    #[test]
    fn from_id_accepts_aliases() {
        assert_eq!(Timeframe::from_id("today"), Some(Timeframe::Live));
        assert_eq!(Timeframe::from_id("LIVE"), Some(Timeframe::Live));
        assert_eq!(Timeframe::from_id("7d"), Some(Timeframe::Last7Days));
        assert_eq!(Timeframe::from_id("last-30-days"), Some(Timeframe::Last30Days));
        assert_eq!(Timeframe::from_id("fortnight"), None);
    }

    #[test]
    fn all_lists_every_timeframe_once() {
        let all = Timeframe::all();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0], Timeframe::Live);
        assert!(all.contains(&Timeframe::Custom));
    }

    #[test]
    fn ids_round_trip_through_from_id() {
        for tf in Timeframe::all() {
            assert_eq!(Timeframe::from_id(tf.id()), Some(*tf));
        }
    }

    #[test]
    fn serde_uses_kebab_ids() {
        assert_eq!(serde_json::to_string(&Timeframe::Last7Days).unwrap(), "\"last-7-days\"");
        let tf: Timeframe = serde_json::from_str("\"today\"").unwrap();
        assert_eq!(tf, Timeframe::Live);
    }

    #[test]
    fn range_display() {
        assert_eq!(DateRange::single(d("2024-03-10")).to_string(), "2024-03-10");
        assert_eq!(
            DateRange::new(d("2024-03-03"), d("2024-03-10")).to_string(),
            "2024-03-03 to 2024-03-10"
        );
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(parse_date(" 2024-03-10 ").unwrap(), d("2024-03-10"));
        assert!(parse_date("10/03/2024").is_err());
    }
}
