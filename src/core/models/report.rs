use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::models::balance::BalanceInfo;
use crate::core::models::chart::ChartSeries;
use crate::core::timeframe::{DateRange, Timeframe};

/// Whether the backend computed the report from today's live counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    Live,
    Historical,
}

/// Call aggregates for one campaign and date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallReport {
    pub campaign: String,
    pub range: DateRange,
    pub total_calls: u64,
    pub connected_calls: u64,
    /// Answer-seizure ratio, percent of attempts that connected
    pub asr_percent: f64,
    /// Average call duration in seconds
    pub acd_seconds: f64,
    pub billing_total: f64,
    /// Disposition code -> call count
    pub dispositions: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ReportSource>,
    #[serde(default)]
    pub deduction_pending: bool,
}

impl CallReport {
    /// Dispositions sorted by descending count, ties by code.
    pub fn top_dispositions(&self) -> Vec<(&str, u64)> {
        let mut rows: Vec<(&str, u64)> = self
            .dispositions
            .iter()
            .map(|(code, count)| (code.as_str(), *count))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }

    pub fn unconnected_calls(&self) -> u64 {
        self.total_calls.saturating_sub(self.connected_calls)
    }
}

/// Backend business day, used as the reference for range derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerDate {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Everything the dashboard shows after one successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    /// Selection the data was fetched for
    pub timeframe: Timeframe,
    pub report: CallReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<BalanceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSeries>,
    pub server_date: NaiveDate,
    pub fetched_at: DateTime<Utc>,
}

impl ReportSnapshot {
    /// The report's own balance reflects today's running deduction, so it
    /// wins over the separately fetched account balance.
    pub fn current_balance(&self) -> Option<f64> {
        self.report
            .balance
            .or_else(|| self.balance.as_ref().map(|b| b.current_balance))
    }
}
