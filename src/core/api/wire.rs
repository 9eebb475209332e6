//! JSON bodies as the backend sends them, and their conversion into models.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::core::api::ApiError;
use crate::core::models::chart::{ChartBucket, ChartPoint, ChartSeries};
use crate::core::models::report::{CallReport, ReportSource, ServerDate};
use crate::core::models::status::{parse_indicator, StatusInfo};
use crate::core::session::LoginGrant;
use crate::core::timeframe::DateRange;

#[derive(Deserialize)]
pub struct ServerDateResponse {
    pub server_date: NaiveDate,
    pub server_timezone: Option<String>,
}

impl From<ServerDateResponse> for ServerDate {
    fn from(resp: ServerDateResponse) -> Self {
        ServerDate {
            date: resp.server_date,
            timezone: resp.server_timezone,
        }
    }
}

#[derive(Deserialize)]
pub struct WireDateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Deserialize)]
pub struct Billing {
    pub total_cost_inr: Option<f64>,
}

#[derive(Deserialize)]
pub struct ReportResponse {
    pub campaign: Option<String>,
    pub date_range: Option<WireDateRange>,
    #[serde(default)]
    pub total_calls: u64,
    #[serde(default)]
    pub connected_calls: u64,
    #[serde(rename = "ASR_percent", default)]
    pub asr_percent: f64,
    #[serde(rename = "ACD_seconds", default)]
    pub acd_seconds: f64,
    pub billing: Option<Billing>,
    #[serde(default)]
    pub dispositions: BTreeMap<String, u64>,
    pub balance: Option<f64>,
    pub source: Option<String>,
    #[serde(default)]
    pub deduction_pending: bool,
    /// Present instead of the aggregates when the backend had nothing to report
    pub error: Option<String>,
}

impl ReportResponse {
    pub fn into_report(self, campaign: &str, requested: DateRange) -> Result<CallReport, ApiError> {
        if let Some(message) = self.error {
            return Err(ApiError::server(200, message));
        }
        let range = self
            .date_range
            .map(|r| DateRange::new(r.start, r.end))
            .unwrap_or(requested);
        let source = match self.source.as_deref() {
            Some("live") => Some(ReportSource::Live),
            Some("historical") => Some(ReportSource::Historical),
            _ => None,
        };
        Ok(CallReport {
            campaign: self.campaign.unwrap_or_else(|| campaign.to_string()),
            range,
            total_calls: self.total_calls,
            connected_calls: self.connected_calls,
            asr_percent: self.asr_percent,
            acd_seconds: self.acd_seconds,
            billing_total: self.billing.and_then(|b| b.total_cost_inr).unwrap_or(0.0),
            dispositions: self.dispositions,
            balance: self.balance,
            source,
            deduction_pending: self.deduction_pending,
        })
    }
}

#[derive(Deserialize)]
pub struct ChartResponse {
    #[serde(default)]
    pub data: Vec<ChartPoint>,
    pub total_connected: Option<u64>,
    pub last_updated: Option<String>,
}

impl ChartResponse {
    pub fn into_series(self, bucket: ChartBucket) -> ChartSeries {
        ChartSeries {
            bucket,
            points: self.data,
            total_connected: self.total_connected,
            last_updated: self.last_updated,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginUser {
    pub username: String,
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

impl From<LoginResponse> for LoginGrant {
    fn from(resp: LoginResponse) -> Self {
        LoginGrant {
            token: resp.token,
            username: resp.user.username,
            full_name: resp.user.full_name,
        }
    }
}

#[derive(Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub app: Option<String>,
}

impl From<HealthResponse> for StatusInfo {
    fn from(resp: HealthResponse) -> Self {
        StatusInfo {
            indicator: parse_indicator(&resp.status),
            app: resp.app,
            description: None,
        }
    }
}

/// Pull a readable message out of an error body.
///
/// The backend sends `{"detail": "..."}`; validation failures carry a list
/// under `detail` instead, which is passed through as JSON.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match value.get("detail") {
            Some(serde_json::Value::String(detail)) => first_line(detail),
            Some(other) => other.to_string(),
            None => first_line(body),
        },
        Err(_) => first_line(body),
    }
}

// Debug builds of the backend append a traceback after a blank line.
fn first_line(text: &str) -> String {
    let trimmed = text.trim();
    let head = trimmed.split("\n\n").next().unwrap_or(trimmed).trim();
    if head.is_empty() {
        "empty response body".to_string()
    } else {
        head.to_string()
    }
}
