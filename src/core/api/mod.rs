pub mod http;
pub mod wire;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::models::balance::BalanceInfo;
use crate::core::models::chart::{ChartBucket, ChartSeries};
use crate::core::models::payment::{PaymentPage, PaymentStats};
use crate::core::models::report::{CallReport, ServerDate};
use crate::core::models::status::StatusInfo;
use crate::core::models::user::UserProfile;
use crate::core::session::LoginGrant;
use crate::core::timeframe::DateRange;

pub use http::HttpReportApi;

/// Failure talking to the reporting backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced a usable response.
    #[error("network error: {0}")]
    Transport(String),
    /// The backend answered, but with an error.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },
}

impl ApiError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Server { status: 401, .. })
    }

    /// Text shown in place of the data when a fetch fails.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("Could not reach the reporting server: {}", msg),
            Self::Server { status: 401, .. } => {
                "Session expired or not logged in. Run `calldash login`.".to_string()
            }
            // Backend reported a problem inside a successful response.
            Self::Server { status, message } if (200..300).contains(status) => message.clone(),
            Self::Server { status, message } => format!("Server error ({}): {}", status, message),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url().to_string())
    }
}

/// Remote reporting API consumed by the controller and the CLI.
#[async_trait]
pub trait ReportApi: Send + Sync {
    async fn server_date(&self) -> Result<ServerDate, ApiError>;

    async fn report(&self, campaign: &str, range: DateRange) -> Result<CallReport, ApiError>;

    async fn balance(&self) -> Result<BalanceInfo, ApiError>;

    async fn chart(&self, bucket: ChartBucket, campaign: &str) -> Result<ChartSeries, ApiError>;

    async fn payment_history(&self, limit: u32, offset: u32) -> Result<PaymentPage, ApiError>;

    async fn payment_stats(&self) -> Result<PaymentStats, ApiError>;

    /// Account that owns the current token.
    async fn me(&self) -> Result<UserProfile, ApiError>;

    async fn login(&self, username: &str, password: &str) -> Result<LoginGrant, ApiError>;

    async fn health(&self) -> Result<StatusInfo, ApiError>;
}

/// Validate that a backend base URL is plain HTTP(S).
///
/// The bearer token is attached to every request, so other schemes are
/// refused outright.
pub fn validate_endpoint(url: &str) -> anyhow::Result<()> {
    let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    else {
        anyhow::bail!("API base URL must use http:// or https://, got: {}", url);
    };
    if rest.trim_matches('/').is_empty() {
        anyhow::bail!("API base URL has no host: {}", url);
    }
    Ok(())
}
