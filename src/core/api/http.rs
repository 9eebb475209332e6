use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::api::wire::{
    error_message, ChartResponse, HealthResponse, LoginResponse, ReportResponse,
    ServerDateResponse,
};
use crate::core::api::{validate_endpoint, ApiError, ReportApi};
use crate::core::models::balance::BalanceInfo;
use crate::core::models::chart::{ChartBucket, ChartSeries};
use crate::core::models::payment::{PaymentPage, PaymentStats};
use crate::core::models::report::{CallReport, ServerDate};
use crate::core::models::status::StatusInfo;
use crate::core::models::user::UserProfile;
use crate::core::session::{LoginGrant, Session};
use crate::core::timeframe::DateRange;

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// reqwest-backed client for the reporting backend.
pub struct HttpReportApi {
    client: reqwest::Client,
    base_url: String,
    session: Session,
}

impl HttpReportApi {
    pub fn new(base_url: &str, timeout: Duration, session: Session) -> anyhow::Result<Self> {
        validate_endpoint(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("calldash/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token, or fail without touching the network.
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        match self.session.token() {
            Some(token) if !token.is_empty() => Ok(request
                .header("Authorization", format!("Bearer {}", token))
                .header("Accept", "application/json")),
            _ => Err(ApiError::server(401, "not logged in")),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let request = self.authorized(self.client.get(self.url(path)).query(query))?;
        tracing::debug!(path, "GET");
        let response = request.send().await?;
        self.read_json(path, response).await
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        path: &str,
        response: Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(path, "backend rejected token");
            self.session.clear();
            return Err(ApiError::server(401, error_message(&body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(path, status = status.as_u16(), "request failed");
            return Err(ApiError::server(status.as_u16(), error_message(&body)));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Transport(format!("unexpected response from {}: {}", path, e)))
    }
}

#[async_trait]
impl ReportApi for HttpReportApi {
    async fn server_date(&self) -> Result<ServerDate, ApiError> {
        let resp: ServerDateResponse = self.get_json("/server-date", &[]).await?;
        Ok(resp.into())
    }

    async fn report(&self, campaign: &str, range: DateRange) -> Result<CallReport, ApiError> {
        let query = [
            ("campaign", campaign.to_string()),
            ("start_date", range.start.format("%Y-%m-%d").to_string()),
            ("end_date", range.end.format("%Y-%m-%d").to_string()),
        ];
        let resp: ReportResponse = self.get_json("/report", &query).await?;
        resp.into_report(campaign, range)
    }

    async fn balance(&self) -> Result<BalanceInfo, ApiError> {
        self.get_json("/balance", &[]).await
    }

    async fn chart(&self, bucket: ChartBucket, campaign: &str) -> Result<ChartSeries, ApiError> {
        let query = [
            ("timeframe", bucket.id().to_string()),
            ("campaign", campaign.to_string()),
        ];
        let resp: ChartResponse = self.get_json(bucket.endpoint(), &query).await?;
        Ok(resp.into_series(bucket))
    }

    async fn payment_history(&self, limit: u32, offset: u32) -> Result<PaymentPage, ApiError> {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        self.get_json("/payment-history", &query).await
    }

    async fn payment_stats(&self) -> Result<PaymentStats, ApiError> {
        self.get_json("/payment-history/stats", &[]).await
    }

    async fn me(&self) -> Result<UserProfile, ApiError> {
        self.get_json("/auth/me", &[]).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginGrant, ApiError> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .header("Accept", "application/json")
            .json(&LoginRequest { username, password })
            .send()
            .await?;
        // A 401 here means bad credentials; there is no session to clear yet.
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::server(status.as_u16(), error_message(&body)));
        }
        let resp: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Transport(format!("unexpected login response: {}", e)))?;
        let grant = LoginGrant::from(resp);
        self.session.establish(&grant);
        Ok(grant)
    }

    async fn health(&self) -> Result<StatusInfo, ApiError> {
        let response = self
            .client
            .get(self.url("/"))
            .header("Accept", "application/json")
            .send()
            .await?;
        self.read_json::<HealthResponse>("/", response)
            .await
            .map(StatusInfo::from)
    }
}
