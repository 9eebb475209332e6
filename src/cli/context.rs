use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::api::HttpReportApi;
use crate::core::config::AppConfig;
use crate::core::controller::ReportController;
use crate::core::session::{Session, SessionStore};

/// Everything a command needs to talk to the backend.
pub struct AppContext {
    pub config: AppConfig,
    pub store: SessionStore,
    pub session: Session,
    pub api: Arc<HttpReportApi>,
}

impl AppContext {
    pub fn load(config: AppConfig) -> Result<Self> {
        config.ensure_valid().with_context(|| {
            format!(
                "Fix {} or run `calldash config check`",
                AppConfig::config_path().display()
            )
        })?;
        let store = SessionStore::new();
        let session = store
            .resolve()
            .with_context(|| format!("Failed to load session from {}", store.path().display()))?;
        let base_url = config.api.effective_base_url();
        let api = HttpReportApi::new(&base_url, config.api.timeout(), session.clone())?;
        tracing::debug!(%base_url, authenticated = session.is_authenticated(), "context ready");
        Ok(Self {
            config,
            store,
            session,
            api: Arc::new(api),
        })
    }

    pub fn campaign<'a>(&'a self, campaign: Option<&'a str>) -> &'a str {
        campaign.unwrap_or(self.config.api.campaign.as_str())
    }

    pub fn controller(&self, campaign: Option<&str>) -> ReportController {
        ReportController::new(
            self.api.clone(),
            self.campaign(campaign),
            self.config.api.poll_interval(),
        )
    }

    /// Bail early with a login hint instead of sending a doomed request.
    pub fn require_login(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            anyhow::bail!("Not logged in. Run `calldash login --username <user>` first.");
        }
        Ok(())
    }

    /// Drop the persisted token after the backend rejected it.
    pub fn forget_session_if_rejected(&self) {
        if self.session.is_authenticated() {
            return;
        }
        match self.store.remove() {
            Ok(true) => tracing::info!("removed rejected session file"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "failed to remove session file"),
        }
    }
}
