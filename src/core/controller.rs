//! Timeframe-driven report fetching with silent live refresh.
//!
//! The controller owns the timeframe selection and the last good
//! [`ReportSnapshot`]. Fetches run as spawned tasks; each one is tagged with
//! a sequence id and only the most recently issued request may update the
//! snapshot, so a slow response can never overwrite a newer one.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::core::api::{ApiError, ReportApi};
use crate::core::models::report::ReportSnapshot;
use crate::core::timeframe::{derive_range, DateRange, Timeframe};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
/// Shortest accepted live refresh period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControllerError {
    #[error("a custom range can only be set while the timeframe is custom (current: {0})")]
    NotCustom(Timeframe),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshState {
    /// A user-visible fetch is in flight
    pub loading: bool,
    /// Message from the most recent failed fetch, cleared on success
    pub error: Option<String>,
    /// Number of explicit refreshes requested
    pub refresh_count: u64,
}

/// Read-only copy of the controller state for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerView {
    pub timeframe: Timeframe,
    pub campaign: String,
    pub custom_start: Option<NaiveDate>,
    pub custom_end: Option<NaiveDate>,
    pub snapshot: Option<ReportSnapshot>,
    pub refresh: RefreshState,
    pub live_timer_armed: bool,
}

impl ControllerView {
    pub fn range(&self) -> Option<DateRange> {
        self.snapshot.as_ref().map(|s| s.report.range)
    }

    /// Showing data that a later fetch failed to replace.
    pub fn is_stale(&self) -> bool {
        self.snapshot.is_some() && self.refresh.error.is_some()
    }
}

struct State {
    timeframe: Timeframe,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
    snapshot: Option<ReportSnapshot>,
    refresh: RefreshState,
    latest_request: u64,
}

struct Inner {
    api: Arc<dyn ReportApi>,
    campaign: String,
    poll_interval: Duration,
    state: Mutex<State>,
    timer: Mutex<Option<JoinHandle<()>>>,
    changes: watch::Sender<u64>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.abort();
        }
    }
}

/// Cheap-clone handle; all clones drive the same state.
///
/// Operations that fetch spawn onto the current tokio runtime and must be
/// called from within it.
#[derive(Clone)]
pub struct ReportController {
    inner: Arc<Inner>,
}

impl ReportController {
    /// Build a controller in the `live` timeframe with its refresh timer armed.
    ///
    /// Must be called within a tokio runtime. Periods below
    /// [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn new(api: Arc<dyn ReportApi>, campaign: impl Into<String>, poll_interval: Duration) -> Self {
        let poll_interval = if poll_interval < MIN_POLL_INTERVAL {
            tracing::warn!(requested = ?poll_interval, "poll interval too short, using minimum");
            MIN_POLL_INTERVAL
        } else {
            poll_interval
        };
        let (changes, _) = watch::channel(0);
        let controller = Self {
            inner: Arc::new(Inner {
                api,
                campaign: campaign.into(),
                poll_interval,
                state: Mutex::new(State {
                    timeframe: Timeframe::Live,
                    custom_start: None,
                    custom_end: None,
                    snapshot: None,
                    refresh: RefreshState::default(),
                    latest_request: 0,
                }),
                timer: Mutex::new(None),
                changes,
            }),
        };
        controller.reschedule_timer(Timeframe::Live);
        controller
    }

    pub fn campaign(&self) -> &str {
        &self.inner.campaign
    }

    pub fn timeframe(&self) -> Timeframe {
        self.inner.state.lock().timeframe
    }

    pub fn view(&self) -> ControllerView {
        let state = self.inner.state.lock();
        ControllerView {
            timeframe: state.timeframe,
            campaign: self.inner.campaign.clone(),
            custom_start: state.custom_start,
            custom_end: state.custom_end,
            snapshot: state.snapshot.clone(),
            refresh: state.refresh.clone(),
            live_timer_armed: self.live_timer_armed(),
        }
    }

    /// Receiver that is bumped on every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }

    pub fn live_timer_armed(&self) -> bool {
        self.inner
            .timer
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Select a timeframe.
    ///
    /// Non-custom selections start a silent fetch right away and the handle
    /// of that fetch is returned. Custom selections wait for
    /// [`apply_filters`](Self::apply_filters) so a half-entered range is
    /// never requested.
    pub fn set_timeframe(&self, timeframe: Timeframe) -> Option<JoinHandle<()>> {
        let previous = {
            let mut state = self.inner.state.lock();
            std::mem::replace(&mut state.timeframe, timeframe)
        };
        tracing::debug!(from = %previous, to = %timeframe, "timeframe changed");
        self.reschedule_timer(timeframe);
        self.notify();

        if timeframe == Timeframe::Custom {
            return None;
        }
        Some(self.spawn_fetch(true))
    }

    /// Store custom bounds; either may be empty. Never fetches.
    pub fn set_custom_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(), ControllerError> {
        {
            let mut state = self.inner.state.lock();
            if state.timeframe != Timeframe::Custom {
                return Err(ControllerError::NotCustom(state.timeframe));
            }
            state.custom_start = start;
            state.custom_end = end;
        }
        self.notify();
        Ok(())
    }

    /// Explicit fetch for the current selection, shown with a loading state.
    pub fn apply_filters(&self) -> JoinHandle<()> {
        {
            let mut state = self.inner.state.lock();
            state.refresh.refresh_count += 1;
        }
        self.spawn_fetch(false)
    }

    /// Manual refresh. Runs alongside the live timer, which keeps its schedule.
    pub fn refresh(&self) -> JoinHandle<()> {
        tracing::debug!("manual refresh");
        self.apply_filters()
    }

    /// Cancel the live timer. In-flight fetches are left to finish.
    pub fn shutdown(&self) {
        if let Some(timer) = self.inner.timer.lock().take() {
            timer.abort();
        }
        self.notify();
    }

    /// Fetch and apply a snapshot for the current selection.
    ///
    /// Errors are recorded in [`RefreshState`] and never returned. A silent
    /// fetch leaves `loading` untouched.
    pub async fn fetch_report(&self, silent: bool) {
        let (request_id, timeframe, custom_start, custom_end) = {
            let mut state = self.inner.state.lock();
            state.latest_request += 1;
            if !silent {
                state.refresh.loading = true;
            }
            (
                state.latest_request,
                state.timeframe,
                state.custom_start,
                state.custom_end,
            )
        };
        if !silent {
            self.notify();
        }

        let outcome = self.load_snapshot(timeframe, custom_start, custom_end).await;
        self.apply_outcome(request_id, outcome);
    }

    async fn load_snapshot(
        &self,
        timeframe: Timeframe,
        custom_start: Option<NaiveDate>,
        custom_end: Option<NaiveDate>,
    ) -> Result<ReportSnapshot, ApiError> {
        let api = &self.inner.api;
        let campaign = self.inner.campaign.as_str();

        let server = api.server_date().await?;
        let range = derive_range(timeframe, server.date, custom_start, custom_end);
        if !range.is_ordered() {
            tracing::warn!(%range, "custom range starts after it ends");
        }
        tracing::debug!(%timeframe, %range, campaign, "fetching report");

        let (report, balance) = tokio::try_join!(api.report(campaign, range), api.balance())?;

        let chart = match api.chart(timeframe.chart_bucket(), campaign).await {
            Ok(series) => Some(series),
            Err(e) => {
                tracing::warn!(error = %e, "chart fetch failed");
                None
            }
        };

        Ok(ReportSnapshot {
            timeframe,
            report,
            balance: Some(balance),
            chart,
            server_date: server.date,
            fetched_at: Utc::now(),
        })
    }

    fn apply_outcome(&self, request_id: u64, outcome: Result<ReportSnapshot, ApiError>) {
        {
            let mut state = self.inner.state.lock();
            if request_id != state.latest_request {
                tracing::debug!(
                    request_id,
                    latest = state.latest_request,
                    "dropping superseded report response"
                );
                return;
            }
            state.refresh.loading = false;
            match outcome {
                Ok(snapshot) => {
                    state.snapshot = Some(snapshot);
                    state.refresh.error = None;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "report fetch failed");
                    state.refresh.error = Some(e.user_message());
                }
            }
        }
        self.notify();
    }

    fn spawn_fetch(&self, silent: bool) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move { controller.fetch_report(silent).await })
    }

    fn reschedule_timer(&self, timeframe: Timeframe) {
        let mut timer = self.inner.timer.lock();
        if timeframe.is_live() {
            if timer.as_ref().is_some_and(|h| !h.is_finished()) {
                return;
            }
            tracing::debug!(interval = ?self.inner.poll_interval, "arming live refresh");
            *timer = Some(spawn_live_timer(
                Arc::downgrade(&self.inner),
                self.inner.poll_interval,
            ));
        } else if let Some(handle) = timer.take() {
            tracing::debug!("cancelling live refresh");
            handle.abort();
        }
    }

    fn notify(&self) {
        self.inner.changes.send_modify(|generation| *generation += 1);
    }
}

// Holds only a weak reference so a dropped controller stops the timer.
fn spawn_live_timer(weak: Weak<Inner>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else { break };
            tracing::debug!("live refresh tick");
            let controller = ReportController { inner };
            tokio::spawn(async move { controller.fetch_report(true).await });
        }
    })
}
