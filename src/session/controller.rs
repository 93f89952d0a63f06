//! Session controller
//!
//! Single source of truth for the current paper-trading session. Owns the
//! local state machine, issues every state-changing request, and is the only
//! writer of the local snapshot. Poll results reach the snapshot exclusively
//! through the reconciliation guard.

use crate::client::{PaperTradingApi, StartSessionRequest};
use crate::config::PaperTradingConfig;
use crate::error::{ClientError, Result};
use crate::session::equity::EquityHistory;
use crate::session::poller::StatusPoller;
use crate::session::reconcile::{reconcile_tick, LocalView, MergeOutcome, TickData};
use crate::types::{EquitySample, HistoryEntry, PaperTradeSession, Position, SessionStatus};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Local lifecycle of the controller, a superset of the server's status
/// (the transient `Starting`/`Stopping` phases exist only client-side).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Starting,
    Active,
    Paused,
    Stopping,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Starting => "starting",
            SessionPhase::Active => "active",
            SessionPhase::Paused => "paused",
            SessionPhase::Stopping => "stopping",
        };
        write!(f, "{}", s)
    }
}

fn phase_for(status: SessionStatus) -> SessionPhase {
    match status {
        SessionStatus::Active => SessionPhase::Active,
        SessionStatus::Paused => SessionPhase::Paused,
        SessionStatus::Stopped => SessionPhase::Idle,
    }
}

struct SessionState {
    phase: SessionPhase,
    session: Option<PaperTradeSession>,
    current_equity: Option<Decimal>,
    total_return: Option<Decimal>,
    open_positions: Vec<Position>,
    all_positions: Vec<Position>,
    equity: EquityHistory,
    history: Vec<HistoryEntry>,
    last_error: Option<String>,
    /// Bumped on every confirmed local transition; lets the guard tell a
    /// stale poll result from a current one.
    version: u64,
}

/// Read-only view of the controller's snapshot for rendering.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub session: Option<PaperTradeSession>,
    pub current_equity: Option<Decimal>,
    pub total_return: Option<Decimal>,
    pub open_positions: Vec<Position>,
    pub last_error: Option<String>,
}

impl SessionView {
    /// Server-reported return when available, otherwise derived from the
    /// latest equity against initial capital.
    pub fn return_percent(&self) -> Option<Decimal> {
        if let Some(r) = self.total_return {
            return Some(r);
        }
        let session = self.session.as_ref()?;
        let equity = self.current_equity?;
        if session.initial_capital.is_zero() {
            return None;
        }
        Some(
            (equity - session.initial_capital) / session.initial_capital * Decimal::ONE_HUNDRED,
        )
    }
}

struct Inner {
    api: Arc<dyn PaperTradingApi>,
    config: PaperTradingConfig,
    poller: StatusPoller,
    state: RwLock<SessionState>,
    /// Rejects a pause/resume while one is already in flight.
    toggle_in_flight: AtomicBool,
    /// Session id of the tick currently in flight, or `NO_TICK`. Keyed by
    /// session so a stale tick from a stopped session cannot block the
    /// replacement session's first fetch.
    tick_in_flight: AtomicI64,
}

/// Sentinel for `tick_in_flight`; server ids start at 1.
const NO_TICK: i64 = 0;

#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(api: Arc<dyn PaperTradingApi>, config: PaperTradingConfig) -> Self {
        let poller = StatusPoller::new(config.poll_interval());
        let state = SessionState {
            phase: SessionPhase::Idle,
            session: None,
            current_equity: None,
            total_return: None,
            open_positions: Vec::new(),
            all_positions: Vec::new(),
            equity: EquityHistory::new(config.equity_history_len),
            history: Vec::new(),
            last_error: None,
            version: 0,
        };
        Self {
            inner: Arc::new(Inner {
                api,
                config,
                poller,
                state: RwLock::new(state),
                toggle_in_flight: AtomicBool::new(false),
                tick_in_flight: AtomicI64::new(NO_TICK),
            }),
        }
    }

    /// Start a new simulated session. Fails locally (no request issued) when
    /// the inputs are invalid or a session already exists.
    pub async fn start(
        &self,
        ticker: &str,
        strategy_id: i64,
        initial_capital: Decimal,
    ) -> Result<()> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return self.fail_validation("ticker is required").await;
        }
        if strategy_id <= 0 {
            return self.fail_validation("a strategy must be selected").await;
        }
        if initial_capital <= Decimal::ZERO {
            return self.fail_validation("initial capital must be positive").await;
        }

        {
            let mut state = self.inner.state.write().await;
            // phase, not session: the session field is only set once the
            // server has answered, but a start is underway from `Starting` on
            if state.phase != SessionPhase::Idle {
                let e = ClientError::Validation("a session is already running".into());
                state.last_error = Some(e.to_string());
                return Err(e);
            }
            state.phase = SessionPhase::Starting;
        }

        let req = StartSessionRequest {
            strategy_id,
            ticker: ticker.clone(),
            initial_capital,
        };
        match self.inner.api.start_session(&req).await {
            Ok(session) => {
                info!(
                    "Started paper session {} on {} with {}",
                    session.id, session.ticker, session.initial_capital
                );
                {
                    let mut state = self.inner.state.write().await;
                    state.phase = phase_for(session.status);
                    state.session = Some(session);
                    state.version += 1;
                    state.last_error = None;
                }
                // populate positions/equity right away, then poll on interval
                self.refresh_once().await;
                self.arm_poller();
                Ok(())
            }
            Err(e) => {
                let mut state = self.inner.state.write().await;
                state.phase = SessionPhase::Idle;
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Pause an active session or resume a paused one, based on the current
    /// *local* status. A call while another toggle is in flight is a no-op.
    pub async fn pause_or_resume(&self) -> Result<()> {
        if self
            .inner
            .toggle_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Pause/resume already in flight, ignoring");
            return Ok(());
        }

        let result = self.toggle_inner().await;
        self.inner.toggle_in_flight.store(false, Ordering::Release);
        result
    }

    async fn toggle_inner(&self) -> Result<()> {
        let session_id = {
            let state = self.inner.state.read().await;
            state.session.as_ref().map(|s| s.id)
        };
        let Some(session_id) = session_id else {
            return self.fail_validation("no session to pause or resume").await;
        };

        match self.inner.api.toggle_pause(session_id).await {
            Ok(updated) => {
                // The server-confirmed status wins over anything an in-flight
                // poll may later report; bumping the version marks the
                // transition for the reconciliation guard.
                let status = updated.status;
                {
                    let mut state = self.inner.state.write().await;
                    if let Some(session) = state.session.as_mut() {
                        session.status = status;
                    }
                    state.phase = phase_for(status);
                    state.version += 1;
                    state.last_error = None;
                }
                match status {
                    SessionStatus::Paused => {
                        info!("Session {} paused", session_id);
                        self.inner.poller.disarm();
                    }
                    SessionStatus::Active => {
                        info!("Session {} resumed", session_id);
                        self.arm_poller();
                    }
                    SessionStatus::Stopped => {
                        warn!("Session {} reported STOPPED on pause toggle", session_id);
                        self.inner.poller.disarm();
                    }
                }
                Ok(())
            }
            Err(e) => {
                self.set_error(&e).await;
                Err(e)
            }
        }
    }

    /// Stop the current session and discard it locally. A 404 means the
    /// session already ended server-side and counts as success.
    pub async fn stop(&self) -> Result<()> {
        let session_id = {
            let mut state = self.inner.state.write().await;
            let session_id = state.session.as_ref().map(|s| s.id);
            match session_id {
                Some(id) => {
                    state.phase = SessionPhase::Stopping;
                    id
                }
                None => {
                    let e = ClientError::Validation("no session to stop".into());
                    state.last_error = Some(e.to_string());
                    return Err(e);
                }
            }
        };

        match self.inner.api.stop_session(session_id).await {
            Ok(()) | Err(ClientError::NotFound) => {
                info!("Session {} stopped", session_id);
                self.inner.poller.disarm();
                {
                    let mut state = self.inner.state.write().await;
                    state.session = None;
                    state.phase = SessionPhase::Idle;
                    state.current_equity = None;
                    state.total_return = None;
                    state.open_positions.clear();
                    state.all_positions.clear();
                    state.equity.clear();
                    state.version += 1;
                    state.last_error = None;
                }
                if let Err(e) = self.refresh_history(None).await {
                    warn!("Failed to refresh history after stop: {}", e);
                }
                Ok(())
            }
            Err(e) => {
                let mut state = self.inner.state.write().await;
                let status = state.session.as_ref().map(|s| s.status);
                state.phase = status.map(phase_for).unwrap_or(SessionPhase::Idle);
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Adopt a live session left over from a previous run, if the server has
    /// one. Called once at startup.
    pub async fn load_active_if_any(&self) -> Result<()> {
        let sessions = match self.inner.api.fetch_active_sessions().await {
            Ok(sessions) => sessions,
            Err(ClientError::NotFound) => return Ok(()),
            Err(e) => {
                self.set_error(&e).await;
                return Err(e);
            }
        };

        let Some(session) = sessions.into_iter().find(|s| s.status.is_live()) else {
            return Ok(());
        };

        info!(
            "Adopting live session {} on {} ({})",
            session.id, session.ticker, session.status
        );
        let status = session.status;
        {
            let mut state = self.inner.state.write().await;
            state.phase = phase_for(status);
            state.session = Some(session);
            state.version += 1;
        }
        self.refresh_once().await;
        if status == SessionStatus::Active {
            self.arm_poller();
        }
        Ok(())
    }

    /// Poller tick entry point. Skipped when the local status is not ACTIVE
    /// at fire time (a pause between ticks must not be polled over).
    async fn poll_tick(&self) {
        let active = {
            let state = self.inner.state.read().await;
            state.phase == SessionPhase::Active
        };
        if !active {
            debug!("Skipping tick: session not locally active");
            return;
        }
        self.refresh_once().await;
    }

    /// Force one fetch sequence outside the poll cadence (e.g. a manual
    /// refresh from the UI). Skipped when a tick is already in flight.
    pub async fn refresh_now(&self) {
        self.refresh_once().await;
    }

    /// One fetch sequence: status, open positions and full position list,
    /// issued concurrently and applied only after all three settle. Errors
    /// land in the error slot; a 404 is swallowed (the session ended between
    /// ticks). Never panics out of the timer task.
    async fn refresh_once(&self) {
        // capture the target at dispatch; a late result for another session
        // is discarded by the guard
        let dispatched = {
            let state = self.inner.state.read().await;
            state
                .session
                .as_ref()
                .map(|s| (s.id, s.ticker.clone(), state.version))
        };
        let Some((session_id, ticker, dispatched_version)) = dispatched else {
            return;
        };

        match self.inner.tick_in_flight.compare_exchange(
            NO_TICK,
            session_id,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {}
            Err(current) if current == session_id => {
                debug!("Previous tick still in flight, skipping");
                return;
            }
            Err(_) => {
                // a tick for an earlier session is still in flight; its
                // result will be discarded, so it must not block this one
                self.inner
                    .tick_in_flight
                    .store(session_id, Ordering::Release);
            }
        }

        self.refresh_inner(session_id, &ticker, dispatched_version)
            .await;
        let _ = self.inner.tick_in_flight.compare_exchange(
            session_id,
            NO_TICK,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    async fn refresh_inner(&self, session_id: i64, ticker: &str, dispatched_version: u64) {
        let (status_res, open_res, all_res) = tokio::join!(
            self.inner.api.fetch_status(ticker),
            self.inner.api.fetch_open_positions(ticker),
            self.inner.api.fetch_session_positions(session_id),
        );

        let tick = match (status_res, open_res, all_res) {
            // tagged with the id captured at dispatch, never the response's;
            // the response id is checked separately by the guard
            (Ok(snapshot), Ok(open_positions), Ok(all_positions)) => TickData {
                session_id,
                dispatched_version,
                snapshot,
                open_positions,
                all_positions,
            },
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                if e.is_benign_not_found() {
                    debug!("Status poll 404 for {} (session ended)", ticker);
                } else {
                    warn!("Status poll failed for {}: {}", ticker, e);
                    self.set_error(&e).await;
                }
                return;
            }
        };

        let mut state = self.inner.state.write().await;
        let Some(session) = state.session.as_ref() else {
            return;
        };
        let local = LocalView {
            session_id: session.id,
            status: session.status,
            version: state.version,
        };

        match reconcile_tick(&local, &tick) {
            MergeOutcome::Discard => {}
            MergeOutcome::Merge {
                status,
                record_sample,
            } => {
                let equity = tick.snapshot.current_equity;
                if let Some(session) = state.session.as_mut() {
                    session.status = status;
                    session.current_capital = tick.snapshot.paper_trade.current_capital;
                }
                state.phase = phase_for(status);
                state.current_equity = Some(equity);
                state.total_return = Some(tick.snapshot.total_return);
                state.open_positions = tick.open_positions;
                state.all_positions = tick.all_positions;
                if record_sample {
                    state.equity.append(Utc::now(), equity);
                }
                state.last_error = None;
                debug!(
                    "Merged poll for session {}: equity {} ({} open)",
                    tick.session_id, equity, tick.snapshot.open_positions_count
                );
            }
        }
    }

    /// Refresh the session history listing. `limit` falls back to the
    /// configured default when not given.
    pub async fn refresh_history(&self, limit: Option<u32>) -> Result<Vec<HistoryEntry>> {
        let limit = limit.unwrap_or(self.inner.config.history_limit);
        let history = self.inner.api.fetch_history(limit).await?;
        let mut state = self.inner.state.write().await;
        state.history = history.clone();
        Ok(history)
    }

    /// Positions of a past session, fetched lazily and cached on the history
    /// entry the first time it is expanded.
    pub async fn session_detail(&self, session_id: i64) -> Result<HistoryEntry> {
        {
            let state = self.inner.state.read().await;
            if let Some(entry) = state
                .history
                .iter()
                .find(|e| e.id == session_id && e.positions.is_some())
            {
                return Ok(entry.clone());
            }
        }

        let detail = self.inner.api.fetch_session_detail(session_id).await?;
        let mut state = self.inner.state.write().await;
        if let Some(entry) = state.history.iter_mut().find(|e| e.id == session_id) {
            entry.positions = detail.positions.clone();
        }
        Ok(detail)
    }

    /// Disarm the poller. Call on teardown; idempotent.
    pub fn teardown(&self) {
        self.inner.poller.disarm();
    }

    pub fn poller_armed(&self) -> bool {
        self.inner.poller.is_armed()
    }

    fn arm_poller(&self) {
        let controller = self.clone();
        self.inner.poller.arm(move || {
            let controller = controller.clone();
            async move { controller.poll_tick().await }
        });
    }

    async fn fail_validation(&self, message: &str) -> Result<()> {
        let e = ClientError::Validation(message.to_string());
        self.inner.state.write().await.last_error = Some(e.to_string());
        Err(e)
    }

    async fn set_error(&self, e: &ClientError) {
        self.inner.state.write().await.last_error = Some(e.to_string());
    }

    // ---- read accessors for the UI ----

    pub async fn view(&self) -> SessionView {
        let state = self.inner.state.read().await;
        SessionView {
            phase: state.phase,
            session: state.session.clone(),
            current_equity: state.current_equity,
            total_return: state.total_return,
            open_positions: state.open_positions.clone(),
            last_error: state.last_error.clone(),
        }
    }

    pub async fn equity_series(&self) -> Vec<EquitySample> {
        let state = self.inner.state.read().await;
        state.equity.to_series().copied().collect()
    }

    /// All positions of the current session, open and closed.
    pub async fn positions(&self) -> Vec<Position> {
        self.inner.state.read().await.all_positions.clone()
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.inner.state.read().await.history.clone()
    }

    pub async fn current_error(&self) -> Option<String> {
        self.inner.state.read().await.last_error.clone()
    }

    pub async fn dismiss_error(&self) {
        self.inner.state.write().await.last_error = None;
    }
}
