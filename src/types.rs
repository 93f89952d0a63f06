//! Core domain types for the paper-trading session client

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Server-side trading state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Paused,
    Stopped,
}

impl SessionStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, SessionStatus::Active | SessionStatus::Paused)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "ACTIVE"),
            SessionStatus::Paused => write!(f, "PAUSED"),
            SessionStatus::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// A simulated trading session. The server is the source of truth; this is
/// the locally mirrored view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperTradeSession {
    pub id: i64,
    /// Instrument under simulation; immutable for the session's lifetime.
    pub ticker: String,
    pub status: SessionStatus,
    pub initial_capital: Decimal,
    /// Advisory; superseded by `StatusSnapshot::current_equity` when present.
    pub current_capital: Decimal,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
}

/// Latest mark-to-market view of a session, returned by the status endpoint.
/// Ephemeral: only the most recent fetch is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub current_equity: Decimal,
    /// Percent, server-derived.
    pub total_return: Decimal,
    pub open_positions_count: u32,
    /// The session this snapshot belongs to. Snapshots for a different
    /// session id must never be merged.
    pub paper_trade: PaperTradeSession,
}

/// A simulated position. Created and closed server-side; the client only
/// reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: i64,
    pub ticker: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub entry_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl: Option<Decimal>,
}

impl Position {
    /// A position is open iff it has no exit date.
    pub fn is_open(&self) -> bool {
        self.exit_date.is_none()
    }
}

/// One point of the equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquitySample {
    pub timestamp: DateTime<Utc>,
    pub equity: Decimal,
}

/// A past or live session as reported by the history listing. Immutable once
/// fetched, except `positions` which is lazily populated exactly once via the
/// detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub ticker: String,
    pub status: SessionStatus,
    pub initial_capital: Decimal,
    pub current_capital: Decimal,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<Position>>,
}

impl HistoryEntry {
    /// Return over initial capital, in percent.
    pub fn return_percent(&self) -> Decimal {
        if self.initial_capital.is_zero() {
            return Decimal::ZERO;
        }
        (self.current_capital - self.initial_capital) / self.initial_capital
            * Decimal::ONE_HUNDRED
    }
}
