//! Poll-result reconciliation
//!
//! A status fetch can be in flight while the user pauses or resumes the
//! session. When that fetch resolves it carries a status from *before* the
//! user's action, and must not overwrite the status the action just
//! confirmed. The rule: the local status always wins a disagreement; the
//! fetched equity and positions are still applied. Results tagged with a
//! session id that no longer matches the current session are dropped
//! entirely (the session was stopped or replaced mid-fetch).

use crate::types::{Position, SessionStatus, StatusSnapshot};
use tracing::debug;

/// The local view the guard compares a tick against, captured at merge time
/// (not at dispatch time; the comparison must see intervening transitions).
#[derive(Debug, Clone, Copy)]
pub struct LocalView {
    pub session_id: i64,
    pub status: SessionStatus,
    /// Bumped on every confirmed local transition (start, pause, resume).
    pub version: u64,
}

/// Everything one poller tick fetched, tagged with the session id and local
/// version captured when the tick was dispatched.
#[derive(Debug)]
pub struct TickData {
    pub session_id: i64,
    pub dispatched_version: u64,
    pub snapshot: StatusSnapshot,
    pub open_positions: Vec<Position>,
    pub all_positions: Vec<Position>,
}

/// Guard verdict for one tick.
#[derive(Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Wrong session: the tick outlived a stop/disarm. Nothing is applied.
    Discard,
    /// Apply equity and positions; `status` is the value the snapshot must
    /// end up with, `record_sample` whether an equity sample may be appended.
    Merge {
        status: SessionStatus,
        record_sample: bool,
    },
}

/// Decide how a resolved tick merges into the local snapshot.
///
/// `tick.session_id` is the id captured when the tick was dispatched; the
/// snapshot additionally carries the id the server answered for. Both must
/// match the current session, otherwise the tick straddled a stop/restart
/// and none of its data may be applied.
pub fn reconcile_tick(local: &LocalView, tick: &TickData) -> MergeOutcome {
    if tick.session_id != local.session_id {
        debug!(
            "Discarding poll result dispatched for session {} (current is {})",
            tick.session_id, local.session_id
        );
        return MergeOutcome::Discard;
    }
    if tick.snapshot.paper_trade.id != local.session_id {
        debug!(
            "Discarding poll result answering for session {} (current is {})",
            tick.snapshot.paper_trade.id, local.session_id
        );
        return MergeOutcome::Discard;
    }

    let fetched = tick.snapshot.paper_trade.status;
    if fetched != local.status {
        // A user action landed while this fetch was in flight; the local
        // status is the more recent fact.
        debug!(
            "Stale status {} from poll (local {} at v{}, tick dispatched at v{})",
            fetched, local.status, local.version, tick.dispatched_version
        );
    }

    MergeOutcome::Merge {
        status: local.status,
        record_sample: local.status != SessionStatus::Paused,
    }
}
