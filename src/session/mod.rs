//! Paper-trading session state machine
//!
//! The server owns the session; this module keeps a local mirror of it
//! consistent under periodic polling. The controller is the only writer of
//! the local snapshot, the poller drives the fetch cadence, and the
//! reconciliation guard keeps a stale poll response from overwriting a more
//! recent user-initiated transition.

mod controller;
mod equity;
mod poller;
mod reconcile;


pub use controller::{SessionController, SessionPhase, SessionView};
pub use equity::EquityHistory;
pub use poller::StatusPoller;
pub use reconcile::{reconcile_tick, LocalView, MergeOutcome, TickData};
