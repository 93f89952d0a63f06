//! Paper Trading Session Client
//!
//! Client-side state machine for a simulated trading session whose source of
//! truth is a remote REST backend.
//!
//! ## Architecture
//!
//! ```text
//! CLI/UI → SessionController → PaperTradingClient (REST)
//!               ↑ snapshot merges
//!        ReconciliationGuard ← StatusPoller (30s ticks)
//!               ↓
//!        EquityHistory (bounded curve buffer)
//! ```
//!
//! The controller is the single writer of the local snapshot; poll results
//! only reach it through the reconciliation guard, so a fetch that was in
//! flight when the user paused or resumed can never overwrite the newer
//! local state.

pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod types;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod types_tests;
