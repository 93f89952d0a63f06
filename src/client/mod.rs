//! Remote API clients

mod paper;

pub use paper::{PaperTradingApi, PaperTradingClient, StartSessionRequest};

#[cfg(test)]
pub use paper::MockPaperTradingApi;
