//! Paper trading REST client
//!
//! Thin wrapper over the backend's paper-trading endpoints. The backend is
//! the source of truth for sessions and positions; this client only moves
//! JSON and maps HTTP failures onto the crate's error taxonomy.

use crate::config::ApiConfig;
use crate::error::{ClientError, Result};
use crate::types::{HistoryEntry, PaperTradeSession, Position, StatusSnapshot};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Payload for session creation.
#[derive(Debug, Clone, Serialize)]
pub struct StartSessionRequest {
    pub strategy_id: i64,
    pub ticker: String,
    pub initial_capital: Decimal,
}

/// Error body shape the backend uses for 4xx/5xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(alias = "message")]
    detail: Option<String>,
}

/// The paper-trading API surface the session layer depends on.
///
/// Behind a trait so the controller can be exercised against a mock without
/// a running backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaperTradingApi: Send + Sync {
    /// Create a new session. Returns the session with `status = ACTIVE`.
    async fn start_session(&self, req: &StartSessionRequest) -> Result<PaperTradeSession>;

    /// Toggle pause/resume. Returns the session with the flipped status.
    async fn toggle_pause(&self, session_id: i64) -> Result<PaperTradeSession>;

    /// Stop the session. The server keeps it as history.
    async fn stop_session(&self, session_id: i64) -> Result<()>;

    /// Current equity/return/position-count for the live session on `ticker`.
    async fn fetch_status(&self, ticker: &str) -> Result<StatusSnapshot>;

    /// Open positions for the live session on `ticker`.
    async fn fetch_open_positions(&self, ticker: &str) -> Result<Vec<Position>>;

    /// All positions (open and closed) of a session.
    async fn fetch_session_positions(&self, session_id: i64) -> Result<Vec<Position>>;

    /// Past and live sessions, most recent first.
    async fn fetch_history(&self, limit: u32) -> Result<Vec<HistoryEntry>>;

    /// Single session with its positions populated.
    async fn fetch_session_detail(&self, session_id: i64) -> Result<HistoryEntry>;

    /// Sessions currently in ACTIVE or PAUSED state.
    async fn fetch_active_sessions(&self) -> Result<Vec<PaperTradeSession>>;
}

/// reqwest-backed implementation of [`PaperTradingApi`].
#[derive(Clone)]
pub struct PaperTradingClient {
    http: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl PaperTradingClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/paper-trading/{}", self.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Map non-2xx responses onto the error taxonomy, extracting the server's
    /// message body when there is one.
    async fn check(resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }

        let message = resp
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|b| b.detail)
            .unwrap_or_else(|| format!("HTTP {}", status));
        Err(ClientError::Api(message))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!("GET {}", url);
        let resp = self.authed(self.http.get(&url)).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }
}

#[async_trait]
impl PaperTradingApi for PaperTradingClient {
    async fn start_session(&self, req: &StartSessionRequest) -> Result<PaperTradeSession> {
        let url = self.url("start");
        debug!("POST {} ticker={}", url, req.ticker);
        let resp = self.authed(self.http.post(&url)).json(req).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn toggle_pause(&self, session_id: i64) -> Result<PaperTradeSession> {
        let url = self.url(&format!("{}/pause", session_id));
        debug!("POST {}", url);
        let resp = self.authed(self.http.post(&url)).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn stop_session(&self, session_id: i64) -> Result<()> {
        let url = self.url(&format!("{}/stop", session_id));
        debug!("POST {}", url);
        let resp = self.authed(self.http.post(&url)).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn fetch_status(&self, ticker: &str) -> Result<StatusSnapshot> {
        self.get_json(&format!("status/{}", ticker)).await
    }

    async fn fetch_open_positions(&self, ticker: &str) -> Result<Vec<Position>> {
        self.get_json(&format!("positions/{}", ticker)).await
    }

    async fn fetch_session_positions(&self, session_id: i64) -> Result<Vec<Position>> {
        self.get_json(&format!("{}/positions", session_id)).await
    }

    async fn fetch_history(&self, limit: u32) -> Result<Vec<HistoryEntry>> {
        self.get_json(&format!("history?limit={}", limit)).await
    }

    async fn fetch_session_detail(&self, session_id: i64) -> Result<HistoryEntry> {
        self.get_json(&session_id.to_string()).await
    }

    async fn fetch_active_sessions(&self) -> Result<Vec<PaperTradeSession>> {
        self.get_json("active").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use rust_decimal_macros::dec;

    fn test_config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            bearer_token: Some("test-token".to_string()),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = PaperTradingClient::new(&test_config("http://localhost:8000/api/")).unwrap();
        assert_eq!(
            client.url("status/PETR4"),
            "http://localhost:8000/api/paper-trading/status/PETR4"
        );
    }

    #[test]
    fn test_start_request_serializes_snake_case() {
        let req = StartSessionRequest {
            strategy_id: 3,
            ticker: "PETR4".to_string(),
            initial_capital: dec!(100000),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["strategy_id"], 3);
        assert_eq!(json["ticker"], "PETR4");
        assert_eq!(json["initial_capital"], serde_json::json!("100000"));
    }

    #[test]
    fn test_error_body_accepts_detail_and_message() {
        let body: ApiErrorBody = serde_json::from_str(r#"{"detail": "no such strategy"}"#).unwrap();
        assert_eq!(body.detail.as_deref(), Some("no such strategy"));

        let body: ApiErrorBody = serde_json::from_str(r#"{"message": "boom"}"#).unwrap();
        assert_eq!(body.detail.as_deref(), Some("boom"));
    }
}
