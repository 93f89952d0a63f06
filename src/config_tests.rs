//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use std::time::Duration;

    #[test]
    fn test_api_config_default() {
        let config: ApiConfig = toml::from_str("").unwrap();
        assert_eq!(config.base_url, "http://localhost:8000/api");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.bearer_token.is_none());
    }

    #[test]
    fn test_paper_trading_config_default() {
        let config: PaperTradingConfig = toml::from_str("").unwrap();
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.equity_history_len, 50);
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_full_config_from_toml() {
        let toml_str = r#"
[api]
base_url = "https://dash.example.com/api/"
bearer_token = "abc123"
timeout_secs = 10

[paper_trading]
poll_interval_secs = 5
equity_history_len = 100
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "https://dash.example.com/api/");
        assert_eq!(config.api.bearer_token.as_deref(), Some("abc123"));
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.paper_trading.poll_interval_secs, 5);
        assert_eq!(config.paper_trading.equity_history_len, 100);
        // limit not set, falls back to default
        assert_eq!(config.paper_trading.history_limit, 20);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[paper_trading]\npoll_interval_secs = 7\n").unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.paper_trading.poll_interval_secs, 7);
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/papertrade-config").unwrap();
        assert_eq!(config.paper_trading.equity_history_len, 50);
    }
}
