//! Tests for core types

#[cfg(test)]
mod tests {
    use super::super::types::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_session_status_serde() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Active).unwrap(),
            "\"ACTIVE\""
        );
        let s: SessionStatus = serde_json::from_str("\"PAUSED\"").unwrap();
        assert_eq!(s, SessionStatus::Paused);
        assert!(serde_json::from_str::<SessionStatus>("\"RUNNING\"").is_err());
    }

    #[test]
    fn test_session_status_is_live() {
        assert!(SessionStatus::Active.is_live());
        assert!(SessionStatus::Paused.is_live());
        assert!(!SessionStatus::Stopped.is_live());
    }

    #[test]
    fn test_position_open_closed() {
        let mut pos = Position {
            id: 1,
            ticker: "PETR4".to_string(),
            quantity: dec!(100),
            entry_price: dec!(32.50),
            entry_date: Utc::now(),
            exit_price: None,
            exit_date: None,
            pnl: None,
        };
        assert!(pos.is_open());

        pos.exit_date = Some(Utc::now());
        pos.exit_price = Some(dec!(33.10));
        pos.pnl = Some(dec!(60));
        assert!(!pos.is_open());
    }

    #[test]
    fn test_session_deserializes_from_wire_json() {
        let json = r#"{
            "id": 7,
            "ticker": "VALE3",
            "status": "ACTIVE",
            "initial_capital": "100000.00",
            "current_capital": "101500.00",
            "started_at": "2026-08-01T12:00:00Z"
        }"#;
        let session: PaperTradeSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.id, 7);
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.initial_capital, dec!(100000.00));
        assert!(session.stopped_at.is_none());
    }

    #[test]
    fn test_history_entry_return_percent() {
        let entry = HistoryEntry {
            id: 1,
            ticker: "PETR4".to_string(),
            status: SessionStatus::Stopped,
            initial_capital: dec!(100000),
            current_capital: dec!(101500),
            started_at: Utc::now(),
            stopped_at: Some(Utc::now()),
            positions: None,
        };
        assert_eq!(entry.return_percent(), dec!(1.5));

        let zero = HistoryEntry {
            initial_capital: dec!(0),
            ..entry
        };
        assert_eq!(zero.return_percent(), dec!(0));
    }
}
