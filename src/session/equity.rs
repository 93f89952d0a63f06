//! Bounded equity-curve buffer
//!
//! Rolling window of `(timestamp, equity)` samples for chart rendering.
//! Pure FIFO: when full, the oldest sample is evicted. Ordering is not
//! enforced here; the poller's serialized ticks guarantee appends happen in
//! timestamp order.

use crate::types::EquitySample;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;

pub struct EquityHistory {
    samples: VecDeque<EquitySample>,
    capacity: usize,
}

impl EquityHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when at capacity.
    pub fn append(&mut self, timestamp: DateTime<Utc>, equity: Decimal) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(EquitySample { timestamp, equity });
    }

    /// Samples in insertion order, oldest first. Does not mutate the buffer.
    pub fn to_series(&self) -> impl Iterator<Item = &EquitySample> + '_ {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&EquitySample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_append_and_series_order() {
        let mut history = EquityHistory::new(50);
        let t0 = Utc::now();
        history.append(t0, dec!(100000));
        history.append(t0 + Duration::seconds(30), dec!(100500));

        let series: Vec<_> = history.to_series().collect();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].equity, dec!(100000));
        assert_eq!(series[1].equity, dec!(100500));
        // reading the series twice works and leaves the buffer intact
        assert_eq!(history.to_series().count(), 2);
        assert_eq!(history.latest().unwrap().equity, dec!(100500));
    }

    #[test]
    fn test_capacity_bound_keeps_most_recent() {
        let mut history = EquityHistory::new(50);
        let t0 = Utc::now();
        for i in 0..55 {
            history.append(t0 + Duration::seconds(30 * i), Decimal::from(100000 + i));
        }

        assert_eq!(history.len(), 50);
        let series: Vec<_> = history.to_series().collect();
        // oldest remaining is sample #5, newest is #54
        assert_eq!(series[0].equity, Decimal::from(100005));
        assert_eq!(series[49].equity, Decimal::from(100054));
    }

    #[test]
    fn test_sixty_ticks_evicts_first_ten() {
        let mut history = EquityHistory::new(50);
        let t0 = Utc::now();
        for i in 1..=60 {
            history.append(t0 + Duration::seconds(30 * i), Decimal::from(i));
        }

        assert_eq!(history.len(), 50);
        let equities: Vec<_> = history.to_series().map(|s| s.equity).collect();
        // sample #10 is gone, #60 is present
        assert!(!equities.contains(&Decimal::from(10)));
        assert_eq!(equities.first(), Some(&Decimal::from(11)));
        assert_eq!(equities.last(), Some(&Decimal::from(60)));
    }

    #[test]
    fn test_clear() {
        let mut history = EquityHistory::new(10);
        history.append(Utc::now(), dec!(1));
        history.clear();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }
}
