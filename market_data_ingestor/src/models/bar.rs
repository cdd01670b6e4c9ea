//! Canonical in-memory representation of a time-series bar (OHLCV).
//!
//! This struct is the standard output of every [`DataProvider`](crate::providers::DataProvider)
//! implementation, regardless of vendor. Timestamps are always UTC here; callers
//! that need exchange-local time convert at their own boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timeframe::TimeFrame;

/// A single time-series bar (OHLCV) for a given timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Start of the bar interval (UTC).
    pub timestamp: DateTime<Utc>,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Volume traded during the bar interval.
    pub volume: f64,

    /// Trade count for the bar. Not all providers supply this.
    pub trade_count: Option<u64>,

    /// Volume-weighted average price. Not all providers supply this.
    pub vwap: Option<f64>,
}

/// Represents a complete set of time-series data for a single symbol.
///
/// This struct groups a vector of [`Bar`]s with their corresponding symbol
/// and [`TimeFrame`], making the data set self-describing.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    /// The symbol this data represents (e.g., "AAPL", "SPY").
    pub symbol: String,
    /// The time interval for each bar in the series.
    pub timeframe: TimeFrame,
    /// The collection of OHLCV bars.
    pub bars: Vec<Bar>,
}

impl BarSeries {
    /// Sorts bars ascending by timestamp and drops duplicate timestamps.
    ///
    /// When two bars share a timestamp the one that appeared later in the
    /// input wins, so a re-delivered bar replaces the stale one.
    pub fn normalize(&mut self) {
        // stable sort keeps arrival order among equal timestamps
        self.bars.sort_by_key(|b| b.timestamp);
        let mut out: Vec<Bar> = Vec::with_capacity(self.bars.len());
        for bar in self.bars.drain(..) {
            match out.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => out.push(bar),
            }
        }
        self.bars = out;
    }

    /// Keeps only the newest `limit` bars. Assumes the series is normalized.
    pub fn keep_latest(&mut self, limit: usize) {
        if self.bars.len() > limit {
            let excess = self.bars.len() - limit;
            self.bars.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::models::timeframe::TimeFrame;

    fn bar(minute: i64, close: f64) -> Bar {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 3, 14, 30, 0).unwrap();
        Bar {
            timestamp: t0 + Duration::minutes(minute),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100.0,
            trade_count: None,
            vwap: None,
        }
    }

    #[test]
    fn normalize_sorts_and_keeps_last_duplicate() {
        let mut series = BarSeries {
            symbol: "SPY".into(),
            timeframe: TimeFrame::minute(),
            bars: vec![bar(2, 3.0), bar(0, 1.0), bar(1, 2.0), bar(2, 4.0)],
        };
        series.normalize();
        let closes: Vec<f64> = series.bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn keep_latest_drops_oldest() {
        let mut series = BarSeries {
            symbol: "SPY".into(),
            timeframe: TimeFrame::minute(),
            bars: (0..10).map(|i| bar(i, i as f64)).collect(),
        };
        series.keep_latest(3);
        let closes: Vec<f64> = series.bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![7.0, 8.0, 9.0]);

        series.keep_latest(50);
        assert_eq!(series.bars.len(), 3);
    }
}
