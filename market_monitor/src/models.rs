//! Values that flow through one refresh cycle.
//!
//! Everything here is plain data: produced once per cycle, shared read-only
//! afterwards, and replaced wholesale on the next cycle.

use std::fmt;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

/// One OHLCV observation stamped in the market's local time zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    /// Start of the bar interval, market-local.
    pub timestamp: DateTime<Tz>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Converts a provider bar (UTC) into a market-local bar.
    pub fn from_provider(bar: &market_data_ingestor::models::bar::Bar, tz: Tz) -> Self {
        Self {
            timestamp: bar.timestamp.with_timezone(&tz),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

/// Indicator values indexed in parallel with a bar sequence.
///
/// `None` marks an index without enough history; it never means zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub sma: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.sma.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sma.is_empty()
    }

    pub fn latest_sma(&self) -> Option<f64> {
        self.sma.last().copied().flatten()
    }

    pub fn latest_rsi(&self) -> Option<f64> {
        self.rsi.last().copied().flatten()
    }

    /// The last `n` entries of both series (all of them if shorter).
    pub fn tail(&self, n: usize) -> IndicatorSeries {
        let from = self.len().saturating_sub(n);
        IndicatorSeries {
            sma: self.sma[from..].to_vec(),
            rsi: self.rsi[from..].to_vec(),
        }
    }
}

/// Three-way tone classification used for single headlines and for the
/// aggregate news score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    Negative,
    Neutral,
}

impl Mood {
    /// `> positive` is positive, `< negative` is negative, anything in
    /// between (bounds included) is neutral.
    pub fn classify(score: f64, positive: f64, negative: f64) -> Mood {
        if score > positive {
            Mood::Positive
        } else if score < negative {
            Mood::Negative
        } else {
            Mood::Neutral
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Mood::Positive => "🟢",
            Mood::Negative => "🔴",
            Mood::Neutral => "⚪",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Mood::Positive => "Positive",
            Mood::Negative => "Negative",
            Mood::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

/// A scored headline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    /// Polarity in `[-1, 1]`.
    pub polarity: f64,
    pub mood_icon: Mood,
}

/// Price position relative to the moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TechTrend {
    Bullish,
    Bearish,
}

impl fmt::Display for TechTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TechTrend::Bullish => f.write_str("BULLISH"),
            TechTrend::Bearish => f.write_str("BEARISH"),
        }
    }
}

/// Regular-hours classification of the refresh instant.
///
/// Informational only: a closed session does not change the snapshot status.
/// Exchange holidays are not known and count as open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSession {
    Open,
    Closed,
}

impl MarketSession {
    /// Weekends and anything outside 09:30-16:00 market time are closed.
    pub fn at(local: DateTime<Tz>) -> MarketSession {
        let minute_of_day = local.hour() * 60 + local.minute();
        let weekend = matches!(local.weekday(), Weekday::Sat | Weekday::Sun);
        if weekend || !(9 * 60 + 30..16 * 60).contains(&minute_of_day) {
            MarketSession::Closed
        } else {
            MarketSession::Open
        }
    }
}

/// Outcome of the cycle that produced a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum SnapshotStatus {
    Ok,
    /// Acquisition succeeded but returned no bars (market closed, illiquid symbol, ...).
    NoData,
    /// The cycle failed; the reason is meant for display.
    Error(String),
}

impl SnapshotStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, SnapshotStatus::Ok)
    }
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotStatus::Ok => f.write_str("ok"),
            SnapshotStatus::NoData => f.write_str("no data"),
            SnapshotStatus::Error(reason) => write!(f, "error: {reason}"),
        }
    }
}

/// Everything presentation needs to draw one refresh.
///
/// Built once and shared behind an `Arc`; never mutated after publication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub symbol: String,
    /// Timestamp of the latest bar, or `None` if no bar was ever seen.
    pub as_of: Option<DateTime<Tz>>,
    /// Wall-clock time this snapshot was assembled.
    pub refreshed_at: DateTime<Utc>,
    pub session: MarketSession,
    pub latest_price: Option<f64>,
    /// `latest - previous` close; needs two bars.
    pub price_delta: Option<f64>,
    pub rsi: Option<f64>,
    pub sma: Option<f64>,
    /// `None` while the moving average is still warming up.
    pub tech_trend: Option<TechTrend>,
    pub news_score: f64,
    pub news_mood: Mood,
    pub headlines: Vec<NewsItem>,
    /// Most recent bars, oldest first, trimmed to the snapshot window.
    pub bars: Vec<Bar>,
    /// Indicator values aligned with `bars`.
    pub indicators: IndicatorSeries,
    pub status: SnapshotStatus,
}
