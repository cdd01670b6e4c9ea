//! Snapshot assembly.
//!
//! [`MarketSnapshotBuilder::build`] turns one cycle's bars, indicators and
//! sentiment into a [`Snapshot`]. [`Snapshot::unavailable`] covers cycles that
//! produced nothing new.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::{
    config::MonitorOptions,
    errors::ComputationError,
    models::{Bar, IndicatorSeries, MarketSession, Mood, Snapshot, SnapshotStatus, TechTrend},
    sentiment::Sentiment,
};

#[derive(Debug, Clone)]
pub struct MarketSnapshotBuilder {
    symbol: String,
    tz: Tz,
    snapshot_window: usize,
    positive_threshold: f64,
    negative_threshold: f64,
}

impl MarketSnapshotBuilder {
    pub fn new(options: &MonitorOptions) -> Self {
        Self {
            symbol: options.symbol.clone(),
            tz: options.market_tz(),
            snapshot_window: options.snapshot_window,
            positive_threshold: options.positive_threshold,
            negative_threshold: options.negative_threshold,
        }
    }

    /// Builds a snapshot stamped with the current time.
    pub fn build(
        &self,
        bars: &[Bar],
        indicators: &IndicatorSeries,
        sentiment: Sentiment,
    ) -> Result<Snapshot, ComputationError> {
        self.build_at(bars, indicators, sentiment, Utc::now())
    }

    /// Builds a snapshot from the full bar history.
    ///
    /// Indicators must have been computed over exactly `bars`; only the
    /// returned window is trimmed.
    pub fn build_at(
        &self,
        bars: &[Bar],
        indicators: &IndicatorSeries,
        sentiment: Sentiment,
        refreshed_at: DateTime<Utc>,
    ) -> Result<Snapshot, ComputationError> {
        let Some(latest) = bars.last() else {
            return Err(ComputationError::EmptyBars);
        };
        if indicators.sma.len() != bars.len() || indicators.rsi.len() != bars.len() {
            return Err(ComputationError::LengthMismatch {
                bars: bars.len(),
                indicators: indicators.sma.len().min(indicators.rsi.len()),
            });
        }
        let latest_price = latest.close;
        if !latest_price.is_finite() {
            return Err(ComputationError::NonFinitePrice(latest_price));
        }

        let price_delta = bars
            .len()
            .checked_sub(2)
            .map(|prev| latest_price - bars[prev].close);
        let sma = indicators.latest_sma();
        let tech_trend = sma.map(|sma| trend(latest_price, sma));

        let from = bars.len().saturating_sub(self.snapshot_window);
        Ok(Snapshot {
            symbol: self.symbol.clone(),
            as_of: Some(latest.timestamp),
            refreshed_at,
            session: MarketSession::at(refreshed_at.with_timezone(&self.tz)),
            latest_price: Some(latest_price),
            price_delta,
            rsi: indicators.latest_rsi(),
            sma,
            tech_trend,
            news_score: sentiment.score,
            news_mood: Mood::classify(
                sentiment.score,
                self.positive_threshold,
                self.negative_threshold,
            ),
            headlines: sentiment.items,
            bars: bars[from..].to_vec(),
            indicators: indicators.tail(self.snapshot_window),
            status: SnapshotStatus::Ok,
        })
    }

    /// Non-ok snapshot for a cycle that produced no fresh market data.
    pub fn unavailable(
        &self,
        previous: Option<&Snapshot>,
        status: SnapshotStatus,
        refreshed_at: DateTime<Utc>,
    ) -> Snapshot {
        Snapshot::unavailable(
            &self.symbol,
            previous,
            status,
            refreshed_at,
            MarketSession::at(refreshed_at.with_timezone(&self.tz)),
        )
    }
}

/// Strictly above the average is bullish; touching it is not.
fn trend(price: f64, sma: f64) -> TechTrend {
    if price > sma {
        TechTrend::Bullish
    } else {
        TechTrend::Bearish
    }
}

impl Snapshot {
    /// Carries the market and news fields of `previous` forward under a new
    /// status, or leaves them empty when nothing was published before.
    pub fn unavailable(
        symbol: &str,
        previous: Option<&Snapshot>,
        status: SnapshotStatus,
        refreshed_at: DateTime<Utc>,
        session: MarketSession,
    ) -> Snapshot {
        match previous {
            Some(prev) => Snapshot {
                refreshed_at,
                session,
                status,
                ..prev.clone()
            },
            None => Snapshot {
                symbol: symbol.to_string(),
                as_of: None,
                refreshed_at,
                session,
                latest_price: None,
                price_delta: None,
                rsi: None,
                sma: None,
                tech_trend: None,
                news_score: 0.0,
                news_mood: Mood::Neutral,
                headlines: Vec::new(),
                bars: Vec::new(),
                indicators: IndicatorSeries::default(),
                status,
            },
        }
    }
}
