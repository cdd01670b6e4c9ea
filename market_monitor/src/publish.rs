//! Snapshot publication.
//!
//! The scheduler swaps each new snapshot into a [`SnapshotSlot`] and then
//! hands it to a [`SnapshotSink`]. Readers of the slot see either the previous
//! or the new snapshot, never a partial one.

use std::{
    io::Write,
    sync::{Arc, Mutex},
};

use arc_swap::ArcSwapOption;
use tracing::{debug, info, warn};

use crate::{errors::PublishError, models::Snapshot};

/// Single-slot holder of the latest published snapshot.
///
/// Cheap to clone; clones share the slot.
#[derive(Clone, Default)]
pub struct SnapshotSlot {
    inner: Arc<ArcSwapOption<Snapshot>>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest snapshot, or `None` before the first publication.
    pub fn load(&self) -> Option<Arc<Snapshot>> {
        self.inner.load_full()
    }

    pub fn store(&self, snapshot: Arc<Snapshot>) {
        self.inner.store(Some(snapshot));
    }
}

/// Presentation side of the monitor.
///
/// Rendering the same snapshot twice must be harmless.
pub trait SnapshotSink: Send + Sync {
    fn render(&self, snapshot: &Snapshot) -> Result<(), PublishError>;
}

/// Writes each snapshot as structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl SnapshotSink for LogSink {
    fn render(&self, snapshot: &Snapshot) -> Result<(), PublishError> {
        if !snapshot.status.is_ok() {
            warn!(
                symbol = %snapshot.symbol,
                status = %snapshot.status,
                stale_as_of = ?snapshot.as_of,
                "market data unavailable"
            );
        }
        info!(
            symbol = %snapshot.symbol,
            status = %snapshot.status,
            session = ?snapshot.session,
            as_of = ?snapshot.as_of,
            price = ?snapshot.latest_price,
            delta = ?snapshot.price_delta,
            rsi = ?snapshot.rsi,
            sma = ?snapshot.sma,
            trend = ?snapshot.tech_trend,
            news_score = snapshot.news_score,
            news_mood = %snapshot.news_mood,
            "snapshot"
        );
        for item in &snapshot.headlines {
            debug!(
                mood = item.mood_icon.icon(),
                polarity = item.polarity,
                link = %item.link,
                "{}",
                item.title
            );
        }
        Ok(())
    }
}

/// Writes one JSON document per snapshot, newline separated.
pub struct JsonLinesSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> SnapshotSink for JsonLinesSink<W> {
    fn render(&self, snapshot: &Snapshot) -> Result<(), PublishError> {
        let line =
            serde_json::to_string(snapshot).map_err(|e| PublishError(e.to_string()))?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| PublishError("output lock poisoned".into()))?;
        writeln!(out, "{line}")
            .and_then(|()| out.flush())
            .map_err(|e| PublishError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::{MarketSession, SnapshotStatus};

    fn empty(status: SnapshotStatus) -> Snapshot {
        Snapshot::unavailable(
            "SPY",
            None,
            status,
            Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap(),
            MarketSession::Closed,
        )
    }

    #[test]
    fn slot_starts_empty_and_keeps_latest() {
        let slot = SnapshotSlot::new();
        assert!(slot.load().is_none());

        let reader = slot.clone();
        slot.store(Arc::new(empty(SnapshotStatus::NoData)));
        slot.store(Arc::new(empty(SnapshotStatus::Ok)));
        assert_eq!(reader.load().unwrap().status, SnapshotStatus::Ok);
    }

    #[test]
    fn log_sink_accepts_any_snapshot() {
        assert!(LogSink.render(&empty(SnapshotStatus::Error("x".into()))).is_ok());
    }

    #[test]
    fn json_sink_writes_one_line_per_snapshot() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.render(&empty(SnapshotStatus::NoData)).unwrap();
        sink.render(&empty(SnapshotStatus::Error("feed down".into()))).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["symbol"], "SPY");
        assert_eq!(first["status"]["kind"], "no_data");
        assert_eq!(first["session"], "closed");
        assert!(first["latest_price"].is_null());

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["status"]["reason"], "feed down");
    }
}
