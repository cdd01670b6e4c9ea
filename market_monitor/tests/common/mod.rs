#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{Duration, TimeZone};
use chrono_tz::America::New_York;
use market_monitor::{
    acquisition::{AcquisitionRequest, BarSource},
    config::MonitorOptions,
    errors::{AcquisitionError, FeedError, PublishError, ScoreError},
    models::{Bar, Snapshot},
    news::{FeedEntry, HeadlineFeed},
    publish::SnapshotSink,
    scheduler::RefreshScheduler,
    sentiment::PolarityScorer,
};

/// Scripted answer of [`FakeSource`].
#[derive(Clone)]
pub enum Reply {
    Bars(Vec<Bar>),
    Fail(&'static str),
    Panic,
}

/// Plays back replies in order, then repeats the last one.
pub struct FakeSource {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Reply>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(Reply::Bars(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl BarSource for FakeSource {
    async fn fetch(&self, _request: &AcquisitionRequest) -> Result<Vec<Bar>, AcquisitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = match self.replies.lock().unwrap().pop_front() {
            Some(reply) => {
                *self.last.lock().unwrap() = reply.clone();
                reply
            }
            None => self.last.lock().unwrap().clone(),
        };
        match reply {
            Reply::Bars(bars) => Ok(bars),
            Reply::Fail(reason) => Err(AcquisitionError::InvalidRequest(reason.to_string())),
            Reply::Panic => panic!("source exploded"),
        }
    }
}

pub struct FakeFeed {
    titles: Option<Vec<&'static str>>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeFeed {
    pub fn with_titles(titles: &[&'static str]) -> Self {
        Self {
            titles: Some(titles.to_vec()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            titles: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl HeadlineFeed for FakeFeed {
    async fn fetch(&self) -> Result<Vec<FeedEntry>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let titles = self.titles.as_ref().ok_or(FeedError::Status(503))?;
        Ok(titles
            .iter()
            .enumerate()
            .map(|(i, title)| FeedEntry {
                title: title.to_string(),
                link: format!("https://news.example/{i}"),
            })
            .collect())
    }
}

/// Keeps every rendered snapshot; optionally rejects them all.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub rendered: Arc<Mutex<Vec<Snapshot>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            rendered: Arc::default(),
            fail: true,
        }
    }

    pub fn statuses(&self) -> Vec<String> {
        self.rendered
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.status.to_string())
            .collect()
    }
}

impl SnapshotSink for RecordingSink {
    fn render(&self, snapshot: &Snapshot) -> Result<(), PublishError> {
        self.rendered.lock().unwrap().push(snapshot.clone());
        if self.fail {
            return Err(PublishError("display went away".into()));
        }
        Ok(())
    }
}

/// Scorer used by the end-to-end scenarios.
pub fn table_scorer() -> Box<dyn PolarityScorer> {
    Box::new(|title: &str| -> Result<f64, ScoreError> {
        match title {
            "great results" => Ok(0.6),
            "market crash fears" => Ok(-0.5),
            _ => Ok(0.0),
        }
    })
}

/// One-minute bars starting Friday 2025-03-07 09:30 New York time.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let t0 = New_York.with_ymd_and_hms(2025, 3, 7, 9, 30, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: t0 + Duration::minutes(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        })
        .collect()
}

pub fn rising_closes(n: usize) -> Vec<f64> {
    (0..n).map(|i| 100.0 + i as f64 * 0.5).collect()
}

pub fn scheduler(
    source: FakeSource,
    feed: FakeFeed,
    sink: RecordingSink,
) -> RefreshScheduler {
    RefreshScheduler::new(
        MonitorOptions::for_symbol("SPY"),
        Box::new(source),
        Box::new(feed),
        table_scorer(),
        Box::new(sink),
    )
    .unwrap()
}
