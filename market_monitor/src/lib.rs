//! Live market monitor for a single instrument.
//!
//! Each refresh cycle fetches recent bars and headlines, computes a moving
//! average and RSI, scores headline sentiment and publishes an immutable
//! [`Snapshot`](models::Snapshot). [`RefreshScheduler`](scheduler::RefreshScheduler)
//! runs the cycle on a fixed cadence and keeps failures contained.

pub mod acquisition;
pub mod config;
pub mod errors;
pub mod indicators;
pub mod models;
pub mod news;
pub mod publish;
pub mod scheduler;
pub mod sentiment;
pub mod snapshot;
pub mod telemetry;
