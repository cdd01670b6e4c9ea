//! Vendor-agnostic market data retrieval.
//!
//! [`models`] holds the canonical bar, timeframe and request types;
//! [`providers`] holds the [`DataProvider`](providers::DataProvider) trait and
//! its concrete vendor implementations.

pub mod models;
pub mod providers;
