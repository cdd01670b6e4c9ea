//! Small helpers shared by the market data and monitor crates.

pub mod env;
