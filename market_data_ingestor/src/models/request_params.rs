use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::{asset::AssetClass, timeframe::TimeFrame},
    providers::alpaca_rest::AlpacaBarsParams,
};

/// Universal parameters for requesting time-series bar data from any market data provider.
///
/// Vendor-agnostic; it is the standard input for every
/// [`DataProvider`](crate::providers::DataProvider) implementation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BarsRequestParams {
    /// List of symbols to request (e.g., `["SPY"]`).
    pub symbols: Vec<String>,

    /// The time interval for each bar (e.g., 1 minute, 1 day).
    ///
    /// **Which amounts a vendor accepts is checked by each provider**, on top of
    /// the generic validation done by [`TimeFrame::new`].
    pub timeframe: TimeFrame,

    /// Start of the requested time range (inclusive, UTC).
    pub start: DateTime<Utc>,

    /// End of the requested time range (exclusive, UTC).
    pub end: DateTime<Utc>,

    /// The asset class for the requested symbols.
    #[serde(default)]
    pub asset_class: AssetClass,

    /// Upper bound on the number of bars returned across all pages.
    ///
    /// `None` means every bar in `[start, end)`.
    #[serde(default)]
    pub limit: Option<u32>,

    /// Optional, provider-specific parameters.
    #[serde(default)]
    pub provider_specific: ProviderParams,
}

/// Provider-specific request parameters.
///
/// Lets callers pass per-request options for a particular provider without
/// cluttering the universal `BarsRequestParams`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum ProviderParams {
    #[default]
    None,
    Alpaca(AlpacaBarsParams),
}
