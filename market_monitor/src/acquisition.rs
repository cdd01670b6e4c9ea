//! Bar acquisition.
//!
//! The scheduler only sees [`BarSource`]. [`ProviderBarSource`] adapts any
//! `market_data_ingestor` provider: it asks for the newest `limit` bars of the
//! lookback window and hands them back ascending, in market time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use market_data_ingestor::{
    models::{
        asset::AssetClass,
        bar::BarSeries,
        request_params::{BarsRequestParams, ProviderParams},
        timeframe::TimeFrame,
    },
    providers::{
        DataProvider,
        alpaca_rest::{
            AlpacaBarsParams,
            params::{Feed, Sort},
        },
    },
};
use tracing::debug;

use crate::{config::MonitorOptions, errors::AcquisitionError, models::Bar};

/// What one cycle asks the data source for.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionRequest {
    pub symbol: String,
    pub granularity: TimeFrame,
    /// Window ending now.
    pub lookback: chrono::Duration,
    /// Maximum number of bars; the newest are kept.
    pub limit: u32,
}

impl AcquisitionRequest {
    pub fn from_options(options: &MonitorOptions) -> Self {
        Self {
            symbol: options.symbol.clone(),
            granularity: options.timeframe,
            lookback: options.lookback(),
            limit: options.bar_limit,
        }
    }
}

/// Source of market bars for one instrument.
///
/// Returns bars ascending with unique timestamps. An empty list is a valid
/// answer (market closed, no trades) and is not an error.
#[async_trait]
pub trait BarSource: Send + Sync {
    async fn fetch(&self, request: &AcquisitionRequest) -> Result<Vec<Bar>, AcquisitionError>;
}

pub struct ProviderBarSource {
    provider: Box<dyn DataProvider>,
    tz: Tz,
    feed: Feed,
}

impl ProviderBarSource {
    pub fn new(provider: Box<dyn DataProvider>, tz: Tz, feed: Feed) -> Self {
        Self { provider, tz, feed }
    }

    pub fn from_options(provider: Box<dyn DataProvider>, options: &MonitorOptions) -> Self {
        Self::new(provider, options.market_tz(), options.data_feed)
    }

    fn params(&self, request: &AcquisitionRequest, now: DateTime<Utc>) -> BarsRequestParams {
        BarsRequestParams {
            symbols: vec![request.symbol.clone()],
            timeframe: request.granularity,
            start: now - request.lookback,
            end: now,
            asset_class: AssetClass::UsEquity,
            limit: Some(request.limit),
            provider_specific: ProviderParams::Alpaca(AlpacaBarsParams {
                feed: Some(self.feed),
                sort: Some(Sort::Desc),
                ..Default::default()
            }),
        }
    }

    /// Fetches the window ending at `now`.
    pub async fn fetch_at(
        &self,
        request: &AcquisitionRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<Bar>, AcquisitionError> {
        if request.limit == 0 {
            return Err(AcquisitionError::InvalidRequest("limit must be positive".into()));
        }
        if request.lookback <= chrono::Duration::zero() {
            return Err(AcquisitionError::InvalidRequest(format!(
                "lookback must be positive, got {}",
                request.lookback
            )));
        }

        let params = self.params(request, now);
        let series = self.provider.fetch_bars(params).await?;

        let Some(mut series) = series
            .into_iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(&request.symbol))
        else {
            debug!(symbol = %request.symbol, "provider returned no series");
            return Ok(Vec::new());
        };
        Ok(self.to_market_bars(&mut series, request.limit as usize))
    }

    fn to_market_bars(&self, series: &mut BarSeries, limit: usize) -> Vec<Bar> {
        series.normalize();
        series.keep_latest(limit);
        series
            .bars
            .iter()
            .map(|bar| Bar::from_provider(bar, self.tz))
            .collect()
    }
}

#[async_trait]
impl BarSource for ProviderBarSource {
    async fn fetch(&self, request: &AcquisitionRequest) -> Result<Vec<Bar>, AcquisitionError> {
        self.fetch_at(request, Utc::now()).await
    }
}
