use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use indexmap::IndexMap;
use nonzero_ext::nonzero;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use snafu::ResultExt;
use tracing::debug;

use crate::{
    models::{
        asset::AssetClass,
        bar::{Bar, BarSeries},
        request_params::BarsRequestParams,
    },
    providers::{
        ApiSnafu, ClientBuildSnafu, DataProvider, InvalidApiKeySnafu, MissingEnvVarSnafu,
        ProviderError, ProviderInitError, ReqwestSnafu, ValidationSnafu,
        alpaca_rest::{
            params::{construct_params, validate_request},
            response::AlpacaResponse,
        },
    },
};

const BASE_URL: &str = "https://data.alpaca.markets/v2/stocks/bars";

/// Alpaca's documented allowance for the free data plan.
fn request_quota() -> Quota {
    Quota::per_minute(nonzero!(200u32))
}

pub struct AlpacaProvider {
    client: Client,
    base_url: String,
    limiter: DefaultDirectRateLimiter,
    _api_key: SecretString,
    _secret_key: SecretString,
}

impl AlpacaProvider {
    /// Creates a new Alpaca provider.
    ///
    /// Reads API keys from the `APCA_API_KEY_ID` and `APCA_API_SECRET_KEY`
    /// environment variables.
    pub fn new() -> Result<Self, ProviderInitError> {
        let api_key =
            SecretString::from(get_env_var("APCA_API_KEY_ID").context(MissingEnvVarSnafu)?);
        let secret_key =
            SecretString::from(get_env_var("APCA_API_SECRET_KEY").context(MissingEnvVarSnafu)?);
        Self::with_credentials(api_key, secret_key)
    }

    /// Creates a provider from explicit credentials.
    pub fn with_credentials(
        api_key: SecretString,
        secret_key: SecretString,
    ) -> Result<Self, ProviderInitError> {
        let mut headers = header::HeaderMap::new();
        let mut key_value =
            header::HeaderValue::from_str(api_key.expose_secret()).context(InvalidApiKeySnafu)?;
        key_value.set_sensitive(true);
        let mut secret_value = header::HeaderValue::from_str(secret_key.expose_secret())
            .context(InvalidApiKeySnafu)?;
        secret_value.set_sensitive(true);
        headers.insert("APCA-API-KEY-ID", key_value);
        headers.insert("APCA-API-SECRET-KEY", secret_value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            limiter: RateLimiter::direct(request_quota()),
            _api_key: api_key,
            _secret_key: secret_key,
        })
    }

    /// Points the provider at another bars endpoint (e.g. a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl DataProvider for AlpacaProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        if params.asset_class != AssetClass::UsEquity {
            return ValidationSnafu {
                message: format!(
                    "asset class {:?} is not served by the stocks endpoint",
                    params.asset_class
                ),
            }
            .fail();
        }
        validate_request(&params)?;

        let limit = params.limit.map(|l| l as usize);
        let mut all_bars: IndexMap<String, Vec<Bar>> = IndexMap::new();
        let mut collected = 0usize;
        let mut next_page_token: Option<String> = None;

        loop {
            let mut query_params = construct_params(&params);
            if let Some(token) = &next_page_token {
                query_params.push(("page_token".to_string(), token.clone()));
            }

            self.limiter.until_ready().await;
            let response = self
                .client
                .get(&self.base_url)
                .query(&query_params)
                .send()
                .await
                .context(ReqwestSnafu)?;

            let status = response.status();
            if !status.is_success() {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown API error".to_string());
                return ApiSnafu {
                    status: status.as_u16(),
                    message,
                }
                .fail();
            }

            let page = response.json::<AlpacaResponse>().await.context(ReqwestSnafu)?;

            // Merge the bars from the current page into our collection.
            for (symbol, bars) in page.bars.unwrap_or_default() {
                collected += bars.len();
                all_bars
                    .entry(symbol)
                    .or_default()
                    .extend(bars.into_iter().map(Bar::from));
            }
            debug!(collected, has_next = page.next_page_token.is_some(), "alpaca bars page");

            let reached_limit = limit.is_some_and(|l| collected >= l);
            match page.next_page_token {
                Some(token) if !reached_limit => next_page_token = Some(token),
                _ => break,
            }
        }

        let result = all_bars
            .into_iter()
            .map(|(symbol, bars)| {
                let mut series = BarSeries {
                    symbol,
                    timeframe: params.timeframe,
                    bars,
                };
                series.normalize();
                if let Some(limit) = limit {
                    series.keep_latest(limit);
                }
                series
            })
            .collect();

        Ok(result)
    }
}
