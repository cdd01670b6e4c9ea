//! Provider abstraction for market data sources.
//!
//! This module defines the [`DataProvider`] trait, a unified interface for
//! fetching time-series bar data from a market data vendor. Each concrete
//! provider handles its vendor-specific API logic and validation.
//!
//! The trait is async and object safe, so callers can hold a
//! `Box<dyn DataProvider>` chosen at runtime.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_data_ingestor::models::{bar::BarSeries, request_params::BarsRequestParams};
//! use market_data_ingestor::providers::{DataProvider, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     async fn fetch_bars(
//!         &self,
//!         _params: BarsRequestParams,
//!     ) -> Result<Vec<BarSeries>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod alpaca_rest;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{bar::BarSeries, request_params::BarsRequestParams};

/// Trait for fetching time-series bar data from a market data provider.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetches bars for the given request parameters.
    ///
    /// Returns one [`BarSeries`] per symbol that had data. A symbol with no
    /// bars in the range is simply absent; that is not an error.
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains invalid characters.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout, bad JSON).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API answered with a non-success status.
    #[snafu(display("API error ({status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// An error during provider configuration or initialization.
    #[snafu(display("Provider initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}

impl ProviderError {
    /// Whether retrying the same request later could plausibly succeed.
    ///
    /// Validation and authentication failures are permanent; transport errors,
    /// throttling and server-side errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Reqwest { source, .. } => !source.is_decode(),
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Validation { .. } | ProviderError::Init { .. } => false,
        }
    }
}
