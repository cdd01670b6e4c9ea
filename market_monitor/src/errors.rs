//! Failure taxonomy of the refresh cycle.
//!
//! Each collaborator has its own error type so a failed cycle can say which
//! stage broke. [`CycleError`] is what the scheduler turns into a faulted
//! state; feed and scorer errors never reach it because they degrade to
//! neutral values at their call sites.

use market_data_ingestor::providers::ProviderError;
use thiserror::Error;

/// Bars could not be retrieved.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The market-data provider failed (network, auth, malformed response).
    #[error("market data provider failed: {0}")]
    Provider(#[from] ProviderError),

    /// The request could not be built from the configured options.
    #[error("invalid acquisition request: {0}")]
    InvalidRequest(String),
}

/// The headline feed was unreachable or unparseable.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed answered with status {0}")]
    Status(u16),

    #[error("feed is not valid XML: {0}")]
    Parse(String),
}

/// A single headline could not be scored.
#[derive(Debug, Error)]
#[error("scoring failed: {0}")]
pub struct ScoreError(pub String);

/// Indicator or snapshot assembly hit input it cannot handle.
#[derive(Debug, Error, PartialEq)]
pub enum ComputationError {
    #[error("no bars to build a snapshot from")]
    EmptyBars,

    #[error("indicator series has {indicators} entries for {bars} bars")]
    LengthMismatch { bars: usize, indicators: usize },

    #[error("latest close is not a finite number: {0}")]
    NonFinitePrice(f64),
}

/// The presentation sink rejected a snapshot.
#[derive(Debug, Error)]
#[error("publishing snapshot failed: {0}")]
pub struct PublishError(pub String);

/// Options failed to load or validate.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("failed to read options file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse options: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid option `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Why a cycle ended in the faulted state.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Computation(#[from] ComputationError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    /// A collaborator panicked inside the cycle.
    #[error("cycle panicked: {0}")]
    Panicked(String),
}

impl CycleError {
    /// Short, stable name of the failing stage, used as a log field.
    pub fn stage(&self) -> &'static str {
        match self {
            CycleError::Acquisition(_) => "acquisition",
            CycleError::Computation(_) => "computation",
            CycleError::Publish(_) => "publish",
            CycleError::Panicked(_) => "panic",
        }
    }

    /// Whether the next cycle could plausibly succeed without intervention.
    pub fn is_transient(&self) -> bool {
        match self {
            CycleError::Acquisition(AcquisitionError::Provider(err)) => err.is_transient(),
            CycleError::Acquisition(AcquisitionError::InvalidRequest(_)) => false,
            CycleError::Computation(_) | CycleError::Panicked(_) => false,
            CycleError::Publish(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use market_data_ingestor::providers::{ApiSnafu, ValidationSnafu};

    use super::*;

    fn provider_failure(err: ProviderError) -> CycleError {
        CycleError::from(AcquisitionError::from(err))
    }

    #[test]
    fn upstream_outage_is_transient() {
        let err = provider_failure(
            ApiSnafu {
                status: 503u16,
                message: "service unavailable",
            }
            .build(),
        );
        assert!(err.is_transient());
        assert_eq!(err.stage(), "acquisition");
    }

    #[test]
    fn rejected_request_is_not_transient() {
        let err = provider_failure(
            ValidationSnafu {
                message: "bad symbol",
            }
            .build(),
        );
        assert!(!err.is_transient());
        assert!(!CycleError::from(ComputationError::EmptyBars).is_transient());
        assert!(!CycleError::Panicked("boom".into()).is_transient());
        assert!(CycleError::from(PublishError("closed".into())).is_transient());
    }
}
