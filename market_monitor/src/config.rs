//! Monitor options: defaults, TOML loading and validation.
//!
//! Options are supplied once at construction and shared read-only by every
//! component. Every field has a default, so a TOML file only needs the keys it
//! wants to change:
//!
//! ```toml
//! symbol = "QQQ"
//! success_interval_secs = 30
//!
//! [timeframe]
//! amount = 5
//! unit = "minute"
//! ```

use std::{cmp::Ordering, time::Duration};

use chrono_tz::Tz;
use market_data_ingestor::{
    models::timeframe::TimeFrame, providers::alpaca_rest::params::Feed,
};
use serde::Deserialize;

use crate::errors::OptionsError;

/// CNBC "Top News" RSS.
pub const DEFAULT_FEED_URL: &str =
    "https://search.cnbc.com/rs/search/combinedcms/view.xml?partnerId=wrss01&id=15839069";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorOptions {
    /// Instrument to monitor, e.g. `SPY`.
    pub symbol: String,
    pub sma_window: usize,
    pub rsi_span: usize,
    /// Number of most recent bars handed to presentation.
    pub snapshot_window: usize,
    pub success_interval_secs: u64,
    pub retry_interval_secs: u64,
    pub headline_limit: usize,
    pub positive_threshold: f64,
    pub negative_threshold: f64,
    /// IANA zone bars are converted to, e.g. `America/New_York`.
    pub market_timezone: String,
    pub timeframe: TimeFrame,
    /// How far back each acquisition reaches.
    pub lookback_days: u32,
    /// Maximum bars per acquisition; the newest ones are kept.
    pub bar_limit: u32,
    pub feed_url: String,
    pub data_feed: Feed,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            sma_window: 20,
            rsi_span: 14,
            snapshot_window: 60,
            success_interval_secs: 60,
            retry_interval_secs: 10,
            headline_limit: 5,
            positive_threshold: 0.1,
            negative_threshold: -0.1,
            market_timezone: "America/New_York".to_string(),
            timeframe: TimeFrame::minute(),
            lookback_days: 5,
            bar_limit: 390,
            feed_url: DEFAULT_FEED_URL.to_string(),
            data_feed: Feed::Iex,
        }
    }
}

impl MonitorOptions {
    /// Default options for `symbol`.
    pub fn for_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn success_interval(&self) -> Duration {
        Duration::from_secs(self.success_interval_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.lookback_days))
    }

    /// Parsed market time zone. Call [`validate`](Self::validate) first to
    /// get a descriptive error instead of the UTC fallback.
    pub fn market_tz(&self) -> Tz {
        self.market_timezone.parse().unwrap_or(Tz::UTC)
    }

    /// Checks cross-field constraints and normalizes the symbol.
    pub fn validate(mut self) -> Result<Self, OptionsError> {
        self.symbol = self.symbol.trim().to_uppercase();
        if self.symbol.is_empty() {
            return Err(invalid("symbol", "must not be empty"));
        }
        for (field, value) in [
            ("sma_window", self.sma_window),
            ("rsi_span", self.rsi_span),
            ("snapshot_window", self.snapshot_window),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be at least 1"));
            }
        }
        if self.success_interval_secs == 0 {
            return Err(invalid("success_interval_secs", "must be positive"));
        }
        if self.retry_interval_secs == 0 {
            return Err(invalid("retry_interval_secs", "must be positive"));
        }
        if self.lookback_days == 0 {
            return Err(invalid("lookback_days", "must be positive"));
        }
        if self.bar_limit == 0 {
            return Err(invalid("bar_limit", "must be positive"));
        }
        // also rejects NaN thresholds
        if self.negative_threshold.partial_cmp(&self.positive_threshold) != Some(Ordering::Less) {
            return Err(invalid(
                "negative_threshold",
                format!(
                    "{} must be below positive_threshold {}",
                    self.negative_threshold, self.positive_threshold
                ),
            ));
        }
        if self.market_timezone.parse::<Tz>().is_err() {
            return Err(invalid(
                "market_timezone",
                format!("unknown IANA zone {:?}", self.market_timezone),
            ));
        }
        Ok(self)
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> OptionsError {
    OptionsError::Invalid {
        field,
        message: message.into(),
    }
}

/// Parse and validate options from a TOML string.
pub fn load_options_str(toml_str: &str) -> Result<MonitorOptions, OptionsError> {
    let options: MonitorOptions = toml::from_str(toml_str)?;
    options.validate()
}

/// Read an options TOML file from disk, parse, and validate it.
pub fn load_options_path(path: impl AsRef<std::path::Path>) -> Result<MonitorOptions, OptionsError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| OptionsError::Read {
        path: path.display().to_string(),
        source,
    })?;
    load_options_str(&text)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use market_data_ingestor::models::timeframe::TimeFrameUnit;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let options = load_options_str("").unwrap();
        assert_eq!(options.symbol, "SPY");
        assert_eq!(options.sma_window, 20);
        assert_eq!(options.rsi_span, 14);
        assert_eq!(options.snapshot_window, 60);
        assert_eq!(options.success_interval(), Duration::from_secs(60));
        assert_eq!(options.retry_interval(), Duration::from_secs(10));
        assert_eq!(options.headline_limit, 5);
        assert_eq!(options.positive_threshold, 0.1);
        assert_eq!(options.negative_threshold, -0.1);
        assert_eq!(options.market_tz(), chrono_tz::America::New_York);
    }

    #[test]
    fn partial_file_overrides_selected_fields() {
        let options = load_options_str(
            r#"
symbol = " qqq "
success_interval_secs = 30
data_feed = "sip"

[timeframe]
amount = 5
unit = "minute"
"#,
        )
        .unwrap();
        assert_eq!(options.symbol, "QQQ");
        assert_eq!(options.success_interval(), Duration::from_secs(30));
        assert_eq!(options.retry_interval(), Duration::from_secs(10));
        assert_eq!(options.data_feed, Feed::Sip);
        assert_eq!(options.timeframe.amount, 5);
        assert_eq!(options.timeframe.unit, TimeFrameUnit::Minute);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let err = load_options_str("positive_threshold = -0.2\nnegative_threshold = 0.2").unwrap_err();
        assert!(matches!(
            err,
            OptionsError::Invalid {
                field: "negative_threshold",
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_windows_and_bad_zone() {
        assert!(load_options_str("sma_window = 0").is_err());
        assert!(load_options_str("retry_interval_secs = 0").is_err());
        assert!(load_options_str("market_timezone = \"Mars/Olympus\"").is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            load_options_str("symbols = [\"SPY\"]"),
            Err(OptionsError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "symbol = \"DIA\"\nheadline_limit = 3").unwrap();
        let options = load_options_path(file.path()).unwrap();
        assert_eq!(options.symbol, "DIA");
        assert_eq!(options.headline_limit, 3);

        let missing = load_options_path("/definitely/not/here.toml");
        assert!(matches!(missing, Err(OptionsError::Read { .. })));
    }
}
