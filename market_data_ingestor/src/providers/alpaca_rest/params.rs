use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::models::{
    request_params::{BarsRequestParams, ProviderParams},
    timeframe::{TimeFrame, TimeFrameUnit},
};
use crate::providers::{ProviderError, ValidationSnafu};

/// Largest page Alpaca will serve in one response.
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// Specifies the corporate action adjustment for stock data.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    #[default]
    Raw,
    Split,
    Dividend,
    All,
}

/// Specifies the source feed for stock data.
///
/// Free accounts may only query `iex` for recent data.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    #[default]
    Sip,
    Iex,
    Otc,
}

/// Specifies the sort order for the bars.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    Asc,
    Desc,
}

/// Alpaca-specific parameters for a bars request.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AlpacaBarsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<Adjustment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<Feed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}

fn as_query_value<T: Serialize>(value: &T) -> String {
    // unit variants serialize to a plain JSON string
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Renders a timeframe the way the bars endpoint expects it (`5Min`, `1Hour`, ...).
pub fn format_timeframe(tf: &TimeFrame) -> String {
    let unit = match tf.unit {
        TimeFrameUnit::Minute => "Min",
        TimeFrameUnit::Hour => "Hour",
        TimeFrameUnit::Day => "Day",
        TimeFrameUnit::Week => "Week",
        TimeFrameUnit::Month => "Month",
    };
    format!("{}{}", tf.amount, unit)
}

/// Rejects request shapes the bars endpoint cannot serve.
pub fn validate_request(params: &BarsRequestParams) -> Result<(), ProviderError> {
    if params.symbols.is_empty() {
        return ValidationSnafu {
            message: "at least one symbol is required",
        }
        .fail();
    }
    if params.start >= params.end {
        return ValidationSnafu {
            message: format!("empty range: start {} >= end {}", params.start, params.end),
        }
        .fail();
    }
    if params.limit == Some(0) {
        return ValidationSnafu {
            message: "limit must be positive",
        }
        .fail();
    }
    Ok(())
}

/// Builds the query string for one page, without the page token.
pub fn construct_params(params: &BarsRequestParams) -> Vec<(String, String)> {
    let mut query = vec![
        ("symbols".to_string(), params.symbols.join(",")),
        ("timeframe".to_string(), format_timeframe(&params.timeframe)),
        (
            "start".to_string(),
            params.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        (
            "end".to_string(),
            params.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
    ];

    if let Some(limit) = params.limit {
        query.push(("limit".to_string(), limit.min(MAX_PAGE_SIZE).to_string()));
    }

    if let ProviderParams::Alpaca(alpaca) = &params.provider_specific {
        if let Some(adjustment) = &alpaca.adjustment {
            query.push(("adjustment".to_string(), as_query_value(adjustment)));
        }
        if let Some(feed) = &alpaca.feed {
            query.push(("feed".to_string(), as_query_value(feed)));
        }
        if let Some(currency) = &alpaca.currency {
            query.push(("currency".to_string(), currency.clone()));
        }
        if let Some(sort) = &alpaca.sort {
            query.push(("sort".to_string(), as_query_value(sort)));
        }
    }

    query
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::models::asset::AssetClass;

    fn request(provider_specific: ProviderParams) -> BarsRequestParams {
        let end = Utc.with_ymd_and_hms(2025, 3, 7, 21, 0, 0).unwrap();
        BarsRequestParams {
            symbols: vec!["SPY".into()],
            timeframe: TimeFrame::minute(),
            start: end - Duration::days(5),
            end,
            asset_class: AssetClass::UsEquity,
            limit: Some(390),
            provider_specific,
        }
    }

    fn lookup<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
        query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn formats_timeframes() {
        assert_eq!(format_timeframe(&TimeFrame::minute()), "1Min");
        assert_eq!(format_timeframe(&TimeFrame::hours(4).unwrap()), "4Hour");
        assert_eq!(format_timeframe(&TimeFrame::day()), "1Day");
    }

    #[test]
    fn query_includes_alpaca_options() {
        let query = construct_params(&request(ProviderParams::Alpaca(AlpacaBarsParams {
            feed: Some(Feed::Iex),
            sort: Some(Sort::Desc),
            ..Default::default()
        })));

        assert_eq!(lookup(&query, "symbols"), Some("SPY"));
        assert_eq!(lookup(&query, "timeframe"), Some("1Min"));
        assert_eq!(lookup(&query, "start"), Some("2025-03-02T21:00:00Z"));
        assert_eq!(lookup(&query, "limit"), Some("390"));
        assert_eq!(lookup(&query, "feed"), Some("iex"));
        assert_eq!(lookup(&query, "sort"), Some("desc"));
        assert_eq!(lookup(&query, "adjustment"), None);
    }

    #[test]
    fn validation_rejects_empty_range() {
        let mut req = request(ProviderParams::None);
        req.start = req.end;
        assert!(validate_request(&req).is_err());

        let mut req = request(ProviderParams::None);
        req.symbols.clear();
        assert!(validate_request(&req).is_err());

        assert!(validate_request(&request(ProviderParams::None)).is_ok());
    }
}
