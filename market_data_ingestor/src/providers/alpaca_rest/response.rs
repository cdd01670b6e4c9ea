use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::models::bar::Bar;

#[derive(Deserialize, Debug)]
pub struct AlpacaBar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
    #[serde(rename = "n", default)]
    pub trade_count: Option<u64>,
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
}

impl From<AlpacaBar> for Bar {
    fn from(ab: AlpacaBar) -> Self {
        Bar {
            timestamp: ab.timestamp,
            open: ab.open,
            high: ab.high,
            low: ab.low,
            close: ab.close,
            volume: ab.volume,
            trade_count: ab.trade_count,
            vwap: ab.vwap,
        }
    }
}

/// One page of the multi-symbol bars response.
///
/// Alpaca sends `"bars": null` instead of an empty object when nothing matched.
#[derive(Deserialize, Debug)]
pub struct AlpacaResponse {
    #[serde(default)]
    pub bars: Option<IndexMap<String, Vec<AlpacaBar>>>,
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_with_token() {
        let body = r#"{
            "bars": {
                "SPY": [
                    {"t":"2025-03-07T20:59:00Z","o":575.1,"h":575.4,"l":574.9,"c":575.2,"v":120345,"n":1803,"vw":575.18},
                    {"t":"2025-03-07T20:58:00Z","o":575.0,"h":575.2,"l":574.8,"c":575.1,"v":98001,"n":1500,"vw":575.02}
                ]
            },
            "next_page_token": "U1BZfE0"
        }"#;
        let page: AlpacaResponse = serde_json::from_str(body).unwrap();
        let bars = page.bars.unwrap();
        assert_eq!(bars["SPY"].len(), 2);
        assert_eq!(page.next_page_token.as_deref(), Some("U1BZfE0"));

        let bar: Bar = bars.into_iter().next().unwrap().1.remove(0).into();
        assert_eq!(bar.close, 575.2);
        assert_eq!(bar.trade_count, Some(1803));
    }

    #[test]
    fn parses_null_bars() {
        let page: AlpacaResponse =
            serde_json::from_str(r#"{"bars":null,"next_page_token":null}"#).unwrap();
        assert!(page.bars.is_none());
        assert!(page.next_page_token.is_none());
    }
}
