use chrono::{Duration, Utc};
use market_data_ingestor::{
    models::{
        asset::AssetClass,
        request_params::{BarsRequestParams, ProviderParams},
        timeframe::TimeFrame,
    },
    providers::{
        DataProvider,
        alpaca_rest::{
            AlpacaProvider,
            params::{AlpacaBarsParams, Feed, Sort},
        },
    },
};
use serial_test::serial;

#[tokio::test]
#[serial]
#[ignore]
async fn test_alpaca_provider_fetches_latest_minute_bars() {
    let _ = dotenvy::dotenv();
    // This test requires APCA_API_KEY_ID and APCA_API_SECRET_KEY to be set in the environment.
    if std::env::var("APCA_API_KEY_ID").is_err() || std::env::var("APCA_API_SECRET_KEY").is_err() {
        println!("Skipping test_alpaca_provider_fetches_latest_minute_bars: API keys not set.");
        return;
    }

    let provider = AlpacaProvider::new().expect("Failed to create AlpacaProvider");

    let end = Utc::now();
    let params = BarsRequestParams {
        symbols: vec!["SPY".to_string()],
        timeframe: TimeFrame::minute(),
        start: end - Duration::days(5),
        end,
        asset_class: AssetClass::UsEquity,
        limit: Some(60),
        provider_specific: ProviderParams::Alpaca(AlpacaBarsParams {
            feed: Some(Feed::Iex),
            sort: Some(Sort::Desc),
            ..Default::default()
        }),
    };

    let result = provider.fetch_bars(params).await;
    assert!(result.is_ok(), "fetch_bars returned an error: {:?}", result.err());

    let series_vec = result.unwrap();
    assert_eq!(series_vec.len(), 1, "Expected 1 BarSeries for SPY");

    let spy = &series_vec[0];
    assert_eq!(spy.symbol, "SPY");
    assert!(!spy.bars.is_empty(), "Expected at least one bar for SPY");
    assert!(spy.bars.len() <= 60, "Expected at most 60 bars due to limit");

    // Requested descending, but the provider hands back ascending series.
    assert!(spy.bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}
