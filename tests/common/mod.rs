#![allow(dead_code)]

use httpmock::prelude::*;
use httpmock::Mock;
use nse_picks::AppConfig;
use serde_json::json;

pub const BOT_TOKEN: &str = "123456:test-bot-token";
pub const CHAT_ID: &str = "-100987654321";

pub struct Stock {
    pub symbol: &'static str,
    pub previous_close: f64,
    pub last_price: f64,
    pub industry: &'static str,
    /// (open interest, change in open interest) for the futures contract
    pub futures: Option<(f64, f64)>,
}

pub fn stock(
    symbol: &'static str,
    previous_close: f64,
    last_price: f64,
    industry: &'static str,
    futures: Option<(f64, f64)>,
) -> Stock {
    Stock {
        symbol,
        previous_close,
        last_price,
        industry,
        futures,
    }
}

/// Banks lead with three gainers confirmed by OI; IT has one gainer.
pub fn banking_morning() -> Vec<Stock> {
    vec![
        stock("SBIN", 790.0, 812.35, "Banks", Some((1100.0, 100.0))),
        stock("INFY", 1500.0, 1530.0, "IT - Software", None),
        stock("PNB", 100.0, 103.0, "Banks", Some((120.0, 20.0))),
        stock("TCS", 3000.0, 3010.0, "IT - Software", Some((500.0, 50.0))),
        stock("BOB", 200.0, 205.0, "Banks", Some((108.0, 8.0))),
    ]
}

/// Mocks the home page, the index listing, and quote/derivative routes for
/// every stock. Returns the index listing mock.
pub fn mock_nse<'a>(server: &'a MockServer, index: &str, stocks: &[Stock]) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body("<html></html>");
    });

    let mut rows = vec![json!({ "symbol": index })];
    rows.extend(stocks.iter().map(|s| json!({ "symbol": s.symbol })));
    let listing = server.mock(|when, then| {
        when.method(GET)
            .path("/api/equity-stockIndices")
            .query_param("index", index);
        then.status(200).json_body(json!({ "name": index, "data": rows }));
    });

    for s in stocks {
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/quote-equity")
                .query_param("symbol", s.symbol);
            then.status(200).json_body(json!({
                "info": { "symbol": s.symbol, "industry": s.industry },
                "priceInfo": { "lastPrice": s.last_price, "previousClose": s.previous_close }
            }));
        });

        let stocks_json = match s.futures {
            Some((oi, change)) => json!([
                {
                    "metadata": { "instrumentType": "Stock Futures" },
                    "marketDeptOrderBook": {
                        "tradeInfo": { "openInterest": oi, "changeinOpenInterest": change }
                    }
                }
            ]),
            None => json!([]),
        };
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/quote-derivative")
                .query_param("symbol", s.symbol);
            then.status(200).json_body(json!({ "stocks": stocks_json }));
        });
    }

    listing
}

pub fn mock_telegram(server: &MockServer) -> Mock<'_> {
    server.mock(|when, then| {
        when.method(POST).path(format!("/bot{}/sendMessage", BOT_TOKEN));
        then.status(200).json_body(json!({ "ok": true }));
    })
}

pub fn secrets(name: &str) -> Option<String> {
    match name {
        "TELEGRAM_BOT_TOKEN" => Some(BOT_TOKEN.to_string()),
        "TELEGRAM_CHAT_ID" => Some(CHAT_ID.to_string()),
        "UPSTOX_ACCESS_TOKEN" => Some("upstox-test-token".to_string()),
        _ => None,
    }
}

pub fn config_for(nse: &MockServer, telegram: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.nse.base_url = nse.base_url();
    config.nse.timeout_seconds = 5;
    config.telegram.api_base = telegram.base_url();
    config.telegram.timeout_seconds = 5;
    config
}
