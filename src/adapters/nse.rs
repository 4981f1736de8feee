//! NSE public JSON API.
//!
//! The site rejects requests without a browser-like header set and the
//! session cookies handed out on the home page, so the client keeps a cookie
//! store and visits `/` once before the first API call.

use crate::config::toml_config::NseConfig;
use crate::domain::model::{EquityQuote, OpenInterest};
use crate::domain::ports::MarketData;
use crate::utils::error::{PicksError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const STOCK_FUTURES: &str = "Stock Futures";

#[derive(Debug, Deserialize)]
struct IndexResponse {
    #[serde(default)]
    data: Vec<IndexEntry>,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    symbol: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QuoteResponse {
    info: Option<QuoteInfo>,
    price_info: Option<PriceInfo>,
    industry_info: Option<IndustryInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteInfo {
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PriceInfo {
    last_price: Option<f64>,
    previous_close: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IndustryInfo {
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DerivativeResponse {
    stocks: Vec<DerivativeStock>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DerivativeStock {
    metadata: DerivativeMetadata,
    market_dept_order_book: OrderBook,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DerivativeMetadata {
    instrument_type: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct OrderBook {
    trade_info: TradeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TradeInfo {
    open_interest: f64,
    changein_open_interest: f64,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub struct NseClient {
    client: Client,
    base_url: String,
    session: OnceCell<()>,
}

impl NseClient {
    pub fn new(config: &NseConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let base_url = config.base_url.trim_end_matches('/').to_string();
        if let Ok(referer) = HeaderValue::from_str(&format!("{}/", base_url)) {
            headers.insert(REFERER, referer);
        }

        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url,
            session: OnceCell::new(),
        })
    }

    /// Best effort: a failed visit is logged and the API call still goes ahead.
    async fn ensure_session(&self) {
        self.session
            .get_or_init(|| async {
                tracing::debug!("Priming NSE session cookies");
                match self.client.get(format!("{}/", self.base_url)).send().await {
                    Ok(response) => {
                        tracing::debug!("NSE home page status: {}", response.status())
                    }
                    Err(e) => tracing::warn!("⚠️ Could not prime NSE session: {}", e),
                }
            })
            .await;
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)], symbol: &str) -> Result<T> {
        self.ensure_session().await;

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {} {:?}", url, query);
        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PicksError::MarketDataError {
                symbol: symbol.to_string(),
                message: format!("{} returned HTTP {}", path, status),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MarketData for NseClient {
    async fn index_constituents(&self, index: &str) -> Result<Vec<String>> {
        let response: IndexResponse = self
            .get_json("/api/equity-stockIndices", &[("index", index)], index)
            .await?;

        // 第一筆通常是指數本身
        let symbols: Vec<String> = response
            .data
            .into_iter()
            .map(|entry| entry.symbol)
            .filter(|symbol| !symbol.eq_ignore_ascii_case(index))
            .collect();

        if symbols.is_empty() {
            return Err(PicksError::MarketDataError {
                symbol: index.to_string(),
                message: "index has no constituents".to_string(),
            });
        }

        tracing::debug!("{} has {} constituents", index, symbols.len());
        Ok(symbols)
    }

    async fn quote(&self, symbol: &str) -> Result<EquityQuote> {
        let response: QuoteResponse = self
            .get_json("/api/quote-equity", &[("symbol", symbol)], symbol)
            .await?;

        let price = response.price_info.unwrap_or_default();
        let (last_price, previous_close) = match (price.last_price, price.previous_close) {
            (Some(last), Some(prev)) => (last, prev),
            _ => {
                return Err(PicksError::MarketDataError {
                    symbol: symbol.to_string(),
                    message: "quote has no lastPrice/previousClose".to_string(),
                })
            }
        };

        let industry = non_empty(response.info.and_then(|i| i.industry))
            .or_else(|| non_empty(response.industry_info.and_then(|i| i.industry)))
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(EquityQuote {
            symbol: symbol.to_string(),
            last_price,
            previous_close,
            industry,
        })
    }

    async fn futures_open_interest(&self, symbol: &str) -> Result<OpenInterest> {
        let response: DerivativeResponse = self
            .get_json("/api/quote-derivative", &[("symbol", symbol)], symbol)
            .await?;

        let futures: Vec<&TradeInfo> = response
            .stocks
            .iter()
            .filter(|s| s.metadata.instrument_type == STOCK_FUTURES)
            .map(|s| &s.market_dept_order_book.trade_info)
            .collect();

        if futures.is_empty() {
            return Err(PicksError::MarketDataError {
                symbol: symbol.to_string(),
                message: "no stock futures contracts".to_string(),
            });
        }

        let today: f64 = futures.iter().map(|t| t.open_interest).sum();
        let change: f64 = futures.iter().map(|t| t.changein_open_interest).sum();

        Ok(OpenInterest {
            today,
            previous_day: today - change,
        })
    }
}
