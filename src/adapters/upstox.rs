use crate::config::secrets::UpstoxSecrets;
use crate::config::toml_config::SwingConfig;
use crate::domain::model::Candle;
use crate::domain::ports::CandleSource;
use crate::utils::error::{PicksError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandleResponse {
    data: CandleData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandleData {
    candles: Vec<Vec<serde_json::Value>>,
}

/// `[timestamp, open, high, low, close, volume, oi]`
fn parse_candle(row: &[serde_json::Value]) -> Result<Candle> {
    let bad = |message: String| PicksError::ProcessingError { message };

    let timestamp = row
        .first()
        .and_then(|v| v.as_str())
        .ok_or_else(|| bad(format!("candle row without timestamp: {:?}", row)))?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|e| bad(format!("bad candle timestamp '{}': {}", timestamp, e)))?;

    let number = |i: usize| {
        row.get(i)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| bad(format!("candle row missing column {}: {:?}", i, row)))
    };

    Ok(Candle {
        timestamp,
        open: number(1)?,
        high: number(2)?,
        low: number(3)?,
        close: number(4)?,
        volume: number(5)?,
        open_interest: row.get(6).and_then(|v| v.as_f64()).unwrap_or(0.0),
    })
}

/// Oldest first.
fn parse_candles(body: CandleResponse) -> Result<Vec<Candle>> {
    let mut candles = body
        .data
        .candles
        .iter()
        .map(|row| parse_candle(row))
        .collect::<Result<Vec<_>>>()?;
    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

/// Instrument keys look like `NSE_EQ|INE002A01018`; the pipe must be escaped in a path.
fn encode_key(instrument_key: &str) -> String {
    instrument_key.replace('|', "%7C")
}

pub struct UpstoxClient {
    client: Client,
    base_url: String,
    secrets: UpstoxSecrets,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl UpstoxClient {
    pub fn new(config: &SwingConfig, secrets: UpstoxSecrets) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secrets,
            retry_attempts: config.retry_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Retries transport failures with a linearly growing pause. HTTP error
    /// statuses are returned as-is.
    async fn get_with_retry(&self, url: &str) -> Result<Response> {
        let mut attempt = 1;
        loop {
            let result = self
                .client
                .get(url)
                .header("Accept", "application/json")
                .bearer_auth(self.secrets.access_token.expose())
                .send()
                .await;

            match result {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.retry_attempts => {
                    tracing::warn!(
                        "Network error (attempt {}/{}): {}",
                        attempt,
                        self.retry_attempts,
                        e
                    );
                    tokio::time::sleep(self.retry_delay * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn fetch(&self, url: &str, instrument_key: &str) -> Result<Option<Vec<Candle>>> {
        let response = self.get_with_retry(url).await?;
        if response.status() != StatusCode::OK {
            tracing::debug!("{} returned HTTP {}", instrument_key, response.status());
            return Ok(None);
        }

        let candles = parse_candles(response.json().await?)?;
        Ok(if candles.is_empty() { None } else { Some(candles) })
    }
}

#[async_trait]
impl CandleSource for UpstoxClient {
    async fn daily_candles(
        &self,
        instrument_key: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Option<Vec<Candle>>> {
        let url = format!(
            "{}/{}/days/1/{}/{}",
            self.base_url,
            encode_key(instrument_key),
            to.format("%Y-%m-%d"),
            from.format("%Y-%m-%d")
        );
        self.fetch(&url, instrument_key).await
    }

    async fn session_candle(&self, instrument_key: &str) -> Result<Option<Candle>> {
        let url = format!("{}/intraday/{}/days/1", self.base_url, encode_key(instrument_key));
        Ok(self
            .fetch(&url, instrument_key)
            .await?
            .and_then(|candles| candles.into_iter().last()))
    }
}
