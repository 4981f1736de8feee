use crate::app::pipelines::rows_to_csv;
use crate::config::toml_config::SwingConfig;
use crate::core::report::swing_message;
use crate::core::swing::{check_signal, IndicatorFrame};
use crate::domain::model::{Candle, Instrument, SwingScan};
use crate::domain::ports::{CandleSource, Notifier, Pipeline, Storage};
use crate::utils::error::{PicksError, Result};
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct InstrumentRow {
    instrument_key: String,
    #[serde(default)]
    tradingsymbol: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
}

/// Reads `instrument_key` plus `tradingsymbol` (or `symbol`) rows. Rows
/// without any symbol are skipped.
pub fn load_instruments<P: AsRef<Path>>(path: P) -> Result<Vec<Instrument>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PicksError::ConfigError {
            message: format!("{} not found", path.display()),
        });
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut instruments = Vec::new();
    for row in reader.deserialize::<InstrumentRow>() {
        let row = row?;
        let symbol = [row.tradingsymbol, row.symbol]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty());

        match symbol {
            Some(symbol) => instruments.push(Instrument {
                symbol,
                instrument_key: row.instrument_key.trim().to_string(),
            }),
            None => tracing::warn!("Skipping {} without a symbol", row.instrument_key),
        }
    }

    Ok(instruments)
}

/// Extract reads the instrument list. Transform fetches candles symbol by
/// symbol so the scan can stop as soon as enough signals are found.
pub struct SwingPipeline<S: Storage> {
    candles: Arc<dyn CandleSource>,
    notifier: Arc<dyn Notifier>,
    storage: Option<S>,
    config: SwingConfig,
    today: NaiveDate,
}

impl<S: Storage> SwingPipeline<S> {
    pub fn new(
        candles: Arc<dyn CandleSource>,
        notifier: Arc<dyn Notifier>,
        config: SwingConfig,
        today: NaiveDate,
    ) -> Self {
        Self {
            candles,
            notifier,
            storage: None,
            config,
            today,
        }
    }

    pub fn with_storage(mut self, storage: S) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Daily history up to yesterday, plus today's candle when the session
    /// has one.
    async fn history(&self, instrument: &Instrument) -> Option<Vec<Candle>> {
        let to = self.today - Duration::days(1);
        let from = to - Duration::days(self.config.history_days);

        let mut candles = match self
            .candles
            .daily_candles(&instrument.instrument_key, from, to)
            .await
        {
            Ok(Some(candles)) => candles,
            Ok(None) => {
                tracing::debug!("No history for {}", instrument.symbol);
                return None;
            }
            Err(e) => {
                tracing::warn!("Error fetching {}: {}", instrument.symbol, e);
                return None;
            }
        };

        match self.candles.session_candle(&instrument.instrument_key).await {
            Ok(Some(today)) if candles.last().map_or(true, |last| today.timestamp > last.timestamp) => {
                candles.push(today)
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("No session candle for {}: {}", instrument.symbol, e),
        }

        if let Some(last) = candles.last() {
            tracing::debug!("{} last candle: {}", instrument.symbol, last.timestamp.date_naive());
        }
        Some(candles)
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for SwingPipeline<S> {
    type Extracted = Vec<Instrument>;
    type Transformed = SwingScan;

    async fn extract(&self) -> Result<Vec<Instrument>> {
        let instruments = load_instruments(&self.config.symbols_csv)?;
        tracing::info!("🚀 Starting scan for {} symbols", instruments.len());
        Ok(instruments)
    }

    async fn transform(&self, instruments: Vec<Instrument>) -> Result<SwingScan> {
        let mut scan = SwingScan::default();
        let pause = std::time::Duration::from_millis(self.config.api_sleep_ms);

        for instrument in &instruments {
            if scan.signals.len() >= self.config.max_signals {
                tracing::info!("Max signal limit reached. Stopping scan.");
                break;
            }
            if scan.scanned > 0 && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            scan.scanned += 1;

            let Some(candles) = self.history(instrument).await else {
                continue;
            };

            let frame = IndicatorFrame::compute(candles, &self.config);
            if let Some(signal) = check_signal(&instrument.symbol, &frame, &self.config) {
                tracing::info!("🔔 SIGNAL FOUND: {}", instrument.symbol);
                scan.signals.push(signal);
            }
        }

        tracing::info!(
            "Scan finished | Scanned: {} | Signals: {}",
            scan.scanned,
            scan.signals.len()
        );
        Ok(scan)
    }

    async fn load(&self, scan: SwingScan) -> Result<String> {
        self.notifier
            .send_message(&swing_message(&scan, self.today))
            .await?;

        let mut summary = format!(
            "{} swing signal(s) from {} symbols",
            scan.signals.len(),
            scan.scanned
        );

        if let Some(storage) = &self.storage {
            if !scan.signals.is_empty() {
                let file_name = format!("swing_signals_{}.csv", self.today.format("%Y-%m-%d"));
                let written = storage
                    .write_file(&file_name, &rows_to_csv(&scan.signals)?)
                    .await?;
                tracing::info!("📁 Signals saved to: {}", written);
                summary.push_str(&format!(", saved to {}", written));
            }
        }

        Ok(summary)
    }
}
