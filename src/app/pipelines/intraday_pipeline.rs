use crate::app::pipelines::rows_to_csv;
use crate::config::toml_config::IntradayConfig;
use crate::core::intraday::screen;
use crate::core::report::intraday_message;
use crate::domain::model::{QuoteSnapshot, ScreenOutcome};
use crate::domain::ports::{MarketData, Notifier, Pipeline, Storage};
use crate::utils::error::Result;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Quote plus open interest for one symbol. A failed quote skips the symbol;
/// failed open interest is treated as unchanged.
async fn fetch_snapshot(market: &dyn MarketData, symbol: String) -> Option<QuoteSnapshot> {
    let quote = match market.quote(&symbol).await {
        Ok(quote) => quote,
        Err(e) => {
            tracing::debug!("Skipping {}: {}", symbol, e);
            return None;
        }
    };

    let open_interest = match market.futures_open_interest(&symbol).await {
        Ok(oi) => Some(oi),
        Err(e) => {
            tracing::debug!("No futures OI for {}: {}", symbol, e);
            None
        }
    };

    QuoteSnapshot::from_market(quote, open_interest)
}

pub struct IntradayPipeline<S: Storage> {
    market: Arc<dyn MarketData>,
    notifier: Arc<dyn Notifier>,
    storage: Option<S>,
    config: IntradayConfig,
    concurrent_requests: usize,
    today: NaiveDate,
}

impl<S: Storage> IntradayPipeline<S> {
    pub fn new(
        market: Arc<dyn MarketData>,
        notifier: Arc<dyn Notifier>,
        config: IntradayConfig,
        today: NaiveDate,
    ) -> Self {
        Self {
            market,
            notifier,
            storage: None,
            config,
            concurrent_requests: 1,
            today,
        }
    }

    pub fn with_storage(mut self, storage: S) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_concurrency(mut self, concurrent_requests: usize) -> Self {
        self.concurrent_requests = concurrent_requests.max(1);
        self
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for IntradayPipeline<S> {
    type Extracted = Vec<QuoteSnapshot>;
    type Transformed = ScreenOutcome;

    async fn extract(&self) -> Result<Vec<QuoteSnapshot>> {
        let symbols = self.market.index_constituents(&self.config.index).await?;
        let total = symbols.len();
        tracing::info!("📋 {} constituents in {}", total, self.config.index);

        // buffered() keeps index order, which the sector tie-break relies on
        let snapshots: Vec<QuoteSnapshot> = stream::iter(symbols)
            .map(|symbol| fetch_snapshot(self.market.as_ref(), symbol))
            .buffered(self.concurrent_requests)
            .filter_map(|snapshot| async move { snapshot })
            .collect()
            .await;

        if snapshots.len() < total {
            tracing::warn!("Skipped {} of {} symbols without a usable quote", total - snapshots.len(), total);
        }

        Ok(snapshots)
    }

    async fn transform(&self, data: Vec<QuoteSnapshot>) -> Result<ScreenOutcome> {
        let outcome = screen(data, &self.config);
        match &outcome {
            ScreenOutcome::Picks { sector, picks } => {
                tracing::info!("🟢 {} pick(s) in {}", picks.len(), sector)
            }
            other => tracing::info!("No picks today: {:?}", other),
        }
        Ok(outcome)
    }

    async fn load(&self, outcome: ScreenOutcome) -> Result<String> {
        let message = intraday_message(&outcome, &self.config, self.today);
        self.notifier.send_message(&message).await?;

        let mut summary = format!("{} intraday pick(s) for {}", outcome.picks().len(), self.today);

        if let Some(storage) = &self.storage {
            if !outcome.picks().is_empty() {
                let file_name = format!("intraday_picks_{}.csv", self.today.format("%Y-%m-%d"));
                let written = storage
                    .write_file(&file_name, &rows_to_csv(outcome.picks())?)
                    .await?;
                tracing::info!("📁 Picks saved to: {}", written);
                summary.push_str(&format!(", saved to {}", written));
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{EquityQuote, OpenInterest};
    use crate::utils::error::PicksError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeMarket {
        constituents: Vec<String>,
        quotes: HashMap<String, EquityQuote>,
        open_interest: HashMap<String, OpenInterest>,
    }

    impl FakeMarket {
        fn with(mut self, symbol: &str, prev: f64, last: f64, industry: &str, oi: Option<(f64, f64)>) -> Self {
            self.constituents.push(symbol.to_string());
            self.quotes.insert(
                symbol.to_string(),
                EquityQuote {
                    symbol: symbol.to_string(),
                    last_price: last,
                    previous_close: prev,
                    industry: industry.to_string(),
                },
            );
            if let Some((today, previous_day)) = oi {
                self.open_interest
                    .insert(symbol.to_string(), OpenInterest { today, previous_day });
            }
            self
        }
    }

    #[async_trait::async_trait]
    impl MarketData for FakeMarket {
        async fn index_constituents(&self, _index: &str) -> Result<Vec<String>> {
            Ok(self.constituents.clone())
        }

        async fn quote(&self, symbol: &str) -> Result<EquityQuote> {
            self.quotes.get(symbol).cloned().ok_or_else(|| PicksError::MarketDataError {
                symbol: symbol.to_string(),
                message: "no quote".to_string(),
            })
        }

        async fn futures_open_interest(&self, symbol: &str) -> Result<OpenInterest> {
            self.open_interest
                .get(symbol)
                .copied()
                .ok_or_else(|| PicksError::MarketDataError {
                    symbol: symbol.to_string(),
                    message: "no futures".to_string(),
                })
        }
    }

    #[derive(Default)]
    struct CapturingNotifier {
        messages: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Notifier for CapturingNotifier {
        async fn send_message(&self, text: &str) -> Result<()> {
            self.messages.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MemoryStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
            self.files.lock().unwrap().insert(path.to_string(), data.to_vec());
            Ok(format!("mem://{}", path))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[tokio::test]
    async fn test_extract_skips_symbols_without_quotes() {
        let mut market = FakeMarket::default()
            .with("SBIN", 100.0, 103.0, "Banks", Some((110.0, 100.0)))
            .with("INFY", 100.0, 101.0, "IT", None);
        market.constituents.push("DELISTED".to_string());

        let pipeline: IntradayPipeline<MemoryStorage> = IntradayPipeline::new(
            Arc::new(market),
            Arc::new(CapturingNotifier::default()),
            IntradayConfig::default(),
            today(),
        )
        .with_concurrency(3);

        let snapshots = pipeline.extract().await.unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].symbol, "SBIN");
        assert!((snapshots[0].pct_change - 3.0).abs() < 1e-9);
        assert!((snapshots[0].oi_pct_change - 10.0).abs() < 1e-9);
        // missing futures data counts as flat OI
        assert_eq!(snapshots[1].oi_pct_change, 0.0);
    }

    #[tokio::test]
    async fn test_load_sends_message_and_saves_csv() {
        let notifier = Arc::new(CapturingNotifier::default());
        let storage = MemoryStorage::default();
        let market = FakeMarket::default()
            .with("SBIN", 790.0, 812.35, "Banks", Some((1100.0, 1000.0)))
            .with("PNB", 100.0, 103.0, "Banks", Some((120.0, 100.0)))
            .with("BOB", 200.0, 205.0, "Banks", Some((108.0, 100.0)));

        let pipeline = IntradayPipeline::new(
            Arc::new(market),
            notifier.clone(),
            IntradayConfig::default(),
            today(),
        )
        .with_storage(storage.clone());

        let snapshots = pipeline.extract().await.unwrap();
        let outcome = pipeline.transform(snapshots).await.unwrap();
        let summary = pipeline.load(outcome).await.unwrap();

        assert!(summary.starts_with("3 intraday pick(s) for 2025-06-02"));
        let messages = notifier.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Sector in focus: *Banks*"));

        let files = storage.files.lock().unwrap();
        let csv = String::from_utf8(files["intraday_picks_2025-06-02.csv"].clone()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "symbol,entry,stop_loss,target,quantity,pct_change,oi_pct_change"
        );
        // PNB moved most (+3%), then SBIN (+2.83%), then BOB (+2.5%)
        assert!(lines.next().unwrap().starts_with("PNB,"));
        assert!(lines.next().unwrap().starts_with("SBIN,"));
        assert!(lines.next().unwrap().starts_with("BOB,"));
    }

    #[tokio::test]
    async fn test_no_picks_still_notifies_without_csv() {
        let notifier = Arc::new(CapturingNotifier::default());
        let storage = MemoryStorage::default();
        let market = FakeMarket::default().with("SBIN", 100.0, 100.5, "Banks", None);

        let pipeline = IntradayPipeline::new(
            Arc::new(market),
            notifier.clone(),
            IntradayConfig::default(),
            today(),
        )
        .with_storage(storage.clone());

        let snapshots = pipeline.extract().await.unwrap();
        let outcome = pipeline.transform(snapshots).await.unwrap();
        assert_eq!(outcome, ScreenOutcome::NoGainers);
        pipeline.load(outcome).await.unwrap();

        assert_eq!(
            notifier.messages.lock().unwrap()[0],
            "⏳ No stocks ≥ +2.0% at 09:30 on 2025-06-02."
        );
        assert!(storage.files.lock().unwrap().is_empty());
    }
}
