use crate::domain::model::{Candle, EquityQuote, OpenInterest};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

#[async_trait]
pub trait MarketData: Send + Sync {
    async fn index_constituents(&self, index: &str) -> Result<Vec<String>>;
    async fn quote(&self, symbol: &str) -> Result<EquityQuote>;
    async fn futures_open_interest(&self, symbol: &str) -> Result<OpenInterest>;
}

#[async_trait]
pub trait CandleSource: Send + Sync {
    /// `None` when the source has nothing usable for the instrument.
    async fn daily_candles(
        &self,
        instrument_key: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Option<Vec<Candle>>>;

    /// The current session's candle, if the market has opened.
    async fn session_candle(&self, instrument_key: &str) -> Result<Option<Candle>>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, text: &str) -> Result<()>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Send;
    type Transformed: Send;

    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    async fn load(&self, result: Self::Transformed) -> Result<String>;
}
