use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Last traded price and previous close for one equity, as NSE reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityQuote {
    pub symbol: String,
    pub last_price: f64,
    pub previous_close: f64,
    pub industry: String,
}

/// Aggregated futures open interest across all live contracts of a stock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenInterest {
    pub today: f64,
    pub previous_day: f64,
}

impl OpenInterest {
    pub fn pct_change(&self) -> f64 {
        if self.previous_day > 0.0 {
            (self.today - self.previous_day) / self.previous_day * 100.0
        } else {
            0.0
        }
    }
}

/// One symbol's state at the time of the scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub cmp: f64,
    pub pct_change: f64,
    pub industry: String,
    pub oi_pct_change: f64,
}

impl QuoteSnapshot {
    /// Returns `None` when the quote cannot yield a percentage change.
    /// Missing open interest counts as a 0% change.
    pub fn from_market(quote: EquityQuote, open_interest: Option<OpenInterest>) -> Option<Self> {
        if !quote.last_price.is_finite() || quote.previous_close <= 0.0 {
            return None;
        }

        let pct_change = (quote.last_price - quote.previous_close) / quote.previous_close * 100.0;

        Some(Self {
            symbol: quote.symbol,
            cmp: quote.last_price,
            pct_change,
            industry: quote.industry,
            oi_pct_change: open_interest.map(|oi| oi.pct_change()).unwrap_or(0.0),
        })
    }
}

/// A selected intraday trade with its risk plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradayPick {
    pub symbol: String,
    pub entry: f64,
    pub stop_loss: f64,
    pub target: f64,
    pub quantity: u64,
    pub pct_change: f64,
    pub oi_pct_change: f64,
}

/// Result of the intraday screen. Every variant except `Picks` explains
/// which filter emptied the candidate list.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenOutcome {
    NoGainers,
    NoMomentumSector,
    EmptySector { sector: String },
    NoOiConfirmation { sector: String },
    Picks { sector: String, picks: Vec<IntradayPick> },
}

impl ScreenOutcome {
    pub fn picks(&self) -> &[IntradayPick] {
        match self {
            ScreenOutcome::Picks { picks, .. } => picks,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_interest: f64,
}

impl Candle {
    pub fn is_green(&self) -> bool {
        self.close > self.open
    }

    pub fn is_red(&self) -> bool {
        self.close < self.open
    }
}

/// Instrument row of the symbols CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    pub instrument_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingSignal {
    pub symbol: String,
    pub entry: f64,
    pub stop_loss: f64,
    pub target: f64,
    pub rsi: f64,
    pub stop_loss_pct: f64,
    pub last_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SwingScan {
    pub scanned: usize,
    pub signals: Vec<SwingSignal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(last_price: f64, previous_close: f64) -> EquityQuote {
        EquityQuote {
            symbol: "SBIN".to_string(),
            last_price,
            previous_close,
            industry: "Banks".to_string(),
        }
    }

    #[test]
    fn test_snapshot_from_quote_and_oi() {
        let oi = OpenInterest {
            today: 110.0,
            previous_day: 100.0,
        };
        let snapshot = QuoteSnapshot::from_market(quote(103.0, 100.0), Some(oi)).unwrap();
        assert!((snapshot.pct_change - 3.0).abs() < 1e-9);
        assert!((snapshot.oi_pct_change - 10.0).abs() < 1e-9);
        assert_eq!(snapshot.cmp, 103.0);
    }

    #[test]
    fn test_non_positive_previous_close_has_no_snapshot() {
        assert!(QuoteSnapshot::from_market(quote(103.0, 0.0), None).is_none());
        assert!(QuoteSnapshot::from_market(quote(103.0, -5.0), None).is_none());
    }

    #[test]
    fn test_zero_previous_oi_counts_as_flat() {
        let oi = OpenInterest {
            today: 50.0,
            previous_day: 0.0,
        };
        assert_eq!(oi.pct_change(), 0.0);

        let snapshot = QuoteSnapshot::from_market(quote(103.0, 100.0), Some(oi)).unwrap();
        assert_eq!(snapshot.oi_pct_change, 0.0);
    }

    #[test]
    fn test_missing_oi_counts_as_flat() {
        let snapshot = QuoteSnapshot::from_market(quote(103.0, 100.0), None).unwrap();
        assert_eq!(snapshot.oi_pct_change, 0.0);
    }
}
