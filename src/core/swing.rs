//! 44-SMA bounce setup on daily candles.

use crate::config::toml_config::SwingConfig;
use crate::core::indicators::{rolling_mean, rsi};
use crate::core::intraday::round2;
use crate::domain::model::{Candle, SwingSignal};

/// Candles with their indicator columns.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub candles: Vec<Candle>,
    pub sma: Vec<Option<f64>>,
    pub volume_avg: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
}

impl IndicatorFrame {
    pub fn compute(candles: Vec<Candle>, config: &SwingConfig) -> Self {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

        Self {
            sma: rolling_mean(&closes, config.ma_period),
            volume_avg: rolling_mean(&volumes, config.volume_period),
            rsi: rsi(&closes, config.rsi_period),
            candles,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

/// Degrees of the SMA's rise over `lookback` bars, with the rise taken as a
/// percentage so that prices of different magnitude compare.
pub fn slope_angle(sma_now: f64, sma_then: f64, lookback: usize) -> f64 {
    let pct_rise = (sma_now - sma_then) / sma_then * 100.0;
    pct_rise.atan2(lookback as f64).to_degrees()
}

pub fn check_signal(symbol: &str, frame: &IndicatorFrame, config: &SwingConfig) -> Option<SwingSignal> {
    let n = frame.len();
    if n < config.min_candles.max(3) || config.slope_lookback == 0 || config.slope_lookback > n {
        return None;
    }

    let (last, prev, prev2) = (n - 1, n - 2, n - 3);
    let row = &frame.candles[last];
    let sma = frame.sma[last]?;
    let rsi = frame.rsi[last]?;

    if !(config.rsi_min..=config.rsi_max).contains(&rsi) {
        return None;
    }

    if let Some(volume_avg) = frame.volume_avg[last] {
        if row.volume <= volume_avg {
            return None;
        }
    }

    let angle = slope_angle(sma, frame.sma[n - config.slope_lookback]?, config.slope_lookback);
    if angle < config.min_slope_angle {
        return None;
    }
    tracing::debug!("{} is in an uptrend (angle {:.2}°)", symbol, angle);

    let band = |price: f64| price * (1.0 + config.support_tolerance);

    // A: green candle dips into the SMA band and closes above the SMA
    let bounce = row.is_green() && row.low <= band(sma) && row.close > sma;

    // B: two red candles, one of which tagged the band, then a green candle
    // clearing the previous high while staying above the band
    let reclaim = {
        let p = &frame.candles[prev];
        let p2 = &frame.candles[prev2];
        let touched = |i: usize, c: &Candle| frame.sma[i].is_some_and(|s| c.low <= band(s));
        row.is_green()
            && row.close > p.high
            && row.low > band(sma)
            && p.is_red()
            && p2.is_red()
            && (touched(prev, p) || touched(prev2, p2))
    };

    if !(bounce || reclaim) {
        return None;
    }

    let entry = row.high;
    let stop_loss = row.low.min(sma).max(entry * 0.98);
    let target = entry + (entry - stop_loss) * 2.0;

    Some(SwingSignal {
        symbol: symbol.to_string(),
        entry: round2(entry),
        stop_loss: round2(stop_loss),
        target: round2(target),
        rsi: round2(rsi),
        stop_loss_pct: round2((entry - stop_loss) / entry * 100.0),
        last_date: row.timestamp.date_naive(),
    })
}
