use crate::config::toml_config::IntradayConfig;
use crate::domain::model::{IntradayPick, QuoteSnapshot, ScreenOutcome};
use std::collections::HashMap;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Industry with the most gainers, with its count. Ties go to the industry
/// that appears first in scan order.
pub fn dominant_sector(snapshots: &[QuoteSnapshot]) -> Option<(String, usize)> {
    // industry -> (count, first position)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, snapshot) in snapshots.iter().enumerate() {
        counts
            .entry(snapshot.industry.as_str())
            .or_insert((0, position))
            .0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (a_count, a_first)), (_, (b_count, b_first))| {
            a_count.cmp(b_count).then(b_first.cmp(a_first))
        })
        .map(|(sector, (count, _))| (sector.to_string(), count))
}

pub fn plan_trade(snapshot: &QuoteSnapshot, config: &IntradayConfig) -> IntradayPick {
    let entry = snapshot.cmp;
    let quantity = ((config.margin_per_trade * config.leverage) / entry).floor();

    IntradayPick {
        symbol: snapshot.symbol.clone(),
        entry,
        stop_loss: round2(entry * (1.0 - config.sl_factor)),
        target: round2(entry * (1.0 + config.target_factor)),
        quantity: if quantity.is_finite() && quantity > 0.0 {
            quantity as u64
        } else {
            0
        },
        pct_change: snapshot.pct_change,
        oi_pct_change: snapshot.oi_pct_change,
    }
}

/// Gainers filter, then momentum sector, then OI confirmation, then the top
/// movers by % change.
pub fn screen(snapshots: Vec<QuoteSnapshot>, config: &IntradayConfig) -> ScreenOutcome {
    let gainers: Vec<QuoteSnapshot> = snapshots
        .into_iter()
        .filter(|s| s.pct_change >= config.premarket_threshold)
        .collect();
    tracing::debug!("{} symbols at or above +{:.1}%", gainers.len(), config.premarket_threshold);

    if gainers.is_empty() {
        return ScreenOutcome::NoGainers;
    }

    let sector = match dominant_sector(&gainers) {
        Some((sector, count)) if count >= config.sector_min_count => sector,
        _ => return ScreenOutcome::NoMomentumSector,
    };
    tracing::debug!("Momentum sector: {}", sector);

    let in_sector: Vec<QuoteSnapshot> = gainers
        .into_iter()
        .filter(|s| s.industry == sector)
        .collect();
    if in_sector.is_empty() {
        return ScreenOutcome::EmptySector { sector };
    }

    let mut confirmed: Vec<QuoteSnapshot> = in_sector
        .into_iter()
        .filter(|s| s.oi_pct_change >= config.oi_threshold)
        .collect();
    if confirmed.is_empty() {
        return ScreenOutcome::NoOiConfirmation { sector };
    }

    // sort_by is stable, equal moves keep scan order
    confirmed.sort_by(|a, b| b.pct_change.total_cmp(&a.pct_change));
    confirmed.truncate(config.max_symbols_per_day);

    let picks = confirmed
        .iter()
        .map(|snapshot| plan_trade(snapshot, config))
        .collect();

    ScreenOutcome::Picks { sector, picks }
}
