//! Telegram Markdown (v1) bodies for the scan outcomes.

use crate::config::toml_config::IntradayConfig;
use crate::domain::model::{IntradayPick, ScreenOutcome, SwingScan};
use chrono::NaiveDate;

const RISK_RULES: &str = "\n⚠️ *Remember:*  \n \
• Place a *Bracket‐Order* if your broker supports it (Groww, AngelOne, Dhan).  \n \
• If no BO, place market/limit buy → set SL at above SL.  \n \
• Move SL to breakeven at +1.5 %; trail SL by -1 % once +2 % hits.  \n \
• *Exit all positions by 10:30 AM* if neither SL nor target is hit.  \n \
• Stop trading for the day if you lose 2 full SLs (~₹1,500–₹2,000).";

fn pick_block(pick: &IntradayPick, leverage: f64) -> String {
    format!(
        "🔹 *{sym}*  \n   Entry: *{entry:.2}*  \n   SL: *{sl:.2}*  |  Target₁: *{tgt:.2}*  \n   OI Δ: *{oi:.2}%*  \n   Qty (@{lev}× Lev): *{qty}*  \n• At +1.5 % → move SL → *{entry:.2}*\n• At +2 % → trail SL = (current_price × 0.99)\n",
        sym = pick.symbol,
        entry = pick.entry,
        sl = pick.stop_loss,
        tgt = pick.target,
        oi = pick.oi_pct_change,
        lev = leverage,
        qty = pick.quantity,
    )
}

pub fn intraday_message(outcome: &ScreenOutcome, config: &IntradayConfig, date: NaiveDate) -> String {
    let date = date.format("%Y-%m-%d");
    match outcome {
        ScreenOutcome::NoGainers => format!(
            "⏳ No stocks ≥ +{:.1}% at 09:30 on {}.",
            config.premarket_threshold, date
        ),
        ScreenOutcome::NoMomentumSector => format!(
            "⚠️ No sector has ≥ {} stocks with +{:.1}% at 09:30.\nDate: {}",
            config.sector_min_count, config.premarket_threshold, date
        ),
        ScreenOutcome::EmptySector { sector } => {
            format!("⚠️ After sector filter, 0 stocks remain in {}.", sector)
        }
        ScreenOutcome::NoOiConfirmation { sector } => format!(
            "⚠️ No stocks in sector '{}' have OI Δ ≥ {:.1}% at 09:30.\nDate: {}",
            sector, config.oi_threshold, date
        ),
        ScreenOutcome::Picks { sector, picks } => {
            let header = format!(
                "🟢 *9:30 Intraday Picks for {}*\nSector in focus: *{}*\n\n",
                date, sector
            );
            let blocks: Vec<String> = picks
                .iter()
                .map(|pick| pick_block(pick, config.leverage))
                .collect();
            format!("{}{}{}", header, blocks.join("\n"), RISK_RULES)
        }
    }
}

pub fn swing_message(scan: &SwingScan, date: NaiveDate) -> String {
    if scan.signals.is_empty() {
        return format!("📉 Scan Complete ({}): No signals found.", date.format("%Y-%m-%d"));
    }

    let mut msg = format!("📢 *SWING TRADE SIGNALS ({})*\n\n", date.format("%Y-%m-%d"));
    for signal in &scan.signals {
        msg.push_str(&format!(
            "🚀 *{}*\n   Entry > {:.2}\n   SL: {:.2} ({:.2}%) | Tgt: {:.2}\n   RSI: {:.2}\n   Last Candle: {}\n\n",
            signal.symbol,
            signal.entry,
            signal.stop_loss,
            signal.stop_loss_pct,
            signal.target,
            signal.rsi,
            signal.last_date.format("%Y-%m-%d"),
        ));
    }
    msg.push_str(&format!("Scanned {} symbols.", scan.scanned));
    msg
}
