/// Trailing simple moving average. Slots before the first full window are `None`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, value) in values.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= values[i - window];
        }
        out.push(if i + 1 >= window {
            Some(sum / window as f64)
        } else {
            None
        });
    }
    out
}

/// RSI over simple rolling averages of gains and losses (not Wilder smoothing).
/// The first bar has no change and counts as neither gain nor loss.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        let delta = if i == 0 { 0.0 } else { closes[i] - closes[i - 1] };
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));
    }

    rolling_mean(&gains, period)
        .into_iter()
        .zip(rolling_mean(&losses, period))
        .map(|(gain, loss)| match (gain, loss) {
            (Some(gain), Some(loss)) if loss > 0.0 => Some(100.0 - 100.0 / (1.0 + gain / loss)),
            (Some(gain), Some(_)) if gain > 0.0 => Some(100.0),
            // flat window, RSI undefined
            _ => None,
        })
        .collect()
}
