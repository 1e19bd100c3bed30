use super::{rolling, IndicatorSeries};

/// Calculate Relative Strength Index (RSI)
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions. Gains and losses are averaged with a
/// simple trailing mean over `period` price changes.
///
/// The first `period` values are NaN (a change needs a previous close), and so
/// is any bar whose average loss is zero: the ratio is undefined there and the
/// caller must not read it as a tradable 100.
pub fn rsi_series(closes: &[f64], period: usize) -> IndicatorSeries {
    let name = format!("RSI_{}", period);
    if closes.is_empty() {
        return IndicatorSeries::new(name, Vec::new());
    }

    // Change at index 0 has no previous close
    let mut gains = vec![f64::NAN; closes.len()];
    let mut losses = vec![f64::NAN; closes.len()];
    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        gains[i] = change.max(0.0);
        losses[i] = (-change).max(0.0);
    }

    let mean = |w: &[f64]| w.iter().sum::<f64>() / w.len() as f64;
    let avg_gain = rolling(&gains, period, mean);
    let avg_loss = rolling(&losses, period, mean);

    let values = avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(&gain, &loss)| {
            if gain.is_nan() || loss.is_nan() || loss == 0.0 {
                f64::NAN
            } else {
                let rs = gain / loss;
                100.0 - (100.0 / (1.0 + rs))
            }
        })
        .collect();

    IndicatorSeries::new(name, values)
}
