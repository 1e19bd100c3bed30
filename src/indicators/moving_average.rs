use super::{rolling, IndicatorSeries};

/// Simple Moving Average over a trailing window
pub fn sma_series(values: &[f64], window: usize) -> IndicatorSeries {
    let out = rolling(values, window, |w| w.iter().sum::<f64>() / w.len() as f64);
    IndicatorSeries::new(format!("SMA_{}", window), out)
}

/// Exponential Moving Average
///
/// Seeded with the first finite value, then
/// `avg[i] = avg[i-1] + alpha * (x[i] - avg[i-1])` with `alpha = 2 / (span + 1)`.
/// The recursion runs from the seed but the first `span - 1` values are
/// reported as NaN so short histories never look ready.
pub fn ema_series(values: &[f64], span: usize) -> IndicatorSeries {
    let name = format!("EMA_{}", span);
    let mut out = vec![f64::NAN; values.len()];

    let start = match values.iter().position(|v| v.is_finite()) {
        Some(idx) if span > 0 => idx,
        _ => return IndicatorSeries::new(name, out),
    };

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut avg = values[start];

    for (i, &value) in values.iter().enumerate().skip(start) {
        if i > start {
            avg += alpha * (value - avg);
        }
        if i + 1 >= start + span {
            out[i] = avg;
        }
    }

    IndicatorSeries::new(name, out)
}
