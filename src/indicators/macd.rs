use super::{ema_series, IndicatorSeries};

/// MACD line and its signal line
#[derive(Debug, Clone)]
pub struct Macd {
    pub macd: IndicatorSeries,
    pub signal: IndicatorSeries,
}

/// Moving Average Convergence Divergence
///
/// `macd = EMA(fast) - EMA(slow)`, `signal = EMA(signal_span)` of the macd line.
/// The signal EMA seeds on the first defined macd value.
pub fn macd_series(closes: &[f64], fast: usize, slow: usize, signal_span: usize) -> Macd {
    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);

    let line: Vec<f64> = fast_ema
        .values
        .iter()
        .zip(slow_ema.values.iter())
        .map(|(f, s)| f - s)
        .collect();

    let signal = ema_series(&line, signal_span).values;

    Macd {
        macd: IndicatorSeries::new("MACD", line),
        signal: IndicatorSeries::new("MACD_signal", signal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_warm_up() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let macd = macd_series(&closes, 12, 26, 9);

        assert_eq!(macd.macd.warm_up(), 25);
        assert_eq!(macd.signal.warm_up(), 33);
        assert_eq!(macd.macd.len(), 40);
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let macd = macd_series(&closes, 12, 26, 9);

        // Fast EMA lags less than slow EMA when prices rise
        assert!(macd.macd.latest() > 0.0);
        assert!(macd.signal.latest() > 0.0);
    }

    #[test]
    fn test_macd_short_history_not_ready() {
        let closes = vec![100.0; 20];
        let macd = macd_series(&closes, 12, 26, 9);
        assert!(macd.macd.latest().is_nan());
        assert!(macd.signal.latest().is_nan());
    }
}
