// Technical indicators module
// Every function returns a series aligned 1:1 with its input, NaN where not ready

pub mod atr;
pub mod bollinger;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod stochastic;

pub use atr::{atr_series, true_range};
pub use bollinger::{bollinger_series, BollingerBands};
pub use macd::{macd_series, Macd};
pub use moving_average::{ema_series, sma_series};
pub use rsi::rsi_series;
pub use stochastic::{stochastic_series, Stochastic};

/// Named, index-aligned indicator values
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub name: String,
    pub values: Vec<f64>,
}

impl IndicatorSeries {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Value at the most recent bar, NaN when empty or still warming up
    pub fn latest(&self) -> f64 {
        self.values.last().copied().unwrap_or(f64::NAN)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of leading NaN values
    pub fn warm_up(&self) -> usize {
        self.values.iter().take_while(|v| v.is_nan()).count()
    }
}

/// Trailing window reduction, NaN until the window is full or when it holds a NaN
pub(crate) fn rolling<F>(values: &[f64], window: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 {
        return out;
    }

    for end in window..=values.len() {
        let slice = &values[end - window..end];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[end - 1] = f(slice);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_on_empty_series_is_nan() {
        let series = IndicatorSeries::new("empty", Vec::new());
        assert!(series.latest().is_nan());
        assert!(series.is_empty());
    }

    #[test]
    fn test_warm_up_counts_leading_nans() {
        let series = IndicatorSeries::new("x", vec![f64::NAN, f64::NAN, 1.0, 2.0]);
        assert_eq!(series.warm_up(), 2);
        assert_eq!(series.latest(), 2.0);
    }

    #[test]
    fn test_rolling_skips_windows_with_nan() {
        let values = vec![f64::NAN, 1.0, 2.0, 3.0];
        let sums = rolling(&values, 2, |w| w.iter().sum());

        assert!(sums[0].is_nan());
        assert!(sums[1].is_nan());
        assert_eq!(sums[2], 3.0);
        assert_eq!(sums[3], 5.0);
    }
}
