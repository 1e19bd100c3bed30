use super::{sma_series, IndicatorSeries};
use crate::models::PriceBar;

#[derive(Debug, Clone)]
pub struct Stochastic {
    pub k: IndicatorSeries,
    pub d: IndicatorSeries,
}

/// Stochastic oscillator (%K and its %D smoothing)
///
/// `%K = 100 * (close - lowest low) / (highest high - lowest low)` over the
/// last `k_period` bars. A flat window has no range and yields NaN.
pub fn stochastic_series(bars: &[PriceBar], k_period: usize, d_period: usize) -> Stochastic {
    let mut k = vec![f64::NAN; bars.len()];

    if k_period > 0 {
        for end in k_period..=bars.len() {
            let window = &bars[end - k_period..end];
            let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let range = highest - lowest;
            if range > 0.0 {
                k[end - 1] = 100.0 * (bars[end - 1].close - lowest) / range;
            }
        }
    }

    let d = sma_series(&k, d_period).values;

    Stochastic {
        k: IndicatorSeries::new("Stochastic", k),
        d: IndicatorSeries::new("Stochastic_signal", d),
    }
}
