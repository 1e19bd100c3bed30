//! Average True Range (ATR) indicator
//!
//! Measures market volatility by averaging true ranges over a trailing window.
//! True Range is the greatest of:
//! - Current High - Current Low
//! - Abs(Current High - Previous Close)
//! - Abs(Current Low - Previous Close)
//!
//! The first bar has no previous close and uses High - Low alone. The average
//! is a simple trailing mean, so the first `window - 1` values are undefined.

use super::{rolling, IndicatorSeries};
use crate::models::PriceBar;

/// Per-bar true range
pub fn true_range(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let range = bar.high - bar.low;
            match i.checked_sub(1).map(|prev| bars[prev].close) {
                Some(prev_close) => range
                    .max((bar.high - prev_close).abs())
                    .max((bar.low - prev_close).abs()),
                None => range,
            }
        })
        .collect()
}

/// ATR series aligned with `bars`
pub fn atr_series(bars: &[PriceBar], window: usize) -> IndicatorSeries {
    let tr = true_range(bars);
    let values = rolling(&tr, window, |w| w.iter().sum::<f64>() / w.len() as f64);
    IndicatorSeries::new(format!("ATR_{}", window), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn create_test_bars(prices: &[(f64, f64, f64, f64)]) -> Vec<PriceBar> {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| PriceBar {
                timestamp: start + Duration::minutes(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000.0,
                turnover: 1000.0 * close,
            })
            .collect()
    }

    #[test]
    fn test_true_range_uses_previous_close_gap() {
        let bars = create_test_bars(&[(100.0, 101.0, 99.0, 100.0), (108.0, 110.0, 107.0, 109.0)]);
        let tr = true_range(&bars);

        assert_eq!(tr[0], 2.0);
        // Gap up: high - prev close dominates
        assert_eq!(tr[1], 10.0);
    }

    #[test]
    fn test_atr_low_volatility() {
        let bars = create_test_bars(&[(100.0, 101.0, 99.0, 100.0); 15]);
        let atr = atr_series(&bars, 14);

        assert_eq!(atr.latest(), 2.0);
        assert_eq!(atr.warm_up(), 13);
    }

    #[test]
    fn test_atr_high_volatility() {
        let bars = create_test_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 110.0, 98.0, 105.0),
            (105.0, 108.0, 92.0, 95.0),
            (95.0, 103.0, 88.0, 100.0),
            (100.0, 115.0, 97.0, 110.0),
            (110.0, 112.0, 95.0, 98.0),
            (98.0, 108.0, 90.0, 105.0),
            (105.0, 120.0, 100.0, 115.0),
            (115.0, 118.0, 105.0, 110.0),
            (110.0, 125.0, 108.0, 120.0),
            (120.0, 130.0, 115.0, 125.0),
            (125.0, 128.0, 110.0, 115.0),
            (115.0, 122.0, 105.0, 118.0),
            (118.0, 130.0, 115.0, 125.0),
            (125.0, 135.0, 120.0, 130.0),
        ]);

        assert!(atr_series(&bars, 14).latest() > 10.0);
    }

    #[test]
    fn test_insufficient_data() {
        let bars = create_test_bars(&[(100.0, 101.0, 99.0, 100.0), (100.0, 101.0, 99.0, 100.0)]);
        let atr = atr_series(&bars, 14);

        assert!(atr.latest().is_nan());
        assert_eq!(atr.len(), 2);
    }
}
