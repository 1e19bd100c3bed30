use super::{rolling, sma_series, IndicatorSeries};

#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
}

/// Bollinger Bands: SMA middle line +/- `num_std` sample standard deviations
pub fn bollinger_series(closes: &[f64], window: usize, num_std: f64) -> BollingerBands {
    let middle = sma_series(closes, window).values;
    let std_dev = rolling(closes, window, sample_std_dev);

    let upper = middle
        .iter()
        .zip(std_dev.iter())
        .map(|(m, s)| m + num_std * s)
        .collect();
    let lower = middle
        .iter()
        .zip(std_dev.iter())
        .map(|(m, s)| m - num_std * s)
        .collect();

    BollingerBands {
        upper: IndicatorSeries::new("Bollinger_upper", upper),
        middle: IndicatorSeries::new("Bollinger_middle", middle),
        lower: IndicatorSeries::new("Bollinger_lower", lower),
    }
}

fn sample_std_dev(window: &[f64]) -> f64 {
    if window.len() < 2 {
        return f64::NAN;
    }
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}
