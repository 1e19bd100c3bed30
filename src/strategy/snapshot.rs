use crate::indicators::{
    atr_series, bollinger_series, ema_series, macd_series, rsi_series, stochastic_series,
};
use crate::models::PriceBar;

/// Indicator periods used to build a snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub fast_ema: usize,
    pub slow_ema: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub stoch_k: usize,
    pub stoch_d: usize,
    pub bollinger_window: usize,
    pub bollinger_std: f64,
    pub atr_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            fast_ema: 9,
            slow_ema: 21,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            stoch_k: 14,
            stoch_d: 3,
            bollinger_window: 20,
            bollinger_std: 2.0,
            atr_period: 14,
        }
    }
}

/// Latest value of every indicator the strategies read
///
/// Any field may be NaN while its indicator is still warming up.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub bollinger_upper: f64,
    pub bollinger_middle: f64,
    pub bollinger_lower: f64,
    pub atr: f64,
}

impl IndicatorSnapshot {
    /// Compute all series over `bars` (ascending) and keep the last values
    pub fn from_bars(bars: &[PriceBar], params: &IndicatorParams) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let macd = macd_series(&closes, params.macd_fast, params.macd_slow, params.macd_signal);
        let stoch = stochastic_series(bars, params.stoch_k, params.stoch_d);
        let bands = bollinger_series(&closes, params.bollinger_window, params.bollinger_std);

        Self {
            close: closes.last().copied().unwrap_or(f64::NAN),
            ema_fast: ema_series(&closes, params.fast_ema).latest(),
            ema_slow: ema_series(&closes, params.slow_ema).latest(),
            rsi: rsi_series(&closes, params.rsi_period).latest(),
            macd: macd.macd.latest(),
            macd_signal: macd.signal.latest(),
            stoch_k: stoch.k.latest(),
            stoch_d: stoch.d.latest(),
            bollinger_upper: bands.upper.latest(),
            bollinger_middle: bands.middle.latest(),
            bollinger_lower: bands.lower.latest(),
            atr: atr_series(bars, params.atr_period).latest(),
        }
    }

    /// Emit the snapshot at info level
    pub fn log(&self) {
        tracing::info!(
            close = self.close,
            ema_fast = self.ema_fast,
            ema_slow = self.ema_slow,
            rsi = self.rsi,
            macd = self.macd,
            macd_signal = self.macd_signal,
            stoch_k = self.stoch_k,
            stoch_d = self.stoch_d,
            bb_upper = self.bollinger_upper,
            bb_middle = self.bollinger_middle,
            bb_lower = self.bollinger_lower,
            atr = self.atr,
            "Indicators"
        );
    }
}
