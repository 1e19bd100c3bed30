// Trading strategy module
pub mod signals;
pub mod snapshot;

pub use snapshot::{IndicatorParams, IndicatorSnapshot};

use crate::models::Signal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategy variant selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Fast/slow EMA with RSI confirmation
    #[default]
    EmaRsi,
    /// EMA/RSI plus MACD, stochastic and Bollinger confirmations
    MultiIndicatorConfluence,
    /// Stochastic extremes for short holding periods
    Scalping,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::EmaRsi => "ema_rsi",
            StrategyKind::MultiIndicatorConfluence => "multi_indicator_confluence",
            StrategyKind::Scalping => "scalping",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "ema_rsi" => Ok(StrategyKind::EmaRsi),
            "multi_indicator_confluence" | "confluence" => {
                Ok(StrategyKind::MultiIndicatorConfluence)
            }
            "scalping" => Ok(StrategyKind::Scalping),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

/// Turns the latest indicator values into a directional verdict
#[derive(Debug, Clone)]
pub struct SignalEvaluator {
    kind: StrategyKind,
    params: IndicatorParams,
}

impl SignalEvaluator {
    pub fn new(kind: StrategyKind, params: IndicatorParams) -> Self {
        Self { kind, params }
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Minimum bars before every indicator this strategy reads is defined
    pub fn min_bars_required(&self) -> usize {
        let p = &self.params;
        let ema_rsi = p.slow_ema.max(p.fast_ema).max(p.rsi_period + 1);
        let macd = p.macd_slow.max(p.macd_fast) + p.macd_signal - 1;
        let stoch = p.stoch_k + p.stoch_d - 1;

        let needed = match self.kind {
            StrategyKind::EmaRsi => ema_rsi,
            StrategyKind::MultiIndicatorConfluence => {
                ema_rsi.max(macd).max(stoch).max(p.bollinger_window)
            }
            StrategyKind::Scalping => stoch.max(p.rsi_period + 1).max(p.bollinger_window),
        };
        needed.max(p.atr_period)
    }

    /// Values the active strategy reads; a NaN in any of them blocks evaluation
    fn required_values(&self, s: &IndicatorSnapshot) -> Vec<f64> {
        match self.kind {
            StrategyKind::EmaRsi => vec![s.ema_fast, s.ema_slow, s.rsi],
            StrategyKind::MultiIndicatorConfluence => vec![
                s.ema_fast,
                s.ema_slow,
                s.rsi,
                s.macd,
                s.macd_signal,
                s.stoch_k,
                s.stoch_d,
                s.close,
                s.bollinger_middle,
            ],
            StrategyKind::Scalping => {
                vec![s.stoch_k, s.stoch_d, s.rsi, s.close, s.bollinger_middle]
            }
        }
    }

    /// Evaluate the latest bar
    pub fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Signal {
        if self.required_values(snapshot).iter().any(|v| v.is_nan()) {
            tracing::info!(strategy = %self.kind, "Indicators not ready, no signal");
            return Signal::None;
        }

        let conditions = match self.kind {
            StrategyKind::EmaRsi => signals::ema_rsi_conditions(snapshot),
            StrategyKind::MultiIndicatorConfluence => signals::confluence_conditions(snapshot),
            StrategyKind::Scalping => signals::scalping_conditions(snapshot),
        };

        let signal = conditions.resolve();
        tracing::debug!(strategy = %self.kind, ?signal, "{}", conditions.describe());
        signal
    }
}

impl Default for SignalEvaluator {
    fn default() -> Self {
        Self::new(StrategyKind::default(), IndicatorParams::default())
    }
}
