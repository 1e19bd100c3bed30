use super::snapshot::IndicatorSnapshot;
use crate::models::Signal;

/// RSI midline separating bullish from bearish momentum
pub const RSI_MIDLINE: f64 = 50.0;

// Scalping thresholds
const STOCH_OVERSOLD: f64 = 20.0;
const STOCH_OVERBOUGHT: f64 = 80.0;
const SCALP_RSI_LONG_MAX: f64 = 45.0;
const SCALP_RSI_SHORT_MIN: f64 = 55.0;

/// Conditions evaluated for each direction on the latest bar
#[derive(Debug, Clone, Default)]
pub struct Conditions {
    pub long: Vec<(&'static str, bool)>,
    pub short: Vec<(&'static str, bool)>,
}

impl Conditions {
    /// All long conditions AND-ed against all short conditions.
    ///
    /// Both directions holding at once is contradictory and yields `None`.
    pub fn resolve(&self) -> Signal {
        let long = !self.long.is_empty() && self.long.iter().all(|(_, ok)| *ok);
        let short = !self.short.is_empty() && self.short.iter().all(|(_, ok)| *ok);

        match (long, short) {
            (true, false) => Signal::Long,
            (false, true) => Signal::Short,
            (true, true) => {
                tracing::warn!("Contradictory long/short conditions, treating as no signal");
                Signal::None
            }
            (false, false) => Signal::None,
        }
    }

    fn extend(&mut self, other: Conditions) {
        self.long.extend(other.long);
        self.short.extend(other.short);
    }

    pub fn describe(&self) -> String {
        let fmt = |conds: &[(&str, bool)]| {
            conds
                .iter()
                .map(|(name, ok)| format!("{}={}", name, ok))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!("LONG[{}] SHORT[{}]", fmt(&self.long), fmt(&self.short))
    }
}

/// Fast/slow EMA position plus RSI confirmation
pub fn ema_rsi_conditions(s: &IndicatorSnapshot) -> Conditions {
    Conditions {
        long: vec![
            ("EMA_fast<EMA_slow", s.ema_fast < s.ema_slow),
            ("RSI<50", s.rsi < RSI_MIDLINE),
        ],
        short: vec![
            ("EMA_fast>EMA_slow", s.ema_fast > s.ema_slow),
            ("RSI>50", s.rsi > RSI_MIDLINE),
        ],
    }
}

/// EMA/RSI confirmed by MACD, stochastic and Bollinger position
pub fn confluence_conditions(s: &IndicatorSnapshot) -> Conditions {
    let mut conditions = ema_rsi_conditions(s);
    conditions.extend(Conditions {
        long: vec![
            ("MACD>signal", s.macd > s.macd_signal),
            ("%K>%D", s.stoch_k > s.stoch_d),
            ("close<BB_mid", s.close < s.bollinger_middle),
        ],
        short: vec![
            ("MACD<signal", s.macd < s.macd_signal),
            ("%K<%D", s.stoch_k < s.stoch_d),
            ("close>BB_mid", s.close > s.bollinger_middle),
        ],
    });
    conditions
}

/// Stochastic extremes turning back, with RSI and band-side filters
pub fn scalping_conditions(s: &IndicatorSnapshot) -> Conditions {
    Conditions {
        long: vec![
            ("%K<20", s.stoch_k < STOCH_OVERSOLD),
            ("%K>%D", s.stoch_k > s.stoch_d),
            ("RSI<45", s.rsi < SCALP_RSI_LONG_MAX),
            ("close<BB_mid", s.close < s.bollinger_middle),
        ],
        short: vec![
            ("%K>80", s.stoch_k > STOCH_OVERBOUGHT),
            ("%K<%D", s.stoch_k < s.stoch_d),
            ("RSI>55", s.rsi > SCALP_RSI_SHORT_MIN),
            ("close>BB_mid", s.close > s.bollinger_middle),
        ],
    }
}
