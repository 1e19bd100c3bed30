use crate::models::{RiskBracket, Signal};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RiskError {
    #[error("invalid direction {0:?}: bracket needs Long or Short")]
    InvalidDirection(Signal),
}

/// ATR-scaled stop-loss / take-profit sizing
///
/// `distance = atr_multiplier * volatility`; the stop sits one distance
/// against the trade and the target `reward_ratio` distances in its favour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSizer {
    pub atr_multiplier: f64,
    pub reward_ratio: f64,
}

impl Default for RiskSizer {
    fn default() -> Self {
        Self {
            atr_multiplier: 1.5,
            reward_ratio: 1.5,
        }
    }
}

impl RiskSizer {
    pub fn new(atr_multiplier: f64, reward_ratio: f64) -> Self {
        Self {
            atr_multiplier,
            reward_ratio,
        }
    }

    /// Size a bracket around `reference_price`.
    ///
    /// `volatility` must be finite and positive; callers check this before
    /// sizing.
    pub fn size(
        &self,
        reference_price: f64,
        direction: Signal,
        volatility: f64,
    ) -> Result<RiskBracket, RiskError> {
        let distance = self.atr_multiplier * volatility;

        match direction {
            Signal::Long => Ok(RiskBracket {
                stop_loss: reference_price - distance,
                take_profit: reference_price + distance * self.reward_ratio,
            }),
            Signal::Short => Ok(RiskBracket {
                stop_loss: reference_price + distance,
                take_profit: reference_price - distance * self.reward_ratio,
            }),
            Signal::None => Err(RiskError::InvalidDirection(direction)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_bracket() {
        let sizer = RiskSizer::new(1.5, 1.5);
        let bracket = sizer.size(100.0, Signal::Long, 2.0).unwrap();

        assert_eq!(bracket.stop_loss, 97.0);
        assert_eq!(bracket.take_profit, 104.5);
    }

    #[test]
    fn test_short_bracket() {
        let sizer = RiskSizer::new(1.5, 1.5);
        let bracket = sizer.size(100.0, Signal::Short, 2.0).unwrap();

        assert_eq!(bracket.stop_loss, 103.0);
        assert_eq!(bracket.take_profit, 95.5);
    }

    #[test]
    fn test_none_direction_rejected() {
        let sizer = RiskSizer::default();
        let result = sizer.size(100.0, Signal::None, 2.0);

        assert_eq!(result, Err(RiskError::InvalidDirection(Signal::None)));
    }

    #[test]
    fn test_bracket_ordering_holds_across_inputs() {
        let sizer = RiskSizer::new(2.0, 3.0);

        for &price in &[0.5, 10.0, 100.0, 65_000.0] {
            for &atr in &[0.001, 0.1, 0.2, 1.0] {
                let long = sizer.size(price, Signal::Long, atr).unwrap();
                assert!(long.stop_loss < price && price < long.take_profit);

                let short = sizer.size(price, Signal::Short, atr).unwrap();
                assert!(short.take_profit < price && price < short.stop_loss);
            }
        }
    }

    #[test]
    fn test_zero_multiplier_collapses_to_price() {
        let sizer = RiskSizer::new(0.0, 1.5);
        let bracket = sizer.size(100.0, Signal::Long, 2.0).unwrap();

        assert_eq!(bracket.stop_loss, 100.0);
        assert_eq!(bracket.take_profit, 100.0);
    }
}
