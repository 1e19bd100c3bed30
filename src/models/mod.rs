use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLCV bar as returned by the exchange kline endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub turnover: f64,
}

/// Directional verdict for a single cycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    Long,
    Short,
    None,
}

impl Signal {
    /// Order side for an actionable signal
    pub fn side(self) -> Option<Side> {
        match self {
            Signal::Long => Some(Side::Buy),
            Signal::Short => Some(Side::Sell),
            Signal::None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stop-loss / take-profit pair attached to an entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskBracket {
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl RiskBracket {
    pub fn is_positive(&self) -> bool {
        self.stop_loss > 0.0 && self.take_profit > 0.0
    }

    /// Stop and target strictly on opposite sides of `reference_price`
    pub fn is_ordered(&self, reference_price: f64, direction: Signal) -> bool {
        match direction {
            Signal::Long => self.stop_loss < reference_price && reference_price < self.take_profit,
            Signal::Short => self.take_profit < reference_price && reference_price < self.stop_loss,
            Signal::None => false,
        }
    }

    /// Both legs rounded to `decimals` places, as they are sent to the exchange
    pub fn rounded(&self, decimals: u32) -> Option<RiskBracket> {
        let round = |value: f64| {
            Decimal::from_f64_retain(value).and_then(|d| d.round_dp(decimals).to_f64())
        };

        Some(RiskBracket {
            stop_loss: round(self.stop_loss)?,
            take_profit: round(self.take_profit)?,
        })
    }
}

/// Bracketed market order to submit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub leverage: u32,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Open position on the exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    pub size: f64,
    pub entry_price: f64,
    pub leverage: f64,
}

/// Resting (not yet filled or cancelled) order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub order_id: String,
    pub symbol: String,
    pub side: Side,
    pub qty: f64,
    pub price: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClosedPosition {
    pub symbol: String,
    pub closed_at: DateTime<Utc>,
    pub closed_pnl: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderReceipt {
    pub order_id: String,
    pub order_link_id: String,
}

/// Sort bars ascending by timestamp and collapse duplicate timestamps.
///
/// When the exchange returns the same bar twice (e.g. the still-forming
/// candle across two pages) the later occurrence wins.
pub fn prepare_bars(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    // Stable sort keeps the original order among equal timestamps
    bars.sort_by_key(|b| b.timestamp);

    let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_bracket_ordering() {
        let long = RiskBracket {
            stop_loss: 97.0,
            take_profit: 104.5,
        };
        assert!(long.is_ordered(100.0, Signal::Long));
        assert!(!long.is_ordered(100.0, Signal::Short));
        assert!(!long.is_ordered(100.0, Signal::None));

        let collapsed = RiskBracket {
            stop_loss: 100.0,
            take_profit: 100.0,
        };
        assert!(!collapsed.is_ordered(100.0, Signal::Long));
        assert!(!collapsed.is_ordered(100.0, Signal::Short));
    }

    #[test]
    fn test_rounding_can_collapse_bracket() {
        let tight = RiskBracket {
            stop_loss: 99.998,
            take_profit: 100.003,
        };
        assert!(tight.is_ordered(100.0, Signal::Long));

        let rounded = tight.rounded(2).unwrap();
        assert_eq!(rounded.stop_loss, 100.0);
        assert_eq!(rounded.take_profit, 100.0);
        assert!(!rounded.is_ordered(100.0, Signal::Long));

        assert!(RiskBracket {
            stop_loss: f64::NAN,
            take_profit: 1.0
        }
        .rounded(2)
        .is_none());
    }

    fn bar(minute: i64, close: f64) -> PriceBar {
        PriceBar {
            timestamp: Utc.timestamp_opt(1_700_000_000 + minute * 60, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
            turnover: close,
        }
    }

    #[test]
    fn test_prepare_bars_sorts_ascending() {
        let bars = vec![bar(2, 102.0), bar(0, 100.0), bar(1, 101.0)];
        let prepared = prepare_bars(bars);

        let closes: Vec<f64> = prepared.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![100.0, 101.0, 102.0]);
    }

    #[test]
    fn test_prepare_bars_deduplicates_last_wins() {
        let bars = vec![bar(1, 101.0), bar(0, 100.0), bar(1, 105.0)];
        let prepared = prepare_bars(bars);

        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[1].close, 105.0);
    }

    #[test]
    fn test_signal_side() {
        assert_eq!(Signal::Long.side(), Some(Side::Buy));
        assert_eq!(Signal::Short.side(), Some(Side::Sell));
        assert_eq!(Signal::None.side(), None);
    }

    #[test]
    fn test_bracket_positive() {
        let ok = RiskBracket { stop_loss: 97.0, take_profit: 104.5 };
        let bad = RiskBracket { stop_loss: -1.0, take_profit: 104.5 };
        assert!(ok.is_positive());
        assert!(!bad.is_positive());
    }
}
