use chrono::{DateTime, Utc};
use std::fmt;

use super::LoopState;
use crate::api::ExchangeGateway;
use crate::config::BotConfig;
use crate::models::{prepare_bars, OrderIntent, OrderReceipt};
use crate::risk::RiskSizer;
use crate::strategy::{IndicatorParams, IndicatorSnapshot, SignalEvaluator};

/// Which gateway read came back empty or failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    ClosedPositions,
    History,
    OpenOrders,
    Exposure,
    Price,
}

/// How a single cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Tracked order exceeded the position timeout and open orders were cancelled
    TimedOut { cancelled: usize, failed: usize },
    /// Last position closed too recently
    CoolingDown { remaining_secs: i64 },
    DataUnavailable(DataKind),
    /// Fewer bars than the active strategy needs
    CollectingData { have: usize, need: usize },
    /// A position or resting order already exists for the symbol
    ExposureOpen { positions: usize, orders: usize },
    NoSignal,
    /// Volatility measure missing or non-positive, bracket cannot be sized
    VolatilityUnavailable,
    /// Sizing refused the trade or produced an unusable bracket
    Rejected(String),
    OrderPlaced {
        intent: OrderIntent,
        receipt: OrderReceipt,
    },
    OrderFailed(String),
}

impl CycleOutcome {
    pub fn placed_order(&self) -> bool {
        matches!(self, CycleOutcome::OrderPlaced { .. })
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::TimedOut { cancelled, failed } => {
                write!(f, "timed out ({} cancelled, {} failed)", cancelled, failed)
            }
            CycleOutcome::CoolingDown { remaining_secs } => {
                write!(f, "cooling down ({}s left)", remaining_secs)
            }
            CycleOutcome::DataUnavailable(kind) => write!(f, "data unavailable: {:?}", kind),
            CycleOutcome::ExposureOpen { positions, orders } => write!(
                f,
                "exposure open ({} positions, {} orders)",
                positions, orders
            ),
            CycleOutcome::CollectingData { have, need } => {
                write!(f, "collecting data ({}/{} bars)", have, need)
            }
            CycleOutcome::NoSignal => write!(f, "no signal"),
            CycleOutcome::VolatilityUnavailable => write!(f, "volatility unavailable"),
            CycleOutcome::Rejected(reason) => write!(f, "rejected: {}", reason),
            CycleOutcome::OrderPlaced { intent, receipt } => write!(
                f,
                "order placed: {} {} {} (id {})",
                intent.side, intent.quantity, intent.symbol, receipt.order_id
            ),
            CycleOutcome::OrderFailed(reason) => write!(f, "order failed: {}", reason),
        }
    }
}

/// Per-cycle decision and order lifecycle for one symbol
///
/// Every cycle re-reads the exchange from scratch; `LoopState` is the only
/// thing remembered between cycles.
pub struct TradingEngine<G> {
    gateway: G,
    config: BotConfig,
    evaluator: SignalEvaluator,
    sizer: RiskSizer,
}

impl<G: ExchangeGateway> TradingEngine<G> {
    pub fn new(gateway: G, config: BotConfig) -> Self {
        let evaluator = SignalEvaluator::new(config.strategy, IndicatorParams::default());
        let sizer = RiskSizer::new(config.atr_multiplier, config.risk_ratio);

        Self {
            gateway,
            config,
            evaluator,
            sizer,
        }
    }

    pub fn with_evaluator(mut self, evaluator: SignalEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Run the gates in order; the first one that fires ends the cycle
    pub async fn run_cycle(&self, state: &mut LoopState, now: DateTime<Utc>) -> CycleOutcome {
        let symbol = self.config.trading_symbol.as_str();

        if state.is_timed_out(now, self.config.position_timeout()) {
            return self.cancel_stale_orders(state).await;
        }

        if let Some(outcome) = self.check_cooldown(now).await {
            return outcome;
        }

        let bars = match self
            .gateway
            .get_historical_bars(
                symbol,
                &self.config.trading_interval,
                self.config.trading_limit,
            )
            .await
        {
            Ok(bars) if !bars.is_empty() => prepare_bars(bars),
            Ok(_) => {
                tracing::warn!(symbol, "No historical data returned");
                return CycleOutcome::DataUnavailable(DataKind::History);
            }
            Err(e) => {
                tracing::warn!(symbol, error = %e, "Failed to retrieve historical data");
                return CycleOutcome::DataUnavailable(DataKind::History);
            }
        };

        let snapshot = IndicatorSnapshot::from_bars(&bars, self.evaluator.params());
        snapshot.log();

        let needed = self.evaluator.min_bars_required();
        if bars.len() < needed {
            tracing::info!(
                "Collecting data... ({}/{} bars for {})",
                bars.len(),
                needed,
                self.evaluator.kind()
            );
            return CycleOutcome::CollectingData {
                have: bars.len(),
                need: needed,
            };
        }

        if let Some(outcome) = self.check_exposure(state).await {
            return outcome;
        }

        let price = match self.gateway.get_realtime_price(symbol).await {
            Ok(price) if price.is_finite() && price > 0.0 => price,
            Ok(price) => {
                tracing::warn!(symbol, price, "Ignoring non-positive real-time price");
                return CycleOutcome::DataUnavailable(DataKind::Price);
            }
            Err(e) => {
                tracing::warn!(symbol, error = %e, "Failed to retrieve real-time price");
                return CycleOutcome::DataUnavailable(DataKind::Price);
            }
        };
        tracing::info!(symbol, price, "Current price");

        let signal = self.evaluator.evaluate(&snapshot);
        let side = match signal.side() {
            Some(side) => side,
            None => {
                tracing::info!("No suitable signals for position opening");
                return CycleOutcome::NoSignal;
            }
        };

        if !(snapshot.atr.is_finite() && snapshot.atr > 0.0) {
            tracing::warn!(atr = snapshot.atr, ?signal, "ATR not usable, skipping entry");
            return CycleOutcome::VolatilityUnavailable;
        }

        let bracket = match self.sizer.size(price, signal, snapshot.atr) {
            Ok(bracket) => bracket,
            Err(e) => {
                tracing::error!(error = %e, "Risk sizing failed");
                return CycleOutcome::Rejected(e.to_string());
            }
        };

        if !bracket.is_positive() {
            tracing::warn!(
                stop_loss = bracket.stop_loss,
                take_profit = bracket.take_profit,
                "Bracket has a non-positive leg, skipping entry"
            );
            return CycleOutcome::Rejected(format!(
                "non-positive bracket: stop {:.2}, target {:.2}",
                bracket.stop_loss, bracket.take_profit
            ));
        }

        // Legs go out rounded to the exchange tick, so check what is actually sent
        let ordered = bracket.is_ordered(price, signal)
            && bracket
                .rounded(self.config.price_decimals)
                .map_or(false, |rounded| rounded.is_ordered(price, signal));
        if !ordered {
            tracing::warn!(
                ?signal,
                price,
                stop_loss = bracket.stop_loss,
                take_profit = bracket.take_profit,
                "Bracket does not straddle the entry price, skipping entry"
            );
            return CycleOutcome::Rejected(format!(
                "bracket not ordered around {:.2}: stop {:.2}, target {:.2}",
                price, bracket.stop_loss, bracket.take_profit
            ));
        }

        let intent = OrderIntent {
            symbol: symbol.to_string(),
            side,
            quantity: self.config.trade_quantity,
            leverage: self.config.leverage,
            stop_loss: bracket.stop_loss,
            take_profit: bracket.take_profit,
        };

        tracing::info!(
            ?signal,
            side = %side,
            stop_loss = bracket.stop_loss,
            take_profit = bracket.take_profit,
            "Placing bracket order"
        );

        match self.gateway.place_order(&intent).await {
            Ok(receipt) => {
                tracing::info!(order_id = %receipt.order_id, "✅ Order successfully placed");
                state.record_order(now);
                CycleOutcome::OrderPlaced { intent, receipt }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to place order");
                CycleOutcome::OrderFailed(e.to_string())
            }
        }
    }

    /// Cancel every resting order for the symbol and forget the tracked order
    async fn cancel_stale_orders(&self, state: &mut LoopState) -> CycleOutcome {
        let symbol = self.config.trading_symbol.as_str();
        tracing::warn!(
            symbol,
            opened_at = ?state.last_order_opened_at,
            timeout_secs = self.config.position_timeout_secs,
            "⏰ Order timeout reached, cancelling open orders"
        );

        // Keep tracking if we cannot even list the orders; next tick retries
        let orders = match self.gateway.get_open_orders(symbol).await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(symbol, error = %e, "Failed to list open orders for cancellation");
                return CycleOutcome::DataUnavailable(DataKind::OpenOrders);
            }
        };

        let mut cancelled = 0;
        let mut failed = 0;
        for order in &orders {
            match self.gateway.cancel_order(&order.order_id, symbol).await {
                Ok(()) => {
                    tracing::info!(order_id = %order.order_id, "Cancelled order");
                    cancelled += 1;
                }
                Err(e) => {
                    tracing::error!(order_id = %order.order_id, error = %e, "Failed to cancel order");
                    failed += 1;
                }
            }
        }

        state.clear();
        CycleOutcome::TimedOut { cancelled, failed }
    }

    async fn check_cooldown(&self, now: DateTime<Utc>) -> Option<CycleOutcome> {
        let symbol = self.config.trading_symbol.as_str();

        let last_closed = match self.gateway.get_last_closed_position(symbol).await {
            Ok(Some(last_closed)) => last_closed,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(symbol, error = %e, "Failed to retrieve last closed position");
                return Some(CycleOutcome::DataUnavailable(DataKind::ClosedPositions));
            }
        };

        let elapsed = now - last_closed.closed_at;
        tracing::debug!(
            symbol,
            elapsed_secs = elapsed.num_seconds(),
            "Time since last closed position"
        );

        if elapsed < self.config.cooldown() {
            let remaining_secs = (self.config.cooldown() - elapsed).num_seconds();
            tracing::info!(
                symbol,
                remaining_secs,
                "Last position closed {}s ago, waiting for cooldown",
                elapsed.num_seconds()
            );
            return Some(CycleOutcome::CoolingDown { remaining_secs });
        }

        None
    }

    /// Never stack exposure: any position or resting order ends the cycle
    async fn check_exposure(&self, state: &mut LoopState) -> Option<CycleOutcome> {
        let symbol = self.config.trading_symbol.as_str();

        let positions = match self.gateway.get_open_positions(symbol).await {
            Ok(positions) => positions,
            Err(e) => {
                tracing::warn!(symbol, error = %e, "Failed to retrieve open positions");
                return Some(CycleOutcome::DataUnavailable(DataKind::Exposure));
            }
        };
        if !positions.is_empty() {
            tracing::info!(symbol, count = positions.len(), "Position already open, not placing a new order");
            return Some(CycleOutcome::ExposureOpen {
                positions: positions.len(),
                orders: 0,
            });
        }

        let orders = match self.gateway.get_open_orders(symbol).await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::warn!(symbol, error = %e, "Failed to retrieve open orders");
                return Some(CycleOutcome::DataUnavailable(DataKind::Exposure));
            }
        };
        if !orders.is_empty() {
            tracing::info!(symbol, count = orders.len(), "Open order pending, not placing a new order");
            return Some(CycleOutcome::ExposureOpen {
                positions: 0,
                orders: orders.len(),
            });
        }

        if state.last_order_opened_at.is_some() {
            tracing::info!(symbol, "Tracked position closed, clearing order timer");
            state.clear();
        }

        None
    }
}
