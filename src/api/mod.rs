pub mod bybit;

pub use bybit::BybitClient;

use async_trait::async_trait;

use crate::models::{ClosedPosition, Order, OrderIntent, OrderReceipt, Position, PriceBar};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("exchange error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("no data returned for {0}")]
    Empty(String),

    #[error("failed to sign request: {0}")]
    Signing(String),
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Exchange operations the trading loop depends on
///
/// Implementations talk to one venue for a single account. Every call is
/// awaited to completion before the loop moves on.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Recent bars, ascending by timestamp with duplicates removed
    async fn get_historical_bars(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> GatewayResult<Vec<PriceBar>>;

    async fn get_realtime_price(&self, symbol: &str) -> GatewayResult<f64>;

    /// Positions with non-zero size (empty = flat)
    async fn get_open_positions(&self, symbol: &str) -> GatewayResult<Vec<Position>>;

    async fn get_open_orders(&self, symbol: &str) -> GatewayResult<Vec<Order>>;

    /// Most recently closed position, if any
    async fn get_last_closed_position(&self, symbol: &str)
        -> GatewayResult<Option<ClosedPosition>>;

    async fn place_order(&self, intent: &OrderIntent) -> GatewayResult<OrderReceipt>;

    async fn cancel_order(&self, order_id: &str, symbol: &str) -> GatewayResult<()>;
}
