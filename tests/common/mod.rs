#![allow(dead_code)]

use async_trait::async_trait;
use bracketbot::api::{ExchangeGateway, GatewayError, GatewayResult};
use bracketbot::models::{
    ClosedPosition, Order, OrderIntent, OrderReceipt, Position, PriceBar, Side,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Mutex;

pub fn t0() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// Bars from closes; one minute apart, ending one minute before `t0()`
pub fn create_test_bars(closes: &[f64]) -> Vec<PriceBar> {
    let start = t0() - Duration::minutes(closes.len() as i64);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                timestamp: start + Duration::minutes(i as i64),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume: 10.0,
                turnover: 10.0 * close,
            }
        })
        .collect()
}

/// Oscillating climb then a sharp drop: fast EMA dips under slow, RSI below 50
pub fn long_setup_closes() -> Vec<f64> {
    let mut closes = vec![100.0];
    for i in 1..29 {
        let last = closes[closes.len() - 1];
        closes.push(if i % 2 == 1 { last + 1.0 } else { last - 0.8 });
    }
    let last = closes[closes.len() - 1];
    closes.push(last - 6.0);
    closes
}

pub fn short_setup_closes() -> Vec<f64> {
    long_setup_closes().iter().map(|c| 200.0 - c).collect()
}

/// Steady uptrend with a drop on the last bar: EMAs say short, RSI says long
pub fn no_signal_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..29).map(|i| 100.0 + i as f64).collect();
    closes.push(128.0 - 15.0);
    closes
}

pub fn create_test_order(order_id: &str) -> Order {
    Order {
        order_id: order_id.to_string(),
        symbol: "BTCUSDT".to_string(),
        side: Side::Buy,
        qty: 0.03,
        price: 0.0,
        status: "New".to_string(),
        created_at: t0(),
    }
}

pub fn create_test_position() -> Position {
    Position {
        symbol: "BTCUSDT".to_string(),
        side: Side::Buy,
        size: 0.03,
        entry_price: 100.0,
        leverage: 10.0,
    }
}

/// In-memory exchange with scripted responses
pub struct MockGateway {
    pub bars: Mutex<GatewayResult<Vec<PriceBar>>>,
    pub price: Mutex<GatewayResult<f64>>,
    pub positions: Mutex<Vec<Position>>,
    pub orders: Mutex<Vec<Order>>,
    pub last_closed: Mutex<Option<ClosedPosition>>,
    pub fail_orders_listing: Mutex<bool>,
    pub fail_place: Mutex<bool>,
    pub fail_cancel: Mutex<bool>,

    pub calls: Mutex<Vec<&'static str>>,
    pub placed: Mutex<Vec<OrderIntent>>,
    pub cancelled: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new(closes: &[f64]) -> Self {
        Self {
            bars: Mutex::new(Ok(create_test_bars(closes))),
            price: Mutex::new(Ok(100.0)),
            positions: Mutex::new(Vec::new()),
            orders: Mutex::new(Vec::new()),
            last_closed: Mutex::new(None),
            fail_orders_listing: Mutex::new(false),
            fail_place: Mutex::new(false),
            fail_cancel: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
            placed: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
        }
    }

    pub fn with_bars(self, bars: Vec<PriceBar>) -> Self {
        *self.bars.lock().unwrap() = Ok(bars);
        self
    }

    pub fn with_price(self, price: f64) -> Self {
        *self.price.lock().unwrap() = Ok(price);
        self
    }

    pub fn with_last_closed(self, closed_at: DateTime<Utc>) -> Self {
        *self.last_closed.lock().unwrap() = Some(ClosedPosition {
            symbol: "BTCUSDT".to_string(),
            closed_at,
            closed_pnl: 1.5,
        });
        self
    }

    pub fn with_orders(self, orders: Vec<Order>) -> Self {
        *self.orders.lock().unwrap() = orders;
        self
    }

    pub fn with_positions(self, positions: Vec<Position>) -> Self {
        *self.positions.lock().unwrap() = positions;
        self
    }

    pub fn fail_history(self) -> Self {
        *self.bars.lock().unwrap() = Err(GatewayError::Empty("klines".to_string()));
        self
    }

    pub fn fail_price(self) -> Self {
        *self.price.lock().unwrap() = Err(GatewayError::Empty("ticker".to_string()));
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn placed(&self) -> Vec<OrderIntent> {
        self.placed.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

fn unavailable(what: &str) -> GatewayError {
    GatewayError::Api {
        code: 10016,
        message: format!("{} unavailable", what),
    }
}

#[async_trait]
impl ExchangeGateway for MockGateway {
    async fn get_historical_bars(
        &self,
        _symbol: &str,
        _interval: &str,
        _limit: usize,
    ) -> GatewayResult<Vec<PriceBar>> {
        self.record("get_historical_bars");
        match &*self.bars.lock().unwrap() {
            Ok(bars) => Ok(bars.clone()),
            Err(_) => Err(unavailable("klines")),
        }
    }

    async fn get_realtime_price(&self, _symbol: &str) -> GatewayResult<f64> {
        self.record("get_realtime_price");
        match &*self.price.lock().unwrap() {
            Ok(price) => Ok(*price),
            Err(_) => Err(unavailable("ticker")),
        }
    }

    async fn get_open_positions(&self, _symbol: &str) -> GatewayResult<Vec<Position>> {
        self.record("get_open_positions");
        Ok(self.positions.lock().unwrap().clone())
    }

    async fn get_open_orders(&self, _symbol: &str) -> GatewayResult<Vec<Order>> {
        self.record("get_open_orders");
        if *self.fail_orders_listing.lock().unwrap() {
            return Err(unavailable("orders"));
        }
        Ok(self.orders.lock().unwrap().clone())
    }

    async fn get_last_closed_position(
        &self,
        _symbol: &str,
    ) -> GatewayResult<Option<ClosedPosition>> {
        self.record("get_last_closed_position");
        Ok(self.last_closed.lock().unwrap().clone())
    }

    async fn place_order(&self, intent: &OrderIntent) -> GatewayResult<OrderReceipt> {
        self.record("place_order");
        if *self.fail_place.lock().unwrap() {
            return Err(GatewayError::Api {
                code: 110007,
                message: "insufficient balance".to_string(),
            });
        }
        let mut placed = self.placed.lock().unwrap();
        placed.push(intent.clone());
        Ok(OrderReceipt {
            order_id: format!("order-{}", placed.len()),
            order_link_id: format!("link-{}", placed.len()),
        })
    }

    async fn cancel_order(&self, order_id: &str, _symbol: &str) -> GatewayResult<()> {
        self.record("cancel_order");
        if *self.fail_cancel.lock().unwrap() {
            return Err(unavailable("cancel"));
        }
        self.cancelled.lock().unwrap().push(order_id.to_string());
        self.orders.lock().unwrap().retain(|o| o.order_id != order_id);
        Ok(())
    }
}
