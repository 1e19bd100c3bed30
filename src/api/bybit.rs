use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use reqwest::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use super::{ExchangeGateway, GatewayError, GatewayResult};
use crate::models::{
    prepare_bars, ClosedPosition, Order, OrderIntent, OrderReceipt, Position, PriceBar, Side,
};

/// Demo trading host; mainnet is https://api.bybit.com
pub const BYBIT_DEMO_API_BASE: &str = "https://api-demo.bybit.com";
const CATEGORY: &str = "linear";
const RECV_WINDOW_MS: u64 = 5000;
const REQUEST_TIMEOUT_SECS: u64 = 10;
/// "leverage not modified" - leverage already at the requested value
const RET_CODE_LEVERAGE_NOT_MODIFIED: i64 = 110043;
const RATE_LIMIT_PER_SEC: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => panic!("rate limit must be non-zero"),
};

type HmacSha256 = Hmac<Sha256>;

type BybitRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Bybit V5 REST client for USDT linear perpetuals
///
/// Cloneable; clones share the rate limiter.
#[derive(Clone)]
pub struct BybitClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    price_decimals: u32,
    qty_decimals: u32,
    rate_limiter: Arc<BybitRateLimiter>,
}

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitResponse {
    ret_code: i64,
    ret_msg: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ListResult<T> {
    list: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickerRaw {
    last_price: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionRaw {
    symbol: String,
    side: String,
    size: String,
    avg_price: String,
    #[serde(default)]
    leverage: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRaw {
    order_id: String,
    symbol: String,
    side: String,
    qty: String,
    #[serde(default)]
    price: String,
    order_status: String,
    created_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClosedPnlRaw {
    symbol: String,
    closed_pnl: String,
    updated_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderCreated {
    order_id: String,
    order_link_id: String,
}

// ============== Parsing helpers ==============

fn parse_num(field: &str, raw: &str) -> GatewayResult<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| GatewayError::Decode(format!("{} is not a number: {:?}", field, raw)))
}

/// Empty strings show up for unset numeric fields
fn parse_num_or_zero(field: &str, raw: &str) -> GatewayResult<f64> {
    if raw.trim().is_empty() {
        Ok(0.0)
    } else {
        parse_num(field, raw)
    }
}

fn parse_millis(field: &str, raw: &str) -> GatewayResult<DateTime<Utc>> {
    let millis = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| GatewayError::Decode(format!("{} is not a timestamp: {:?}", field, raw)))?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| GatewayError::Decode(format!("{} out of range: {}", field, millis)))
}

fn parse_side(raw: &str) -> Option<Side> {
    match raw {
        "Buy" => Some(Side::Buy),
        "Sell" => Some(Side::Sell),
        _ => None,
    }
}

/// Kline rows are `[startTime, open, high, low, close, volume, turnover]` strings
fn parse_kline_row(row: &[String]) -> GatewayResult<PriceBar> {
    if row.len() < 7 {
        return Err(GatewayError::Decode(format!(
            "kline row has {} fields, expected 7",
            row.len()
        )));
    }

    Ok(PriceBar {
        timestamp: parse_millis("startTime", &row[0])?,
        open: parse_num("open", &row[1])?,
        high: parse_num("high", &row[2])?,
        low: parse_num("low", &row[3])?,
        close: parse_num("close", &row[4])?,
        volume: parse_num("volume", &row[5])?,
        turnover: parse_num("turnover", &row[6])?,
    })
}

/// Round to `decimals` places and drop trailing zeros
fn format_decimal(value: f64, decimals: u32) -> GatewayResult<String> {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp(decimals).normalize().to_string())
        .ok_or_else(|| GatewayError::Decode(format!("cannot represent {} as decimal", value)))
}

// ============== Implementation ==============

impl BybitClient {
    pub fn new(api_key: String, api_secret: String) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: BYBIT_DEMO_API_BASE.to_string(),
            api_key,
            api_secret,
            price_decimals: 2,
            qty_decimals: 3,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(RATE_LIMIT_PER_SEC))),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Decimal places used when sending prices and quantities
    pub fn with_precision(mut self, price_decimals: u32, qty_decimals: u32) -> Self {
        self.price_decimals = price_decimals;
        self.qty_decimals = qty_decimals;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// HMAC-SHA256 over `timestamp + api_key + recv_window + payload`, hex encoded
    fn sign(&self, timestamp: &str, payload: &str) -> GatewayResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| GatewayError::Signing(e.to_string()))?;
        mac.update(timestamp.as_bytes());
        mac.update(self.api_key.as_bytes());
        mac.update(RECV_WINDOW_MS.to_string().as_bytes());
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn authenticate(&self, request: RequestBuilder, payload: &str) -> GatewayResult<RequestBuilder> {
        let timestamp = Utc::now().timestamp_millis().to_string();
        let signature = self.sign(&timestamp, payload)?;

        Ok(request
            .header("X-BAPI-API-KEY", &self.api_key)
            .header("X-BAPI-TIMESTAMP", timestamp)
            .header("X-BAPI-RECV-WINDOW", RECV_WINDOW_MS.to_string())
            .header("X-BAPI-SIGN", signature))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        signed: bool,
    ) -> GatewayResult<T> {
        self.rate_limiter.until_ready().await;

        // The signature covers the exact query string sent
        let query_string = query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let url = if query_string.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query_string)
        };

        let mut request = self.client.get(&url);
        if signed {
            request = self.authenticate(request, &query_string)?;
        }

        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> GatewayResult<T> {
        self.rate_limiter.until_ready().await;

        let payload = body.to_string();
        let request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.clone());
        let request = self.authenticate(request, &payload)?;

        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> GatewayResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Api {
                code: i64::from(status.as_u16()),
                message: text,
            });
        }

        let envelope: BybitResponse =
            serde_json::from_str(&text).map_err(|e| GatewayError::Decode(e.to_string()))?;

        if envelope.ret_code != 0 {
            return Err(GatewayError::Api {
                code: envelope.ret_code,
                message: envelope.ret_msg,
            });
        }

        serde_json::from_value(envelope.result).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Set buy/sell leverage; an unchanged leverage is not an error
    pub async fn set_leverage(&self, symbol: &str, leverage: u32) -> GatewayResult<()> {
        let body = json!({
            "category": CATEGORY,
            "symbol": symbol,
            "buyLeverage": leverage.to_string(),
            "sellLeverage": leverage.to_string(),
        });

        match self
            .post::<serde_json::Value>("/v5/position/set-leverage", &body)
            .await
        {
            Ok(_) => Ok(()),
            Err(GatewayError::Api { code, .. }) if code == RET_CODE_LEVERAGE_NOT_MODIFIED => {
                tracing::debug!(symbol, leverage, "Leverage already set");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ExchangeGateway for BybitClient {
    /// Endpoint: GET /v5/market/kline (public). Bybit returns newest first.
    async fn get_historical_bars(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> GatewayResult<Vec<PriceBar>> {
        let query = [
            ("category", CATEGORY.to_string()),
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ];
        let result: ListResult<Vec<String>> = self.get("/v5/market/kline", &query, false).await?;

        if result.list.is_empty() {
            return Err(GatewayError::Empty(format!("{} klines", symbol)));
        }

        let bars = result
            .list
            .iter()
            .map(|row| parse_kline_row(row))
            .collect::<GatewayResult<Vec<_>>>()?;

        Ok(prepare_bars(bars))
    }

    /// Endpoint: GET /v5/market/tickers (public)
    async fn get_realtime_price(&self, symbol: &str) -> GatewayResult<f64> {
        let query = [
            ("category", CATEGORY.to_string()),
            ("symbol", symbol.to_string()),
        ];
        let result: ListResult<TickerRaw> = self.get("/v5/market/tickers", &query, false).await?;

        let ticker = result
            .list
            .first()
            .ok_or_else(|| GatewayError::Empty(format!("{} ticker", symbol)))?;
        parse_num("lastPrice", &ticker.last_price)
    }

    /// Endpoint: GET /v5/position/list (signed)
    async fn get_open_positions(&self, symbol: &str) -> GatewayResult<Vec<Position>> {
        let query = [
            ("category", CATEGORY.to_string()),
            ("symbol", symbol.to_string()),
        ];
        let result: ListResult<PositionRaw> = self.get("/v5/position/list", &query, true).await?;

        let mut positions = Vec::new();
        for raw in result.list {
            let size = parse_num_or_zero("size", &raw.size)?;
            // Flat one-way positions come back with size 0 and an empty side
            let side = match parse_side(&raw.side) {
                Some(side) if size > 0.0 => side,
                _ => continue,
            };
            positions.push(Position {
                symbol: raw.symbol,
                side,
                size,
                entry_price: parse_num_or_zero("avgPrice", &raw.avg_price)?,
                leverage: parse_num_or_zero("leverage", &raw.leverage)?,
            });
        }
        Ok(positions)
    }

    /// Endpoint: GET /v5/order/realtime (signed)
    async fn get_open_orders(&self, symbol: &str) -> GatewayResult<Vec<Order>> {
        let query = [
            ("category", CATEGORY.to_string()),
            ("symbol", symbol.to_string()),
            ("openOnly", "0".to_string()),
        ];
        let result: ListResult<OrderRaw> = self.get("/v5/order/realtime", &query, true).await?;

        result
            .list
            .into_iter()
            .map(|raw| -> GatewayResult<Order> {
                let side = parse_side(&raw.side).ok_or_else(|| {
                    GatewayError::Decode(format!("unknown order side {:?}", raw.side))
                })?;
                Ok(Order {
                    order_id: raw.order_id,
                    symbol: raw.symbol,
                    side,
                    qty: parse_num("qty", &raw.qty)?,
                    price: parse_num_or_zero("price", &raw.price)?,
                    status: raw.order_status,
                    created_at: parse_millis("createdTime", &raw.created_time)?,
                })
            })
            .collect()
    }

    /// Endpoint: GET /v5/position/closed-pnl (signed), newest first
    async fn get_last_closed_position(
        &self,
        symbol: &str,
    ) -> GatewayResult<Option<ClosedPosition>> {
        let query = [
            ("category", CATEGORY.to_string()),
            ("symbol", symbol.to_string()),
            ("limit", "1".to_string()),
        ];
        let result: ListResult<ClosedPnlRaw> =
            self.get("/v5/position/closed-pnl", &query, true).await?;

        match result.list.into_iter().next() {
            Some(raw) => Ok(Some(ClosedPosition {
                closed_at: parse_millis("updatedTime", &raw.updated_time)?,
                closed_pnl: parse_num_or_zero("closedPnl", &raw.closed_pnl)?,
                symbol: raw.symbol,
            })),
            None => Ok(None),
        }
    }

    /// Endpoint: POST /v5/order/create (signed), market entry with attached TP/SL
    async fn place_order(&self, intent: &OrderIntent) -> GatewayResult<OrderReceipt> {
        self.set_leverage(&intent.symbol, intent.leverage).await?;

        let order_link_id = uuid::Uuid::new_v4().to_string();
        let body = json!({
            "category": CATEGORY,
            "symbol": intent.symbol,
            "side": intent.side.as_str(),
            "orderType": "Market",
            "qty": format_decimal(intent.quantity, self.qty_decimals)?,
            "stopLoss": format_decimal(intent.stop_loss, self.price_decimals)?,
            "takeProfit": format_decimal(intent.take_profit, self.price_decimals)?,
            "tpslMode": "Full",
            "tpTriggerBy": "LastPrice",
            "slTriggerBy": "LastPrice",
            "orderLinkId": order_link_id,
        });

        let created: OrderCreated = self.post("/v5/order/create", &body).await?;

        tracing::info!(
            symbol = %intent.symbol,
            side = %intent.side,
            order_id = %created.order_id,
            "Order accepted by Bybit"
        );

        Ok(OrderReceipt {
            order_id: created.order_id,
            order_link_id: created.order_link_id,
        })
    }

    /// Endpoint: POST /v5/order/cancel (signed)
    async fn cancel_order(&self, order_id: &str, symbol: &str) -> GatewayResult<()> {
        let body = json!({
            "category": CATEGORY,
            "symbol": symbol,
            "orderId": order_id,
        });

        let _: serde_json::Value = self.post("/v5/order/cancel", &body).await?;
        Ok(())
    }
}
