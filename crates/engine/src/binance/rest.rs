use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

use common::{Error, ExchangeClient, Fill, Order, Result};

const BASE_URL: &str = "https://api.binance.com";

/// REST API client for Binance. Used for order placement.
pub struct BinanceClient {
    api_key: String,
    secret: String,
    http: Client,
}

impl BinanceClient {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    fn timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_millis() as u64
    }

    fn sign(&self, query: &str) -> String {
        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    async fn signed_post(&self, path: &str, params: &str) -> Result<String> {
        let ts = Self::timestamp_ms();
        let query = format!("{params}&timestamp={ts}");
        let signature = self.sign(&query);
        let body = format!("{query}&signature={signature}");
        let url = format!("{BASE_URL}{path}");

        let resp = self
            .http
            .post(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(rejection_error(status, &text));
        }
        Ok(text)
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn submit_order(&self, order: &Order) -> Result<Fill> {
        let params = order_params(order);
        debug!(symbol = %order.symbol, side = %order.side, "Submitting order to Binance");
        let body = self.signed_post("/api/v3/order", &params).await?;
        parse_fill(order, &body)
    }
}

fn order_params(order: &Order) -> String {
    format!(
        "symbol={}&side={}&type=MARKET&quantity={}",
        order.symbol, order.side, order.quantity
    )
}

/// Extract the executed price and quantity from an order response.
/// The requested quantity is never substituted: a response without an
/// executed quantity or fill price is an exchange error.
fn parse_fill(order: &Order, body: &str) -> Result<Fill> {
    let resp: OrderResponse =
        serde_json::from_str(body).map_err(|e| Error::Exchange(e.to_string()))?;

    let executed_qty = resp
        .executed_qty
        .parse::<f64>()
        .map_err(|_| Error::Exchange(format!("no executed quantity in response: {body}")))?;
    let fill_price = resp
        .fills
        .first()
        .and_then(|f| f.price.parse::<f64>().ok())
        .or_else(|| {
            let quote: f64 = resp.cummulative_quote_qty.parse().ok()?;
            (executed_qty > 0.0).then(|| quote / executed_qty)
        })
        .ok_or_else(|| Error::Exchange(format!("no fill price in response: {body}")))?;

    Ok(Fill {
        order_id: resp.client_order_id,
        symbol: order.symbol.clone(),
        side: order.side,
        fill_price,
        quantity: executed_qty,
        timestamp: Utc::now(),
    })
}

/// Classify a non-2xx order response. Binance reports rejections as
/// `{"code": -2010, "msg": "..."}`; anything else is an opaque exchange error.
fn rejection_error(status: reqwest::StatusCode, body: &str) -> Error {
    #[derive(Deserialize)]
    struct ApiError {
        code: i64,
        msg: String,
    }

    match serde_json::from_str::<ApiError>(body) {
        Ok(api) => Error::OrderRejected {
            code: api.code,
            message: api.msg,
        },
        Err(_) => Error::Exchange(format!("HTTP {status}: {body}")),
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    client_order_id: String,
    #[serde(default)]
    executed_qty: String,
    #[serde(default)]
    cummulative_quote_qty: String,
    #[serde(default)]
    fills: Vec<FillDetail>,
}

#[derive(Deserialize)]
struct FillDetail {
    price: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_balance_body_maps_to_rejection_code() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        let body = r#"{"code":-2010,"msg":"Account has insufficient balance for requested action."}"#;
        match rejection_error(status, body) {
            Error::OrderRejected { code, message } => {
                assert_eq!(code, -2010);
                assert!(message.contains("insufficient balance"));
            }
            other => panic!("expected OrderRejected, got {other:?}"),
        }
    }

    #[test]
    fn opaque_body_maps_to_exchange_error() {
        let status = reqwest::StatusCode::BAD_GATEWAY;
        match rejection_error(status, "<html>Bad Gateway</html>") {
            Error::Exchange(msg) => assert!(msg.contains("502")),
            other => panic!("expected Exchange, got {other:?}"),
        }
    }

    #[test]
    fn order_params_always_request_market_execution() {
        let order = Order::market("BTCUSDT", common::OrderSide::Sell, 0.5);
        let params = order_params(&order);
        assert!(params.contains("type=MARKET"), "params: {params}");
        assert!(params.contains("symbol=BTCUSDT&side=SELL"));
        assert!(!params.contains("timeInForce"));
    }

    #[test]
    fn fill_reports_executed_values_from_fills() {
        let order = Order::market("BTCUSDT", common::OrderSide::Buy, 0.5);
        let body = r#"{
            "clientOrderId": "abc",
            "executedQty": "0.4",
            "cummulativeQuoteQty": "40.0",
            "fills": [{"price": "99.5"}]
        }"#;
        let fill = parse_fill(&order, body).unwrap();
        assert!((fill.fill_price - 99.5).abs() < 1e-9);
        assert!((fill.quantity - 0.4).abs() < 1e-9);
        assert_eq!(fill.order_id, "abc");
    }

    #[test]
    fn fill_price_falls_back_to_quote_over_qty() {
        let order = Order::market("BTCUSDT", common::OrderSide::Buy, 2.0);
        let body = r#"{
            "clientOrderId": "abc",
            "executedQty": "2.0",
            "cummulativeQuoteQty": "200.0",
            "fills": []
        }"#;
        let fill = parse_fill(&order, body).unwrap();
        assert!((fill.fill_price - 100.0).abs() < 1e-9);
    }

    #[test]
    fn missing_executed_quantity_is_an_error() {
        // The requested quantity must never stand in for the executed one
        let order = Order::market("BTCUSDT", common::OrderSide::Buy, 2.0);
        let body = r#"{"clientOrderId": "abc", "fills": [{"price": "99.5"}]}"#;
        match parse_fill(&order, body) {
            Err(Error::Exchange(msg)) => assert!(msg.contains("executed quantity")),
            other => panic!("expected Exchange error, got {other:?}"),
        }
    }
}
