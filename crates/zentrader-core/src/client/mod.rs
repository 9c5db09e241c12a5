//! Authenticated Bybit v5 REST client
//!
//! Thin wrappers over the endpoints the desktop app actually calls. Every
//! authenticated request carries `api_key`, a fresh `timestamp` and a `sign`
//! field computed by [`crate::signer`]. A non-zero `retCode` from the
//! exchange is surfaced verbatim; in particular a signature rejection is
//! never retried with altered canonicalization.

mod cache;

pub use cache::ClientCache;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::signer;
use crate::store::{CredentialRecord, Environment};

/// Bybit v5 response envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub ret_code: i64,
    pub ret_msg: String,
    pub result: Option<T>,
}

/// `result` payloads that wrap a `list` array
#[derive(Debug, Deserialize)]
pub struct ResultList<T> {
    pub list: Vec<T>,
}

/// Ticker snapshot (numeric fields are strings on the wire)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub symbol: String,
    pub last_price: String,
}

/// Account balance summary
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    pub account_type: String,
    pub total_equity: String,
    pub total_wallet_balance: String,
}

/// Open position
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: String,
    pub side: String,
    pub size: String,
    pub avg_price: String,
    pub unrealised_pnl: String,
    pub leverage: String,
}

/// Open or historical order
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub qty: String,
    pub price: String,
    pub order_status: String,
}

/// Acknowledgement returned by order create/cancel
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    pub order_id: String,
    pub order_link_id: String,
}

/// Parameters for placing an order
#[derive(Debug, Clone, Default)]
pub struct OrderRequest {
    pub category: String,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub qty: String,
    /// Limit price, only sent for limit orders
    pub price: Option<String>,
    pub trigger_price: Option<String>,
    pub take_profit: Option<String>,
    pub stop_loss: Option<String>,
    pub reduce_only: bool,
}

/// REST client bound to one decrypted credential set
pub struct ExchangeClient {
    http: reqwest::Client,
    api_key: String,
    api_secret: String,
    environment: Environment,
}

impl ExchangeClient {
    /// Construct a client from a decrypted credential record
    ///
    /// Pure function of the record: no hidden state, so the cache layer can
    /// rebuild clients solely from fingerprint changes.
    pub fn new(record: &CredentialRecord) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: record.api_key.clone(),
            api_secret: record.api_secret.clone(),
            environment: record.environment,
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.environment.rest_base_url(), endpoint)
    }

    fn unwrap_envelope<T>(response: ApiResponse<T>) -> Result<T> {
        if response.ret_code != 0 {
            return Err(CoreError::ExchangeError {
                code: response.ret_code,
                message: response.ret_msg,
            });
        }
        response.result.ok_or(CoreError::EmptyResponse)
    }

    async fn signed_get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Vec<(String, String)>,
    ) -> Result<T> {
        let params = signer::signed_params(params, &self.api_key, &self.api_secret);

        debug!("GET (signed) {}", endpoint);

        let response = self
            .http
            .get(self.url(endpoint))
            .query(&params)
            .send()
            .await?
            .json::<ApiResponse<T>>()
            .await?;

        Self::unwrap_envelope(response)
    }

    async fn signed_post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: Vec<(String, String)>,
    ) -> Result<T> {
        let params = signer::signed_params(params, &self.api_key, &self.api_secret);

        debug!("POST (signed) {}", endpoint);

        let response = self
            .http
            .post(self.url(endpoint))
            .json(&params)
            .send()
            .await?
            .json::<ApiResponse<T>>()
            .await?;

        Self::unwrap_envelope(response)
    }

    /// Latest tickers for a symbol
    pub async fn get_tickers(&self, category: &str, symbol: &str) -> Result<Vec<Ticker>> {
        let result: ResultList<Ticker> = self
            .signed_get(
                "/v5/market/tickers",
                vec![
                    ("category".to_string(), category.to_string()),
                    ("symbol".to_string(), symbol.to_string()),
                ],
            )
            .await?;
        Ok(result.list)
    }

    /// Wallet balance per account type (e.g. UNIFIED)
    pub async fn get_wallet_balance(&self, account_type: &str) -> Result<Vec<WalletBalance>> {
        let result: ResultList<WalletBalance> = self
            .signed_get(
                "/v5/account/wallet-balance",
                vec![("accountType".to_string(), account_type.to_string())],
            )
            .await?;
        Ok(result.list)
    }

    /// Open positions for a settlement coin
    pub async fn get_positions(&self, category: &str, settle_coin: &str) -> Result<Vec<Position>> {
        let result: ResultList<Position> = self
            .signed_get(
                "/v5/position/list",
                vec![
                    ("category".to_string(), category.to_string()),
                    ("settleCoin".to_string(), settle_coin.to_string()),
                ],
            )
            .await?;
        Ok(result.list)
    }

    /// Orders currently resting on the book
    pub async fn get_open_orders(&self, category: &str, settle_coin: &str) -> Result<Vec<Order>> {
        let result: ResultList<Order> = self
            .signed_get(
                "/v5/order/realtime",
                vec![
                    ("category".to_string(), category.to_string()),
                    ("settleCoin".to_string(), settle_coin.to_string()),
                ],
            )
            .await?;
        Ok(result.list)
    }

    /// Place an order
    pub async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck> {
        let mut params = vec![
            ("category".to_string(), request.category.clone()),
            ("symbol".to_string(), request.symbol.clone()),
            ("side".to_string(), request.side.clone()),
            ("orderType".to_string(), request.order_type.clone()),
            ("qty".to_string(), request.qty.clone()),
        ];

        if let Some(price) = &request.price {
            params.push(("price".to_string(), price.clone()));
        }
        if let Some(trigger_price) = &request.trigger_price {
            params.push(("triggerPrice".to_string(), trigger_price.clone()));
            params.push(("triggerDirection".to_string(), "1".to_string()));
        }
        if let Some(take_profit) = &request.take_profit {
            params.push(("takeProfit".to_string(), take_profit.clone()));
        }
        if let Some(stop_loss) = &request.stop_loss {
            params.push(("stopLoss".to_string(), stop_loss.clone()));
        }
        if request.reduce_only {
            params.push(("reduceOnly".to_string(), "true".to_string()));
        }

        self.signed_post("/v5/order/create", params).await
    }

    /// Cancel a resting order
    pub async fn cancel_order(
        &self,
        category: &str,
        symbol: &str,
        order_id: &str,
    ) -> Result<OrderAck> {
        self.signed_post(
            "/v5/order/cancel",
            vec![
                ("category".to_string(), category.to_string()),
                ("symbol".to_string(), symbol.to_string()),
                ("orderId".to_string(), order_id.to_string()),
            ],
        )
        .await
    }

    /// Set buy/sell leverage for a symbol
    pub async fn set_leverage(&self, category: &str, symbol: &str, leverage: &str) -> Result<()> {
        let _: serde_json::Value = self
            .signed_post(
                "/v5/position/set-leverage",
                vec![
                    ("category".to_string(), category.to_string()),
                    ("symbol".to_string(), symbol.to_string()),
                    ("buyLeverage".to_string(), leverage.to_string()),
                    ("sellLeverage".to_string(), leverage.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    /// Modify take-profit / stop-loss on a position
    ///
    /// `None` clears the respective level ("0" on the wire).
    pub async fn set_trading_stop(
        &self,
        category: &str,
        symbol: &str,
        take_profit: Option<&str>,
        stop_loss: Option<&str>,
    ) -> Result<()> {
        let _: serde_json::Value = self
            .signed_post(
                "/v5/position/trading-stop",
                vec![
                    ("category".to_string(), category.to_string()),
                    ("symbol".to_string(), symbol.to_string()),
                    ("takeProfit".to_string(), take_profit.unwrap_or("0").to_string()),
                    ("stopLoss".to_string(), stop_loss.unwrap_or("0").to_string()),
                ],
            )
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for ExchangeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeClient")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("environment", &self.environment)
            .finish()
    }
}
