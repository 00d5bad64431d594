//! HTTP settlement: POST the match to the backend's settle endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use veilmatch_types::{
    Address, BackendConfig, MatchResult, OrderId, PairId, Result, VeilmatchError,
};

use crate::{SettlementEmitter, SettlementProtocol};

/// JSON body of the settle callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    pub buyer_order_id: OrderId,
    pub seller_order_id: OrderId,
    pub buyer_recipient: Address,
    pub seller_recipient: Address,
    pub trade_amount: Decimal,
    pub execution_price: Decimal,
    pub quote_amount: Decimal,
    pub pair_id: PairId,
}

impl SettleRequest {
    pub fn from_match(trade: &MatchResult) -> Result<Self> {
        Ok(Self {
            buyer_order_id: trade.buyer.id.clone(),
            seller_order_id: trade.seller.id.clone(),
            buyer_recipient: trade.buyer.recipient_address,
            seller_recipient: trade.seller.recipient_address,
            trade_amount: trade.trade_amount,
            execution_price: trade.execution_price,
            quote_amount: trade.quote_amount()?,
            pair_id: trade.pair_id.clone(),
        })
    }
}

/// Settlement through the backend's HTTP callback.
#[derive(Debug)]
pub struct HttpSettlementEmitter {
    client: reqwest::Client,
    url: String,
    secret_header: HeaderName,
    secret: HeaderValue,
}

impl HttpSettlementEmitter {
    pub fn new(
        url: impl Into<String>,
        secret_header: &str,
        secret: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let secret_header = HeaderName::from_bytes(secret_header.as_bytes())
            .map_err(|e| VeilmatchError::Configuration(format!("invalid secret header: {e}")))?;
        let mut secret = HeaderValue::from_str(secret)
            .map_err(|_| VeilmatchError::Configuration("invalid settlement secret".into()))?;
        secret.set_sensitive(true);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VeilmatchError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            secret_header,
            secret,
        })
    }

    /// Build from the backend section and the shared secret.
    pub fn from_config(backend: &BackendConfig, secret: &str) -> Result<Self> {
        let base = backend.base_url.as_deref().ok_or_else(|| {
            VeilmatchError::Configuration("HTTP settlement requires backend.base_url".into())
        })?;
        Self::new(
            format!("{}{}", base.trim_end_matches('/'), backend.settle_path),
            &backend.secret_header,
            secret,
            Duration::from_millis(backend.request_timeout_ms),
        )
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SettlementEmitter for HttpSettlementEmitter {
    fn protocol(&self) -> SettlementProtocol {
        SettlementProtocol::Http
    }

    async fn emit(&self, trade: &MatchResult) -> Result<Map<String, Value>> {
        let body = SettleRequest::from_match(trade)?;

        let response = self
            .client
            .post(&self.url)
            .header(self.secret_header.clone(), self.secret.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| VeilmatchError::SettlementTransport {
                reason: e.without_url().to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(match_id = %trade.match_id, %status, "Settlement callback rejected");
            return Err(VeilmatchError::SettlementTransport {
                reason: format!("HTTP {status}"),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| VeilmatchError::SettlementTransport {
                reason: e.to_string(),
            })?;
        info!(match_id = %trade.match_id, %status, "Settlement callback accepted");

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(obj)) => Ok(obj),
            _ => {
                debug!(match_id = %trade.match_id, "Settlement response is not a JSON object");
                Ok(Map::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use veilmatch_types::{Counterparty, MatchId, OrderSide};

    use super::*;

    fn trade() -> MatchResult {
        let pair = PairId::new("ETH-USDC");
        let (b, s) = (OrderId::new("b-1"), OrderId::new("s-1"));
        MatchResult {
            match_id: MatchId::derive(&pair, &b, &s),
            pair_id: pair,
            buyer: Counterparty {
                id: b,
                owner_identity: Address::repeat_byte(1),
                recipient_address: Address::repeat_byte(2),
            },
            seller: Counterparty {
                id: s,
                owner_identity: Address::repeat_byte(3),
                recipient_address: Address::repeat_byte(4),
            },
            trade_amount: Decimal::new(15, 1),
            execution_price: Decimal::new(2000, 0),
            taker_side: OrderSide::Buy,
        }
    }

    #[test]
    fn body_uses_recipients_and_decimal_strings() {
        let body = serde_json::to_value(SettleRequest::from_match(&trade()).unwrap()).unwrap();
        assert_eq!(body["buyerOrderId"], "b-1");
        assert_eq!(body["sellerOrderId"], "s-1");
        assert_eq!(
            body["buyerRecipient"].as_str().unwrap().to_lowercase(),
            format!("0x{}", "02".repeat(20))
        );
        assert_eq!(body["tradeAmount"], "1.5");
        assert_eq!(body["executionPrice"], "2000");
        assert_eq!(body["quoteAmount"], "3000");
        assert_eq!(body["pairId"], "ETH-USDC");
        assert!(body.get("buyerIdentity").is_none());
    }

    #[test]
    fn url_from_config() {
        let backend = BackendConfig {
            base_url: Some("http://backend.local/".into()),
            ..BackendConfig::default()
        };
        let emitter = HttpSettlementEmitter::from_config(&backend, "s3cret").unwrap();
        assert_eq!(emitter.url(), "http://backend.local/settle");
        assert_eq!(emitter.protocol(), SettlementProtocol::Http);
    }

    #[test]
    fn missing_base_url_is_a_config_error() {
        let err = HttpSettlementEmitter::from_config(&BackendConfig::default(), "x").unwrap_err();
        assert!(matches!(err, VeilmatchError::Configuration(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let emitter = HttpSettlementEmitter::new(
            "http://127.0.0.1:1/settle",
            "x-settlement-secret",
            "s3cret",
            Duration::from_millis(500),
        )
        .unwrap();
        let err = emitter.emit(&trade()).await.unwrap_err();
        assert!(matches!(err, VeilmatchError::SettlementTransport { .. }));
    }
}
