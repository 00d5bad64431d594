//! Eligibility gate over a real `JsonRpcRegistry`, with a scripted node
//! answering `eth_call` one connection at a time.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use veilmatch_compliance::{ComplianceRegistry, EligibilityGate, GateDecision, JsonRpcRegistry};
use veilmatch_types::{
    Counterparty, GateOnError, MatchId, MatchResult, OrderId, OrderSide, PairId, RegistryConfig,
    VeilmatchError,
};

const CHAIN: &str = "ethereum-testnet-sepolia";

fn registry_address() -> Address {
    Address::repeat_byte(0x11)
}

fn buyer() -> Address {
    Address::repeat_byte(0xb0)
}

fn seller() -> Address {
    Address::repeat_byte(0x50)
}

fn bool_word(value: bool) -> String {
    let word = if value { format!("{}01", "00".repeat(31)) } else { "00".repeat(32) };
    json!({ "jsonrpc": "2.0", "id": 1, "result": format!("0x{word}") }).to_string()
}

fn raw_result(result: &str) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
}

fn node_error() -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": -32000, "message": "execution reverted" } })
        .to_string()
}

async fn scripted_node(bodies: Vec<String>) -> (String, tokio::task::JoinHandle<Vec<Value>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for body in bodies {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_body(&mut socket).await;
            seen.push(serde_json::from_str(&request).unwrap_or(Value::Null));
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        }
        seen
    });
    (format!("http://{addr}"), handle)
}

async fn read_body(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= pos + 4 + len {
                return String::from_utf8_lossy(&buf[pos + 4..pos + 4 + len]).into_owned();
            }
        }
    }
    String::new()
}

fn config(url: String, gate_on_error: GateOnError) -> RegistryConfig {
    RegistryConfig {
        chain_selector: CHAIN.into(),
        registry_address: Some(registry_address()),
        rpc_urls: BTreeMap::from([(CHAIN.to_string(), url)]),
        gate_on_error,
        request_timeout_ms: 2_000,
    }
}

fn trade() -> MatchResult {
    let buyer_id = OrderId::new("b");
    let seller_id = OrderId::new("s");
    let pair = PairId::new("ETH-USDC");
    MatchResult {
        match_id: MatchId::derive(&pair, &buyer_id, &seller_id),
        pair_id: pair,
        buyer: Counterparty {
            id: buyer_id,
            owner_identity: buyer(),
            recipient_address: Address::repeat_byte(0xb1),
        },
        seller: Counterparty {
            id: seller_id,
            owner_identity: seller(),
            recipient_address: Address::repeat_byte(0x51),
        },
        trade_amount: Decimal::ONE,
        execution_price: Decimal::ONE_HUNDRED,
        taker_side: OrderSide::Buy,
    }
}

#[tokio::test]
async fn false_word_for_seller_holds_the_match() {
    let (url, node) = scripted_node(vec![bool_word(true), bool_word(false)]).await;
    let gate = EligibilityGate::from_config(&config(url, GateOnError::Open)).unwrap();
    assert!(gate.is_enforcing());

    assert_eq!(gate.check_match(&trade()).await, GateDecision::SellerNotVerified);

    let requests = node.await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["method"], "eth_call");
    let call = &requests[0]["params"][0];
    assert_eq!(
        call["to"].as_str().unwrap().to_lowercase(),
        format!("0x{}", hex::encode(registry_address()))
    );
    let data = call["data"].as_str().unwrap();
    assert!(data.ends_with(&hex::encode(buyer())));
    assert!(requests[1]["params"][0]["data"].as_str().unwrap().ends_with(&hex::encode(seller())));
}

#[tokio::test]
async fn both_true_clears() {
    let (url, _node) = scripted_node(vec![bool_word(true), bool_word(true)]).await;
    let gate = EligibilityGate::from_config(&config(url, GateOnError::Closed)).unwrap();
    assert_eq!(gate.check_match(&trade()).await, GateDecision::Cleared);
}

#[tokio::test]
async fn node_error_is_an_eligibility_error() {
    let (url, _node) = scripted_node(vec![node_error()]).await;
    let registry = JsonRpcRegistry::from_config(&config(url, GateOnError::Open))
        .unwrap()
        .unwrap();
    let err = registry.is_verified(buyer()).await.unwrap_err();
    assert!(matches!(err, VeilmatchError::EligibilityCheck { .. }));
    assert!(err.to_string().contains("execution reverted"));
}

#[tokio::test]
async fn node_error_fails_open_by_default() {
    let (url, _node) = scripted_node(vec![node_error(), node_error()]).await;
    let gate = EligibilityGate::from_config(&config(url, GateOnError::Open)).unwrap();
    assert_eq!(gate.check_match(&trade()).await, GateDecision::Cleared);
}

#[tokio::test]
async fn node_error_fails_closed_when_configured() {
    let (url, _node) = scripted_node(vec![node_error()]).await;
    let gate = EligibilityGate::from_config(&config(url, GateOnError::Closed)).unwrap();
    assert_eq!(gate.check_match(&trade()).await, GateDecision::BuyerNotVerified);
}

#[tokio::test]
async fn undecodable_result_follows_gate_policy() {
    let (url, _node) = scripted_node(vec![raw_result("0x01")]).await;
    let gate = EligibilityGate::from_config(&config(url, GateOnError::Closed)).unwrap();
    assert!(!gate.is_eligible(buyer()).await);

    let (url, _node) = scripted_node(vec![raw_result("not hex")]).await;
    let gate = EligibilityGate::from_config(&config(url, GateOnError::Open)).unwrap();
    assert!(gate.is_eligible(buyer()).await);
}
