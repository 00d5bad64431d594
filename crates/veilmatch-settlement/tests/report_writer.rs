//! `JsonRpcReportWriter` against a scripted JSON-RPC node.
//!
//! The node answers one request per connection, in order, from a fixed
//! list of `result`/`error` bodies.

use std::collections::BTreeMap;
use std::time::Duration;

use alloy_primitives::{Address, B256, keccak256};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use veilmatch_compliance::JsonRpcClient;
use veilmatch_settlement::{JsonRpcReportWriter, ReportWriter};
use veilmatch_types::{OnChainConfig, VeilmatchError};

fn tx_hash() -> B256 {
    B256::repeat_byte(0xab)
}

fn ok(result: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
}

fn node_error(message: &str) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": -32000, "message": message } })
        .to_string()
}

fn receipt(status: &str) -> String {
    ok(json!({
        "transactionHash": tx_hash(),
        "status": status,
        "blockNumber": "0x2a"
    }))
}

/// Answer `bodies.len()` requests, one per connection. The join handle
/// yields the JSON-RPC request bodies received.
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

fn writer(url: String, poll_attempts: u32) -> JsonRpcReportWriter {
    let config = OnChainConfig {
        chain_selector: "ethereum-testnet-sepolia".into(),
        receiver_address: Address::repeat_byte(0x22),
        sender_address: Address::repeat_byte(0x33),
        gas_limit: 300_000,
        receipt_poll_attempts: poll_attempts,
        receipt_poll_interval_ms: 10,
        pairs: BTreeMap::new(),
    };
    let rpc = JsonRpcClient::new(url, Duration::from_secs(2)).unwrap();
    JsonRpcReportWriter::new(rpc, &config)
}

#[tokio::test]
async fn confirmed_report_returns_receipt() {
    let (url, node) = scripted_node(vec![ok(json!(tx_hash())), receipt("0x1")]).await;

    let out = writer(url, 3).write_report(b"report", b"sig").await.unwrap();
    assert_eq!(out.tx_hash, tx_hash());
    assert_eq!(out.block_number.as_deref(), Some("0x2a"));

    let requests = node.await.unwrap();
    assert_eq!(requests[0]["method"], "eth_sendTransaction");
    let tx = &requests[0]["params"][0];
    assert_eq!(tx["gas"], "0x493e0");
    let selector = hex::encode(&keccak256(b"submitReport(bytes,bytes)")[..4]);
    assert!(tx["data"].as_str().unwrap().starts_with(&format!("0x{selector}")));
    assert_eq!(requests[1]["method"], "eth_getTransactionReceipt");
}

#[tokio::test]
async fn reverted_receipt_is_rejected() {
    let (url, node) = scripted_node(vec![
        ok(json!(tx_hash())),
        ok(Value::Null),
        receipt("0x0"),
    ])
    .await;

    let err = writer(url, 5).write_report(b"report", b"sig").await.unwrap_err();
    assert!(matches!(err, VeilmatchError::OnChainRejected { .. }));
    assert!(err.to_string().contains("reverted"));
    assert_eq!(node.await.unwrap().len(), 3);
}

#[tokio::test]
async fn missing_receipt_after_all_polls_is_rejected() {
    let (url, node) = scripted_node(vec![
        ok(json!(tx_hash())),
        ok(Value::Null),
        ok(Value::Null),
    ])
    .await;

    let err = writer(url, 2).write_report(b"report", b"sig").await.unwrap_err();
    assert!(matches!(err, VeilmatchError::OnChainRejected { .. }));
    assert!(err.to_string().contains("not confirmed after 2 polls"));
    assert_eq!(node.await.unwrap().len(), 3);
}

#[tokio::test]
async fn node_error_on_send_is_a_transport_error() {
    let (url, _node) = scripted_node(vec![node_error("insufficient funds")]).await;

    let err = writer(url, 2).write_report(b"report", b"sig").await.unwrap_err();
    assert!(matches!(err, VeilmatchError::SettlementTransport { .. }));
    assert!(err.to_string().contains("insufficient funds"));
}
