//! HTTP clients against in-process stand-ins for the Hyperliquid Info API
//! and a HyperEVM JSON-RPC node.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use hypevault::datasource::{ActivitySource, BalanceFetcher, FetchError};
use hypevault::domain::{ActivityCategory, Address, Network};
use hypevault::{HyperEvmClient, HyperliquidClient, PriceSource};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const USER: &str = "0x1111111111111111111111111111111111111111";
const CUSTOM_TOKEN: &str = "0x00000000000000000000000000000000000000aa";
const OVERSIZED_TOKEN: &str = "0x00000000000000000000000000000000000000cc";

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn user() -> Address {
    Address::from_str(USER).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// =============================================================================
// Hyperliquid
// =============================================================================

async fn fake_info(Json(body): Json<Value>) -> Json<Value> {
    let response = match body["type"].as_str().unwrap_or_default() {
        "spotClearinghouseState" => json!({
            "balances": [
                {"coin": "USDC", "token": 0, "hold": "0.0", "total": "120.5"},
                {"coin": "@107", "token": 150, "hold": "0.0", "total": "12.0"},
                {"coin": "UBTC", "token": 197, "hold": "0.0", "total": "0.02"},
                {"coin": "PURR", "token": 1, "hold": "0.0", "total": "0.0000001"}
            ]
        }),
        "clearinghouseState" => json!({
            "marginSummary": {"accountValue": "879.5", "totalNtlPos": "0.0"},
            "assetPositions": []
        }),
        "allMids" => json!({"HYPE": "26.5", "BTC": "95000.0", "ETH": "3200.0"}),
        "userFillsByTime" => json!([
            {"coin": "HYPE", "px": "25.0", "sz": "2", "side": "A", "time": 1_700_000_100_000i64,
             "fee": "0.02", "hash": "0xf1", "tid": 7}
        ]),
        "userFunding" => json!([
            {"time": 1_700_000_200_000i64, "hash": "0x0",
             "delta": {"type": "funding", "coin": "ETH", "usdc": "1.25", "szi": "0.5"}}
        ]),
        "userNonFundingLedgerUpdates" => json!([
            {"time": 1_700_000_000_000i64, "hash": "0xd1",
             "delta": {"type": "deposit", "usdc": "1000.0"}}
        ]),
        _ => json!(null),
    };
    Json(response)
}

#[tokio::test]
async fn test_hyperliquid_balances() {
    let url = serve(Router::new().route("/info", post(fake_info))).await;
    let client = HyperliquidClient::new(url, Duration::from_secs(5));

    assert_eq!(client.network(), Network::Hyperliquid);
    let balances = client.fetch_balances(&user()).await.unwrap();
    let summary: Vec<(&str, Decimal)> = balances
        .iter()
        .map(|b| (b.token.as_str(), b.balance))
        .collect();
    // Spot USDC and perp account value merge; dust PURR is dropped.
    assert_eq!(
        summary,
        vec![
            ("BTC", dec("0.02")),
            ("HYPE", dec("12")),
            ("USDC", dec("1000")),
        ]
    );
}

#[tokio::test]
async fn test_hyperliquid_prices() {
    let url = serve(Router::new().route("/info", post(fake_info))).await;
    let client = HyperliquidClient::new(url, Duration::from_secs(5));

    let prices = client
        .fetch_prices(&["HYPE", "ETH", "BTC", "USDT", "USDC"])
        .await
        .unwrap();
    assert_eq!(prices["HYPE"], 26.5);
    assert_eq!(prices["BTC"], 95000.0);
    assert_eq!(prices["USDT"], 1.0);
}

#[tokio::test]
async fn test_hyperliquid_activity() {
    let url = serve(Router::new().route("/info", post(fake_info))).await;
    let client = HyperliquidClient::new(url, Duration::from_secs(5));

    let activity = client.fetch_activity(&user(), 0).await.unwrap();
    assert_eq!(activity.len(), 3);

    let fill = activity
        .iter()
        .find(|a| a.category == ActivityCategory::Trade)
        .unwrap();
    assert_eq!(fill.kind, "sell");
    assert_eq!(fill.value, dec("50"));

    let deposit = activity
        .iter()
        .find(|a| a.category == ActivityCategory::Transfer)
        .unwrap();
    assert_eq!(deposit.kind, "deposit");
    assert_eq!(deposit.value, dec("1000"));
}

#[tokio::test]
async fn test_hyperliquid_client_error_is_not_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/info",
            post(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (StatusCode::UNPROCESSABLE_ENTITY, "bad request")
            }),
        )
        .with_state(hits.clone());
    let url = serve(app).await;
    let client = HyperliquidClient::new(url, Duration::from_secs(5));

    let err = client.fetch_prices(&["HYPE"]).await.unwrap_err();
    assert!(matches!(err, FetchError::HttpError { status: 422, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let err = client.fetch_balances(&user()).await.unwrap_err();
    assert!(matches!(err, FetchError::HttpError { status: 422, .. }));
}

#[tokio::test]
async fn test_hyperliquid_server_error_is_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/info",
            post(
                |State(hits): State<Arc<AtomicUsize>>, Json(body): Json<Value>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})));
                    }
                    (StatusCode::OK, fake_info(Json(body)).await)
                },
            ),
        )
        .with_state(hits.clone());
    let url = serve(app).await;
    let client = HyperliquidClient::new(url, Duration::from_secs(5));

    let prices = client.fetch_prices(&["HYPE"]).await.unwrap();
    assert_eq!(prices["HYPE"], 26.5);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

// =============================================================================
// HyperEVM
// =============================================================================

fn word(value: u128) -> String {
    format!("0x{:064x}", value)
}

fn abi_string(s: &str) -> String {
    let hex: String = s.bytes().map(|b| format!("{:02x}", b)).collect();
    format!("0x{:064x}{:064x}{:0<64}", 32, s.len(), hex)
}

async fn fake_rpc(State(calls): State<Arc<AtomicUsize>>, Json(body): Json<Value>) -> Json<Value> {
    let id = body["id"].clone();
    let params = &body["params"];
    let result = match body["method"].as_str().unwrap_or_default() {
        // 2.5 HYPE
        "eth_getBalance" => json!(format!("0x{:x}", 2_500_000_000_000_000_000u128)),
        "eth_call" => {
            let to = params[0]["to"].as_str().unwrap_or_default().to_lowercase();
            let data = params[0]["data"].as_str().unwrap_or_default();
            match (to.as_str(), &data[..10]) {
                (CUSTOM_TOKEN, "0x95d89b41") => {
                    calls.fetch_add(1, Ordering::SeqCst);
                    json!(abi_string("UETH"))
                }
                (CUSTOM_TOKEN, "0x313ce567") => {
                    calls.fetch_add(1, Ordering::SeqCst);
                    json!(word(18))
                }
                (OVERSIZED_TOKEN, "0x95d89b41") => json!(abi_string("JUNK")),
                (OVERSIZED_TOKEN, "0x313ce567") => json!(word(0)),
                // Above 2^96, too large for a Decimal at zero decimals
                (OVERSIZED_TOKEN, "0x70a08231") => json!(word(u128::MAX >> 1)),
                // 0.75 of an 18-decimal token
                (CUSTOM_TOKEN, "0x70a08231") => json!(word(750_000_000_000_000_000)),
                // 1.5 WHYPE
                ("0x5555555555555555555555555555555555555555", "0x70a08231") => {
                    json!(word(1_500_000_000_000_000_000))
                }
                // 300 USDT0 (6 decimals)
                ("0xb8ce59fc3717ada4c02eadf9682a9e934f625ebb", "0x70a08231") => {
                    json!(word(300_000_000))
                }
                _ => {
                    return Json(json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": {"code": -32000, "message": "execution reverted"}
                    }))
                }
            }
        }
        _ => json!(null),
    };
    Json(json!({"jsonrpc": "2.0", "id": id, "result": result}))
}

async fn rpc_server() -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/", post(fake_rpc))
        .with_state(calls.clone());
    (serve(app).await, calls)
}

#[tokio::test]
async fn test_hyperevm_balances_and_metadata_memoization() {
    let (url, metadata_calls) = rpc_server().await;
    let client = HyperEvmClient::new(
        url,
        vec![
            "0x5555555555555555555555555555555555555555".to_string(),
            "0xB8CE59FC3717ADA4C02EADF9682A9E934F625EBB".to_string(),
            CUSTOM_TOKEN.to_string(),
        ],
        Duration::from_secs(5),
    );

    assert_eq!(client.network(), Network::Hyperevm);
    let balances = client.fetch_balances(&user()).await.unwrap();
    let summary: Vec<(&str, Decimal)> = balances
        .iter()
        .map(|b| (b.token.as_str(), b.balance))
        .collect();
    // Native 2.5 + WHYPE 1.5 merge into HYPE.
    assert_eq!(
        summary,
        vec![
            ("ETH", dec("0.75")),
            ("HYPE", dec("4")),
            ("USDT", dec("300")),
        ]
    );
    assert_eq!(metadata_calls.load(Ordering::SeqCst), 2);

    client.fetch_balances(&user()).await.unwrap();
    assert_eq!(metadata_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_hyperevm_skips_untracked_token_that_does_not_scale() {
    let (url, _) = rpc_server().await;
    let client = HyperEvmClient::new(
        url,
        vec![
            "0x5555555555555555555555555555555555555555".to_string(),
            OVERSIZED_TOKEN.to_string(),
        ],
        Duration::from_secs(5),
    );

    let balances = client.fetch_balances(&user()).await.unwrap();
    let summary: Vec<(&str, Decimal)> = balances
        .iter()
        .map(|b| (b.token.as_str(), b.balance))
        .collect();
    assert_eq!(summary, vec![("HYPE", dec("4"))]);
}

#[tokio::test]
async fn test_hyperevm_rpc_error_fails_closed() {
    let (url, _) = rpc_server().await;
    let client = HyperEvmClient::new(
        url,
        vec!["0x00000000000000000000000000000000000000bb".to_string()],
        Duration::from_secs(5),
    );

    let err = client.fetch_balances(&user()).await.unwrap_err();
    assert_eq!(
        err,
        FetchError::RpcError {
            code: -32000,
            message: "execution reverted".to_string()
        }
    );
}
