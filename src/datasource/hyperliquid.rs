//! Hyperliquid Info API client: balances, activity and mid prices.

use super::http::{build_client, post_json};
use super::tokens::canonical_symbol;
use super::{ActivitySource, BalanceFetcher, FetchError};
use crate::domain::decimal::parse_amount;
use crate::domain::{
    merge_balances, Activity, ActivityCategory, Address, Network, NetworkBalance, TrackedToken,
};
use crate::pricing::PriceSource;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Hyperliquid client using the public Info API.
#[derive(Debug, Clone)]
pub struct HyperliquidClient {
    client: Client,
    base_url: String,
    retry_window: Duration,
}

impl HyperliquidClient {
    /// Create a new client; every request times out after `timeout`.
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_window: Duration::from_secs(30),
        }
    }

    /// Create with the default Hyperliquid API URL.
    pub fn default_url() -> Self {
        Self::new(
            crate::config::DEFAULT_HYPERLIQUID_API_URL.to_string(),
            Duration::from_secs(10),
        )
    }

    /// Bound the total time spent retrying transient failures.
    pub fn with_retry_window(mut self, window: Duration) -> Self {
        self.retry_window = window;
        self
    }

    async fn post_info(&self, payload: serde_json::Value) -> Result<serde_json::Value, FetchError> {
        let url = format!("{}/info", self.base_url);
        post_json(&self.client, &url, &payload, self.retry_window).await
    }
}

#[async_trait]
impl BalanceFetcher for HyperliquidClient {
    fn network(&self) -> Network {
        Network::Hyperliquid
    }

    async fn fetch_balances(&self, address: &Address) -> Result<Vec<NetworkBalance>, FetchError> {
        debug!(user = %address, "Fetching Hyperliquid balances");

        let (spot, perp) = futures::try_join!(
            self.post_info(serde_json::json!({
                "type": "spotClearinghouseState",
                "user": address.as_str()
            })),
            self.post_info(serde_json::json!({
                "type": "clearinghouseState",
                "user": address.as_str()
            })),
        )?;

        let mut balances = parse_spot_balances(&spot)?;
        if let Some(margin) = parse_margin_balance(&perp)? {
            balances.push(margin);
        }
        Ok(merge_balances(balances))
    }
}

#[async_trait]
impl ActivitySource for HyperliquidClient {
    async fn fetch_activity(
        &self,
        address: &Address,
        from_ms: i64,
    ) -> Result<Vec<Activity>, FetchError> {
        debug!(user = %address, from_ms, "Fetching Hyperliquid activity");
        let now_ms = Utc::now().timestamp_millis();

        let (fills, funding, ledger) = futures::try_join!(
            self.post_info(serde_json::json!({
                "type": "userFillsByTime",
                "user": address.as_str(),
                "startTime": from_ms,
                "endTime": now_ms,
                "aggregateByTime": false
            })),
            self.post_info(serde_json::json!({
                "type": "userFunding",
                "user": address.as_str(),
                "startTime": from_ms,
                "endTime": now_ms
            })),
            self.post_info(serde_json::json!({
                "type": "userNonFundingLedgerUpdates",
                "user": address.as_str(),
                "startTime": from_ms,
                "endTime": now_ms
            })),
        )?;

        let mut activities = Vec::new();
        for item in expect_array(&fills)? {
            match parse_fill_activity(item) {
                Ok(a) => activities.push(a),
                Err(e) => warn!("Failed to parse fill: {}", e),
            }
        }
        for item in expect_array(&funding)? {
            match parse_funding_activity(item) {
                Ok(a) => activities.push(a),
                Err(e) => warn!("Failed to parse funding update: {}", e),
            }
        }
        for item in expect_array(&ledger)? {
            match parse_ledger_activity(item, address) {
                Ok(a) => activities.push(a),
                Err(e) => warn!("Failed to parse ledger update: {}", e),
            }
        }
        Ok(activities)
    }
}

#[async_trait]
impl PriceSource for HyperliquidClient {
    async fn fetch_prices(&self, symbols: &[&str]) -> Result<HashMap<String, f64>, FetchError> {
        let mids = self
            .post_info(serde_json::json!({ "type": "allMids" }))
            .await?;
        parse_mids(&mids, symbols)
    }
}

fn expect_array(value: &serde_json::Value) -> Result<&Vec<serde_json::Value>, FetchError> {
    value
        .as_array()
        .ok_or_else(|| FetchError::ParseError("Expected array response".to_string()))
}

fn decimal_field(json: &serde_json::Value, field: &str) -> Result<Decimal, FetchError> {
    let raw = json
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| FetchError::ParseError(format!("Missing {} field", field)))?;
    parse_amount(raw).map_err(|e| FetchError::ParseError(format!("Invalid {}: {}", field, e)))
}

fn str_field<'a>(json: &'a serde_json::Value, field: &str) -> Result<&'a str, FetchError> {
    json.get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| FetchError::ParseError(format!("Missing {} field", field)))
}

fn timestamp_field(json: &serde_json::Value) -> Result<DateTime<Utc>, FetchError> {
    let time_ms = json
        .get("time")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| FetchError::ParseError("Missing time field".to_string()))?;
    Utc.timestamp_millis_opt(time_ms)
        .single()
        .ok_or_else(|| FetchError::ParseError(format!("Invalid time: {}", time_ms)))
}

fn parse_spot_balances(spot: &serde_json::Value) -> Result<Vec<NetworkBalance>, FetchError> {
    let entries = spot
        .get("balances")
        .and_then(|v| v.as_array())
        .ok_or_else(|| FetchError::ParseError("Missing balances array".to_string()))?;

    let mut balances = Vec::with_capacity(entries.len());
    for entry in entries {
        let parsed = str_field(entry, "coin")
            .and_then(|coin| decimal_field(entry, "total").map(|total| (coin, total)));
        match parsed {
            Ok((coin, total)) => balances.push(NetworkBalance::new(
                canonical_symbol(coin),
                total,
                Network::Hyperliquid,
            )),
            Err(e) => warn!("Failed to parse spot balance: {}", e),
        }
    }
    Ok(balances)
}

/// Perp account value is USDC collateral.
fn parse_margin_balance(perp: &serde_json::Value) -> Result<Option<NetworkBalance>, FetchError> {
    let Some(summary) = perp.get("marginSummary") else {
        return Ok(None);
    };
    let account_value = decimal_field(summary, "accountValue")?;
    Ok(Some(NetworkBalance::new(
        TrackedToken::Usdc.symbol(),
        account_value,
        Network::Hyperliquid,
    )))
}

fn parse_fill_activity(fill: &serde_json::Value) -> Result<Activity, FetchError> {
    let timestamp = timestamp_field(fill)?;
    let coin = str_field(fill, "coin")?;
    let px = decimal_field(fill, "px")?;
    let sz = decimal_field(fill, "sz")?;
    let fee = decimal_field(fill, "fee").ok();

    let kind = match str_field(fill, "side")? {
        "B" => "buy",
        "A" => "sell",
        other => return Err(FetchError::ParseError(format!("Invalid side: {}", other))),
    };

    let tx_hash = fill.get("hash").and_then(|v| v.as_str()).map(str::to_string);
    let id = match fill.get("tid").and_then(|v| v.as_i64()) {
        Some(tid) => format!("fill:{}", tid),
        None => format!("fill:{}:{}", timestamp.timestamp_millis(), coin),
    };

    Ok(Activity {
        id,
        timestamp,
        category: ActivityCategory::Trade,
        kind: kind.to_string(),
        asset: canonical_symbol(coin),
        network: Network::Hyperliquid.to_string(),
        amount: sz,
        price: Some(px),
        value: px * sz,
        fee,
        tx_hash,
    })
}

fn parse_funding_activity(update: &serde_json::Value) -> Result<Activity, FetchError> {
    let timestamp = timestamp_field(update)?;
    let delta = update
        .get("delta")
        .ok_or_else(|| FetchError::ParseError("Missing delta field".to_string()))?;
    let coin = str_field(delta, "coin")?;
    let usdc = decimal_field(delta, "usdc")?;
    let tx_hash = update.get("hash").and_then(|v| v.as_str()).map(str::to_string);
    let kind = if usdc.is_sign_negative() {
        "funding_paid"
    } else {
        "funding_received"
    };

    Ok(Activity {
        id: format!("funding:{}:{}", timestamp.timestamp_millis(), coin),
        timestamp,
        category: ActivityCategory::Funding,
        kind: kind.to_string(),
        asset: canonical_symbol(coin),
        network: Network::Hyperliquid.to_string(),
        amount: usdc.abs(),
        price: None,
        value: usdc,
        fee: None,
        tx_hash,
    })
}

fn parse_ledger_activity(
    update: &serde_json::Value,
    user: &Address,
) -> Result<Activity, FetchError> {
    let timestamp = timestamp_field(update)?;
    let delta = update
        .get("delta")
        .ok_or_else(|| FetchError::ParseError("Missing delta field".to_string()))?;
    let kind = str_field(delta, "type")?.to_string();
    let tx_hash = update.get("hash").and_then(|v| v.as_str()).map(str::to_string);

    let (asset, amount, value, fee) = match kind.as_str() {
        "spotTransfer" => {
            let token = str_field(delta, "token")?;
            let amount = decimal_field(delta, "amount")?;
            let usd = decimal_field(delta, "usdcValue").unwrap_or(Decimal::ZERO);
            let incoming = delta
                .get("destination")
                .and_then(|v| v.as_str())
                .map_or(false, |d| d.eq_ignore_ascii_case(user.as_str()));
            let value = if incoming { usd } else { -usd };
            (canonical_symbol(token), amount, value, None)
        }
        "withdraw" => {
            let usdc = decimal_field(delta, "usdc")?;
            let fee = decimal_field(delta, "fee").ok();
            (TrackedToken::Usdc.symbol().to_string(), usdc, -usdc, fee)
        }
        _ => {
            let usdc = decimal_field(delta, "usdc").unwrap_or(Decimal::ZERO);
            (TrackedToken::Usdc.symbol().to_string(), usdc.abs(), usdc, None)
        }
    };

    Ok(Activity {
        id: format!(
            "ledger:{}:{}",
            timestamp.timestamp_millis(),
            tx_hash.as_deref().unwrap_or(&kind)
        ),
        timestamp,
        category: ActivityCategory::Transfer,
        kind,
        asset,
        network: Network::Hyperliquid.to_string(),
        amount,
        price: None,
        value,
        fee,
        tx_hash,
    })
}

/// Pick the requested symbols out of an `allMids` response.
///
/// USD stablecoins missing from the response are quoted at 1.0.
fn parse_mids(
    mids: &serde_json::Value,
    symbols: &[&str],
) -> Result<HashMap<String, f64>, FetchError> {
    let mids = mids
        .as_object()
        .ok_or_else(|| FetchError::ParseError("Expected object response".to_string()))?;

    let mut prices = HashMap::with_capacity(symbols.len());
    for symbol in symbols {
        let quoted = mids
            .get(*symbol)
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|p| p.is_finite() && *p > 0.0);
        match quoted {
            Some(price) => {
                prices.insert(symbol.to_string(), price);
            }
            None if TrackedToken::from_symbol(symbol).map_or(false, |t| t.is_stable()) => {
                prices.insert(symbol.to_string(), 1.0);
            }
            None => debug!(symbol, "No mid price quoted"),
        }
    }

    if prices.is_empty() {
        return Err(FetchError::ParseError("No usable mid prices".to_string()));
    }
    Ok(prices)
}
