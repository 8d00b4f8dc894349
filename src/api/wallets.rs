use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::{
    Address, Network, NetworkBalance, VaultAddresses, Wallet, WalletType, WalletUpdate,
};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletsResponse {
    pub wallets: Vec<Wallet>,
    pub available_tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddressesInput {
    pub hyperliquid: String,
    pub hyperevm: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletRequest {
    pub wallet_type: String,
    #[serde(default)]
    pub nickname: String,
    pub addresses: Option<AddressesInput>,
    pub address: Option<String>,
    pub blockchain: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWalletRequest {
    pub nickname: Option<String>,
    pub addresses: Option<AddressesInput>,
    pub address: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct TagsRequest {
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BalancesQuery {
    pub blockchain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BalancesResponse {
    pub address: Address,
    pub blockchain: Network,
    pub balances: Vec<NetworkBalance>,
}

fn parse_address(raw: &str, field: &str) -> Result<Address, AppError> {
    Address::from_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {} address", field)))
}

fn parse_addresses(input: &AddressesInput) -> Result<VaultAddresses, AppError> {
    Ok(VaultAddresses {
        hyperliquid: parse_address(&input.hyperliquid, "hyperliquid")?,
        hyperevm: parse_address(&input.hyperevm, "hyperevm")?,
    })
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

pub async fn list_wallets(State(state): State<AppState>) -> Result<Json<WalletsResponse>, AppError> {
    let document = state.repo.load().await?;
    Ok(Json(WalletsResponse {
        wallets: document.wallets,
        available_tags: document.available_tags,
    }))
}

pub async fn create_wallet(
    State(state): State<AppState>,
    Json(req): Json<CreateWalletRequest>,
) -> Result<(StatusCode, Json<Wallet>), AppError> {
    let wallet_type = match req.wallet_type.to_ascii_lowercase().as_str() {
        "vault" => WalletType::Vault,
        "executor" => WalletType::Executor,
        other => return Err(AppError::BadRequest(format!("Unknown wallet type: {}", other))),
    };

    let mut wallet = Wallet {
        id: Uuid::new_v4().to_string(),
        wallet_type,
        nickname: req.nickname.trim().to_string(),
        addresses: None,
        address: None,
        blockchain: None,
        tags: clean_tags(req.tags),
        created_at: Utc::now(),
    };

    match wallet_type {
        WalletType::Vault => {
            let addresses = req.addresses.as_ref().ok_or_else(|| {
                AppError::BadRequest("Vault wallets need hyperliquid and hyperevm addresses".into())
            })?;
            wallet.addresses = Some(parse_addresses(addresses)?);
        }
        WalletType::Executor => {
            let address = req
                .address
                .as_deref()
                .ok_or_else(|| AppError::BadRequest("Executor wallets need an address".into()))?;
            let blockchain = req
                .blockchain
                .as_deref()
                .ok_or_else(|| AppError::BadRequest("Executor wallets need a blockchain".into()))?;
            wallet.address = Some(parse_address(address, "wallet")?);
            wallet.blockchain = Some(Network::from_str(blockchain).map_err(AppError::BadRequest)?);
        }
    }

    let wallet = state.repo.add_wallet(wallet).await?;
    tracing::info!(id = %wallet.id, wallet_type = ?wallet.wallet_type, "Created wallet");
    Ok((StatusCode::CREATED, Json(wallet)))
}

pub async fn update_wallet(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<UpdateWalletRequest>,
) -> Result<Json<Wallet>, AppError> {
    let update = WalletUpdate {
        nickname: req.nickname.map(|n| n.trim().to_string()),
        addresses: req.addresses.as_ref().map(parse_addresses).transpose()?,
        address: req
            .address
            .as_deref()
            .map(|a| parse_address(a, "wallet"))
            .transpose()?,
        tags: req.tags.map(clean_tags),
    };
    Ok(Json(state.repo.update_wallet(&id, update).await?))
}

pub async fn delete_wallet(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.repo.delete_wallet(&id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn add_tags(
    State(state): State<AppState>,
    Json(req): Json<TagsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tags = state.repo.merge_tags(req.tags).await?;
    Ok(Json(serde_json::json!({ "availableTags": tags })))
}

/// Raw balances of any address on one network.
pub async fn get_balances(
    Path(address): Path<String>,
    Query(params): Query<BalancesQuery>,
    State(state): State<AppState>,
) -> Result<Json<BalancesResponse>, AppError> {
    let address = parse_address(&address, "wallet")?;
    let blockchain = match params.blockchain.as_deref() {
        Some(raw) => Network::from_str(raw).map_err(AppError::BadRequest)?,
        None => Network::Hyperliquid,
    };

    let balances = state.valuation.fetch_balances(blockchain, &address).await?;
    Ok(Json(BalancesResponse {
        address,
        blockchain,
        balances,
    }))
}
