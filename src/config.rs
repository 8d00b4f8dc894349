use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_HYPERLIQUID_API_URL: &str = "https://api.hyperliquid.xyz";
pub const DEFAULT_HYPEREVM_RPC_URL: &str = "https://rpc.hyperliquid.xyz/evm";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: String,
    pub store_backend: StoreBackend,
    pub hyperliquid_api_url: String,
    pub hyperevm_rpc_url: String,
    /// ERC-20 contracts queried on HyperEVM. Empty means the built-in list.
    pub hyperevm_token_contracts: Vec<String>,
    pub price_ttl: Duration,
    pub snapshot_interval: Duration,
    pub snapshot_warmup: Duration,
    pub history_max_points: usize,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Json,
    Sqlite,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("3001")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let data_path = env_map
            .get("DATA_PATH")
            .cloned()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnv("DATA_PATH".to_string()))?;

        let store_backend = match env_map
            .get("STORE_BACKEND")
            .map(|s| s.as_str())
            .unwrap_or("json")
        {
            "json" => StoreBackend::Json,
            "sqlite" => StoreBackend::Sqlite,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORE_BACKEND".to_string(),
                    format!("must be json or sqlite, got {}", other),
                ))
            }
        };

        let hyperliquid_api_url = env_map
            .get("HYPERLIQUID_API_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_HYPERLIQUID_API_URL.to_string());

        let hyperevm_rpc_url = env_map
            .get("HYPEREVM_RPC_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_HYPEREVM_RPC_URL.to_string());

        let hyperevm_token_contracts = parse_contract_list(&env_map)?;

        let price_ttl = parse_secs(&env_map, "PRICE_TTL_SECS", 300)?;
        let snapshot_interval = parse_secs(&env_map, "SNAPSHOT_INTERVAL_SECS", 120)?;
        if snapshot_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "SNAPSHOT_INTERVAL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let snapshot_warmup = parse_secs(&env_map, "SNAPSHOT_WARMUP_SECS", 10)?;
        let request_timeout = parse_secs(&env_map, "REQUEST_TIMEOUT_SECS", 10)?;

        let history_max_points = env_map
            .get("HISTORY_MAX_POINTS")
            .map(|s| s.as_str())
            .unwrap_or("2000")
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 2)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "HISTORY_MAX_POINTS".to_string(),
                    "must be an integer >= 2".to_string(),
                )
            })?;

        Ok(Config {
            port,
            data_path,
            store_backend,
            hyperliquid_api_url,
            hyperevm_rpc_url,
            hyperevm_token_contracts,
            price_ttl,
            snapshot_interval,
            snapshot_warmup,
            history_max_points,
            request_timeout,
        })
    }
}

fn parse_secs(
    env_map: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    match env_map.get(key) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| {
                ConfigError::InvalidValue(key.to_string(), "must be a number of seconds".to_string())
            }),
    }
}

fn parse_contract_list(env_map: &HashMap<String, String>) -> Result<Vec<String>, ConfigError> {
    let Some(raw) = env_map.get("HYPEREVM_TOKEN_CONTRACTS") else {
        return Ok(Vec::new());
    };
    let mut contracts = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if item.parse::<crate::domain::Address>().is_err() {
            return Err(ConfigError::InvalidValue(
                "HYPEREVM_TOKEN_CONTRACTS".to_string(),
                format!("invalid contract address {}", item),
            ));
        }
        contracts.push(item.to_lowercase());
    }
    Ok(contracts)
}
