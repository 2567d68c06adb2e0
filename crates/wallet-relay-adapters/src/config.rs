use std::path::PathBuf;

use alloy::primitives::B256;

use wallet_relay_core::ContractWhiteList;

/// Relay runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub json_rpc_url: String,
    pub chain_id: u64,
    /// Hex-encoded private key of the relay account.
    pub relay_private_key: Option<String>,
    pub database_path: PathBuf,
    /// Approved bytecode hashes for wallet master contracts.
    pub master_code_hashes: Vec<B256>,
    /// Approved bytecode hashes for wallet proxy contracts.
    pub proxy_code_hashes: Vec<B256>,
    pub executor_idle_ms: u64,
    pub receipt_poll_interval_ms: u64,
    pub receipt_poll_attempts: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            json_rpc_url: "http://127.0.0.1:8545".to_owned(),
            chain_id: 1,
            relay_private_key: None,
            database_path: PathBuf::from("wallet-relay-db"),
            master_code_hashes: Vec::new(),
            proxy_code_hashes: Vec::new(),
            executor_idle_ms: 500,
            receipt_poll_interval_ms: 1_000,
            receipt_poll_attempts: 120,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("RELAY_JSON_RPC_URL") {
            config.json_rpc_url = url;
        }
        if let Some(chain_id) = env_parse("RELAY_CHAIN_ID") {
            config.chain_id = chain_id;
        }
        if let Ok(key) = std::env::var("RELAY_PRIVATE_KEY") {
            config.relay_private_key = Some(key);
        }
        if let Ok(path) = std::env::var("RELAY_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(hashes) = std::env::var("RELAY_MASTER_CODE_HASHES") {
            config.master_code_hashes = parse_hash_list(&hashes);
        }
        if let Ok(hashes) = std::env::var("RELAY_PROXY_CODE_HASHES") {
            config.proxy_code_hashes = parse_hash_list(&hashes);
        }
        if let Some(idle) = env_parse("RELAY_EXECUTOR_IDLE_MS") {
            config.executor_idle_ms = idle;
        }
        if let Some(interval) = env_parse("RELAY_RECEIPT_POLL_INTERVAL_MS") {
            config.receipt_poll_interval_ms = interval;
        }
        if let Some(attempts) = env_parse("RELAY_RECEIPT_POLL_ATTEMPTS") {
            config.receipt_poll_attempts = attempts;
        }
        config
    }

    pub fn whitelist(&self) -> ContractWhiteList {
        ContractWhiteList {
            master: self.master_code_hashes.clone(),
            proxy: self.proxy_code_hashes.clone(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn parse_hash_list(raw: &str) -> Vec<B256> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}
