//! Relay worker process: drains the durable message queue against the
//! configured chain. Message intake and status queries are served by the
//! HTTP layer embedding `wallet_relay_core::MessageHandler` over the same
//! stores.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use alloy::signers::local::PrivateKeySigner;
use eyre::{eyre, WrapErr};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wallet_relay_adapters::{HttpBlockchain, RelayConfig, SledRelayStore};
use wallet_relay_core::MessageExecutor;

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = RelayConfig::from_env();
    let signer: PrivateKeySigner = config
        .relay_private_key
        .as_deref()
        .ok_or_else(|| eyre!("RELAY_PRIVATE_KEY is not set"))?
        .parse()
        .wrap_err("invalid relay private key")?;

    let store = SledRelayStore::open(&config.database_path)
        .wrap_err("failed to open the relay database")?;
    let chain = HttpBlockchain::new(config.json_rpc_url.clone())
        .wrap_err("failed to initialise the chain client")?
        .with_receipt_polling(
            Duration::from_millis(config.receipt_poll_interval_ms),
            config.receipt_poll_attempts,
        );

    info!(
        relay = %signer.address(),
        rpc = %config.json_rpc_url,
        chain_id = config.chain_id,
        "starting relay executor"
    );

    let mut executor = MessageExecutor::new(store, chain, signer, config.chain_id)
        .wrap_err("failed to initialise the executor")?;

    let stop = AtomicBool::new(false);
    executor
        .run(&stop, Duration::from_millis(config.executor_idle_ms))
        .wrap_err("executor stopped on an infrastructure error")?;
    Ok(())
}
