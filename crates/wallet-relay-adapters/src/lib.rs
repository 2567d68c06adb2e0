pub mod config;
pub mod memory;
pub mod rpc;
pub mod sled;

pub use config::RelayConfig;
pub use memory::{InMemoryAuthorisationStore, InMemoryPendingStore, InMemoryQueueStore};
pub use rpc::HttpBlockchain;
pub use self::sled::SledRelayStore;

use wallet_relay_core::TimestampMs;

pub(crate) fn now_ms() -> TimestampMs {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    TimestampMs(millis)
}
