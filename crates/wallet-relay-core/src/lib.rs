pub mod authorisation;
pub mod contracts;
pub mod digest;
pub mod domain;
pub mod error;
pub mod executor;
pub mod handler;
pub mod ports;
pub mod validator;

pub use authorisation::AuthorisationService;
pub use domain::{
    AddAuthorisationRequest, CancelAuthorisationRequest, MessageStatus, PendingAuthorisation,
    QueueState, QueuedMessage, SignatureTally, SignedMessage, TimestampMs, TransactionOutcome,
    TransactionRequest, UnsignedMessage, ETHER_TOKEN,
};
pub use error::RelayError;
pub use executor::{ExecutionOutcome, ExecutionResult, MessageExecutor};
pub use handler::MessageHandler;
pub use ports::{AuthorisationStore, BlockchainPort, MessageQueueStore, PendingSignatureStore};
pub use validator::{ContractWhiteList, MessageValidator};
