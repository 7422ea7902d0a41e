use std::time::Duration;

use alloy::primitives::Address;
use alloy::primitives::B256;
use alloy::primitives::U256;
use thiserror::Error;
use xsp_messages::types::request::ErrorKind;
pub use xsp_messages::types::request::RetryClass;
use xsp_messages::types::FormatError;
use xsp_messages::types::SlotStatus;
use xsp_messages::BlockNr;
use xsp_messages::ChainId;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a proof could not be produced.
///
/// Every variant aborts the request it was raised in; no partial proof is returned.
#[derive(Debug, Error)]
pub enum ProverError {
    #[error("header-sync contract {contract} on chain {chain_id} has not synced any block")]
    NeverSynced { chain_id: ChainId, contract: Address },

    #[error("chain {chain_id} does not know synced block {hash}")]
    UnknownBlock { chain_id: ChainId, hash: B256 },

    #[error("latest synced block of chain {chain_id} is {synced}, signal was sent in {required}")]
    NotYetSynced {
        chain_id: ChainId,
        synced: u128,
        required: BlockNr,
    },

    #[error("slot {key} of {contract} holds {actual:#x}, expected {expected}")]
    InvalidProof {
        contract: Address,
        key: B256,
        expected: SlotStatus,
        actual: U256,
    },

    #[error("`{method}` on chain {chain_id} failed")]
    Rpc {
        chain_id: ChainId,
        method: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("`{method}` on chain {chain_id} timed out after {after:?}")]
    Timeout {
        chain_id: ChainId,
        method: &'static str,
        after: Duration,
    },

    #[error("`{method}` on chain {chain_id} returned a malformed response")]
    Malformed {
        chain_id: ChainId,
        method: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("no RPC endpoint for chain {0}")]
    UnknownChain(ChainId),

    #[error(transparent)]
    Encoding(#[from] FormatError),
}

impl ProverError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProverError::NeverSynced { .. }
            | ProverError::UnknownBlock { .. }
            | ProverError::NotYetSynced { .. } => ErrorKind::HeaderNotFound,
            ProverError::InvalidProof { .. } => ErrorKind::InvalidProof,
            ProverError::Rpc { .. } => ErrorKind::Rpc,
            ProverError::Timeout { .. } => ErrorKind::Timeout,
            ProverError::Malformed { .. }
            | ProverError::UnknownChain(_)
            | ProverError::Encoding(_) => ErrorKind::Encoding,
        }
    }

    pub fn retry_class(&self) -> RetryClass {
        self.kind().retry_class()
    }
}
