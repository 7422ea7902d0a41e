//! Which chain and contract play which part in a proof.
use alloy_primitives::Address;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::types::request::Flow;
use crate::types::SlotStatus;
use crate::BlockNr;
use crate::ChainId;

/// A directed pair of chains.
///
/// For a claim, `local` is the chain the signal was sent from and `remote` the chain it is
/// claimed on. A release inverts both.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ChainPair {
    pub local_chain_id: ChainId,
    pub remote_chain_id: ChainId,
}

impl ChainPair {
    pub fn new(
        local_chain_id: ChainId,
        remote_chain_id: ChainId,
    ) -> Self {
        Self {
            local_chain_id,
            remote_chain_id,
        }
    }

    pub fn inverted(&self) -> Self {
        Self::new(self.remote_chain_id, self.local_chain_id)
    }
}

/// Bridge contracts deployed on one chain for one counterpart chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteContracts {
    /// Records the counterpart chain's block hashes.
    pub header_sync: Address,

    /// Stores outgoing signals.
    pub signal_service: Address,

    /// Stores the status of incoming messages.
    pub bridge: Address,
}

/// Everything a single proof run needs to know about where to look.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Role {
    /// Chain hosting the header-sync contract.
    pub sync_chain_id: ChainId,

    /// Header-sync contract on `sync_chain_id`.
    pub sync_contract: Address,

    /// Chain whose state is proven. Also the chain the synced header belongs to.
    pub proof_chain_id: ChainId,

    /// Contract on `proof_chain_id` holding the signal slot.
    pub target_contract: Address,

    pub flow: Flow,

    pub expected_status: SlotStatus,

    /// Lowest synced height that can contain the signal.
    pub min_height: Option<BlockNr>,
}

impl Role {
    /// The destination chain's header-sync must have seen the source block, and the source
    /// signal service must have recorded the signal as sent.
    pub fn for_claim(
        src_chain_id: ChainId,
        dest_chain_id: ChainId,
        dest_header_sync: Address,
        src_signal_service: Address,
    ) -> Self {
        Self {
            sync_chain_id: dest_chain_id,
            sync_contract: dest_header_sync,
            proof_chain_id: src_chain_id,
            target_contract: src_signal_service,
            flow: Flow::Claim,
            expected_status: Flow::Claim.expected_status(),
            min_height: None,
        }
    }

    /// The source chain's header-sync must have seen the destination block, and the
    /// destination bridge must have marked the message as failed.
    pub fn for_release(
        src_chain_id: ChainId,
        dest_chain_id: ChainId,
        src_header_sync: Address,
        dest_bridge: Address,
    ) -> Self {
        Self {
            sync_chain_id: src_chain_id,
            sync_contract: src_header_sync,
            proof_chain_id: dest_chain_id,
            target_contract: dest_bridge,
            flow: Flow::Release,
            expected_status: Flow::Release.expected_status(),
            min_height: None,
        }
    }

    pub fn with_min_height(
        mut self,
        height: Option<BlockNr>,
    ) -> Self {
        self.min_height = height;
        self
    }

    /// `local` is the chain being proven, `remote` the chain that verifies.
    pub fn chain_pair(&self) -> ChainPair {
        ChainPair::new(self.proof_chain_id, self.sync_chain_id)
    }
}
