use alloy::primitives::Address;
use alloy::primitives::B256;
use tracing::debug;
use xsp_messages::types::proof::AccountProofResponse;
use xsp_messages::types::SlotStatus;
use xsp_messages::ChainId;

use crate::client::ChainClients;
use crate::error::ProverError;

pub struct StorageProofFetcher<'a> {
    clients: &'a ChainClients,
}

impl<'a> StorageProofFetcher<'a> {
    pub fn new(clients: &'a ChainClients) -> Self {
        Self { clients }
    }

    /// Fetches the account and storage proof of `key` at `block_hash`, and checks the slot
    /// holds `expected`.
    ///
    /// The Merkle nodes themselves are not checked here. The verifying contract recomputes the
    /// roots from them.
    #[tracing::instrument(skip(self), err(Debug))]
    pub async fn fetch_and_validate(
        &self,
        proof_chain_id: ChainId,
        target_contract: Address,
        key: B256,
        block_hash: B256,
        expected: SlotStatus,
    ) -> Result<AccountProofResponse, ProverError> {
        let raw = self
            .clients
            .proof(proof_chain_id, target_contract, key, block_hash)
            .await?;
        let proof = AccountProofResponse::from(raw);

        let slot = proof.slot_proof()?;
        debug!(?slot, "storage proof");
        if slot.value != expected.value() {
            return Err(ProverError::InvalidProof {
                contract: target_contract,
                key,
                expected,
                actual: slot.value,
            });
        }

        Ok(proof)
    }
}
