use alloy_primitives::Bytes;
use alloy_primitives::B256;
use alloy_primitives::U256;
use derive_debug_plus::Dbg;
use serde_derive::Deserialize;

use crate::types::block::Quantity;
use crate::types::FormatError;

/// The subset of an `eth_getProof` response the encoder needs.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProofResponse {
    pub account_proof: Vec<Bytes>,
    pub storage_proof: Vec<RawStorageProof>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RawStorageProof {
    /// Some nodes echo the requested key back in its compact quantity form.
    pub key: Quantity,
    pub value: Quantity,
    pub proof: Vec<Bytes>,
}

/// One Merkle-Patricia storage proof.
#[derive(Clone, Dbg, PartialEq, Eq)]
pub struct StorageProofEntry {
    pub key: B256,
    pub value: U256,
    #[dbg(formatter = crate::types::nodes_pretty)]
    pub proof_nodes: Vec<Bytes>,
}

/// Proof of inclusion for one contract account and its storage slots at one block.
#[derive(Clone, Dbg, PartialEq, Eq)]
pub struct AccountProofResponse {
    #[dbg(formatter = crate::types::nodes_pretty)]
    pub account_proof_nodes: Vec<Bytes>,
    pub storage_proof: Vec<StorageProofEntry>,
}

impl AccountProofResponse {
    /// The single storage proof requested alongside the account proof.
    pub fn slot_proof(&self) -> Result<&StorageProofEntry, FormatError> {
        match self.storage_proof.as_slice() {
            [entry] => Ok(entry),
            entries => Err(FormatError::StorageProofCount(entries.len())),
        }
    }
}

impl From<RawStorageProof> for StorageProofEntry {
    fn from(raw: RawStorageProof) -> Self {
        Self {
            key: B256::from(raw.key.value()),
            value: raw.value.value(),
            proof_nodes: raw.proof,
        }
    }
}

impl From<RawProofResponse> for AccountProofResponse {
    fn from(raw: RawProofResponse) -> Self {
        Self {
            account_proof_nodes: raw.account_proof,
            storage_proof: raw
                .storage_proof
                .into_iter()
                .map(StorageProofEntry::from)
                .collect(),
        }
    }
}
