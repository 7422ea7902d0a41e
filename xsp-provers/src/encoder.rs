//! Byte layout handed to the verifying contract.
//!
//! The output is `abi.encode(SignalProof(header, abi.encode(accountProofRlp, storageProofRlp)))`
//! where each `*Rlp` is the RLP list of the proof's trie nodes.
use alloy::primitives::Bytes;
use alloy::rlp::Decodable;
use alloy::sol_types::SolValue;
use derive_debug_plus::Dbg;
use xsp_messages::types::abi::BlockHeader;
use xsp_messages::types::abi::SignalProof;
use xsp_messages::types::nodes_pretty;
use xsp_messages::types::proof::AccountProofResponse;
use xsp_messages::types::FormatError;

/// The pieces of an encoded proof.
#[derive(Clone, Dbg, PartialEq, Eq)]
pub struct DecodedProof {
    pub header: BlockHeader,
    #[dbg(formatter = nodes_pretty)]
    pub account_proof_nodes: Vec<Bytes>,
    #[dbg(formatter = nodes_pretty)]
    pub storage_proof_nodes: Vec<Bytes>,
}

pub fn encode(
    header: &BlockHeader,
    proof: &AccountProofResponse,
) -> Result<Bytes, FormatError> {
    let slot = proof.slot_proof()?;

    let account_rlp = Bytes::from(alloy::rlp::encode(&proof.account_proof_nodes));
    let storage_rlp = Bytes::from(alloy::rlp::encode(&slot.proof_nodes));
    let nodes = (account_rlp, storage_rlp).abi_encode_params();

    let signal_proof = SignalProof {
        header: header.clone(),
        proof: nodes.into(),
    };
    Ok(signal_proof.abi_encode().into())
}

/// Inverse of [`encode`].
pub fn decode(data: &[u8]) -> Result<DecodedProof, FormatError> {
    let signal_proof =
        SignalProof::abi_decode(data, true).map_err(|e| FormatError::Decode(e.to_string()))?;
    let (account_rlp, storage_rlp) = <(Bytes, Bytes)>::abi_decode_params(&signal_proof.proof, true)
        .map_err(|e| FormatError::Decode(e.to_string()))?;

    Ok(DecodedProof {
        header: signal_proof.header,
        account_proof_nodes: rlp_nodes(&account_rlp)?,
        storage_proof_nodes: rlp_nodes(&storage_rlp)?,
    })
}

fn rlp_nodes(mut data: &[u8]) -> Result<Vec<Bytes>, FormatError> {
    let nodes = Vec::<Bytes>::decode(&mut data).map_err(|e| FormatError::Decode(e.to_string()))?;
    if !data.is_empty() {
        return Err(FormatError::Decode(format!(
            "{} trailing bytes after node list",
            data.len()
        )));
    }
    Ok(nodes)
}
