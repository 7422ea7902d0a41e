use alloy::primitives::Address;
use metrics::histogram;
use tracing::info;
use xsp_messages::routing::Role;
use xsp_messages::types::Signal;
use xsp_messages::ChainId;
use xsp_messages::ProofBytes;

use crate::client::ChainClients;
use crate::encoder;
use crate::error::ProverError;
use crate::header_sync::HeaderSyncClient;
use crate::key::derive_key;
use crate::storage_proof::StorageProofFetcher;

/// Builds signal proofs for both directions of a bridge.
///
/// Holds no per-request state; concurrent calls share only the RPC clients.
#[derive(Clone)]
pub struct Prover {
    clients: ChainClients,
}

impl Prover {
    pub fn new(clients: ChainClients) -> Self {
        Self { clients }
    }

    /// Proof, verifiable on `dest_chain_id`, that `signal` was sent on `src_chain_id`.
    pub async fn generate_claim_proof(
        &self,
        signal: Signal,
        src_chain_id: ChainId,
        dest_chain_id: ChainId,
        dest_header_sync: Address,
        src_signal_service: Address,
    ) -> Result<ProofBytes, ProverError> {
        let role = Role::for_claim(
            src_chain_id,
            dest_chain_id,
            dest_header_sync,
            src_signal_service,
        );
        self.generate(signal, role).await
    }

    /// Proof, verifiable on `src_chain_id`, that the message behind `signal` failed on
    /// `dest_chain_id`.
    pub async fn generate_release_proof(
        &self,
        signal: Signal,
        src_chain_id: ChainId,
        dest_chain_id: ChainId,
        src_header_sync: Address,
        dest_bridge: Address,
    ) -> Result<ProofBytes, ProverError> {
        let role = Role::for_release(src_chain_id, dest_chain_id, src_header_sync, dest_bridge);
        self.generate(signal, role).await
    }

    /// Runs one proof: derive the slot, find the synced block, prove the slot at that block and
    /// encode.
    ///
    /// Every run is timed, failed ones included.
    #[tracing::instrument(skip(self), err(Debug))]
    pub async fn generate(
        &self,
        signal: Signal,
        role: Role,
    ) -> Result<ProofBytes, ProverError> {
        let now = std::time::Instant::now();
        let result = self.prove(signal, role).await;
        let time = now.elapsed().as_secs_f32();

        histogram!(
            "xsp_proof_generation_seconds",
            "flow" => role.flow.to_string(),
            "result" => result_label(&result)
        )
        .record(time);

        result
    }

    async fn prove(
        &self,
        signal: Signal,
        role: Role,
    ) -> Result<ProofBytes, ProverError> {
        let now = std::time::Instant::now();

        let key = derive_key(&signal);

        let synced = HeaderSyncClient::new(&self.clients)
            .fetch_synced_header(role.sync_chain_id, role.sync_contract, role.proof_chain_id)
            .await?;

        if let Some(required) = role.min_height {
            if !synced.covers(required) {
                return Err(ProverError::NotYetSynced {
                    chain_id: role.proof_chain_id,
                    synced: synced.header.height,
                    required,
                });
            }
        }

        let proof = StorageProofFetcher::new(&self.clients)
            .fetch_and_validate(
                role.proof_chain_id,
                role.target_contract,
                key,
                synced.hash,
                role.expected_status,
            )
            .await?;

        let encoded = encoder::encode(&synced.header, &proof)?;

        let time = now.elapsed().as_secs_f32();
        info!(
            time,
            flow = %role.flow,
            %key,
            pair = ?role.chain_pair(),
            block = %synced.hash,
            size = encoded.len(),
            "signal proof generated"
        );

        Ok(encoded)
    }
}

/// `ok`, or the error kind of a failed run.
fn result_label(result: &Result<ProofBytes, ProverError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(err) => err.kind().as_str(),
    }
}
