use alloy::primitives::Address;
use alloy::primitives::B256;
use tracing::debug;
use xsp_messages::types::abi::BlockHeader;
use xsp_messages::types::block::RawBlock;
use xsp_messages::BlockNr;
use xsp_messages::ChainId;

use crate::client::ChainClients;
use crate::error::ProverError;

/// A block of one chain that a header-sync contract on another chain has accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncedHeader {
    pub hash: B256,
    pub block: RawBlock,
    pub header: BlockHeader,
}

impl SyncedHeader {
    /// Whether the synced block is at least `height`.
    pub fn covers(
        &self,
        height: BlockNr,
    ) -> bool {
        self.header.height >= u128::from(height)
    }
}

pub struct HeaderSyncClient<'a> {
    clients: &'a ChainClients,
}

impl<'a> HeaderSyncClient<'a> {
    pub fn new(clients: &'a ChainClients) -> Self {
        Self { clients }
    }

    /// Looks up the latest block of `remote_chain_id` accepted by `sync_contract` on
    /// `sync_chain_id` and loads its header from `remote_chain_id`.
    #[tracing::instrument(skip(self), err(Debug))]
    pub async fn fetch_synced_header(
        &self,
        sync_chain_id: ChainId,
        sync_contract: Address,
        remote_chain_id: ChainId,
    ) -> Result<SyncedHeader, ProverError> {
        let hash = self
            .clients
            .latest_synced_header(sync_chain_id, sync_contract)
            .await?;
        if hash.is_zero() {
            return Err(ProverError::NeverSynced {
                chain_id: sync_chain_id,
                contract: sync_contract,
            });
        }
        debug!(%hash, "synced header");

        let block = self
            .clients
            .block_by_hash(remote_chain_id, hash)
            .await?
            .ok_or(ProverError::UnknownBlock {
                chain_id: remote_chain_id,
                hash,
            })?;
        block.ensure_hash(hash)?;

        let header = BlockHeader::try_from(&block)?;

        Ok(SyncedHeader {
            hash,
            block,
            header,
        })
    }
}
