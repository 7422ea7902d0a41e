//! JSON-RPC access to the chains a proof touches.
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::primitives::B256;
use alloy::providers::Provider;
use alloy::providers::RootProvider;
use alloy::sol;
use alloy::transports::http::reqwest::Url;
use alloy::transports::RpcError;
use alloy::transports::TransportError;
use async_trait::async_trait;
use thiserror::Error;
use xsp_messages::types::block::RawBlock;
use xsp_messages::types::proof::RawProofResponse;
use xsp_messages::ChainId;

use crate::error::BoxError;
use crate::error::ProverError;

sol! {
    #[sol(rpc)]
    interface IHeaderSync {
        function getLatestSyncedHeader() external view returns (bytes32);
    }
}

/// A failed remote call, before it is attributed to a chain and method.
#[derive(Debug, Error)]
pub enum RpcFailure {
    /// The call did not complete: connection errors, error responses, nodes that cannot serve
    /// the requested state.
    #[error(transparent)]
    Transport(BoxError),

    /// The node answered with something that does not have the expected shape.
    #[error(transparent)]
    Malformed(BoxError),
}

impl From<TransportError> for RpcFailure {
    fn from(err: TransportError) -> Self {
        match err {
            RpcError::DeserError { .. } => RpcFailure::Malformed(Box::new(err)),
            _ => RpcFailure::Transport(Box::new(err)),
        }
    }
}

impl From<alloy::contract::Error> for RpcFailure {
    fn from(err: alloy::contract::Error) -> Self {
        match err {
            alloy::contract::Error::TransportError(err) => err.into(),
            _ => RpcFailure::Malformed(Box::new(err)),
        }
    }
}

/// The read-only calls a proof needs from one chain.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// `getLatestSyncedHeader()` on a header-sync contract.
    async fn latest_synced_header(
        &self,
        contract: Address,
    ) -> Result<B256, RpcFailure>;

    /// `eth_getBlockByHash(hash, false)`. `None` when the node does not know the block.
    async fn block_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<RawBlock>, RpcFailure>;

    /// `eth_getProof(address, [key], block_hash)`.
    async fn proof(
        &self,
        address: Address,
        key: B256,
        block_hash: B256,
    ) -> Result<RawProofResponse, RpcFailure>;
}

/// [`ChainRpc`] over an HTTP JSON-RPC endpoint.
pub struct AlloyChainClient {
    provider: RootProvider,
}

impl AlloyChainClient {
    pub fn new(url: Url) -> Self {
        Self {
            provider: RootProvider::new_http(url),
        }
    }
}

#[async_trait]
impl ChainRpc for AlloyChainClient {
    async fn latest_synced_header(
        &self,
        contract: Address,
    ) -> Result<B256, RpcFailure> {
        let header_sync = IHeaderSync::new(contract, &self.provider);
        let hash = header_sync.getLatestSyncedHeader().call().await?;
        Ok(hash._0)
    }

    async fn block_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<RawBlock>, RpcFailure> {
        let block: Option<RawBlock> = self
            .provider
            .raw_request("eth_getBlockByHash".into(), (hash, false))
            .await?;
        Ok(block)
    }

    async fn proof(
        &self,
        address: Address,
        key: B256,
        block_hash: B256,
    ) -> Result<RawProofResponse, RpcFailure> {
        let proof: RawProofResponse = self
            .provider
            .raw_request("eth_getProof".into(), (address, [key], block_hash))
            .await?;
        Ok(proof)
    }
}

/// One RPC client per chain, shared by every in-flight request.
///
/// Each call is bounded by the same timeout and its failure is tagged with the chain and
/// method it came from.
#[derive(Clone)]
pub struct ChainClients {
    clients: HashMap<ChainId, Arc<dyn ChainRpc>>,
    timeout: Duration,
}

impl ChainClients {
    pub fn new(timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            timeout,
        }
    }

    pub fn with_client(
        mut self,
        chain_id: ChainId,
        client: Arc<dyn ChainRpc>,
    ) -> Self {
        self.clients.insert(chain_id, client);
        self
    }

    fn client(
        &self,
        chain_id: ChainId,
    ) -> Result<&Arc<dyn ChainRpc>, ProverError> {
        self.clients
            .get(&chain_id)
            .ok_or(ProverError::UnknownChain(chain_id))
    }

    async fn bounded<T>(
        &self,
        chain_id: ChainId,
        method: &'static str,
        call: impl Future<Output = Result<T, RpcFailure>>,
    ) -> Result<T, ProverError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(RpcFailure::Transport(source))) => {
                Err(ProverError::Rpc {
                    chain_id,
                    method,
                    source,
                })
            },
            Ok(Err(RpcFailure::Malformed(source))) => {
                Err(ProverError::Malformed {
                    chain_id,
                    method,
                    source,
                })
            },
            Err(_) => {
                Err(ProverError::Timeout {
                    chain_id,
                    method,
                    after: self.timeout,
                })
            },
        }
    }

    pub async fn latest_synced_header(
        &self,
        chain_id: ChainId,
        contract: Address,
    ) -> Result<B256, ProverError> {
        let rpc = self.client(chain_id)?;
        self.bounded(
            chain_id,
            "getLatestSyncedHeader",
            rpc.latest_synced_header(contract),
        )
        .await
    }

    pub async fn block_by_hash(
        &self,
        chain_id: ChainId,
        hash: B256,
    ) -> Result<Option<RawBlock>, ProverError> {
        let rpc = self.client(chain_id)?;
        self.bounded(chain_id, "eth_getBlockByHash", rpc.block_by_hash(hash))
            .await
    }

    pub async fn proof(
        &self,
        chain_id: ChainId,
        address: Address,
        key: B256,
        block_hash: B256,
    ) -> Result<RawProofResponse, ProverError> {
        let rpc = self.client(chain_id)?;
        self.bounded(chain_id, "eth_getProof", rpc.proof(address, key, block_hash))
            .await
    }
}
