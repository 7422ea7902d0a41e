use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::address;
use alloy::primitives::b256;
use alloy::primitives::Address;
use alloy::primitives::B256;
use async_trait::async_trait;
use warp::http::StatusCode;
use xsp_messages::routing::RouteContracts;
use xsp_messages::types::block::RawBlock;
use xsp_messages::types::proof::RawProofResponse;
use xsp_messages::types::request::ErrorKind;
use xsp_messages::types::request::Flow;
use xsp_messages::types::request::ProofReply;
use xsp_messages::types::request::ProofRequest;
use xsp_messages::types::request::RetryClass;
use xsp_messages::types::Signal;
use xsp_messages::ChainId;
use xsp_provers::client::ChainClients;
use xsp_provers::client::ChainRpc;
use xsp_provers::client::RpcFailure;
use xsp_provers::key::derive_key;
use xsp_provers::retry::RetryPolicy;
use xsp_provers::Prover;

use crate::manager::ProofManager;
use crate::server;

const L1: ChainId = 1;
const L2: ChainId = 167_000;
const SYNCED: B256 = b256!("1c9f6a8b0e2d4c3f5a7b9d1e3f5a7c9e1b3d5f7a9c1e3b5d7f9a1c3e5b7d9f1a");

const L1_CONTRACTS: RouteContracts = RouteContracts {
    header_sync: address!("00000000000000000000000000000000000000a1"),
    signal_service: address!("00000000000000000000000000000000000000b1"),
    bridge: address!("00000000000000000000000000000000000000c1"),
};

const L2_CONTRACTS: RouteContracts = RouteContracts {
    header_sync: address!("00000000000000000000000000000000000000a2"),
    signal_service: address!("00000000000000000000000000000000000000b2"),
    bridge: address!("00000000000000000000000000000000000000c2"),
};

/// A chain whose header-sync contracts and proofs are fixed up front.
///
/// Proofs are keyed by contract and storage slot; any other slot is missing from the trie.
struct StaticChain {
    synced: HashMap<Address, B256>,
    proofs: HashMap<(Address, B256), &'static str>,
}

#[async_trait]
impl ChainRpc for StaticChain {
    async fn latest_synced_header(
        &self,
        contract: Address,
    ) -> Result<B256, RpcFailure> {
        Ok(self.synced.get(&contract).copied().unwrap_or_default())
    }

    async fn block_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<RawBlock>, RpcFailure> {
        if hash != SYNCED {
            return Ok(None);
        }
        serde_json::from_str(include_str!("../fixtures/synced_block.json"))
            .map(Some)
            .map_err(|e| RpcFailure::Malformed(Box::new(e)))
    }

    async fn proof(
        &self,
        address: Address,
        key: B256,
        _block_hash: B256,
    ) -> Result<RawProofResponse, RpcFailure> {
        let value = self
            .proofs
            .get(&(address, key))
            .ok_or_else(|| RpcFailure::Transport("missing trie node".into()))?;
        let mut proof: serde_json::Value =
            serde_json::from_str(include_str!("../fixtures/signal_proof.json"))
                .map_err(|e| RpcFailure::Malformed(Box::new(e)))?;
        proof["storageProof"][0]["value"] = (*value).into();
        serde_json::from_value(proof).map_err(|e| RpcFailure::Malformed(Box::new(e)))
    }
}

/// L2 has synced L1's block: L1 -> L2 messages can be claimed, L2 -> L1 messages released.
fn manager() -> ProofManager {
    let l1 = StaticChain {
        synced: HashMap::new(),
        proofs: HashMap::from([(
            (L1_CONTRACTS.signal_service, derive_key(&signal())),
            "0x1",
        )]),
    };
    let l2 = StaticChain {
        synced: HashMap::from([(L2_CONTRACTS.header_sync, SYNCED)]),
        proofs: HashMap::new(),
    };
    let clients = ChainClients::new(Duration::from_secs(1))
        .with_client(L1, Arc::new(l1))
        .with_client(L2, Arc::new(l2));

    let routes = HashMap::from([((L1, L2), L1_CONTRACTS), ((L2, L1), L2_CONTRACTS)]);
    let retry = RetryPolicy {
        max_retries: 0,
        backoff: Duration::from_millis(1),
    };
    ProofManager::with_prover(Prover::new(clients), routes, retry)
}

fn signal() -> Signal {
    Signal::new(
        address!("ea674fdde714fd979de3edf0f56aa9716b898ec8"),
        b256!("a7881266ca0a344c43cb24175d9dbd243b58d45d6ae6ad71310a273a3d1d3afb"),
    )
}

fn request(
    flow: Flow,
    src_chain_id: ChainId,
    dest_chain_id: ChainId,
) -> ProofRequest {
    ProofRequest {
        request_id: "req-1".into(),
        flow,
        signal: signal(),
        src_chain_id,
        dest_chain_id,
        sent_in_block: None,
    }
}

#[test]
fn test_claim_role_uses_both_sides() {
    let role = manager().role(&request(Flow::Claim, L1, L2)).unwrap();

    assert_eq!(role.sync_chain_id, L2);
    assert_eq!(role.sync_contract, L2_CONTRACTS.header_sync);
    assert_eq!(role.proof_chain_id, L1);
    assert_eq!(role.target_contract, L1_CONTRACTS.signal_service);
}

#[test]
fn test_release_role_uses_both_sides() {
    let mut req = request(Flow::Release, L1, L2);
    req.sent_in_block = Some(10);
    let role = manager().role(&req).unwrap();

    assert_eq!(role.sync_chain_id, L1);
    assert_eq!(role.sync_contract, L1_CONTRACTS.header_sync);
    assert_eq!(role.proof_chain_id, L2);
    assert_eq!(role.target_contract, L2_CONTRACTS.bridge);
    assert_eq!(role.min_height, None);
}

#[tokio::test]
async fn test_claim_reply() {
    let reply = manager().handle(request(Flow::Claim, L1, L2)).await.unwrap();

    let proof = reply.inner().unwrap();
    let expected =
        hex_fixture(include_str!("../fixtures/claim_proof.hex"));
    assert_eq!(proof.to_vec(), expected);
    assert_eq!(reply.request_id, "req-1");
}

#[tokio::test]
async fn test_other_signal_has_no_proof() {
    let mut req = request(Flow::Claim, L1, L2);
    req.signal.msg_hash = B256::repeat_byte(0x42);

    let reply = manager().handle(req).await.unwrap();

    let err = reply.inner().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Rpc);
    assert!(err.message.contains("missing trie node"));
}

#[tokio::test]
async fn test_failure_reply() {
    // Nothing has been synced on L1.
    let reply = manager()
        .handle(request(Flow::Release, L1, L2))
        .await
        .unwrap();

    let err = reply.inner().unwrap_err();
    assert_eq!(err.kind, ErrorKind::HeaderNotFound);
    assert_eq!(err.retry, RetryClass::RetryLater);
    assert!(err.message.contains("has not synced any block"));
}

#[tokio::test]
async fn test_unrouted_request() {
    assert!(manager().handle(request(Flow::Claim, L1, 10)).await.is_err());
}

#[tokio::test]
async fn test_server_proof() {
    let routes = server::routes(Arc::new(manager()));

    let response = warp::test::request()
        .method("POST")
        .path("/v1/proof")
        .json(&request(Flow::Claim, L1, L2))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let reply: ProofReply = serde_json::from_slice(response.body()).unwrap();
    assert!(reply.inner().is_ok());
}

#[tokio::test]
async fn test_server_rejects() {
    let routes = server::routes(Arc::new(manager()));

    let response = warp::test::request()
        .method("POST")
        .path("/v1/proof")
        .json(&request(Flow::Claim, L1, 10))
        .reply(&routes)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = warp::test::request()
        .method("GET")
        .path("/readiness")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

fn hex_fixture(text: &str) -> Vec<u8> {
    alloy::hex::decode(text.trim()).unwrap()
}
