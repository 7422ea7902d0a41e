use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use metrics::counter;
use tracing::error;
use tracing::info;
use xsp_messages::routing::Role;
use xsp_messages::routing::RouteContracts;
use xsp_messages::types::request::Flow;
use xsp_messages::types::request::ProofReply;
use xsp_messages::types::request::ProofRequest;
use xsp_messages::ChainId;
use xsp_provers::client::AlloyChainClient;
use xsp_provers::client::ChainClients;
use xsp_provers::retry::with_backoff;
use xsp_provers::retry::RetryPolicy;
use xsp_provers::Prover;

use crate::config::Config;

/// Turns [`ProofRequest`]s into [`ProofReply`]s.
pub(crate) struct ProofManager {
    prover: Prover,
    /// Contracts keyed by (chain they live on, counterpart chain).
    routes: HashMap<(ChainId, ChainId), RouteContracts>,
    retry: RetryPolicy,
}

impl ProofManager {
    pub(crate) fn new(config: &Config) -> anyhow::Result<Self> {
        info!("Registering the chains");

        let mut clients = ChainClients::new(config.prover.rpc_timeout());
        for chain in &config.chains {
            let url = chain
                .rpc_url
                .expose_secret()
                .parse()
                .with_context(|| format!("parsing RPC URL of chain {}", chain.chain_id))?;
            clients = clients.with_client(chain.chain_id, Arc::new(AlloyChainClient::new(url)));
        }

        let routes = config
            .routes
            .iter()
            .map(|route| {
                (
                    (route.chain_id, route.counterpart_chain_id),
                    route.contracts(),
                )
            })
            .collect();

        Ok(Self::with_prover(
            Prover::new(clients),
            routes,
            config.prover.retry_policy(),
        ))
    }

    pub(crate) fn with_prover(
        prover: Prover,
        routes: HashMap<(ChainId, ChainId), RouteContracts>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            prover,
            routes,
            retry,
        }
    }

    fn route(
        &self,
        chain_id: ChainId,
        counterpart_chain_id: ChainId,
    ) -> anyhow::Result<&RouteContracts> {
        self.routes
            .get(&(chain_id, counterpart_chain_id))
            .with_context(|| {
                format!("no contracts configured on chain {chain_id} for chain {counterpart_chain_id}")
            })
    }

    /// Picks the contracts for the request's flow.
    ///
    /// The block the signal was sent in only bounds claims; a release proves state of the
    /// destination chain.
    pub(crate) fn role(
        &self,
        request: &ProofRequest,
    ) -> anyhow::Result<Role> {
        let src = request.src_chain_id;
        let dest = request.dest_chain_id;

        let role = match request.flow {
            Flow::Claim => {
                Role::for_claim(
                    src,
                    dest,
                    self.route(dest, src)?.header_sync,
                    self.route(src, dest)?.signal_service,
                )
                .with_min_height(request.sent_in_block)
            },
            Flow::Release => {
                Role::for_release(
                    src,
                    dest,
                    self.route(src, dest)?.header_sync,
                    self.route(dest, src)?.bridge,
                )
            },
        };
        Ok(role)
    }

    /// Runs the request to completion, retrying transport failures.
    ///
    /// Only requests that cannot be routed are rejected; every prover failure is reported in the
    /// reply.
    #[tracing::instrument(skip(self), err(Debug))]
    pub(crate) async fn handle(
        &self,
        request: ProofRequest,
    ) -> anyhow::Result<ProofReply> {
        let role = self.role(&request)?;
        let flow = request.flow.to_string();

        let result = with_backoff(self.retry, || self.prover.generate(request.signal, role)).await;

        let reply = match result {
            Ok(proof) => {
                counter!("xsp_proofs_generated_total", "flow" => flow).increment(1);
                ProofReply::success(request.request_id, proof)
            },
            Err(err) => {
                let kind = err.kind();
                error!("proof failed. kind: {} err: {:?}", kind.as_str(), err);
                counter!("xsp_proof_errors_total", "flow" => flow, "kind" => kind.as_str())
                    .increment(1);
                ProofReply::failure(request.request_id, kind, error_chain(&err))
            },
        };
        Ok(reply)
    }
}

/// The error and all its sources, outermost first.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}
