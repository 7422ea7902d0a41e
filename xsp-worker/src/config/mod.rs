use std::collections::HashSet;
use std::time::Duration;

use alloy::primitives::Address;
use config::builder::DefaultState;
use config::ConfigBuilder;
use config::FileFormat;
use lazy_static_include::*;
use redact::Secret;
use serde_derive::Deserialize;
use tracing::debug;
use xsp_messages::routing::RouteContracts;
use xsp_messages::ChainId;
use xsp_provers::retry::RetryPolicy;

lazy_static_include_str! {
    DEFAULT_CONFIG => "src/config/default.toml",
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct Config
{
    pub(crate) prover: ProverConfig,
    #[serde(default)]
    pub(crate) chains: Vec<ChainConfig>,
    #[serde(default)]
    pub(crate) routes: Vec<RouteConfig>,
    pub(crate) server: ServerConfig,
    pub(crate) prometheus: PrometheusConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct ProverConfig
{
    /// Upper bound for every single RPC call.
    pub(crate) rpc_timeout_secs: u64,
    /// How many times a proof is restarted after a transport failure.
    pub(crate) max_retries: u32,
    /// Delay before the first restart; doubled on each following one.
    pub(crate) retry_backoff_ms: u64,
}

impl ProverConfig
{
    pub fn validate(&self)
    {
        assert!(
            self.rpc_timeout_secs > 0,
            "RPC timeout must be positive"
        );
    }

    pub fn rpc_timeout(&self) -> Duration
    {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy
    {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct ChainConfig
{
    pub(crate) chain_id: ChainId,
    pub(crate) rpc_url: Secret<String>,
}

impl ChainConfig
{
    pub fn validate(&self)
    {
        assert!(
            !self
                .rpc_url
                .expose_secret()
                .is_empty(),
            "RPC URL is required for chain {}",
            self.chain_id
        );
    }
}

/// Contracts deployed on `chain_id` to talk to `counterpart_chain_id`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct RouteConfig
{
    pub(crate) chain_id: ChainId,
    pub(crate) counterpart_chain_id: ChainId,
    pub(crate) header_sync: Address,
    pub(crate) signal_service: Address,
    pub(crate) bridge: Address,
}

impl RouteConfig
{
    pub fn contracts(&self) -> RouteContracts
    {
        RouteContracts {
            header_sync: self.header_sync,
            signal_service: self.signal_service,
            bridge: self.bridge,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct ServerConfig
{
    pub(crate) port: u16,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct PrometheusConfig
{
    pub(crate) port: u16,
}

impl Config
{
    fn defaults() -> ConfigBuilder<DefaultState>
    {
        config::Config::builder().add_source(
            config::File::from_str(
                &DEFAULT_CONFIG,
                FileFormat::Toml,
            ),
        )
    }

    pub fn load(local_file: Option<String>) -> Config
    {
        let mut config_builder = Self::defaults();

        if let Some(local_file) = local_file
        {
            debug!(
                "Loading local configuration from {}",
                local_file
            );
            config_builder = config_builder.add_source(config::File::with_name(&local_file));
        }

        let config_builder = config_builder
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .ignore_empty(true),
            )
            .build()
            .expect("Could not load configuration");

        config_builder
            .try_deserialize()
            .expect("Could not deserialize configuration")
    }

    pub fn validate(&self)
    {
        self.prover
            .validate();

        assert!(
            !self
                .chains
                .is_empty(),
            "At least one chain is required"
        );

        let mut chain_ids = HashSet::new();
        for chain in &self.chains
        {
            chain.validate();
            assert!(
                chain_ids.insert(chain.chain_id),
                "Chain {} is configured twice",
                chain.chain_id
            );
        }

        let mut pairs = HashSet::new();
        for route in &self.routes
        {
            assert!(
                route.chain_id != route.counterpart_chain_id,
                "Route on chain {} points to itself",
                route.chain_id
            );
            assert!(
                chain_ids.contains(&route.chain_id),
                "Route on chain {} has no RPC endpoint",
                route.chain_id
            );
            assert!(
                chain_ids.contains(&route.counterpart_chain_id),
                "Route counterpart chain {} has no RPC endpoint",
                route.counterpart_chain_id
            );
            assert!(
                pairs.insert((route.chain_id, route.counterpart_chain_id)),
                "Route {} -> {} is configured twice",
                route.chain_id,
                route.counterpart_chain_id
            );
        }
    }
}
