use std::panic;
use std::sync::Arc;

use alloy::primitives::Address;
use alloy::primitives::B256;
use anyhow::Context;
use backtrace::Backtrace;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use mimalloc::MiMalloc;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;
use xsp_messages::types::request::Flow;
use xsp_messages::types::request::ProofRequest;
use xsp_messages::types::Signal;
use xsp_messages::BlockNr;
use xsp_messages::ChainId;

use crate::config::Config;
use crate::manager::ProofManager;

mod config;
mod manager;
mod server;

#[cfg(test)]
mod test;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Clone, Debug)]
struct Cli {
    /// Path to the configuration file.
    #[clap(short, long)]
    config: Option<String>,

    /// If set, output logs in JSON format.
    #[clap(short, long, action)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone, Debug)]
enum Command {
    /// Print a proof, verifiable on the destination chain, that the signal was sent.
    Claim(SignalArgs),

    /// Print a proof, verifiable on the source chain, that the message failed on the
    /// destination chain.
    Release(SignalArgs),

    /// Serve proof requests over HTTP.
    Serve,
}

#[derive(Args, Clone, Debug)]
struct SignalArgs {
    /// Address that sent the signal.
    #[clap(long)]
    sender: Address,

    /// Hash of the bridged message.
    #[clap(long)]
    msg_hash: B256,

    #[clap(long)]
    src_chain_id: ChainId,

    #[clap(long)]
    dest_chain_id: ChainId,

    /// Block the message was sent in. Claims fail early until it is synced.
    #[clap(long)]
    sent_in_block: Option<BlockNr>,
}

impl SignalArgs {
    fn into_request(
        self,
        flow: Flow,
    ) -> ProofRequest {
        ProofRequest {
            request_id: format!("cli-{flow}"),
            flow,
            signal: Signal::new(self.sender, self.msg_hash),
            src_chain_id: self.src_chain_id,
            dest_chain_id: self.dest_chain_id,
            sent_in_block: self.sent_in_block,
        }
    }
}

fn setup_logging(json: bool) {
    if json {
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_env_filter(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).expect("Setting up logging failed");
    } else {
        let subscriber = tracing_subscriber::fmt()
            .pretty()
            .compact()
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_env_filter(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).expect("Setting up logging failed");
    };
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.json);

    panic::set_hook(Box::new(|panic_info| {
        let msg = match panic_info.payload().downcast_ref::<&'static str>() {
            Some(s) => *s,
            None => {
                match panic_info.payload().downcast_ref::<String>() {
                    Some(s) => &s[..],
                    None => "Box<dyn Any>",
                }
            },
        };
        let (file, lineno, col) = match panic_info.location() {
            Some(l) => (l.file(), l.line(), l.column()),
            None => ("<unknown>", 0, 0),
        };

        error!(
            msg,
            file,
            lineno,
            col,
            "Panic occurred: {:?}",
            Backtrace::new(),
        );
    }));

    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    info!("Starting prover. version: {}", version);
    let config = Config::load(cli.config);
    config.validate();
    debug!("Loaded configuration: {:?}", config);

    let manager = ProofManager::new(&config).context("creating proof manager")?;

    match cli.command {
        Command::Claim(args) => prove_once(&manager, args.into_request(Flow::Claim)).await,
        Command::Release(args) => prove_once(&manager, args.into_request(Flow::Release)).await,
        Command::Serve => serve(&config, manager).await,
    }
}

async fn prove_once(
    manager: &ProofManager,
    request: ProofRequest,
) -> anyhow::Result<()> {
    let reply = manager.handle(request).await?;
    match reply.inner() {
        Ok(proof) => {
            println!("{}", alloy::hex::encode_prefixed(proof));
            Ok(())
        },
        Err(err) => {
            anyhow::bail!(
                "{} ({:?}, {:?})",
                err.message,
                err.kind,
                err.retry
            )
        },
    }
}

async fn serve(
    config: &Config,
    manager: ProofManager,
) -> anyhow::Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.prometheus.port))
        .install()
        .context("setting up Prometheus")?;

    info!("Serving proof requests. port: {}", config.server.port);
    warp::serve(server::routes(Arc::new(manager)))
        .run(([0, 0, 0, 0], config.server.port))
        .await;

    Ok(())
}
