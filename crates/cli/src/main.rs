use clap::Parser;
use rpcdns_application::use_cases::ResolutionAttempt;
use rpcdns_domain::CliOverrides;
use rpcdns_jobs::ReResolutionDriver;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod bootstrap;
mod di;
mod reporter;

#[derive(Parser)]
#[command(name = "rpcdns")]
#[command(version)]
#[command(about = "Resolves an RPC target through DNS and keeps re-resolving it")]
struct Cli {
    /// Target to resolve (`host`, `host:port` or `[v6]:port`)
    target: String,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS server to query instead of the system resolver (`ip[:port]`)
    #[arg(short = 's', long)]
    dns_server: Option<String>,

    /// Also look up `_grpclb._tcp.<host>` SRV records
    #[arg(long)]
    enable_srv: bool,

    /// Also look up the `_grpc_config.<host>` TXT service config
    #[arg(long)]
    service_config: bool,

    /// Per-attempt timeout in milliseconds (0 disables it)
    #[arg(long)]
    query_timeout_ms: Option<u64>,

    /// Resolve once, print the result and exit
    #[arg(long)]
    once: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_server: cli.dns_server.clone(),
        enable_srv_queries: cli.enable_srv,
        request_service_config: cli.service_config,
        query_timeout_ms: cli.query_timeout_ms,
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;
    bootstrap::init_logging(&config);

    info!("Starting rpcdns v{}", env!("CARGO_PKG_VERSION"));

    let services = di::ResolverServices::new(&config, &cli.target)?;
    let ctx = services.attempt_context(&config);

    if cli.once {
        let (_attempt, rx) = ResolutionAttempt::start(1, ctx);
        let result = rx.await?;
        reporter::log_result(&result);
        if let Some(status) = result.address_error() {
            anyhow::bail!("resolution failed: {}", status);
        }
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let driver =
        ReResolutionDriver::new(ctx, Arc::new(reporter::LogResultHandler), &config.resolver)
            .with_cancellation(shutdown.clone())
            .start();

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
    }
    info!("Shutdown requested");

    shutdown.cancel();
    driver.shutdown().await;

    info!("Shutdown complete");
    Ok(())
}
