//! `HyperSpot` server: loads configuration, discovers registered modules,
//! drives each through the `Module`/`RestfulModule`/`StatefulModule`
//! lifecycle, and serves their combined REST surface over HTTP.

mod config;
mod registered_modules;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modkit::api::{OpenApiInfo, OpenApiRegistryImpl};
use modkit::client_hub::ClientHub;
use modkit::config::ConfigProvider;
use modkit::context::ModuleContextBuilder;
use modkit::runtime::{self, BuiltModule};
use tokio_util::sync::CancellationToken;

use config::AppConfig;

/// `HyperSpot` Server - modular platform for AI services
#[derive(Parser)]
#[command(name = "hyperspot-server")]
#[command(about = "HyperSpot Server - modular platform for AI services")]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug-level logging.
    #[arg(long, global = true)]
    verbose: bool,

    /// Print the modules declared under `modules:` in the config file, then exit.
    #[arg(long)]
    list_modules: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server and run until shut down.
    Run,
    /// Validate the configuration and module wiring, then exit.
    Check,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let app_config = AppConfig::load(cli.config.as_deref())?;

    if cli.list_modules {
        let mut names = app_config.module_names();
        names.sort_unstable();
        println!("Configured modules ({}):", names.len());
        for name in &names {
            println!("  {name}");
        }
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Check => check(&app_config),
        Commands::Run => {
            let bind = parse_bind_addr(&app_config.server.bind)?;
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(run(app_config, bind))
        }
    }
}

fn parse_bind_addr(bind: &str) -> Result<SocketAddr> {
    bind.parse()
        .with_context(|| format!("invalid server bind address '{bind}'"))
}

/// Validates that every registered module builds and discovers without
/// actually starting the server.
fn check(app_config: &AppConfig) -> Result<()> {
    parse_bind_addr(&app_config.server.bind)?;
    let built = runtime::discover()?;
    println!("configuration OK ({} module(s) discovered)", built.len());
    Ok(())
}

async fn run(app_config: AppConfig, bind: SocketAddr) -> Result<()> {
    let config_provider: Arc<dyn ConfigProvider> = Arc::new(app_config);
    let client_hub = Arc::new(ClientHub::new());
    let root_token = CancellationToken::new();
    let ctx_builder = ModuleContextBuilder::new(config_provider, client_hub, root_token.clone());

    let built = runtime::discover()?;
    tracing::info!(count = built.len(), "discovered modules");

    let openapi = OpenApiRegistryImpl::new();
    let mut router = axum::Router::new();
    let mut module_tokens = Vec::with_capacity(built.len());

    for module in &built {
        let ctx = ctx_builder.for_module(module.name);
        module.module.init(&ctx).await.with_context(|| format!("initializing module '{}'", module.name))?;
        if let Some(rest) = &module.rest {
            router = rest
                .register_rest(&ctx, router, &openapi)
                .with_context(|| format!("registering REST routes for module '{}'", module.name))?;
        }
        module_tokens.push(ctx.cancellation_token().clone());
    }
    openapi
        .build_openapi(&OpenApiInfo {
            title: "HyperSpot Server".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            description: None,
        })
        .context("building OpenAPI document")?;

    start_stateful(&built, &module_tokens).await?;

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(%bind, "hyperspot-server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(root_token))
        .await?;

    stop_stateful(&built, &module_tokens).await;

    Ok(())
}

async fn start_stateful(built: &[BuiltModule], tokens: &[CancellationToken]) -> Result<()> {
    for (module, token) in built.iter().zip(tokens) {
        if let Some(stateful) = &module.stateful {
            stateful.start(token.clone()).await.with_context(|| format!("starting module '{}'", module.name))?;
        }
    }
    Ok(())
}

async fn stop_stateful(built: &[BuiltModule], tokens: &[CancellationToken]) {
    for (module, token) in built.iter().zip(tokens).rev() {
        if let Some(stateful) = &module.stateful {
            token.cancel();
            if let Err(err) = stateful.stop(token.clone()).await {
                tracing::warn!(module = module.name, %err, "module shutdown reported an error");
            }
        }
    }
}

async fn shutdown_signal(root_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    root_token.cancel();
}
