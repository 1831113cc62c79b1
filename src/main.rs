use anyhow::{Context, Result};
use axum::Server;
use console_subscriber::ConsoleLayer;
use sentry::{
    integrations::{anyhow::capture_anyhow, tracing as sentry_tracing},
    ClientOptions, IntoDsn,
};
use std::{net::SocketAddr, sync::Arc};
use structopt::StructOpt;
use tokio::{
    signal::unix::{signal, SignalKind},
    task,
};
use tracing::{error, info, warn};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use args::Args;

mod args;
mod config;
mod git;
mod http;
mod registry;

use config::Config;
use registry::Registry;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse the cli
    let cli = Args::from_args();

    // Get the configuration
    let configuration = match &cli.config {
        Some(path) => config::parse(path).await,
        None => config::from_env(),
    }
    .context("Failed to load configuration")?;
    let address = cli.address.unwrap_or(configuration.server.address);

    // Setup logging
    init_tracing(
        cli.log_level
            .unwrap_or_else(|| configuration.server.log.clone()),
        configuration.server.tokio_console,
    );

    // Initialize sentry
    let _guard = sentry::init(sentry_config(&configuration.server.sentry)?);

    match run_server(address, &configuration).await {
        Ok(()) => Ok(()),
        Err(e) => {
            capture_anyhow(&e);
            Err(e)
        }
    }
}

/// Build the request handling state and start the server
async fn run_server(address: SocketAddr, configuration: &Config) -> Result<()> {
    // Load the repositories
    let registry = Registry::scan(|i| configuration.repositories.get(i));
    if registry.is_empty() {
        warn!("no repositories are registered, pushes will not be deployed");
    }
    inspect_repositories(&registry).await;

    let state = Arc::new(http::State {
        secret: configuration.webhook.secret.clone(),
        registry,
        syncer: Arc::new(git::Git::from(&configuration.git)),
    });

    // Bind the server
    let server = Server::try_bind(&address)
        .with_context(|| format!("failed to bind to {}", address))?
        .serve(http::routes(state).into_make_service())
        .with_graceful_shutdown(async {
            match wait_for_exit().await {
                Ok(()) => info!("signal received, shutting down..."),
                Err(e) => error!(error = %e, "failed to listen for signals"),
            }
        });
    info!("listening on {}", address);

    server.await.context("server failed")?;

    info!("successfully shutdown, good bye!");
    Ok(())
}

/// Log the current commit of each repository, warning about any path
/// that cannot be synchronized
async fn inspect_repositories(registry: &Registry) {
    for repository in registry.iter() {
        let path = repository.path.clone();
        match task::spawn_blocking(move || git::head(&path)).await {
            Ok(Ok(commit)) => info!(
                name = %repository.name,
                path = %repository.path.display(),
                %commit,
                "repository ready"
            ),
            Ok(Err(e)) => warn!(
                name = %repository.name,
                path = %repository.path.display(),
                message = %e.message(),
                "path is not a usable git repository"
            ),
            Err(e) => warn!(error = %e, "failed to inspect repository"),
        }
    }
}

/// Wait for a SIGINT or SIGTERM and then exit
async fn wait_for_exit() -> Result<()> {
    let mut int = signal(SignalKind::interrupt())?;
    let mut term = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = int.recv() => Ok(()),
        _ = term.recv() => Ok(()),
    }
}

/// Generate a registry for tracing
fn init_tracing(raw_filter: String, enable_console: bool) {
    let filter = EnvFilter::builder().parse_lossy(raw_filter);

    if enable_console {
        tracing_subscriber::registry()
            .with(ConsoleLayer::builder().with_default_env().spawn())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_filter(filter),
            )
            .with(sentry_tracing::layer())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_filter(filter),
            )
            .with(sentry_tracing::layer())
            .init();
    }
}

/// Generate configuration for Sentry
fn sentry_config(url: &Option<String>) -> Result<ClientOptions> {
    let dsn = url
        .as_ref()
        .map(String::as_str)
        .map(IntoDsn::into_dsn)
        .transpose()
        .context("failed to parse Sentry DSN")?
        .flatten();

    let options = ClientOptions {
        dsn,
        release: sentry::release_name!(),
        attach_stacktrace: true,
        ..Default::default()
    };

    Ok(options)
}
