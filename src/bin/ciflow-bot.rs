use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ciflow_bot::config::DispatchConfig;
use ciflow_bot::dispatch::DispatchContext;
use ciflow_bot::github::server::{create_app, create_dispatch_process, ServerState};
use ciflow_bot::github::{GithubAppState, WebhookSecret};

#[derive(clap::Parser)]
struct Opts {
    /// Secret used to authenticate webhooks.
    #[arg(long, env = "WEBHOOK_SECRET")]
    webhook_secret: String,

    /// Github App ID.
    #[arg(long, env = "APP_ID")]
    app_id: u64,

    /// Private key used to authenticate as a Github App.
    #[arg(long, env = "PRIVATE_KEY")]
    private_key: String,

    /// Port of the webhook server.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// TOML file that overrides the built-in dispatch policy.
    #[arg(long, env = "CIFLOW_CONFIG")]
    config: Option<PathBuf>,
}

async fn server(state: ServerState, port: u16) -> anyhow::Result<()> {
    let app = create_app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind to {addr}"))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

fn try_main(opts: Opts) -> anyhow::Result<()> {
    let config = match &opts.config {
        Some(path) => DispatchConfig::load(path)?,
        None => DispatchConfig::default(),
    };
    let config = Arc::new(config);
    tracing::info!("Loaded dispatch config: {config:?}");
    let ctx = DispatchContext::new(config.clone())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Cannot build tokio runtime")?;

    let app_state = runtime.block_on(GithubAppState::load(
        opts.app_id.into(),
        opts.private_key.into_bytes().into(),
    ))?;
    let process = create_dispatch_process(ctx, Arc::new(app_state));

    let state = ServerState::new(
        process.tx,
        WebhookSecret::new(opts.webhook_secret),
        config,
    );
    let server_process = server(state, opts.port);

    runtime.block_on(async move {
        tokio::select! {
            () = process.dispatch_process => {
                tracing::warn!("Dispatch process has ended");
                Ok(())
            },
            res = server_process => {
                tracing::warn!("Server has ended: {res:?}");
                res
            }
        }
    })?;

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::parse();
    if let Err(error) = try_main(opts) {
        eprintln!("Error: {error:?}");
        std::process::exit(1);
    }
}
