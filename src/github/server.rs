use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Context, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::mpsc;
use tower::limit::ConcurrencyLimitLayer;
use tracing::{Instrument, Span};

use crate::config::DispatchConfig;
use crate::dispatch::event::DispatchRequest;
use crate::dispatch::{handle_dispatch_event, DispatchContext, RepositoryClientProvider};
use crate::github::webhook::GitHubWebhook;
use crate::github::webhook::WebhookSecret;

/// Shared server state for all axum handlers.
pub struct ServerState {
    dispatch_queue: mpsc::Sender<DispatchRequest>,
    webhook_secret: WebhookSecret,
    config: Arc<DispatchConfig>,
}

impl ServerState {
    pub fn new(
        dispatch_queue: mpsc::Sender<DispatchRequest>,
        webhook_secret: WebhookSecret,
        config: Arc<DispatchConfig>,
    ) -> Self {
        Self {
            dispatch_queue,
            webhook_secret,
            config,
        }
    }

    pub fn get_webhook_secret(&self) -> &WebhookSecret {
        &self.webhook_secret
    }

    pub fn get_config(&self) -> &DispatchConfig {
        &self.config
    }
}

pub type ServerStateRef = Arc<ServerState>;

pub fn create_app(state: ServerState) -> Router {
    Router::new()
        .route("/github", post(github_webhook_handler))
        .route("/health", get(health_handler))
        .layer(ConcurrencyLimitLayer::new(100))
        .with_state(Arc::new(state))
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "")
}

/// Axum handler that receives a webhook and sends it to the dispatch queue.
pub async fn github_webhook_handler(
    State(state): State<ServerStateRef>,
    GitHubWebhook(request): GitHubWebhook,
) -> impl IntoResponse {
    match state.dispatch_queue.send(request).await {
        Ok(_) => (StatusCode::OK, ""),
        Err(err) => {
            tracing::error!("Could not send webhook event: {err:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "")
        }
    }
}

pub struct DispatchProcess {
    pub tx: mpsc::Sender<DispatchRequest>,
    pub dispatch_process: Pin<Box<dyn Future<Output = ()> + Send>>,
}

/// Creates a future with a process that continuously receives webhook events and
/// dispatches CI for them, one event at a time.
///
/// The process ends once all senders of the queue are dropped.
pub fn create_dispatch_process(
    ctx: DispatchContext,
    clients: Arc<dyn RepositoryClientProvider>,
) -> DispatchProcess {
    let (tx, rx) = mpsc::channel::<DispatchRequest>(1024);

    let service = async move {
        consume_dispatch_requests(Arc::new(ctx), clients, rx).await;
    };

    DispatchProcess {
        tx,
        dispatch_process: Box::pin(service),
    }
}

async fn consume_dispatch_requests(
    ctx: Arc<DispatchContext>,
    clients: Arc<dyn RepositoryClientProvider>,
    mut rx: mpsc::Receiver<DispatchRequest>,
) {
    while let Some(request) = rx.recv().await {
        let pr = request.event.pull_request();
        let span = tracing::info_span!(
            "Dispatch",
            pr = format!("{}#{}", pr.repository, pr.number),
            event = request.event.kind().name()
        );
        tracing::debug!("Received dispatch request: {request:#?}");
        if let Err(error) = handle_dispatch_request(&ctx, clients.as_ref(), request)
            .instrument(span.clone())
            .await
        {
            handle_root_error(span, error);
        }
    }
}

async fn handle_dispatch_request(
    ctx: &DispatchContext,
    clients: &dyn RepositoryClientProvider,
    request: DispatchRequest,
) -> anyhow::Result<()> {
    let repo = request.event.pull_request().repository.clone();
    let client = clients
        .repository_client(request.installation, &repo)
        .await
        .with_context(|| format!("Cannot create GitHub client for {repo}"))?;
    handle_dispatch_event(ctx, client.as_ref(), request.event).await?;
    Ok(())
}

#[allow(unused_variables)]
fn handle_root_error(span: Span, error: Error) {
    // In tests, we want to panic on all errors.
    #[cfg(test)]
    {
        panic!("Handler failed: {error:?}");
    }
    #[cfg(not(test))]
    {
        use crate::utils::logging::LogError;
        span.log_error(error);
    }
}
