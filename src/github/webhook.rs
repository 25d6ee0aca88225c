use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use hmac::{Hmac, Mac};
use octocrab::models::InstallationId;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::config::DispatchConfig;
use crate::dispatch::event::{
    CommentAction, DispatchRequest, IssueCommentEvent, PullRequestAction, PullRequestContext,
    PullRequestEvent, WebhookEvent,
};
use crate::dispatch::DispatchError;
use crate::github::server::ServerStateRef;
use crate::github::{GithubRepoName, PullRequestNumber};

/// Upper bound of the size of a webhook body.
const MAX_WEBHOOK_BODY_SIZE: usize = 25 * 1024 * 1024;

#[derive(serde::Deserialize, Debug)]
struct WebhookUser {
    login: Option<String>,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookRepository {
    name: Option<String>,
    owner: Option<WebhookUser>,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookInstallation {
    id: u64,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookLabel {
    name: String,
}

/// Common fields of a pull request and of the issue of a PR comment.
#[derive(serde::Deserialize, Debug)]
struct WebhookIssue {
    number: Option<u64>,
    user: Option<WebhookUser>,
    #[serde(default)]
    labels: Vec<WebhookLabel>,
    /// Only present if the issue is a pull request.
    pull_request: Option<serde_json::Value>,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookComment {
    user: Option<WebhookUser>,
    body: Option<String>,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookPullRequest {
    action: String,
    pull_request: Option<WebhookIssue>,
    repository: Option<WebhookRepository>,
    installation: Option<WebhookInstallation>,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookIssueComment {
    action: String,
    issue: Option<WebhookIssue>,
    comment: Option<WebhookComment>,
    repository: Option<WebhookRepository>,
    installation: Option<WebhookInstallation>,
}

/// axum extractor for GitHub webhook events.
#[derive(Debug)]
pub struct GitHubWebhook(pub DispatchRequest);

/// Extracts a webhook event from a HTTP request.
#[async_trait]
impl FromRequest<ServerStateRef> for GitHubWebhook {
    type Rejection = StatusCode;

    async fn from_request(
        request: Request,
        state: &ServerStateRef,
    ) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        // Eagerly load body
        let body: Bytes = axum::body::to_bytes(body, MAX_WEBHOOK_BODY_SIZE)
            .await
            .map_err(|error| {
                tracing::error!("Parsing webhook body failed: {error:?}");
                StatusCode::BAD_REQUEST
            })?;

        // Verify that the request is valid
        if !verify_gh_signature(&parts.headers, &body, state.get_webhook_secret()) {
            tracing::error!("Webhook request failed, could not authenticate webhook");
            return Err(StatusCode::BAD_REQUEST);
        }

        let Some(event_type) = parts.headers.get("x-github-event") else {
            tracing::error!("Webhook request failed, x-github-event header not found");
            return Err(StatusCode::BAD_REQUEST);
        };
        let Ok(event_type) = event_type.to_str() else {
            tracing::error!("Webhook request failed, invalid x-github-event header");
            return Err(StatusCode::BAD_REQUEST);
        };

        // Parse webhook content
        match extract_event(event_type, &body, state.get_config()) {
            Ok(Some(event)) => Ok(GitHubWebhook(event)),
            Ok(None) => Err(StatusCode::OK),
            Err(error @ DispatchError::UnknownEvent(_)) => {
                tracing::error!("Cannot handle webhook event: {error}");
                Err(StatusCode::OK)
            }
            Err(error) => {
                tracing::error!("Cannot parse webhook event: {error}");
                Err(StatusCode::BAD_REQUEST)
            }
        }
    }
}

/// Extracts the dispatch-relevant fields from a webhook payload.
///
/// Returns `None` for actions and comments that cannot affect CI dispatch. Labels outside
/// the dispatch namespace are dropped.
pub fn extract_event(
    event_type: &str,
    body: &[u8],
    config: &DispatchConfig,
) -> Result<Option<DispatchRequest>, DispatchError> {
    match event_type {
        "pull_request" => {
            let payload: WebhookPullRequest = serde_json::from_slice(body)?;
            let action = match payload.action.as_str() {
                "opened" => PullRequestAction::Opened,
                "reopened" => PullRequestAction::Reopened,
                "synchronize" => PullRequestAction::Synchronize,
                action => {
                    tracing::debug!("Ignoring pull request action {action}");
                    return Ok(None);
                }
            };
            let installation = parse_installation(payload.installation)?;
            let repository = parse_repository_name(payload.repository)?;
            let pr = payload
                .pull_request
                .ok_or(DispatchError::MalformedPayload("pull_request"))?;
            let pull_request = parse_pull_request(repository, pr, config)?;
            Ok(Some(DispatchRequest {
                installation,
                event: WebhookEvent::PullRequest(PullRequestEvent {
                    action,
                    pull_request,
                }),
            }))
        }
        "issue_comment" => {
            let payload: WebhookIssueComment = serde_json::from_slice(body)?;
            let action = match payload.action.as_str() {
                "created" => CommentAction::Created,
                "edited" => CommentAction::Edited,
                action => {
                    tracing::debug!("Ignoring issue comment action {action}");
                    return Ok(None);
                }
            };
            let installation = parse_installation(payload.installation)?;
            let repository = parse_repository_name(payload.repository)?;
            let issue = payload
                .issue
                .ok_or(DispatchError::MalformedPayload("issue"))?;
            // We only care about pull request comments
            if issue.pull_request.is_none() {
                tracing::debug!(
                    "Ignoring comment on issue {repository}#{:?} because it is not a pull request",
                    issue.number
                );
                return Ok(None);
            }
            let pull_request = parse_pull_request(repository, issue, config)?;
            // Without an author, the comment is later rejected by authorization
            let (author, text) = payload
                .comment
                .map(|comment| {
                    (
                        comment.user.and_then(|user| user.login).unwrap_or_default(),
                        comment.body.unwrap_or_default(),
                    )
                })
                .unwrap_or_default();
            Ok(Some(DispatchRequest {
                installation,
                event: WebhookEvent::IssueComment(IssueCommentEvent {
                    action,
                    pull_request,
                    author,
                    text,
                }),
            }))
        }
        _ => Err(DispatchError::UnknownEvent(event_type.to_string())),
    }
}

fn parse_installation(
    installation: Option<WebhookInstallation>,
) -> Result<InstallationId, DispatchError> {
    installation
        .map(|installation| InstallationId(installation.id))
        .ok_or(DispatchError::MalformedPayload("installation.id"))
}

fn parse_repository_name(
    repository: Option<WebhookRepository>,
) -> Result<GithubRepoName, DispatchError> {
    let repository = repository.ok_or(DispatchError::MalformedPayload("repository"))?;
    let name = repository
        .name
        .ok_or(DispatchError::MalformedPayload("repository.name"))?;
    let owner = repository
        .owner
        .and_then(|owner| owner.login)
        .ok_or(DispatchError::MalformedPayload("repository.owner.login"))?;
    Ok(GithubRepoName::new(&owner, &name))
}

fn parse_pull_request(
    repository: GithubRepoName,
    issue: WebhookIssue,
    config: &DispatchConfig,
) -> Result<PullRequestContext, DispatchError> {
    let number = issue
        .number
        .ok_or(DispatchError::MalformedPayload("number"))?;
    let author = issue
        .user
        .and_then(|user| user.login)
        .ok_or(DispatchError::MalformedPayload("user.login"))?;
    let labels = issue
        .labels
        .into_iter()
        .map(|label| label.name)
        .filter(|label| config.is_namespaced(label))
        .collect();
    Ok(PullRequestContext {
        repository,
        number: PullRequestNumber(number),
        author,
        labels,
    })
}

type HmacSha256 = Hmac<Sha256>;

/// Verifies that the request is properly signed by GitHub with SHA-256 and the passed `secret`.
fn verify_gh_signature(
    headers: &HeaderMap<HeaderValue>,
    body: &[u8],
    secret: &WebhookSecret,
) -> bool {
    let Some(signature) = headers.get("x-hub-signature-256").map(|v| v.as_bytes()) else {
        return false;
    };
    let Some(signature) = signature
        .get(b"sha256=".len()..)
        .and_then(|v| hex::decode(v).ok())
    else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose().as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

/// Wrapper for a secret which is zeroed on drop and can be exposed only through the
/// [`WebhookSecret::expose`] method.
pub struct WebhookSecret(SecretString);

impl WebhookSecret {
    pub fn new(secret: String) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret().as_str()
    }
}
