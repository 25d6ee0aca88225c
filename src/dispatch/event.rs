use octocrab::models::InstallationId;

use crate::github::{GithubRepoName, PullRequestNumber};

/// Kind of a webhook event that can affect CI dispatch labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    PullRequest,
    IssueComment,
}

impl EventKind {
    /// Name of the event, as sent by GitHub in the `x-github-event` header.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::PullRequest => "pull_request",
            EventKind::IssueComment => "issue_comment",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PullRequestAction {
    Opened,
    Reopened,
    Synchronize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentAction {
    Created,
    Edited,
}

/// The state of a pull request at the time the webhook was sent.
#[derive(Clone, Debug, PartialEq)]
pub struct PullRequestContext {
    pub repository: GithubRepoName,
    pub number: PullRequestNumber,
    pub author: String,
    /// Labels carrying the dispatch namespace prefix. Other labels of the PR are not tracked.
    pub labels: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,
    pub pull_request: PullRequestContext,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IssueCommentEvent {
    pub action: CommentAction,
    pub pull_request: PullRequestContext,
    /// Login of the comment author. Empty if the payload did not contain it.
    pub author: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WebhookEvent {
    /// A pull request was opened, reopened or its head branch was updated.
    PullRequest(PullRequestEvent),
    /// A comment was posted or edited on a pull request.
    IssueComment(IssueCommentEvent),
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WebhookEvent::PullRequest(_) => EventKind::PullRequest,
            WebhookEvent::IssueComment(_) => EventKind::IssueComment,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            WebhookEvent::PullRequest(event) => match event.action {
                PullRequestAction::Opened => "opened",
                PullRequestAction::Reopened => "reopened",
                PullRequestAction::Synchronize => "synchronize",
            },
            WebhookEvent::IssueComment(event) => match event.action {
                CommentAction::Created => "created",
                CommentAction::Edited => "edited",
            },
        }
    }

    pub fn pull_request(&self) -> &PullRequestContext {
        match self {
            WebhookEvent::PullRequest(event) => &event.pull_request,
            WebhookEvent::IssueComment(event) => &event.pull_request,
        }
    }

    pub fn comment(&self) -> Option<&IssueCommentEvent> {
        match self {
            WebhookEvent::PullRequest(_) => None,
            WebhookEvent::IssueComment(event) => Some(event),
        }
    }
}

/// A webhook event together with the GitHub App installation that received it.
#[derive(Debug)]
pub struct DispatchRequest {
    pub installation: InstallationId,
    pub event: WebhookEvent,
}
