use std::sync::Arc;

use axum::async_trait;
use octocrab::models::InstallationId;

use crate::github::{GithubRepoName, PullRequestNumber};

pub mod command;
mod context;
mod error;
pub mod event;
mod handler;
mod labels;
pub mod policy;
pub mod strategy;

pub use command::{Command, CommandParser};
pub use context::DispatchContext;
pub use error::DispatchError;
pub use handler::{handle_dispatch_event, DispatchOutcome};
pub use labels::{compute_label_diff, LabelDiff};
pub use policy::{AuthorizationPolicy, SelfServicePolicy};
pub use strategy::{DispatchDecision, StrategyRegistry};

/// Provides the operations on a remote repository that are needed to dispatch CI.
/// It is behind a trait to allow easier mocking in tests.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Add a set of labels to a PR. Adding an empty set does nothing.
    async fn add_labels(&self, pr: PullRequestNumber, labels: &[String]) -> anyhow::Result<()>;

    /// Remove a single label from a PR.
    async fn remove_label(&self, pr: PullRequestNumber, label: &str) -> anyhow::Result<()>;

    async fn add_assignee(&self, pr: PullRequestNumber, assignee: &str) -> anyhow::Result<()>;

    async fn remove_assignee(&self, pr: PullRequestNumber, assignee: &str) -> anyhow::Result<()>;
}

/// Creates repository clients for app installations.
#[async_trait]
pub trait RepositoryClientProvider: Send + Sync {
    async fn repository_client(
        &self,
        installation: InstallationId,
        repo: &GithubRepoName,
    ) -> anyhow::Result<Arc<dyn RepositoryClient>>;
}
