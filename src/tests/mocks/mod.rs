use std::sync::{Arc, Mutex};

use axum::async_trait;
use octocrab::models::InstallationId;

use crate::dispatch::{RepositoryClient, RepositoryClientProvider};
use crate::github::{GithubRepoName, PullRequestNumber};

/// A single GitHub API call performed by the bot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformCall {
    AddLabels(Vec<String>),
    RemoveLabel(String),
    AddAssignee(String),
    RemoveAssignee(String),
}

type FailFn = Box<dyn Fn(&PlatformCall) -> bool + Send + Sync>;

/// Records all API calls, in the order in which they were made.
pub struct TestRepositoryClient {
    calls: Mutex<Vec<(PullRequestNumber, PlatformCall)>>,
    fail_fn: Mutex<FailFn>,
}

impl Default for TestRepositoryClient {
    fn default() -> Self {
        Self {
            calls: Default::default(),
            fail_fn: Mutex::new(Box::new(|_| false)),
        }
    }
}

impl TestRepositoryClient {
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub fn calls_for(&self, pr: u64) -> Vec<PlatformCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(number, _)| number.0 == pr)
            .map(|(_, call)| call.clone())
            .collect()
    }

    /// Calls for which `f` returns true will be recorded, but they will fail.
    pub fn fail_on<F: Fn(&PlatformCall) -> bool + Send + Sync + 'static>(&self, f: F) {
        *self.fail_fn.lock().unwrap() = Box::new(f);
    }

    fn record(&self, pr: PullRequestNumber, call: PlatformCall) -> anyhow::Result<()> {
        let fail = (self.fail_fn.lock().unwrap())(&call);
        self.calls.lock().unwrap().push((pr, call.clone()));
        if fail {
            return Err(anyhow::anyhow!("{call:?} failed"));
        }
        Ok(())
    }
}

#[async_trait]
impl RepositoryClient for TestRepositoryClient {
    async fn add_labels(&self, pr: PullRequestNumber, labels: &[String]) -> anyhow::Result<()> {
        self.record(pr, PlatformCall::AddLabels(labels.to_vec()))
    }

    async fn remove_label(&self, pr: PullRequestNumber, label: &str) -> anyhow::Result<()> {
        self.record(pr, PlatformCall::RemoveLabel(label.to_string()))
    }

    async fn add_assignee(&self, pr: PullRequestNumber, assignee: &str) -> anyhow::Result<()> {
        self.record(pr, PlatformCall::AddAssignee(assignee.to_string()))
    }

    async fn remove_assignee(&self, pr: PullRequestNumber, assignee: &str) -> anyhow::Result<()> {
        self.record(pr, PlatformCall::RemoveAssignee(assignee.to_string()))
    }
}

/// Hands out the same client for every installation and repository, and remembers which
/// ones were requested.
#[derive(Default)]
pub struct TestClientProvider {
    pub client: Arc<TestRepositoryClient>,
    requests: Mutex<Vec<(InstallationId, GithubRepoName)>>,
}

impl TestClientProvider {
    pub fn requests(&self) -> Vec<(InstallationId, GithubRepoName)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositoryClientProvider for TestClientProvider {
    async fn repository_client(
        &self,
        installation: InstallationId,
        repo: &GithubRepoName,
    ) -> anyhow::Result<Arc<dyn RepositoryClient>> {
        self.requests
            .lock()
            .unwrap()
            .push((installation, repo.clone()));
        Ok(self.client.clone())
    }
}
