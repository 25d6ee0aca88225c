use anyhow::Context;
use axum::async_trait;
use octocrab::{Error, Octocrab};

use crate::dispatch::RepositoryClient;
use crate::github::{GithubRepoName, PullRequestNumber};

/// Provides access to a single repository of an app installation using the GitHub API.
pub struct GithubRepositoryClient {
    client: Octocrab,
    repo_name: GithubRepoName,
}

impl GithubRepositoryClient {
    pub fn new(client: Octocrab, repo_name: GithubRepoName) -> Self {
        Self { client, repo_name }
    }

    pub fn name(&self) -> &GithubRepoName {
        &self.repo_name
    }

    fn format_pr(&self, pr: PullRequestNumber) -> String {
        format!("{}/{}/{}", self.name().owner(), self.name().name(), pr)
    }
}

#[async_trait]
impl RepositoryClient for GithubRepositoryClient {
    async fn add_labels(&self, pr: PullRequestNumber, labels: &[String]) -> anyhow::Result<()> {
        if labels.is_empty() {
            return Ok(());
        }
        self.client
            .issues(self.name().owner(), self.name().name())
            .add_labels(pr.0, labels)
            .await
            .with_context(|| format!("Cannot add label(s) {labels:?} to {}", self.format_pr(pr)))?;
        Ok(())
    }

    async fn remove_label(&self, pr: PullRequestNumber, label: &str) -> anyhow::Result<()> {
        let result = self
            .client
            .issues(self.name().owner(), self.name().name())
            .remove_label(pr.0, label)
            .await;
        match result {
            Ok(_) => Ok(()),
            // This error is returned if we try to remove a label that does not exist on the issue.
            // This should be a no-op, rather than an error, therefore we swallow this error.
            Err(Error::GitHub { source, .. })
                if source.message.contains("Label does not exist") =>
            {
                tracing::trace!(
                    "Trying to remove label {label} which does not exist on {}",
                    self.format_pr(pr)
                );
                Ok(())
            }
            Err(error) => Err(anyhow::Error::new(error)
                .context(format!("Cannot remove label {label} from {}", self.format_pr(pr)))),
        }
    }

    async fn add_assignee(&self, pr: PullRequestNumber, assignee: &str) -> anyhow::Result<()> {
        self.client
            .issues(self.name().owner(), self.name().name())
            .add_assignees(pr.0, &[assignee])
            .await
            .with_context(|| format!("Cannot assign {assignee} to {}", self.format_pr(pr)))?;
        Ok(())
    }

    async fn remove_assignee(&self, pr: PullRequestNumber, assignee: &str) -> anyhow::Result<()> {
        let url = format!(
            "/repos/{}/{}/issues/{pr}/assignees",
            self.name().owner(),
            self.name().name()
        );
        let response = self
            .client
            ._delete(url, Some(&serde_json::json!({ "assignees": [assignee] })))
            .await
            .with_context(|| format!("Cannot unassign {assignee} from {}", self.format_pr(pr)))?;

        let status = response.status();
        if !status.is_success() {
            let text = self.client.body_to_string(response).await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Cannot unassign {assignee} from {}: {status} ({text})",
                self.format_pr(pr)
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use octocrab::Octocrab;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::GithubRepositoryClient;
    use crate::dispatch::RepositoryClient;
    use crate::github::{GithubRepoName, PullRequestNumber};

    fn create_client(server: &MockServer) -> GithubRepositoryClient {
        let client = Octocrab::builder()
            .base_uri(server.uri())
            .unwrap()
            .build()
            .unwrap();
        GithubRepositoryClient::new(client, GithubRepoName::new("pytorch", "pytorch"))
    }

    fn mock_remove_assignee(status: u16) -> Mock {
        Mock::given(method("DELETE"))
            .and(path("/repos/pytorch/pytorch/issues/42/assignees"))
            .and(body_json(serde_json::json!({ "assignees": ["pytorchbot"] })))
            .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({})))
    }

    #[tokio::test]
    async fn test_remove_assignee() {
        let server = MockServer::start().await;
        mock_remove_assignee(200).expect(1).mount(&server).await;

        create_client(&server)
            .remove_assignee(PullRequestNumber(42), "pytorchbot")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_remove_assignee_failure() {
        let server = MockServer::start().await;
        mock_remove_assignee(404).expect(1).mount(&server).await;

        let error = create_client(&server)
            .remove_assignee(PullRequestNumber(42), "pytorchbot")
            .await
            .unwrap_err();
        assert!(error
            .to_string()
            .starts_with("Cannot unassign pytorchbot from pytorch/pytorch/42"));
    }
}
