use std::sync::Arc;

use anyhow::Context;
use axum::async_trait;
use octocrab::models::{AppId, InstallationId};
use octocrab::Octocrab;
use secrecy::{ExposeSecret, SecretVec};

use client::GithubRepositoryClient;

use crate::dispatch::{RepositoryClient, RepositoryClientProvider};
use crate::github::GithubRepoName;

pub mod client;

/// Provides access to the repositories of the installations of the GitHub App.
pub struct GithubAppState {
    client: Octocrab,
}

impl GithubAppState {
    /// Authenticates as the GitHub App with the given ID.
    pub async fn load(app_id: AppId, private_key: SecretVec<u8>) -> anyhow::Result<GithubAppState> {
        let key = jsonwebtoken::EncodingKey::from_rsa_pem(private_key.expose_secret().as_ref())
            .context("Could not encode private key")?;

        let client = Octocrab::builder()
            .app(app_id, key)
            .build()
            .context("Could not create octocrab builder")?;

        let app = client
            .current()
            .app()
            .await
            .context("Could not load Github App")?;
        tracing::info!("Loaded GitHub App {}", app.name);

        Ok(GithubAppState { client })
    }
}

#[async_trait]
impl RepositoryClientProvider for GithubAppState {
    async fn repository_client(
        &self,
        installation: InstallationId,
        repo: &GithubRepoName,
    ) -> anyhow::Result<Arc<dyn RepositoryClient>> {
        // The installation client caches its access token and refreshes it once it expires.
        let client = self.client.installation(installation);
        Ok(Arc::new(GithubRepositoryClient::new(client, repo.clone())))
    }
}
