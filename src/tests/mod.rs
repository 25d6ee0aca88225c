pub mod mocks;
pub mod webhook;

use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::dispatch::DispatchContext;
use crate::github::GithubRepoName;

pub fn default_repo_name() -> GithubRepoName {
    GithubRepoName::new("owner", "name")
}

pub fn default_pr_author() -> String {
    "alice".to_string()
}

/// The default configuration, with the default PR author in the rollout.
pub fn test_config() -> DispatchConfig {
    DispatchConfig {
        rollout_users: [default_pr_author()].into_iter().collect(),
        ..DispatchConfig::default()
    }
}

pub fn test_context() -> DispatchContext {
    DispatchContext::new(Arc::new(test_config())).unwrap()
}
