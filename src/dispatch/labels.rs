use std::collections::HashSet;

use itertools::Itertools;

use crate::config::DispatchConfig;
use crate::dispatch::RepositoryClient;
use crate::github::PullRequestNumber;

/// Label changes needed to converge the labels of a PR to a target set.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LabelDiff {
    pub to_delete: Vec<String>,
    pub to_add: Vec<String>,
}

/// Computes the set differences between the `target` and `current` labels.
/// Only labels from the dispatch namespace are considered on both sides.
pub fn compute_label_diff(
    config: &DispatchConfig,
    target: &[String],
    current: &[String],
) -> LabelDiff {
    let target: Vec<&String> = target
        .iter()
        .filter(|label| config.is_namespaced(label))
        .collect();
    let target_set: HashSet<&str> = target.iter().map(|label| label.as_str()).collect();
    let current_set: HashSet<&str> = current.iter().map(|label| label.as_str()).collect();

    let to_delete = current
        .iter()
        .filter(|label| config.is_namespaced(label))
        .filter(|label| !target_set.contains(label.as_str()))
        .unique()
        .cloned()
        .collect();
    let to_add = target
        .into_iter()
        .filter(|label| !current_set.contains(label.as_str()))
        .unique()
        .cloned()
        .collect();
    LabelDiff { to_delete, to_add }
}

/// Converges the labels of the PR to `target` and returns the namespaced target labels.
///
/// Labels are removed one at a time, and the new labels are then added in a single call.
pub async fn set_labels(
    client: &dyn RepositoryClient,
    config: &DispatchConfig,
    pr: PullRequestNumber,
    target: Vec<String>,
    current: &[String],
) -> anyhow::Result<Vec<String>> {
    let LabelDiff { to_delete, to_add } = compute_label_diff(config, &target, current);
    tracing::info!("Label changes: delete = {to_delete:?}, add = {to_add:?}");

    for label in &to_delete {
        client.remove_label(pr, label).await?;
    }
    if !to_add.is_empty() {
        client.add_labels(pr, &to_add).await?;
    }

    Ok(target
        .into_iter()
        .filter(|label| config.is_namespaced(label))
        .collect())
}
