use anyhow::Context;

use crate::dispatch::event::WebhookEvent;
use crate::dispatch::labels::set_labels;
use crate::dispatch::policy::rollout;
use crate::dispatch::strategy::DispatchDecision;
use crate::dispatch::{DispatchContext, RepositoryClient};
use crate::github::PullRequestNumber;

/// Final state of handling a single webhook event.
#[derive(Debug, PartialEq)]
pub enum DispatchOutcome {
    /// The event was not authorized to change the dispatch state.
    Rejected,
    /// The PR author is not part of the rollout.
    GatedOut,
    /// Labels of the PR were reconciled and the signal was sent.
    Dispatched(DispatchDecision),
}

/// Decides CI dispatch for a single webhook event and applies the decision to the PR.
///
/// Errors of the GitHub API are returned as-is. Label changes that were already applied
/// are not rolled back.
pub async fn handle_dispatch_event(
    ctx: &DispatchContext,
    client: &dyn RepositoryClient,
    event: WebhookEvent,
) -> anyhow::Result<DispatchOutcome> {
    let pr = event.pull_request();
    let comment = event.comment();
    let command = comment.and_then(|comment| ctx.parser.parse(&comment.text));

    tracing::info!(
        event = event.kind().name(),
        action = event.action(),
        repo = %pr.repository,
        pr = %pr.number,
        pr_author = %pr.author,
        comment_author = ?comment.map(|comment| comment.author.as_str()),
        command = ?command,
        labels = ?pr.labels,
        "dispatch started"
    );

    if !ctx.policy.is_authorized(&event, command.as_ref()) {
        return Ok(DispatchOutcome::Rejected);
    }
    if !rollout(&ctx.config, &event) {
        return Ok(DispatchOutcome::GatedOut);
    }

    let mut decision = ctx
        .strategies
        .run(&ctx.config.strategies, pr, &ctx.config);
    decision.labels = set_labels(client, &ctx.config, pr.number, decision.labels, &pr.labels)
        .await
        .context("Cannot reconcile dispatch labels")?;
    signal_github(client, pr.number, &ctx.config.bot_assignee)
        .await
        .context("Cannot signal dispatch")?;

    tracing::info!(
        repo = %pr.repository,
        pr = %pr.number,
        labels = ?decision.labels,
        strategies = ?decision.strategies,
        "dispatch success"
    );
    Ok(DispatchOutcome::Dispatched(decision))
}

/// Assigns and immediately unassigns `assignee`, so that automation watching for assignee
/// changes on the PR is notified.
async fn signal_github(
    client: &dyn RepositoryClient,
    pr: PullRequestNumber,
    assignee: &str,
) -> anyhow::Result<()> {
    client.add_assignee(pr, assignee).await?;
    client.remove_assignee(pr, assignee).await?;
    Ok(())
}
