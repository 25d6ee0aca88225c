use std::collections::BTreeSet;

use crate::config::DispatchConfig;
use crate::dispatch::command::Command;
use crate::dispatch::event::WebhookEvent;

/// Decides whether an event is allowed to change the CI dispatch state of a PR.
pub trait AuthorizationPolicy: Send + Sync {
    fn is_authorized(&self, event: &WebhookEvent, command: Option<&Command>) -> bool;
}

/// Only the author of a PR can dispatch CI for it, and only with an allowed command.
/// PR lifecycle events are always authorized.
pub struct SelfServicePolicy {
    allowed_commands: BTreeSet<String>,
}

impl SelfServicePolicy {
    pub fn new(config: &DispatchConfig) -> Self {
        Self {
            allowed_commands: config.allowed_commands.clone(),
        }
    }
}

impl AuthorizationPolicy for SelfServicePolicy {
    fn is_authorized(&self, event: &WebhookEvent, command: Option<&Command>) -> bool {
        match event {
            WebhookEvent::PullRequest(_) => true,
            WebhookEvent::IssueComment(comment) => {
                if comment.author.is_empty() {
                    return false;
                }
                // TODO: also allow users with write access to the repository
                if comment.author != comment.pull_request.author {
                    return false;
                }
                command.is_some_and(|command| self.allowed_commands.contains(&command.name))
            }
        }
    }
}

/// Is CI dispatch enabled for the author of the PR?
pub fn rollout(config: &DispatchConfig, event: &WebhookEvent) -> bool {
    config.is_rollout_user(&event.pull_request().author)
}

#[cfg(test)]
mod tests {
    use super::{rollout, AuthorizationPolicy, SelfServicePolicy};
    use crate::config::DispatchConfig;
    use crate::dispatch::command::Command;
    use crate::dispatch::event::WebhookEvent;
    use crate::tests::event::{comment, pull_request};

    fn command(name: &str) -> Command {
        Command {
            name: name.to_string(),
            args: vec!["default".to_string()],
        }
    }

    fn is_authorized(event: &WebhookEvent, command: Option<&Command>) -> bool {
        SelfServicePolicy::new(&DispatchConfig::default()).is_authorized(event, command)
    }

    #[test]
    fn test_pull_request_event_is_authorized() {
        let event = pull_request().author("anyone").create();
        assert!(is_authorized(&event, None));
        assert!(is_authorized(&event, Some(&command("unknown"))));
    }

    #[test]
    fn test_comment_by_pr_author_is_authorized() {
        let event = comment("@pytorchbot ciflow default").create();
        assert!(is_authorized(&event, Some(&command("ciflow"))));
    }

    #[test]
    fn test_comment_by_other_user_is_rejected() {
        let event = comment("@pytorchbot ciflow default")
            .author("mallory")
            .create();
        assert!(!is_authorized(&event, Some(&command("ciflow"))));
    }

    #[test]
    fn test_comment_with_empty_author_is_rejected() {
        let event = comment("@pytorchbot ciflow default")
            .author("")
            .pr_author("")
            .create();
        assert!(!is_authorized(&event, Some(&command("ciflow"))));
    }

    #[test]
    fn test_comment_with_unknown_command_is_rejected() {
        let event = comment("@pytorchbot rebase").create();
        assert!(!is_authorized(&event, Some(&command("rebase"))));
    }

    #[test]
    fn test_comment_without_command_is_rejected() {
        let event = comment("lgtm").create();
        assert!(!is_authorized(&event, None));
    }

    #[test]
    fn test_rollout() {
        let config = DispatchConfig::default();
        assert!(rollout(
            &config,
            &pull_request().author("zhouzhuojie").create()
        ));
        assert!(!rollout(&config, &pull_request().author("alice").create()));
    }
}
