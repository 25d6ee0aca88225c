use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;

pub const DEFAULT_BOT_NAME: &str = "pytorchbot";
pub const DEFAULT_LABEL_PREFIX: &str = "ciflow/";
pub const DEFAULT_LABEL: &str = "ciflow/default";
pub const STRATEGY_ADD_DEFAULT_LABELS: &str = "strategy_add_default_labels";

const DEFAULT_ALLOWED_COMMANDS: &[&str] = &["ciflow"];
const DEFAULT_ROLLOUT_USERS: &[&str] = &["zhouzhuojie", "seemethere", "janeyx99", "malfet"];

/// Policy of the dispatch bot. It is loaded once at startup and never modified afterwards.
///
/// Every key of the TOML file is optional and defaults to the built-in value.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Name used to address the bot in comments, without the `@`.
    pub bot_name: String,
    /// Login that is briefly assigned to a PR to signal a dispatch.
    pub bot_assignee: String,
    /// Prefix of labels that encode CI dispatch intent.
    pub label_prefix: String,
    /// Label that is always part of a dispatch.
    pub default_label: String,
    pub allowed_commands: BTreeSet<String>,
    /// Logins of PR authors for which dispatch is enabled.
    pub rollout_users: BTreeSet<String>,
    /// Names of dispatch strategies, applied in order.
    pub strategies: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            bot_name: DEFAULT_BOT_NAME.to_string(),
            bot_assignee: DEFAULT_BOT_NAME.to_string(),
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
            default_label: DEFAULT_LABEL.to_string(),
            allowed_commands: DEFAULT_ALLOWED_COMMANDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rollout_users: DEFAULT_ROLLOUT_USERS.iter().map(|s| s.to_string()).collect(),
            strategies: vec![STRATEGY_ADD_DEFAULT_LABELS.to_string()],
        }
    }
}

impl DispatchConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: DispatchConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.bot_name.is_empty() {
            return Err(anyhow::anyhow!("Bot name must not be empty"));
        }
        if self.bot_assignee.is_empty() {
            return Err(anyhow::anyhow!("Bot assignee must not be empty"));
        }
        if !self.is_namespaced(&self.default_label) {
            return Err(anyhow::anyhow!(
                "Default label {} does not start with prefix {}",
                self.default_label,
                self.label_prefix
            ));
        }
        Ok(())
    }

    /// Does the label belong to the dispatch namespace?
    pub fn is_namespaced(&self, label: &str) -> bool {
        label.starts_with(&self.label_prefix)
    }

    pub fn is_rollout_user(&self, login: &str) -> bool {
        self.rollout_users.contains(login)
    }
}
