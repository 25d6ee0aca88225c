use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::dispatch::command::CommandParser;
use crate::dispatch::policy::{AuthorizationPolicy, SelfServicePolicy};
use crate::dispatch::strategy::StrategyRegistry;

/// Everything the dispatch handler needs besides the event and the repository client.
/// It is created once at startup and shared between all handled events.
pub struct DispatchContext {
    pub config: Arc<DispatchConfig>,
    pub parser: CommandParser,
    pub policy: Box<dyn AuthorizationPolicy>,
    pub strategies: StrategyRegistry,
}

impl DispatchContext {
    pub fn new(config: Arc<DispatchConfig>) -> anyhow::Result<Self> {
        let parser = CommandParser::new(&config.bot_name)?;
        let policy = Box::new(SelfServicePolicy::new(&config));
        Ok(Self {
            config,
            parser,
            policy,
            strategies: StrategyRegistry::default(),
        })
    }

    pub fn with_policy(self, policy: Box<dyn AuthorizationPolicy>) -> Self {
        Self { policy, ..self }
    }
}
