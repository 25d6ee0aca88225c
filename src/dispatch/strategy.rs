//! Dispatch strategies build the target label set of a PR.
//!
//! Each strategy is a pure function that receives the labels accumulated by the previous
//! strategies and returns a new list. Strategies are looked up by name, so the order and
//! selection can be configured.
use std::collections::HashMap;

use crate::config::{DispatchConfig, STRATEGY_ADD_DEFAULT_LABELS};
use crate::dispatch::error::DispatchError;
use crate::dispatch::event::PullRequestContext;

pub type StrategyFn = fn(&PullRequestContext, &DispatchConfig, Vec<String>) -> Vec<String>;

/// Result of running the strategy pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchDecision {
    /// Target labels of the PR.
    pub labels: Vec<String>,
    /// Names of the strategies that were applied, in order.
    pub strategies: Vec<String>,
}

pub struct StrategyRegistry {
    strategies: HashMap<String, StrategyFn>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        let mut registry = Self {
            strategies: HashMap::new(),
        };
        registry.register(STRATEGY_ADD_DEFAULT_LABELS, strategy_add_default_labels);
        registry
    }
}

impl StrategyRegistry {
    pub fn register(&mut self, name: &str, strategy: StrategyFn) {
        self.strategies.insert(name.to_string(), strategy);
    }

    /// Applies the strategies with the given `names` in order, starting from the current
    /// namespaced labels of the PR. Unknown strategies are skipped.
    pub fn run(
        &self,
        names: &[String],
        pr: &PullRequestContext,
        config: &DispatchConfig,
    ) -> DispatchDecision {
        let mut labels = pr.labels.clone();
        let mut applied = Vec::with_capacity(names.len());
        for name in names {
            match self.strategies.get(name) {
                Some(strategy) => {
                    labels = strategy(pr, config, labels);
                    applied.push(name.clone());
                }
                None => {
                    tracing::error!("{}", DispatchError::UnknownStrategy(name.clone()));
                }
            }
        }
        DispatchDecision {
            labels,
            strategies: applied,
        }
    }
}

/// Puts the default label in front of the accumulated labels.
pub fn strategy_add_default_labels(
    pr: &PullRequestContext,
    config: &DispatchConfig,
    mut labels: Vec<String>,
) -> Vec<String> {
    if labels.is_empty() {
        labels = pr.labels.clone();
    }
    labels.insert(0, config.default_label.clone());
    labels
}
