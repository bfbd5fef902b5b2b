//! Apply plan types and construction.
//!
//! This module turns a snapshot comparison into the ordered list of control
//! plane calls an apply would issue, so it can be reviewed beforehand.

use chrono::{DateTime, Utc};

use crate::config::{ClusterConfig, EntityKind};
use crate::error::Operation;

use super::compare::ClusterComparison;

/// A complete apply plan.
#[derive(Debug)]
pub struct ApplyPlan {
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// Hash of the desired snapshot this plan is based on.
    pub config_hash: String,
    /// Planned actions in execution order.
    pub actions: Vec<PlannedAction>,
}

/// A single planned control plane call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    /// Mutation to issue.
    pub operation: Operation,
    /// What the mutation targets.
    pub target: ActionTarget,
    /// Entity key, empty for the global configuration.
    pub key: String,
}

/// Target of a planned action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTarget {
    /// An entity of the given kind.
    Entity(EntityKind),
    /// The global configuration singleton.
    GlobalConfig,
}

impl ApplyPlan {
    /// Creates a plan from a comparison of the live and desired snapshots.
    ///
    /// Actions follow the apply phases: creations in creation order, then
    /// modifications in creation order followed by the global configuration,
    /// then deletions in reverse creation order.
    #[must_use]
    pub fn from_comparison(comparison: &ClusterComparison, config_hash: &str) -> Self {
        let mut actions = Vec::new();

        push_entities(
            &mut actions,
            Operation::Create,
            &comparison.diff_added,
            EntityKind::CREATION_ORDER,
        );
        push_entities(
            &mut actions,
            Operation::Update,
            &comparison.diff_modified,
            EntityKind::CREATION_ORDER,
        );

        if comparison.diff_modified.global_config.is_some() {
            actions.push(PlannedAction {
                operation: Operation::Update,
                target: ActionTarget::GlobalConfig,
                key: String::new(),
            });
        }

        push_entities(
            &mut actions,
            Operation::Delete,
            &comparison.diff_removed,
            EntityKind::deletion_order(),
        );

        Self {
            created_at: Utc::now(),
            config_hash: config_hash.to_string(),
            actions,
        }
    }

    /// Returns true if the plan is empty (no changes).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Returns the number of actions.
    #[must_use]
    pub const fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Returns the number of actions issuing `operation`.
    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        self.actions
            .iter()
            .filter(|a| a.operation == operation)
            .count()
    }
}

fn push_entities(
    actions: &mut Vec<PlannedAction>,
    operation: Operation,
    config: &ClusterConfig,
    order: impl IntoIterator<Item = EntityKind>,
) {
    for kind in order {
        actions.extend(config.keys(kind).into_iter().map(|key| PlannedAction {
            operation,
            target: ActionTarget::Entity(kind),
            key,
        }));
    }
}

impl PlannedAction {
    /// Returns a human-readable description of the action.
    #[must_use]
    pub fn description(&self) -> String {
        match self.target {
            ActionTarget::Entity(kind) => format!("{} {kind} '{}'", self.operation, self.key),
            ActionTarget::GlobalConfig => format!("{} global configuration", self.operation),
        }
    }
}

impl std::fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entity(kind) => write!(f, "{kind}"),
            Self::GlobalConfig => write!(f, "global configuration"),
        }
    }
}

impl std::fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::fmt::Display for ApplyPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.actions.is_empty() {
            return write!(f, "No changes required");
        }

        writeln!(f, "Apply Plan ({} actions):", self.actions.len())?;
        for (i, action) in self.actions.iter().enumerate() {
            writeln!(f, "  {i}. {action}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClusterQueueConfig, GlobalConfig, ProjectConfig};
    use crate::planner::compare;

    #[test]
    fn test_empty_comparison_gives_empty_plan() {
        let config = ClusterConfig {
            managers: vec![String::from("root")],
            ..ClusterConfig::default()
        };
        let comparison = compare(&config, &config).expect("comparable");

        let plan = ApplyPlan::from_comparison(&comparison, "abc");
        assert!(plan.is_empty());
        assert_eq!(plan.to_string(), "No changes required");
    }

    #[test]
    fn test_actions_follow_phase_order() {
        let live = ClusterConfig {
            managers: vec![String::from("old-admin")],
            cluster_queues: vec![ClusterQueueConfig::named("legacy.q")],
            projects: vec![ProjectConfig {
                name: String::from("physics"),
                fshare: 1,
                ..ProjectConfig::default()
            }],
            ..ClusterConfig::default()
        };
        let desired = ClusterConfig {
            global_config: Some(GlobalConfig {
                max_jobs: 5,
                ..GlobalConfig::default()
            }),
            projects: vec![ProjectConfig {
                name: String::from("physics"),
                fshare: 2,
                ..ProjectConfig::default()
            }],
            cluster_queues: vec![ClusterQueueConfig::named("all.q")],
            ..ClusterConfig::default()
        };
        let comparison = compare(&live, &desired).expect("comparable");

        let plan = ApplyPlan::from_comparison(&comparison, "abc");
        let described: Vec<String> = plan.actions.iter().map(ToString::to_string).collect();

        assert_eq!(
            described,
            vec![
                "add cluster queue 'all.q'",
                "modify project 'physics'",
                "modify global configuration",
                "delete cluster queue 'legacy.q'",
                "delete manager 'old-admin'",
            ]
        );
        assert_eq!(plan.count(Operation::Create), 1);
        assert_eq!(plan.count(Operation::Update), 2);
        assert_eq!(plan.count(Operation::Delete), 2);
        assert_eq!(plan.action_count(), 5);
    }
}
