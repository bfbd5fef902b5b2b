//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::{ClusterConfig, EntityKind, ValidationResult};
use crate::error::Operation;
use crate::planner::{ApplyPlan, ClusterComparison, PhaseReport};
use crate::reconciler::{ApplyOutcome, DriftReport};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan action row for table display.
#[derive(Tabled)]
struct PlanActionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Key")]
    key: String,
}

/// Collection row for table display.
#[derive(Tabled)]
struct CollectionRow {
    #[tabled(rename = "Collection")]
    collection: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Keys")]
    keys: String,
}

/// Change row for comparison display.
#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Key")]
    key: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats an apply plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &ApplyPlan) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&PlanJson::from(plan)).unwrap_or_default()
            }
            OutputFormat::Text => Self::format_plan_text(plan),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(plan: &ApplyPlan) -> String {
        if plan.is_empty() {
            return format!(
                "{} No changes required - cluster is up to date.\n",
                "✓".green()
            );
        }

        let mut output = String::new();

        let _ = write!(output, "\nApply Plan\n");
        let _ = write!(output, "   Config hash: {}\n\n", short(&plan.config_hash));

        let rows: Vec<PlanActionRow> = plan
            .actions
            .iter()
            .enumerate()
            .map(|(i, a)| PlanActionRow {
                index: i + 1,
                action: Self::format_operation(a.operation),
                kind: a.target.to_string(),
                key: a.key.clone(),
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let _ = write!(
            output,
            "\nPlan: {} to add, {} to modify, {} to delete\n",
            plan.count(Operation::Create).to_string().green(),
            plan.count(Operation::Update).to_string().yellow(),
            plan.count(Operation::Delete).to_string().red()
        );

        output
    }

    /// Formats a snapshot comparison.
    #[must_use]
    pub fn format_comparison(&self, comparison: &ClusterComparison) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(comparison).unwrap_or_default(),
            OutputFormat::Text => {
                if comparison.is_same {
                    return format!("{} Snapshots are identical.\n", "✓".green());
                }

                let mut rows = Vec::new();
                for (change, config) in [
                    ("+added".green().to_string(), &comparison.diff_added),
                    ("~modified".yellow().to_string(), &comparison.diff_modified),
                    ("-removed".red().to_string(), &comparison.diff_removed),
                ] {
                    for kind in EntityKind::CREATION_ORDER {
                        rows.extend(config.keys(kind).into_iter().map(|key| ChangeRow {
                            change: change.clone(),
                            kind: kind.to_string(),
                            key,
                        }));
                    }
                }

                let mut output = String::new();
                if !rows.is_empty() {
                    output.push_str(&Table::new(rows).to_string());
                    output.push('\n');
                }

                let (added, modified, removed) = comparison.change_counts();
                let _ = write!(
                    output,
                    "\n{added} added, {modified} modified, {removed} removed"
                );
                if comparison.global_config_changed {
                    let _ = write!(output, ", global configuration {}", "changed".yellow());
                }
                output.push('\n');
                output
            }
        }
    }

    /// Formats the outcome of an apply.
    #[must_use]
    pub fn format_outcome(&self, outcome: &ApplyOutcome) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Text => {
                if !outcome.changed {
                    return format!(
                        "{} No changes applied - cluster is converged.\n",
                        "✓".green()
                    );
                }

                let status = if outcome.dry_run {
                    format!("{} Dry run complete (nothing was changed)", "⚠".yellow())
                } else {
                    format!("{} Apply successful", "✓".green())
                };

                let (added, modified, deleted) = outcome.counts();
                let mut output = format!("{status}\n\n");
                let _ = writeln!(output, "   Added: {added}");
                let _ = writeln!(output, "   Modified: {modified}");
                let _ = writeln!(output, "   Deleted: {deleted}");
                if outcome.modified.global_config.is_some() {
                    let _ = writeln!(output, "   Global configuration modified");
                }
                output
            }
        }
    }

    /// Formats a deletion report from `destroy`.
    #[must_use]
    pub fn format_phase(&self, report: &PhaseReport) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&PhaseJson::from(report)).unwrap_or_default()
            }
            OutputFormat::Text => {
                let status = if report.is_success() {
                    format!("{} All entities deleted", "✓".green())
                } else {
                    format!("{} Some deletions failed", "✗".red())
                };

                let mut output = format!("{status}\n\n");
                let _ = writeln!(output, "   Attempted: {}", report.attempted);
                let _ = writeln!(output, "   Deleted: {}", report.succeeded());

                if let Some(err) = &report.error {
                    let _ = write!(output, "\n{} Failed keys:\n", "⚠".yellow());
                    for key in err.failed_keys() {
                        let _ = writeln!(output, "   - {key}");
                    }
                }
                output
            }
        }
    }

    /// Formats a drift report.
    #[must_use]
    pub fn format_drift(&self, report: &DriftReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => {
                if report.is_converged() {
                    let mut output =
                        format!("{} No drift detected - cluster is converged.\n", "✓".green());
                    if report.global_config_unmanaged {
                        let _ = writeln!(
                            output,
                            "   {} live global configuration cannot be removed",
                            "!".yellow()
                        );
                    }
                    return output;
                }

                let mut output = format!("{} Drift detected:\n\n", "⚠".yellow());
                for entity in &report.missing {
                    let _ = writeln!(output, "   {} {entity}", "+".green());
                }
                for entity in &report.changed {
                    let _ = writeln!(output, "   {} {entity}", "~".yellow());
                }
                for entity in &report.unmanaged {
                    let _ = writeln!(output, "   {} {entity}", "-".red());
                }
                if report.global_config_changed {
                    let _ = writeln!(output, "   {} global configuration", "~".yellow());
                }
                if report.global_config_unmanaged {
                    let _ = writeln!(
                        output,
                        "   {} live global configuration cannot be removed",
                        "!".yellow()
                    );
                }
                let _ = write!(
                    output,
                    "\n{} entities have drifted ({} live, {} desired).\n",
                    report.drifted_count(),
                    report.live_count,
                    report.desired_count
                );
                output
            }
        }
    }

    /// Formats a validation result with a summary of the snapshot.
    #[must_use]
    pub fn format_validation(
        &self,
        result: &ValidationResult,
        config: &ClusterConfig,
        show_warnings: bool,
    ) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&ValidationJson::new(result, config))
                .unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = if result.is_valid() {
                    format!("{} Configuration is valid!\n", "✓".green())
                } else {
                    let mut text = format!(
                        "{} Configuration has {} errors:\n",
                        "✗".red(),
                        result.error_count()
                    );
                    for error in &result.errors {
                        let _ = writeln!(text, "   - {error}");
                    }
                    text
                };

                if show_warnings && result.warning_count() > 0 {
                    let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }

                let _ = write!(output, "\nConfiguration summary:\n");
                let _ = writeln!(output, "   Entities: {}", config.entity_count());
                let _ = writeln!(output, "   Cluster queues: {}", config.cluster_queues.len());
                let _ = writeln!(output, "   Exec hosts: {}", config.exec_hosts.len());
                let _ = writeln!(output, "   Projects: {}", config.projects.len());
                let _ = writeln!(
                    output,
                    "   Global configuration: {}",
                    if config.global_config.is_some() { "yes" } else { "no" }
                );
                output
            }
        }
    }

    /// Formats a snapshot for display.
    #[must_use]
    pub fn format_snapshot(&self, config: &ClusterConfig) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(config).unwrap_or_default(),
            OutputFormat::Text => {
                if config.is_empty() {
                    return String::from("   Live configuration is empty.\n");
                }

                let rows: Vec<CollectionRow> = EntityKind::CREATION_ORDER
                    .into_iter()
                    .filter(|kind| config.count(*kind) > 0)
                    .map(|kind| CollectionRow {
                        collection: kind.collection().to_string(),
                        count: config.count(kind),
                        keys: Self::truncate(&config.keys(kind).join(", "), 50),
                    })
                    .collect();

                let mut output = String::new();
                if let Some(env) = &config.cluster_environment {
                    let _ = write!(output, "\nCluster: {} ({})\n\n", env.name, env.cell);
                }
                if !rows.is_empty() {
                    output.push_str(&Table::new(rows).to_string());
                    output.push('\n');
                }
                let _ = write!(
                    output,
                    "\nTotal: {} entities, global configuration {}\n",
                    config.entity_count(),
                    if config.global_config.is_some() { "present" } else { "absent" }
                );
                output
            }
        }
    }

    /// Formats an operation with color.
    fn format_operation(operation: Operation) -> String {
        match operation {
            Operation::Create => "+add".green().to_string(),
            Operation::Update => "~modify".yellow().to_string(),
            Operation::Delete => "-delete".red().to_string(),
        }
    }

    /// Truncates a string to a maximum length.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let head: String = s.chars().take(max_len - 3).collect();
            format!("{head}...")
        }
    }
}

fn short(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}

// JSON serialization helpers

#[derive(serde::Serialize)]
struct PlanJson {
    config_hash: String,
    created_at: String,
    action_count: usize,
    adds: usize,
    modifies: usize,
    deletes: usize,
    actions: Vec<ActionJson>,
}

#[derive(serde::Serialize)]
struct ActionJson {
    operation: String,
    target: String,
    key: String,
    description: String,
}

impl From<&ApplyPlan> for PlanJson {
    fn from(plan: &ApplyPlan) -> Self {
        Self {
            config_hash: plan.config_hash.clone(),
            created_at: plan.created_at.to_rfc3339(),
            action_count: plan.action_count(),
            adds: plan.count(Operation::Create),
            modifies: plan.count(Operation::Update),
            deletes: plan.count(Operation::Delete),
            actions: plan
                .actions
                .iter()
                .map(|a| ActionJson {
                    operation: a.operation.to_string(),
                    target: a.target.to_string(),
                    key: a.key.clone(),
                    description: a.description(),
                })
                .collect(),
        }
    }
}

#[derive(serde::Serialize)]
struct PhaseJson<'a> {
    operation: String,
    success: bool,
    attempted: usize,
    succeeded: usize,
    error: Option<String>,
    failed_keys: Vec<&'a str>,
    completed: &'a ClusterConfig,
}

impl<'a> From<&'a PhaseReport> for PhaseJson<'a> {
    fn from(report: &'a PhaseReport) -> Self {
        Self {
            operation: report.operation.to_string(),
            success: report.is_success(),
            attempted: report.attempted,
            succeeded: report.succeeded(),
            error: report.error.as_ref().map(ToString::to_string),
            failed_keys: report.error.as_ref().map(|e| e.failed_keys()).unwrap_or_default(),
            completed: &report.completed,
        }
    }
}

#[derive(serde::Serialize)]
struct ValidationJson {
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
    entity_count: usize,
}

impl ValidationJson {
    fn new(result: &ValidationResult, config: &ClusterConfig) -> Self {
        Self {
            valid: result.is_valid(),
            errors: result.errors.iter().map(ToString::to_string).collect(),
            warnings: result.warnings.clone(),
            entity_count: config.entity_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClusterQueueConfig, ConfigValidator, ProjectConfig};
    use crate::planner::compare;

    fn desired() -> ClusterConfig {
        ClusterConfig {
            cluster_queues: vec![ClusterQueueConfig::named("all.q")],
            projects: vec![ProjectConfig {
                name: String::from("physics"),
                ..ProjectConfig::default()
            }],
            ..ClusterConfig::default()
        }
    }

    #[test]
    fn test_plan_json_lists_actions() {
        let comparison = compare(&ClusterConfig::default(), &desired()).expect("comparable");
        let plan = ApplyPlan::from_comparison(&comparison, "0123456789abcdef");

        let json = OutputFormatter::new(OutputFormat::Json).format_plan(&plan);
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["adds"], 2);
        assert_eq!(value["actions"][0]["target"], "project");
        assert_eq!(value["actions"][1]["key"], "all.q");
        assert_eq!(value["actions"][1]["description"], "add cluster queue 'all.q'");
    }

    #[test]
    fn test_empty_plan_text() {
        let comparison = compare(&desired(), &desired()).expect("comparable");
        let plan = ApplyPlan::from_comparison(&comparison, "abc");

        let text = OutputFormatter::new(OutputFormat::Text).format_plan(&plan);
        assert!(text.contains("No changes required"));
    }

    #[test]
    fn test_comparison_json_uses_stable_field_names() {
        let comparison = compare(&ClusterConfig::default(), &desired()).expect("comparable");

        let json = OutputFormatter::new(OutputFormat::Json).format_comparison(&comparison);
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["is_same"], false);
        assert_eq!(value["diff_added"]["cluster_queues"][0]["qname"], "all.q");
        assert!(value["diff_removed"]["projects"].as_array().is_some_and(Vec::is_empty));
    }

    #[test]
    fn test_validation_json() {
        let result = ConfigValidator::new().check(&desired());

        let json =
            OutputFormatter::new(OutputFormat::Json).format_validation(&result, &desired(), true);
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["valid"], true);
        assert_eq!(value["entity_count"], 2);
    }

    #[test]
    fn test_snapshot_text_lists_collections() {
        let text = OutputFormatter::new(OutputFormat::Text).format_snapshot(&desired());
        assert!(text.contains("cluster_queues"));
        assert!(text.contains("all.q"));
        assert!(text.contains("Total: 2 entities"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(OutputFormatter::truncate("short", 10), "short");
        assert_eq!(OutputFormatter::truncate("a-very-long-name", 10), "a-very-...");
    }
}
