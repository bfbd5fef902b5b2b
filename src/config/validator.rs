//! Snapshot validation.
//!
//! This module checks a snapshot before it is compared or applied: keys must
//! be usable names, keys must be unique per collection, enumerated fields
//! must hold known values, and cross references should resolve.

use crate::error::{ConfigError, GridconfError, Result};
use std::collections::HashSet;
use tracing::debug;

use super::entity::EntityKind;
use super::spec::{ClusterConfig, ComplexEntryConfig};

/// Validator for cluster snapshots.
#[derive(Debug, Default)]
pub struct ConfigValidator {
    /// Known complex entry value types.
    known_value_types: HashSet<String>,
}

/// Value types understood by the scheduler.
const KNOWN_VALUE_TYPES: &[&str] = &[
    "INT", "DOUBLE", "MEMORY", "TIME", "STRING", "CSTRING", "RESTRING", "HOST", "BOOL", "RSMAP",
];

const RELATIONAL_OPERATORS: &[&str] = &["==", "<", ">", "<=", ">=", "!=", "EXCL"];
const REQUESTABLE_VALUES: &[&str] = &["YES", "NO", "FORCED"];
const CONSUMABLE_VALUES: &[&str] = &["YES", "NO", "JOB", "HOST"];
const USER_SET_TYPES: &[&str] = &["ACL", "DEPT"];

/// Placeholder meaning "no reference".
const NONE_VALUE: &str = "NONE";

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator with the default value types.
    #[must_use]
    pub fn new() -> Self {
        Self {
            known_value_types: KNOWN_VALUE_TYPES.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Adds a custom complex value type to the known list.
    pub fn add_value_type(&mut self, value_type: impl Into<String>) {
        self.known_value_types.insert(value_type.into());
    }

    /// Validates a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the first problem if validation fails.
    pub fn validate(&self, config: &ClusterConfig) -> Result<ValidationResult> {
        let result = self.check(config);

        if result.errors.is_empty() {
            debug!("Snapshot validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(GridconfError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }))
        }
    }

    /// Collects every error and warning without failing.
    #[must_use]
    pub fn check(&self, config: &ClusterConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        for kind in EntityKind::CREATION_ORDER {
            Self::validate_keys(config, kind, &mut result);
        }
        self.validate_complex_entries(&config.complex_entries, &mut result);
        Self::validate_user_sets(config, &mut result);
        Self::validate_parallel_environments(config, &mut result);
        Self::validate_references(config, &mut result);

        result
    }

    /// Validates key format and uniqueness within one collection.
    fn validate_keys(config: &ClusterConfig, kind: EntityKind, result: &mut ValidationResult) {
        let mut seen = HashSet::new();

        for (i, key) in config.keys(kind).iter().enumerate() {
            let field = kind.key_field().map_or_else(
                || format!("{}[{i}]", kind.collection()),
                |name| format!("{}[{i}].{name}", kind.collection()),
            );

            if key.is_empty() {
                result.errors.push(ValidationError {
                    field,
                    message: format!("{kind} name cannot be empty"),
                });
                continue;
            }

            if !seen.insert(key.clone()) {
                result.errors.push(ValidationError {
                    field,
                    message: ConfigError::DuplicateName {
                        resource_type: kind.to_string(),
                        name: key.clone(),
                    }
                    .to_string(),
                });
                continue;
            }

            if !is_valid_name(key) {
                result.errors.push(ValidationError {
                    field,
                    message: format!(
                        "{kind} name '{key}' contains whitespace or reserved characters"
                    ),
                });
            } else if kind == EntityKind::HostGroup && !key.starts_with('@') {
                result.errors.push(ValidationError {
                    field,
                    message: format!("Host group name '{key}' must start with '@'"),
                });
            }
        }
    }

    /// Validates complex entry enumerations.
    fn validate_complex_entries(
        &self,
        entries: &[ComplexEntryConfig],
        result: &mut ValidationResult,
    ) {
        for (i, entry) in entries.iter().enumerate() {
            let prefix = format!("complex_entries[{i}]");

            if !self.known_value_types.contains(&entry.value_type) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.type"),
                    message: format!(
                        "Complex entry '{}' has unknown type '{}'",
                        entry.name, entry.value_type
                    ),
                });
            }

            let enumerations = [
                ("relop", &entry.relop, RELATIONAL_OPERATORS),
                ("requestable", &entry.requestable, REQUESTABLE_VALUES),
                ("consumable", &entry.consumable, CONSUMABLE_VALUES),
            ];
            for (name, value, allowed) in enumerations {
                if !value.is_empty() && !allowed.contains(&value.as_str()) {
                    result.errors.push(ValidationError {
                        field: format!("{prefix}.{name}"),
                        message: format!(
                            "Complex entry '{}' has invalid {name} '{value}', expected one of {}",
                            entry.name,
                            allowed.join(", ")
                        ),
                    });
                }
            }
        }
    }

    /// Validates user set list types.
    fn validate_user_sets(config: &ClusterConfig, result: &mut ValidationResult) {
        for (i, list) in config.user_set_lists.iter().enumerate() {
            let invalid = list
                .list_type
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .any(|t| !USER_SET_TYPES.contains(&t));

            if invalid {
                result.errors.push(ValidationError {
                    field: format!("user_set_lists[{i}].type"),
                    message: format!(
                        "User set list '{}' has invalid type '{}'",
                        list.name, list.list_type
                    ),
                });
            }

            if list.entries.is_empty() {
                result
                    .warnings
                    .push(format!("user_set_lists[{i}]: '{}' has no entries", list.name));
            }
        }
    }

    /// Validates parallel environment slot counts.
    fn validate_parallel_environments(config: &ClusterConfig, result: &mut ValidationResult) {
        for (i, pe) in config.parallel_environments.iter().enumerate() {
            if pe.slots < 0 {
                result.errors.push(ValidationError {
                    field: format!("parallel_environments[{i}].slots"),
                    message: format!(
                        "Parallel environment '{}' has negative slot count {}",
                        pe.pe_name, pe.slots
                    ),
                });
            }
        }
    }

    /// Warns about references to entities missing from the snapshot.
    fn validate_references(config: &ClusterConfig, result: &mut ValidationResult) {
        let names =
            |kind: EntityKind| -> HashSet<String> { config.keys(kind).into_iter().collect() };
        let user_sets = names(EntityKind::UserSetList);
        let projects = names(EntityKind::Project);
        let calendars = names(EntityKind::Calendar);
        let pes = names(EntityKind::ParallelEnvironment);
        let ckpts = names(EntityKind::CkptInterface);
        let host_groups = names(EntityKind::HostGroup);

        let mut check = |owner: &str, field: &str, values: &[String], known: &HashSet<String>| {
            for name in referenced_names(values) {
                if !known.contains(name) {
                    result
                        .warnings
                        .push(format!("{owner}.{field}: '{name}' is not defined in the snapshot"));
                }
            }
        };

        for queue in &config.cluster_queues {
            let owner = format!("cluster queue '{}'", queue.qname);
            check(&owner, "pe_list", &queue.pe_list, &pes);
            check(&owner, "ckpt_list", &queue.ckpt_list, &ckpts);
            check(&owner, "calendar", &queue.calendar, &calendars);
            check(&owner, "user_lists", &queue.user_lists, &user_sets);
            check(&owner, "xuser_lists", &queue.xuser_lists, &user_sets);
            check(&owner, "projects", &queue.projects, &projects);
            check(&owner, "xprojects", &queue.xprojects, &projects);

            let groups: Vec<String> = queue
                .hostlist
                .iter()
                .filter(|h| h.starts_with('@'))
                .cloned()
                .collect();
            check(&owner, "hostlist", &groups, &host_groups);
        }

        for pe in &config.parallel_environments {
            let owner = format!("parallel environment '{}'", pe.pe_name);
            check(&owner, "user_lists", &pe.user_lists, &user_sets);
            check(&owner, "xuser_lists", &pe.xuser_lists, &user_sets);
        }

        for project in &config.projects {
            let owner = format!("project '{}'", project.name);
            check(&owner, "acl", &project.acl, &user_sets);
            check(&owner, "xacl", &project.xacl, &user_sets);
        }

        for user in &config.users {
            if !user.default_project.is_empty() {
                let owner = format!("user '{}'", user.name);
                check(&owner, "default_project", &[user.default_project.clone()], &projects);
            }
        }

        for group in &config.host_groups {
            if group.hostlist.is_empty() {
                result
                    .warnings
                    .push(format!("host group '{}' has no members", group.group_name));
            }
        }
    }
}

/// Extracts referenced names from queue style attribute values.
///
/// Values may hold several names separated by spaces or commas and may be
/// host overrides of the form `[host=value]`.
fn referenced_names(values: &[String]) -> Vec<&str> {
    values
        .iter()
        .map(|value| {
            let trimmed = value.trim();
            match trimmed.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
                Some(inner) => inner.split_once('=').map_or(inner, |(_, v)| v),
                None => trimmed,
            }
        })
        .flat_map(|value| value.split(|c: char| c == ',' || c.is_whitespace()))
        .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case(NONE_VALUE))
        .collect()
}

/// Validates that a name can be used as an object name.
/// Names must not contain whitespace, separators or quoting characters.
fn is_valid_name(name: &str) -> bool {
    const RESERVED: &[char] = &[
        ',', '/', ':', '\'', '"', '\\', '[', ']', '{', '}', '|', '(', ')', '=',
    ];

    !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || RESERVED.contains(&c))
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
