//! Cluster configuration snapshot types.
//!
//! This module defines the structure of a cluster snapshot: every collection
//! of scheduler objects plus the global configuration. Field names are the
//! stable identifiers used in YAML and JSON documents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete declarative configuration of a cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Informational description of the installation. Never compared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_environment: Option<ClusterEnvironment>,

    /// Global configuration singleton.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_config: Option<GlobalConfig>,

    /// Calendars.
    pub calendars: Vec<CalendarConfig>,

    /// Complex (resource type) definitions.
    pub complex_entries: Vec<ComplexEntryConfig>,

    /// Checkpointing interfaces.
    pub ckpt_interfaces: Vec<CkptInterfaceConfig>,

    /// Host-local configurations.
    pub host_configurations: Vec<HostConfiguration>,

    /// Execution hosts.
    pub exec_hosts: Vec<HostExecConfig>,

    /// Administrative hosts.
    pub admin_hosts: Vec<String>,

    /// Submit hosts.
    pub submit_hosts: Vec<String>,

    /// Host groups.
    pub host_groups: Vec<HostGroupConfig>,

    /// Resource quota sets.
    pub resource_quota_sets: Vec<ResourceQuotaSetConfig>,

    /// Manager user names.
    pub managers: Vec<String>,

    /// Operator user names.
    pub operators: Vec<String>,

    /// Parallel environments.
    pub parallel_environments: Vec<ParallelEnvironmentConfig>,

    /// Projects.
    pub projects: Vec<ProjectConfig>,

    /// Users.
    pub users: Vec<UserConfig>,

    /// Cluster queues.
    pub cluster_queues: Vec<ClusterQueueConfig>,

    /// User set lists (access lists and departments).
    pub user_set_lists: Vec<UserSetListConfig>,
}

/// Installation details of a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterEnvironment {
    /// Cluster name.
    #[serde(rename = "sge_name")]
    pub name: String,
    /// Installation root.
    #[serde(rename = "sge_root")]
    pub root: String,
    /// Cell name.
    #[serde(rename = "sge_cell")]
    pub cell: String,
    /// Qmaster port.
    #[serde(rename = "sge_qmaster_port")]
    pub qmaster_port: u16,
    /// Execution daemon port.
    #[serde(rename = "sge_execd_port")]
    pub execd_port: u16,
    /// Scheduler version.
    #[serde(rename = "sge_version")]
    pub version: String,
}

/// Calendar definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Calendar name.
    pub calendar_name: String,
    /// Year specification.
    pub year: String,
    /// Week specification.
    pub week: String,
}

/// Complex entry (resource attribute) definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexEntryConfig {
    /// Attribute name.
    pub name: String,
    /// Shortcut used in requests.
    pub shortcut: String,
    /// Value type (INT, DOUBLE, MEMORY, ...).
    #[serde(rename = "type")]
    pub value_type: String,
    /// Relational operator.
    pub relop: String,
    /// YES, NO or FORCED.
    pub requestable: String,
    /// YES, NO, JOB or HOST.
    pub consumable: String,
    /// Default value.
    pub default: String,
    /// Urgency weight.
    pub urgency: i64,
}

/// Checkpointing interface definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CkptInterfaceConfig {
    /// Interface name.
    pub ckpt_name: String,
    /// Interface type.
    pub interface: String,
    /// Clean command.
    pub clean_command: String,
    /// Checkpoint command.
    pub ckpt_command: String,
    /// Migration command.
    pub migr_command: String,
    /// Restart command.
    pub restart_command: String,
    /// Checkpoint directory.
    pub ckpt_dir: String,
    /// Signal sent on checkpoint.
    pub signal: String,
    /// When checkpoints are taken.
    pub when: String,
}

/// Global cluster configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct GlobalConfig {
    pub execd_spool_dir: String,
    pub mailer: String,
    pub xterm: String,
    #[serde(rename = "load_sensor")]
    pub load_sensors: Vec<String>,
    pub prolog: String,
    pub epilog: String,
    pub shell_start_mode: String,
    pub login_shells: Vec<String>,
    pub min_uid: i64,
    pub min_gid: i64,
    pub user_lists: Vec<String>,
    pub xuser_lists: Vec<String>,
    pub projects: Vec<String>,
    pub xprojects: Vec<String>,
    pub enforce_project: String,
    pub enforce_user: String,
    pub load_report_time: String,
    pub max_unheard: String,
    pub reschedule_unknown: String,
    pub loglevel: String,
    pub administrator_mail: String,
    pub set_token_cmd: String,
    pub pag_cmd: String,
    pub token_extend_time: String,
    pub shepherd_cmd: String,
    pub qmaster_params: Vec<String>,
    pub execd_params: Vec<String>,
    pub reporting_params: Vec<String>,
    pub finished_jobs: i64,
    pub gid_range: Vec<String>,
    pub qlogin_command: String,
    pub qlogin_daemon: String,
    pub rlogin_command: String,
    pub rlogin_daemon: String,
    pub rsh_command: String,
    pub rsh_daemon: String,
    pub max_aj_instances: i64,
    pub max_aj_tasks: i64,
    pub max_u_jobs: i64,
    pub max_jobs: i64,
    pub max_advance_reservations: i64,
    pub auto_user_oticket: i64,
    pub auto_user_fshare: i64,
    pub auto_user_default_project: String,
    pub auto_user_delete_time: i64,
    pub delegated_file_staging: bool,
    pub reprioritize: i64,
    pub jsv_url: String,
    pub jsv_allowed_mod: Vec<String>,
}

/// Host-local configuration overriding parts of the global configuration.
///
/// Unset values inherit the global value, so every override is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct HostConfiguration {
    /// Host name.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execd_spool_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xterm: Option<String>,
    #[serde(rename = "load_sensor", skip_serializing_if = "Vec::is_empty")]
    pub load_sensors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prolog: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epilog: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_start_mode: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub login_shells: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_report_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shepherd_cmd: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub execd_params: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reporting_params: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gid_range: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qlogin_daemon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qlogin_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsh_daemon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsh_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rlogin_daemon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rlogin_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reschedule_unknown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub libjvm_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_jvm_args: Option<String>,
}

/// Host group definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostGroupConfig {
    /// Group name, conventionally starting with `@`.
    pub group_name: String,
    /// Member hosts and nested groups.
    pub hostlist: Vec<String>,
}

/// Execution host definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostExecConfig {
    /// Host name.
    pub hostname: String,
    /// Scaling applied to reported load values.
    pub load_scaling: BTreeMap<String, f64>,
    /// Scaling applied to reported usage values.
    pub usage_scaling: BTreeMap<String, f64>,
    /// Host-level complex values.
    pub complex_values: BTreeMap<String, String>,
    /// Allowed user sets.
    pub user_lists: Vec<String>,
    /// Denied user sets.
    pub xuser_lists: Vec<String>,
    /// Allowed projects.
    pub projects: Vec<String>,
    /// Denied projects.
    pub xprojects: Vec<String>,
    /// Values written to the reporting file.
    pub report_variables: Vec<String>,
}

/// Resource quota set definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceQuotaSetConfig {
    /// Rule set name.
    pub name: String,
    /// Free text description.
    pub description: String,
    /// Whether the rule set is active.
    pub enabled: bool,
    /// Limit rules, one per entry.
    pub limits: Vec<String>,
}

/// Parallel environment definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ParallelEnvironmentConfig {
    /// Parallel environment name.
    pub pe_name: String,
    pub slots: i64,
    pub user_lists: Vec<String>,
    pub xuser_lists: Vec<String>,
    pub start_proc_args: String,
    pub stop_proc_args: String,
    pub allocation_rule: String,
    pub control_slaves: String,
    pub job_is_first_task: bool,
    pub urgency_slots: String,
    pub accounting_summary: bool,
    #[serde(rename = "ign_sreq_on_mhost")]
    pub ignore_slave_requests_on_master_host: bool,
    pub master_forks_slaves: bool,
    pub daemon_forks_slaves: bool,
}

/// Project definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project name.
    pub name: String,
    /// Override tickets.
    pub oticket: i64,
    /// Functional shares.
    pub fshare: i64,
    /// User sets allowed to use the project.
    pub acl: Vec<String>,
    /// User sets denied the project.
    pub xacl: Vec<String>,
}

/// Cluster queue definition.
///
/// Apart from the name every attribute is a list of values where the first
/// entry is the queue default and later entries are `[host=value]` overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ClusterQueueConfig {
    /// Queue name.
    pub qname: String,
    pub hostlist: Vec<String>,
    pub seq_no: Vec<String>,
    pub load_thresholds: Vec<String>,
    pub suspend_thresholds: Vec<String>,
    pub nsuspend: Vec<String>,
    pub suspend_interval: Vec<String>,
    pub priority: Vec<String>,
    pub min_cpu_interval: Vec<String>,
    pub processors: Vec<String>,
    pub qtype: Vec<String>,
    pub ckpt_list: Vec<String>,
    pub pe_list: Vec<String>,
    pub rerun: Vec<String>,
    pub slots: Vec<String>,
    pub tmpdir: Vec<String>,
    pub shell: Vec<String>,
    pub prolog: Vec<String>,
    pub epilog: Vec<String>,
    pub shell_start_mode: Vec<String>,
    pub starter_method: Vec<String>,
    pub suspend_method: Vec<String>,
    pub resume_method: Vec<String>,
    pub terminate_method: Vec<String>,
    pub notify: Vec<String>,
    pub owner_list: Vec<String>,
    pub user_lists: Vec<String>,
    pub xuser_lists: Vec<String>,
    pub subordinate_list: Vec<String>,
    pub complex_values: Vec<String>,
    pub projects: Vec<String>,
    pub xprojects: Vec<String>,
    pub calendar: Vec<String>,
    pub initial_state: Vec<String>,
    pub s_rt: Vec<String>,
    pub h_rt: Vec<String>,
    pub s_cpu: Vec<String>,
    pub h_cpu: Vec<String>,
    pub s_fsize: Vec<String>,
    pub h_fsize: Vec<String>,
    pub s_data: Vec<String>,
    pub h_data: Vec<String>,
    pub s_stack: Vec<String>,
    pub h_stack: Vec<String>,
    pub s_core: Vec<String>,
    pub h_core: Vec<String>,
    pub s_rss: Vec<String>,
    pub h_rss: Vec<String>,
    pub s_vmem: Vec<String>,
    pub h_vmem: Vec<String>,
}

/// User set list (access list or department).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSetListConfig {
    /// List name.
    pub name: String,
    /// ACL, DEPT or both.
    #[serde(rename = "type")]
    pub list_type: String,
    /// Functional shares.
    pub fshare: i64,
    /// Override tickets.
    pub oticket: i64,
    /// Member users and groups.
    pub entries: Vec<String>,
}

/// User definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// User name.
    pub name: String,
    /// Override tickets.
    pub oticket: i64,
    /// Functional shares.
    pub fshare: i64,
    /// Deletion time for automatically created users.
    pub delete_time: i64,
    /// Default project.
    pub default_project: String,
}

impl ClusterConfig {
    /// Returns true if the snapshot holds no entity and no global configuration.
    ///
    /// The informational cluster environment is ignored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.global_config.is_none() && self.entity_count() == 0
    }

    /// Returns the queue names.
    #[must_use]
    pub fn queue_names(&self) -> Vec<&str> {
        self.cluster_queues.iter().map(|q| q.qname.as_str()).collect()
    }
}

impl ClusterQueueConfig {
    /// Creates a queue with the given name and default attributes.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            qname: name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_collections_default_to_empty() {
        let yaml = r"
managers:
  - root
cluster_queues:
  - qname: all.q
    slots: ['4']
";
        let config: ClusterConfig = serde_yaml::from_str(yaml).expect("valid snapshot");
        assert_eq!(config.managers, vec!["root"]);
        assert_eq!(config.queue_names(), vec!["all.q"]);
        assert!(config.projects.is_empty());
        assert!(config.global_config.is_none());
    }

    #[test]
    fn test_renamed_fields() {
        let json = r#"{
            "complex_entries": [{"name": "mem", "type": "MEMORY", "urgency": 0}],
            "user_set_lists": [{"name": "staff", "type": "ACL"}]
        }"#;
        let config: ClusterConfig = serde_json::from_str(json).expect("valid snapshot");
        assert_eq!(config.complex_entries[0].value_type, "MEMORY");
        assert_eq!(config.user_set_lists[0].list_type, "ACL");

        let rendered = serde_json::to_value(&config).expect("serializable");
        assert_eq!(rendered["complex_entries"][0]["type"], "MEMORY");
    }

    #[test]
    fn test_empty_snapshot() {
        let mut config = ClusterConfig::default();
        assert!(config.is_empty());

        config.cluster_environment = Some(ClusterEnvironment::default());
        assert!(config.is_empty());

        config.global_config = Some(GlobalConfig::default());
        assert!(!config.is_empty());
    }
}
