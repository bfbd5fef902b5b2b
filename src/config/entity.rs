//! Entity kinds and the ordered entity table.
//!
//! Every collection of a [`ClusterConfig`] is described once here: its kind,
//! its collection name, its key field and its position in the creation
//! order. The comparator and the apply phases iterate this table instead of
//! repeating per-collection wiring.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::spec::{
    CalendarConfig, CkptInterfaceConfig, ClusterConfig, ClusterQueueConfig, ComplexEntryConfig,
    HostConfiguration, HostExecConfig, HostGroupConfig, ParallelEnvironmentConfig, ProjectConfig,
    ResourceQuotaSetConfig, UserConfig, UserSetListConfig,
};
use crate::planner::Keyed;

/// Kind of a cluster entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// User set list.
    UserSetList,
    /// Project.
    Project,
    /// User.
    User,
    /// Manager name.
    Manager,
    /// Operator name.
    Operator,
    /// Host-local configuration.
    HostConfiguration,
    /// Host group.
    HostGroup,
    /// Execution host.
    ExecHost,
    /// Complex entry.
    ComplexEntry,
    /// Calendar.
    Calendar,
    /// Checkpointing interface.
    CkptInterface,
    /// Administrative host name.
    AdminHost,
    /// Resource quota set.
    ResourceQuotaSet,
    /// Parallel environment.
    ParallelEnvironment,
    /// Cluster queue.
    ClusterQueue,
    /// Submit host name.
    SubmitHost,
}

impl EntityKind {
    /// Order in which entity kinds are created.
    ///
    /// Later kinds reference earlier ones by name. Deletion walks this order
    /// in reverse.
    pub const CREATION_ORDER: [Self; 16] = [
        Self::UserSetList,
        Self::Project,
        Self::User,
        Self::Manager,
        Self::Operator,
        Self::HostConfiguration,
        Self::HostGroup,
        Self::ExecHost,
        Self::ComplexEntry,
        Self::Calendar,
        Self::CkptInterface,
        Self::AdminHost,
        Self::ResourceQuotaSet,
        Self::ParallelEnvironment,
        Self::ClusterQueue,
        Self::SubmitHost,
    ];

    /// Returns the kinds in deletion order.
    pub fn deletion_order() -> impl Iterator<Item = Self> {
        Self::CREATION_ORDER.into_iter().rev()
    }

    /// Returns the snapshot field holding this kind.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::UserSetList => "user_set_lists",
            Self::Project => "projects",
            Self::User => "users",
            Self::Manager => "managers",
            Self::Operator => "operators",
            Self::HostConfiguration => "host_configurations",
            Self::HostGroup => "host_groups",
            Self::ExecHost => "exec_hosts",
            Self::ComplexEntry => "complex_entries",
            Self::Calendar => "calendars",
            Self::CkptInterface => "ckpt_interfaces",
            Self::AdminHost => "admin_hosts",
            Self::ResourceQuotaSet => "resource_quota_sets",
            Self::ParallelEnvironment => "parallel_environments",
            Self::ClusterQueue => "cluster_queues",
            Self::SubmitHost => "submit_hosts",
        }
    }

    /// Returns a human readable name of this kind.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::UserSetList => "user set list",
            Self::Project => "project",
            Self::User => "user",
            Self::Manager => "manager",
            Self::Operator => "operator",
            Self::HostConfiguration => "host configuration",
            Self::HostGroup => "host group",
            Self::ExecHost => "exec host",
            Self::ComplexEntry => "complex entry",
            Self::Calendar => "calendar",
            Self::CkptInterface => "checkpoint interface",
            Self::AdminHost => "admin host",
            Self::ResourceQuotaSet => "resource quota set",
            Self::ParallelEnvironment => "parallel environment",
            Self::ClusterQueue => "cluster queue",
            Self::SubmitHost => "submit host",
        }
    }

    /// Returns the field identifying a record of this kind.
    ///
    /// `None` for flat name lists, where the value is its own key.
    #[must_use]
    pub const fn key_field(self) -> Option<&'static str> {
        match self {
            Self::Manager | Self::Operator | Self::AdminHost | Self::SubmitHost => None,
            Self::Calendar => Some("calendar_name"),
            Self::CkptInterface => Some("ckpt_name"),
            Self::ExecHost => Some("hostname"),
            Self::HostGroup => Some("group_name"),
            Self::ParallelEnvironment => Some("pe_name"),
            Self::ClusterQueue => Some("qname"),
            Self::UserSetList
            | Self::Project
            | Self::User
            | Self::HostConfiguration
            | Self::ComplexEntry
            | Self::ResourceQuotaSet => Some("name"),
        }
    }

    /// Returns true for flat name lists.
    #[must_use]
    pub const fn is_flat(self) -> bool {
        self.key_field().is_none()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

macro_rules! keyed_by {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(
            impl Keyed for $ty {
                fn key(&self) -> &str {
                    &self.$field
                }

                fn key_field(&self) -> Option<&'static str> {
                    Some(stringify!($field))
                }
            }
        )*
    };
}

keyed_by! {
    CalendarConfig => calendar_name,
    ComplexEntryConfig => name,
    CkptInterfaceConfig => ckpt_name,
    HostConfiguration => name,
    HostExecConfig => hostname,
    HostGroupConfig => group_name,
    ResourceQuotaSetConfig => name,
    ParallelEnvironmentConfig => pe_name,
    ProjectConfig => name,
    UserConfig => name,
    ClusterQueueConfig => qname,
    UserSetListConfig => name,
}

/// Generates [`EntityRecord`] and the table-driven snapshot accessors.
macro_rules! entity_table {
    ($($kind:ident($ty:ty) => $field:ident),* $(,)?) => {
        /// One record of any entity kind.
        #[derive(Debug, Clone, PartialEq)]
        #[allow(missing_docs)]
        pub enum EntityRecord {
            $($kind($ty),)*
        }

        impl EntityRecord {
            /// Returns the kind of this record.
            #[must_use]
            pub const fn kind(&self) -> EntityKind {
                match self {
                    $(Self::$kind(_) => EntityKind::$kind,)*
                }
            }
        }

        impl Keyed for EntityRecord {
            fn key(&self) -> &str {
                match self {
                    $(Self::$kind(record) => Keyed::key(record),)*
                }
            }

            fn key_field(&self) -> Option<&'static str> {
                self.kind().key_field()
            }
        }

        impl ClusterConfig {
            /// Returns copies of every record of one kind, in snapshot order.
            #[must_use]
            pub fn records(&self, kind: EntityKind) -> Vec<EntityRecord> {
                match kind {
                    $(EntityKind::$kind => {
                        self.$field.iter().cloned().map(EntityRecord::$kind).collect()
                    })*
                }
            }

            /// Returns the keys of every record of one kind, in snapshot order.
            #[must_use]
            pub fn keys(&self, kind: EntityKind) -> Vec<String> {
                match kind {
                    $(EntityKind::$kind => {
                        self.$field.iter().map(|r| Keyed::key(r).to_string()).collect()
                    })*
                }
            }

            /// Returns the number of records of one kind.
            #[must_use]
            pub fn count(&self, kind: EntityKind) -> usize {
                match kind {
                    $(EntityKind::$kind => self.$field.len(),)*
                }
            }

            /// Appends a record to the collection of its kind.
            pub fn push(&mut self, record: EntityRecord) {
                match record {
                    $(EntityRecord::$kind(r) => self.$field.push(r),)*
                }
            }

            /// Returns a copy of the record with the given key.
            #[must_use]
            pub fn get(&self, kind: EntityKind, key: &str) -> Option<EntityRecord> {
                match kind {
                    $(EntityKind::$kind => self
                        .$field
                        .iter()
                        .find(|r| Keyed::key(*r) == key)
                        .cloned()
                        .map(EntityRecord::$kind),)*
                }
            }

            /// Replaces the record sharing the key of `record`.
            ///
            /// Returns false if no such record exists.
            pub fn replace(&mut self, record: EntityRecord) -> bool {
                match record {
                    $(EntityRecord::$kind(new) => {
                        let key = Keyed::key(&new).to_string();
                        match self.$field.iter_mut().find(|r| Keyed::key(&**r) == key) {
                            Some(slot) => {
                                *slot = new;
                                true
                            }
                            None => false,
                        }
                    })*
                }
            }

            /// Removes and returns the record with the given key.
            pub fn remove(&mut self, kind: EntityKind, key: &str) -> Option<EntityRecord> {
                match kind {
                    $(EntityKind::$kind => {
                        let index = self.$field.iter().position(|r| Keyed::key(r) == key)?;
                        Some(EntityRecord::$kind(self.$field.remove(index)))
                    })*
                }
            }
        }
    };
}

entity_table! {
    UserSetList(UserSetListConfig) => user_set_lists,
    Project(ProjectConfig) => projects,
    User(UserConfig) => users,
    Manager(String) => managers,
    Operator(String) => operators,
    HostConfiguration(HostConfiguration) => host_configurations,
    HostGroup(HostGroupConfig) => host_groups,
    ExecHost(HostExecConfig) => exec_hosts,
    ComplexEntry(ComplexEntryConfig) => complex_entries,
    Calendar(CalendarConfig) => calendars,
    CkptInterface(CkptInterfaceConfig) => ckpt_interfaces,
    AdminHost(String) => admin_hosts,
    ResourceQuotaSet(ResourceQuotaSetConfig) => resource_quota_sets,
    ParallelEnvironment(ParallelEnvironmentConfig) => parallel_environments,
    ClusterQueue(ClusterQueueConfig) => cluster_queues,
    SubmitHost(String) => submit_hosts,
}

impl EntityRecord {
    /// Returns the key of this record.
    #[must_use]
    pub fn name(&self) -> &str {
        Keyed::key(self)
    }
}

impl ClusterConfig {
    /// Returns the total number of entities across every collection.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        EntityKind::CREATION_ORDER
            .iter()
            .map(|kind| self.count(*kind))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_is_ordered_once() {
        let mut kinds = EntityKind::CREATION_ORDER.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), EntityKind::CREATION_ORDER.len());
    }

    #[test]
    fn test_deletion_order_is_reverse() {
        let deletion: Vec<_> = EntityKind::deletion_order().collect();
        assert_eq!(deletion.first(), Some(&EntityKind::SubmitHost));
        assert_eq!(deletion.last(), Some(&EntityKind::UserSetList));

        let queues = deletion.iter().position(|k| *k == EntityKind::ClusterQueue);
        let complexes = deletion.iter().position(|k| *k == EntityKind::ComplexEntry);
        assert!(queues < complexes);
    }

    #[test]
    fn test_flat_kinds() {
        assert!(EntityKind::Manager.is_flat());
        assert!(EntityKind::AdminHost.is_flat());
        assert!(!EntityKind::ClusterQueue.is_flat());
        assert_eq!(EntityKind::ClusterQueue.key_field(), Some("qname"));
    }

    #[test]
    fn test_record_accessors() {
        let mut config = ClusterConfig::default();
        config.push(EntityRecord::ClusterQueue(ClusterQueueConfig::named("all.q")));
        config.push(EntityRecord::Manager(String::from("root")));

        assert_eq!(config.count(EntityKind::ClusterQueue), 1);
        assert_eq!(config.keys(EntityKind::Manager), vec!["root"]);
        assert_eq!(config.entity_count(), 2);

        let queue = config
            .get(EntityKind::ClusterQueue, "all.q")
            .expect("queue present");
        assert_eq!(queue.kind(), EntityKind::ClusterQueue);
        assert_eq!(queue.name(), "all.q");
        assert_eq!(queue.key_field(), Some("qname"));

        let mut updated = ClusterQueueConfig::named("all.q");
        updated.slots = vec![String::from("8")];
        assert!(config.replace(EntityRecord::ClusterQueue(updated)));
        assert_eq!(config.cluster_queues[0].slots, vec!["8"]);
        assert!(!config.replace(EntityRecord::ClusterQueue(ClusterQueueConfig::named("b.q"))));

        assert!(config.remove(EntityKind::Manager, "root").is_some());
        assert!(config.remove(EntityKind::Manager, "root").is_none());
        assert_eq!(config.entity_count(), 1);
    }
}
