//! Keyed collection differ.
//!
//! This module classifies the records of two versions of one collection as
//! added, modified or removed, matching records by key.

use std::collections::HashMap;
use tracing::trace;

use crate::error::DiffError;

/// A record identified by a string key within its collection.
pub trait Keyed {
    /// Returns the key of this record.
    fn key(&self) -> &str;

    /// Returns the name of the field holding the key.
    ///
    /// `None` when the whole value is the key.
    fn key_field(&self) -> Option<&'static str>;
}

impl Keyed for String {
    fn key(&self) -> &str {
        self
    }

    fn key_field(&self) -> Option<&'static str> {
        None
    }
}

/// Differences between two versions of one collection.
///
/// The three sequences are disjoint by key.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffResult<T> {
    /// Records present only in the new version.
    pub added: Vec<T>,
    /// New versions of records whose value changed.
    pub modified: Vec<T>,
    /// Records present only in the old version.
    pub removed: Vec<T>,
}

impl<T> Default for DiffResult<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            modified: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<T> DiffResult<T> {
    /// Returns true if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    /// Returns the number of changed records.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }
}

/// Computes the differences between `old` and `new`.
///
/// Records are matched by [`Keyed::key`]. A matched record is modified when
/// the two versions are not equal, and the new version is reported. Input
/// order does not affect which records land in which sequence.
///
/// # Errors
///
/// Returns an error if a record has an empty key or if a key appears twice
/// in the same input.
pub fn find_differences<T>(old: &[T], new: &[T]) -> Result<DiffResult<T>, DiffError>
where
    T: Keyed + PartialEq + Clone,
{
    let mut remaining_old = index_by_key(old)?;
    index_by_key(new)?;
    let mut result = DiffResult::default();

    for record in new {
        let key = record.key();
        match remaining_old.remove(key) {
            Some(previous) if previous != record => {
                trace!(key, "record modified");
                result.modified.push(record.clone());
            }
            Some(_) => {}
            None => {
                trace!(key, "record added");
                result.added.push(record.clone());
            }
        }
    }

    // Walk the old input so removals keep a stable order.
    for record in old {
        if remaining_old.contains_key(record.key()) {
            trace!(key = record.key(), "record removed");
            result.removed.push(record.clone());
        }
    }

    Ok(result)
}

fn index_by_key<T: Keyed>(items: &[T]) -> Result<HashMap<&str, &T>, DiffError> {
    let mut index = HashMap::with_capacity(items.len());

    for item in items {
        let key = item.key();
        if key.is_empty() {
            return Err(DiffError::EmptyKey {
                field: item.key_field(),
            });
        }
        if index.insert(key, item).is_some() {
            return Err(DiffError::DuplicateKey {
                key: key.to_string(),
            });
        }
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: String,
        value: u32,
    }

    impl Item {
        fn new(name: &str, value: u32) -> Self {
            Self {
                name: name.to_string(),
                value,
            }
        }
    }

    impl Keyed for Item {
        fn key(&self) -> &str {
            &self.name
        }

        fn key_field(&self) -> Option<&'static str> {
            Some("name")
        }
    }

    fn keys<T: Keyed>(items: &[T]) -> BTreeSet<String> {
        items.iter().map(|i| i.key().to_string()).collect()
    }

    #[test]
    fn test_identical_inputs_have_no_differences() {
        let items = vec![Item::new("a", 1), Item::new("b", 2)];
        let result = find_differences(&items, &items).expect("valid keys");
        assert!(result.is_empty());
    }

    #[test]
    fn test_classifies_added_modified_removed() {
        let old = vec![Item::new("x", 1), Item::new("gone", 0), Item::new("same", 5)];
        let new = vec![Item::new("x", 2), Item::new("fresh", 3), Item::new("same", 5)];

        let result = find_differences(&old, &new).expect("valid keys");

        assert_eq!(result.modified, vec![Item::new("x", 2)]);
        assert_eq!(result.added, vec![Item::new("fresh", 3)]);
        assert_eq!(result.removed, vec![Item::new("gone", 0)]);
        assert_eq!(result.change_count(), 3);
    }

    #[test]
    fn test_order_independent() {
        let old = vec![Item::new("a", 1), Item::new("b", 2), Item::new("c", 3)];
        let new = vec![Item::new("d", 4), Item::new("b", 20), Item::new("a", 1)];

        let forward = find_differences(&old, &new).expect("valid keys");

        let mut old_rev = old.clone();
        old_rev.reverse();
        let mut new_rev = new.clone();
        new_rev.rotate_left(1);
        let permuted = find_differences(&old_rev, &new_rev).expect("valid keys");

        assert_eq!(keys(&forward.added), keys(&permuted.added));
        assert_eq!(keys(&forward.modified), keys(&permuted.modified));
        assert_eq!(keys(&forward.removed), keys(&permuted.removed));
        assert_eq!(keys(&forward.removed), BTreeSet::from([String::from("c")]));
    }

    #[test]
    fn test_flat_values_use_set_difference() {
        let old = vec![String::from("root"), String::from("admin")];
        let new = vec![String::from("admin"), String::from("ops")];

        let result = find_differences(&old, &new).expect("valid keys");

        assert_eq!(result.added, vec![String::from("ops")]);
        assert_eq!(result.removed, vec![String::from("root")]);
        assert!(result.modified.is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        let items = vec![Item::new("a", 1)];
        let empty: Vec<Item> = Vec::new();

        let created = find_differences(&empty, &items).expect("valid keys");
        assert_eq!(created.added, items);
        assert!(created.removed.is_empty());

        let dropped = find_differences(&items, &empty).expect("valid keys");
        assert_eq!(dropped.removed, items);
        assert!(dropped.added.is_empty());
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let new = vec![Item::new("", 1)];
        let err = find_differences(&[], &new).expect_err("empty key");
        assert_eq!(err, DiffError::EmptyKey { field: Some("name") });
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let old = vec![Item::new("a", 1), Item::new("a", 2)];
        let err = find_differences(&old, &[]).expect_err("duplicate key");
        assert_eq!(
            err,
            DiffError::DuplicateKey {
                key: String::from("a")
            }
        );
    }
}
