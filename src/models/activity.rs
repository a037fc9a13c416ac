// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity records and the local dataset that owns them.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Per-activity segment breakdown; transient, never persisted.
pub const SEGMENT_EFFORTS: &str = "segment_efforts";

/// One Strava activity with its raw, flattened attributes.
///
/// Nested JSON objects are flattened into dotted keys (`map.id`,
/// `athlete.id`) so that every attribute maps onto one table column.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    /// Strava activity ID
    pub id: u64,
    /// All other attributes, keyed by (dotted) column name
    pub attributes: BTreeMap<String, Value>,
}

impl Activity {
    /// Build an activity from a detail/list payload returned by Strava.
    pub fn from_json(value: Value) -> Result<Self, ActivityError> {
        let Value::Object(object) = value else {
            return Err(ActivityError::NotAnObject);
        };

        let mut attributes = BTreeMap::new();
        flatten_into(&mut attributes, None, object);

        let id = attributes
            .remove("id")
            .and_then(|v| v.as_u64())
            .ok_or(ActivityError::MissingId)?;

        Ok(Self { id, attributes })
    }

    /// Drop attributes that must not be stored in the dataset.
    pub fn strip_transient(&mut self) {
        self.attributes.retain(|key, _| {
            key != SEGMENT_EFFORTS && !key.starts_with(&format!("{}.", SEGMENT_EFFORTS))
        });
    }

    /// Look up a string attribute.
    pub fn str_attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Look up a numeric attribute as `f64`.
    pub fn f64_attr(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(Value::as_f64)
    }
}

/// Flatten nested objects into `prefix.key` entries; arrays stay whole.
fn flatten_into(out: &mut BTreeMap<String, Value>, prefix: Option<&str>, object: Map<String, Value>) {
    for (key, value) in object {
        let column = match prefix {
            Some(p) => format!("{}.{}", p, key),
            None => key,
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, Some(&column), inner),
            other => {
                out.insert(column, other);
            }
        }
    }
}

/// Errors building an [`Activity`] from a payload.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ActivityError {
    #[error("activity payload is not a JSON object")]
    NotAnObject,
    #[error("activity payload has no integer id")]
    MissingId,
}

/// The local dataset: activities keyed by id, iterated newest id first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityLog {
    records: BTreeMap<u64, Activity>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.records.contains_key(&id)
    }

    pub fn get(&self, id: u64) -> Option<&Activity> {
        self.records.get(&id)
    }

    /// Activities in dataset order (id descending).
    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.records.values().rev()
    }

    /// Ids in dataset order (id descending).
    pub fn ids(&self) -> Vec<u64> {
        self.records.keys().rev().copied().collect()
    }

    /// Insert an activity. Returns `false` if the id was already present,
    /// in which case the stored record is kept.
    pub fn insert(&mut self, activity: Activity) -> bool {
        if self.records.contains_key(&activity.id) {
            return false;
        }
        self.records.insert(activity.id, activity);
        true
    }

    /// Merge freshly fetched records, stripping transient fields.
    ///
    /// Returns the number of records actually added.
    pub fn merge(&mut self, fetched: impl IntoIterator<Item = Activity>) -> usize {
        fetched
            .into_iter()
            .map(|mut activity| {
                activity.strip_transient();
                self.insert(activity)
            })
            .filter(|added| *added)
            .count()
    }

    /// Ids present remotely but not locally, in inventory order.
    pub fn pending_ids(&self, inventory: &[u64]) -> Vec<u64> {
        let mut seen = HashSet::new();
        inventory
            .iter()
            .copied()
            .filter(|id| !self.contains(*id) && seen.insert(*id))
            .collect()
    }

    /// Ids present locally but missing from the remote inventory.
    pub fn orphan_ids(&self, inventory: &[u64]) -> Vec<u64> {
        let remote: HashSet<u64> = inventory.iter().copied().collect();
        self.ids()
            .into_iter()
            .filter(|id| !remote.contains(id))
            .collect()
    }

    /// Union of attribute keys across all records, sorted.
    pub fn attribute_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .records
            .values()
            .flat_map(|a| a.attributes.keys().cloned())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        columns.retain(|c| c != "id");
        columns
    }
}

impl FromIterator<Activity> for ActivityLog {
    fn from_iter<I: IntoIterator<Item = Activity>>(iter: I) -> Self {
        let mut log = ActivityLog::new();
        for activity in iter {
            log.insert(activity);
        }
        log
    }
}
