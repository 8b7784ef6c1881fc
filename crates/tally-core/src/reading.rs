//! Time-stamped sensor readings as returned by a reading source.

use alloc::collections::BTreeMap;
use alloc::string::String;

/// Numeric fields of one sensor group, keyed by field name.
pub type GroupFields = BTreeMap<String, f64>;

/// One device reading.
///
/// A reading carries its capture time (seconds since the Unix epoch) and the
/// numeric fields reported by each sensor group, e.g. `shtDetails.temp`.
/// Readings are produced by a [`ReadingSource`](crate::source::ReadingSource)
/// and never mutated afterwards; the builder methods consume `self`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reading {
    timestamp: i64,
    groups: BTreeMap<String, GroupFields>,
}

impl Reading {
    /// Creates a reading with no sensor groups.
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            groups: BTreeMap::new(),
        }
    }

    /// Creates a reading from already grouped fields.
    pub fn from_groups(timestamp: i64, groups: BTreeMap<String, GroupFields>) -> Self {
        Self { timestamp, groups }
    }

    /// Adds a single `group.field = value` entry.
    pub fn with_value(mut self, group: &str, field: &str, value: f64) -> Self {
        self.groups
            .entry(String::from(group))
            .or_default()
            .insert(String::from(field), value);
        self
    }

    /// Capture time in seconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Looks up `group.field`, if the reading carries it.
    pub fn value(&self, group: &str, field: &str) -> Option<f64> {
        self.groups.get(group)?.get(field).copied()
    }

    /// Fields of a single group.
    pub fn group(&self, group: &str) -> Option<&GroupFields> {
        self.groups.get(group)
    }

    /// Number of sensor groups present.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
