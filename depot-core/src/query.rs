//! Filter construction for backend queries.
//!
//! Backends only need equality matching over record fields: every lookup
//! the store performs is a conjunction of `field == value` conditions.
//! Missing fields compare as JSON null, so a condition on a nullable
//! column (e.g. `remote_user`) matches records where it is absent.
//!
//! # Example
//!
//! ```ignore
//! use depot_core::query::Filter;
//!
//! let filter = Filter::new()
//!     .eq("collection_reference", "/items")
//!     .eq("deleted", false);
//! ```

use serde_json::Value;

use crate::row::Record;

/// A conjunction of field-equality conditions applied to records in a
/// single table.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Creates an empty filter that matches every record.
    pub fn new() -> Self {
        Filter { conditions: Vec::new() }
    }

    /// Adds an equality condition to this filter.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// Adds an equality condition only when `value` is `Some`.
    ///
    /// Used for optional scoping parameters such as `remote_user`: an
    /// absent option must widen the match rather than pin the field to
    /// null.
    pub fn maybe_eq(self, field: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.eq(field, value),
            None => self,
        }
    }

    /// Returns the conditions held by this filter.
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Returns true if the record satisfies every condition.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|(field, value)| {
            record.get(field).unwrap_or(&Value::Null) == value
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn matches_on_every_condition() {
        let rec = record(json!({"uri": "/items/1", "deleted": false}));
        assert!(Filter::new().eq("uri", "/items/1").eq("deleted", false).matches(&rec));
        assert!(!Filter::new().eq("uri", "/items/1").eq("deleted", true).matches(&rec));
    }

    #[test]
    fn missing_fields_compare_as_null() {
        let rec = record(json!({"uri": "/items/1"}));
        assert!(Filter::new().eq("remote_user", Value::Null).matches(&rec));
        assert!(!Filter::new().eq("remote_user", "coltrane").matches(&rec));
    }

    #[test]
    fn maybe_eq_skips_absent_options() {
        let rec = record(json!({"uri": "/items/1", "remote_user": "coltrane"}));
        let unscoped = Filter::new().maybe_eq("remote_user", None::<String>);
        assert!(unscoped.matches(&rec));
        let scoped = Filter::new().maybe_eq("remote_user", Some("monk"));
        assert!(!scoped.matches(&rec));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&record(json!({"anything": 1}))));
    }
}
