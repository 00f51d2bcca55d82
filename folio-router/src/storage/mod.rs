//! The document store collaborator.
//!
//! The core never talks to a concrete database: it issues `find` /
//! `insert_many` / `delete_many` calls against the [`DocumentStore`] trait,
//! keyed by field mappings. Individual calls are independent and may be
//! issued concurrently without coordination.

mod memory;
pub mod seed;

use async_trait::async_trait;
use displaydoc::Display;
pub use memory::MemoryStore;
use serde_json_bytes::Value;
use thiserror::Error;

use crate::json_ext::Object;
use crate::spec::Projection;

/// Collection holding the primary book entities.
pub const BOOKS: &str = "books";
/// Collection holding contact records attached to primary entities.
pub const CONTACTS: &str = "contacts";
/// Collection holding user entities.
pub const USERS: &str = "users";
/// Collection holding identity-scoped secrets.
pub const SECRETS: &str = "secrets";
/// Collection holding the depth-guarded post documents.
pub const POSTS: &str = "posts";

/// A stored record.
pub type Document = Object;

/// Storage failures.
///
/// An empty result is not a failure: a `find` that matches nothing returns an
/// empty sequence.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageError {
    /// storage backend failed: {0}
    Backend(String),
}

/// A single filter condition on one field.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// The field must equal the given value.
    Equals(Value),
    /// The field must be a string starting with the given prefix.
    StartsWith(String),
}

/// A conjunction of filter conditions, keyed by field name.
///
/// Constructed fresh per request and consumed by a single storage call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Condition)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`.
    pub fn equals(mut self, field: impl Into<String>, value: Value) -> Self {
        self.conditions.push((field.into(), Condition::Equals(value)));
        self
    }

    /// Require `field` to be a string starting with `prefix`.
    pub fn starts_with(mut self, field: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.conditions
            .push((field.into(), Condition::StartsWith(prefix.into())));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether `document` satisfies every condition.
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| match condition {
                Condition::Equals(value) => document.get(field.as_str()) == Some(value),
                Condition::StartsWith(prefix) => document
                    .get(field.as_str())
                    .and_then(Value::as_str)
                    .is_some_and(|text| text.starts_with(prefix.as_str())),
            })
    }
}

/// Per-call options for [`DocumentStore::find`].
#[derive(Clone, Debug, Default)]
pub struct FindOptions {
    /// Which fields of each matching document to return. An empty projection
    /// selects all fields — the store's convention for an absent selection.
    pub projection: Projection,

    /// Maximum number of documents to return; `Some(0)` returns none.
    pub limit: Option<i64>,

    /// Field to sort matching documents by, ascending.
    pub sort: Option<String>,
}

impl FindOptions {
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_limit(mut self, limit: Option<i64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_sort(mut self, sort: Option<String>) -> Self {
        self.sort = sort;
        self
    }
}

/// An asynchronous document store.
///
/// All methods may fail with a [`StorageError`]; callers treat any failure as
/// the loss of the whole operation, never as a partial result.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Return the documents of `collection` matching `filter`, shaped and
    /// bounded by `options`.
    async fn find(
        &self,
        collection: &str,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StorageError>;

    /// Append documents to `collection`.
    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<(), StorageError>;

    /// Delete the documents of `collection` matching `filter`, returning how
    /// many were removed.
    async fn delete_many(&self, collection: &str, filter: Filter) -> Result<u64, StorageError>;
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;

    fn document(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_filter_equals() {
        let filter = Filter::new().equals("clientId", json!("1030"));
        assert!(filter.matches(&document(json!({ "clientId": "1030", "message": "x" }))));
        assert!(!filter.matches(&document(json!({ "clientId": "2044" }))));
        assert!(!filter.matches(&document(json!({ "message": "x" }))));
    }

    #[test]
    fn test_filter_starts_with() {
        let filter = Filter::new().starts_with("message", "Lorem");
        assert!(filter.matches(&document(json!({ "message": "Lorem ipsum" }))));
        assert!(!filter.matches(&document(json!({ "message": "Vestibulum" }))));
        assert!(!filter.matches(&document(json!({ "message": 7 }))));
    }

    #[test]
    fn test_conditions_are_conjunctive() {
        let filter = Filter::new()
            .equals("clientId", json!("1030"))
            .starts_with("message", "Lorem");
        assert!(filter.matches(&document(
            json!({ "clientId": "1030", "message": "Lorem ipsum" })
        )));
        assert!(!filter.matches(&document(
            json!({ "clientId": "2044", "message": "Lorem ipsum" })
        )));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::new().matches(&document(json!({ "anything": 1 }))));
        assert!(Filter::new().is_empty());
    }
}
