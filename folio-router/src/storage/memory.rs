//! An embedded, thread-safe document store holding collections in memory.

use std::cmp::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json_bytes::Value;

use super::Document;
use super::DocumentStore;
use super::Filter;
use super::FindOptions;
use super::StorageError;

/// In-memory [`DocumentStore`] implementation.
///
/// Collections are snapshotted out of the map before any filtering or
/// shaping, so no entry lock is ever held across an await point.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        filter: Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StorageError> {
        let snapshot = self
            .collections
            .get(collection)
            .map(|documents| documents.value().clone())
            .unwrap_or_default();
        let mut matching: Vec<Document> = snapshot
            .into_iter()
            .filter(|document| filter.matches(document))
            .collect();
        if let Some(key) = options.sort.as_deref() {
            matching.sort_by(|a, b| compare_field(a.get(key), b.get(key)));
        }
        if let Some(limit) = options.limit {
            // negative limits clamp to zero
            matching.truncate(usize::try_from(limit).unwrap_or(0));
        }
        if !options.projection.is_select_all() {
            matching = matching
                .into_iter()
                .map(|document| {
                    document
                        .into_iter()
                        .filter(|(key, _)| options.projection.contains(key.as_str()))
                        .collect()
                })
                .collect();
        }
        Ok(matching)
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<(), StorageError> {
        self.collections
            .entry(collection.to_owned())
            .or_default()
            .extend(documents);
        Ok(())
    }

    async fn delete_many(&self, collection: &str, filter: Filter) -> Result<u64, StorageError> {
        let Some(mut documents) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = documents.len();
        documents.retain(|document| !filter.matches(document));
        Ok((before - documents.len()) as u64)
    }
}

/// Ascending order, documents missing the sort field first.
fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.as_str().cmp(b.as_str()),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .map(|(a, b)| a.partial_cmp(&b).unwrap_or(Ordering::Equal))
            .unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;
    use crate::spec::Projection;

    fn documents(value: Value) -> Vec<Document> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item.as_object().cloned().unwrap())
            .collect()
    }

    async fn store_with_contacts() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_many(
                "contacts",
                documents(json!([
                    { "firstName": "Ada", "lastName": "Lovelace" },
                    { "firstName": "Grace", "lastName": "Hopper" },
                    { "firstName": "Edsger", "lastName": "Dijkstra" },
                ])),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_insert_then_find_roundtrip() {
        let store = store_with_contacts().await;
        let found = store
            .find("contacts", Filter::new(), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_collection_is_empty_not_an_error() {
        let store = MemoryStore::new();
        let found = store
            .find("nowhere", Filter::new(), FindOptions::default())
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_empty_projection_returns_whole_documents() {
        let store = store_with_contacts().await;
        let found = store
            .find(
                "contacts",
                Filter::new(),
                FindOptions::default().with_projection(Projection::select_all()),
            )
            .await
            .unwrap();
        assert!(found[0].contains_key("firstName"));
        assert!(found[0].contains_key("lastName"));
    }

    #[tokio::test]
    async fn test_projection_trims_fields() {
        let store = store_with_contacts().await;
        let schema = crate::spec::Schema::service().unwrap();
        let query =
            crate::spec::Query::parse("{ books { title } }", None, &schema).unwrap();
        let operation = query.operation().unwrap();
        let root = operation.selection_set.selections[0].as_field().unwrap();
        let projection = Projection::of_level(query.document(), &root.selection_set);
        // "title" is not a contact field, so every projected document is empty
        let found = store
            .find(
                "contacts",
                Filter::new(),
                FindOptions::default().with_projection(projection),
            )
            .await
            .unwrap();
        assert!(found.iter().all(|document| document.is_empty()));
    }

    #[tokio::test]
    async fn test_sort_ascending_by_field() {
        let store = store_with_contacts().await;
        let found = store
            .find(
                "contacts",
                Filter::new(),
                FindOptions::default().with_sort(Some("lastName".to_string())),
            )
            .await
            .unwrap();
        let last_names: Vec<_> = found
            .iter()
            .map(|document| document.get("lastName").unwrap().as_str().unwrap().to_owned())
            .collect();
        assert_eq!(last_names, vec!["Dijkstra", "Hopper", "Lovelace"]);
    }

    #[tokio::test]
    async fn test_limit_zero_returns_no_documents() {
        let store = store_with_contacts().await;
        let found = store
            .find(
                "contacts",
                Filter::new(),
                FindOptions::default().with_limit(Some(0)),
            )
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_limit_truncates_after_sorting() {
        let store = store_with_contacts().await;
        let found = store
            .find(
                "contacts",
                Filter::new(),
                FindOptions::default()
                    .with_sort(Some("lastName".to_string()))
                    .with_limit(Some(2)),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(
            found[0].get("lastName").unwrap().as_str().unwrap(),
            "Dijkstra"
        );
    }

    #[tokio::test]
    async fn test_delete_many_reports_the_removed_count() {
        let store = store_with_contacts().await;
        let removed = store
            .delete_many(
                "contacts",
                Filter::new().equals("lastName", json!("Hopper")),
            )
            .await
            .unwrap();
        assert_eq!(removed, 1);
        let remaining = store
            .find("contacts", Filter::new(), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(remaining.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_many_on_missing_collection_is_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.delete_many("nowhere", Filter::new()).await.unwrap(), 0);
    }
}
