//! One-time clear-and-seed of the demo collections, run at startup.

use serde_json_bytes::json;

use super::BOOKS;
use super::CONTACTS;
use super::Document;
use super::DocumentStore;
use super::Filter;
use super::POSTS;
use super::SECRETS;
use super::StorageError;
use super::USERS;

/// Delete whatever the collections currently hold, then insert the fixtures.
pub async fn reset_and_seed(store: &dyn DocumentStore) -> Result<(), StorageError> {
    for collection in [BOOKS, CONTACTS, USERS, SECRETS, POSTS] {
        store.delete_many(collection, Filter::new()).await?;
    }
    store.insert_many(BOOKS, books()).await?;
    store.insert_many(CONTACTS, contacts()).await?;
    store.insert_many(USERS, users()).await?;
    store.insert_many(SECRETS, secrets()).await?;
    store.insert_many(POSTS, posts()).await?;
    tracing::info!("collections cleared and seeded");
    Ok(())
}

fn documents(value: serde_json_bytes::Value) -> Vec<Document> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|item| item.as_object().cloned())
        .collect()
}

fn books() -> Vec<Document> {
    documents(json!([
        {
            "title": "Harry Potter and the Chamber of Secrets",
            "author": "J.K. Rowling",
            "publishDate": "1998-07-02"
        },
        {
            "title": "Jurassic Park",
            "author": "Michael Crichton",
            "publishDate": "1990-11-20"
        }
    ]))
}

fn contacts() -> Vec<Document> {
    documents(json!([
        {
            "firstName": "Ada",
            "lastName": "Lovelace",
            "address": {
                "street": "12 St James's Square",
                "city": "London",
                "country": "United Kingdom",
                "zip": "SW1Y 4JH"
            }
        },
        {
            "firstName": "Grace",
            "lastName": "Hopper",
            "address": {
                "street": "3801 Nebraska Ave NW",
                "city": "Washington",
                "country": "United States",
                "zip": "20016"
            }
        },
        {
            "firstName": "Edsger",
            "lastName": "Dijkstra",
            "address": {
                "street": "Plataanstraat 5",
                "city": "Nuenen",
                "country": "Netherlands",
                "zip": "5671 AL"
            }
        },
        {
            "firstName": "Barbara",
            "lastName": "Liskov",
            "address": {
                "street": "32 Vassar St",
                "city": "Cambridge",
                "country": "United States",
                "zip": "02139"
            }
        }
    ]))
}

fn users() -> Vec<Document> {
    documents(json!([
        { "firstName": "Noah", "lastName": "Fletcher" },
        { "firstName": "Mira", "lastName": "Okafor" },
        { "firstName": "Theo", "lastName": "Brandt" }
    ]))
}

fn secrets() -> Vec<Document> {
    documents(json!([
        { "clientId": "1030", "message": "Lorem ipsum dolor sit amet" },
        { "clientId": "1030", "message": "Aliquam erat volutpat" },
        { "clientId": "2044", "message": "Lorem tincidunt sapien quis" },
        { "clientId": "2044", "message": "Curabitur vel metus accumsan" }
    ]))
}

fn posts() -> Vec<Document> {
    documents(json!([
        {
            "title": "On query depth",
            "body": "Nested selections are powerful and dangerous.",
            "author": { "name": "Noah Fletcher" },
            "comments": [
                {
                    "text": "Agreed, guard your resolvers.",
                    "author": { "name": "Mira Okafor" }
                },
                {
                    "text": "What about recursive fragments?",
                    "author": { "name": "Theo Brandt" }
                }
            ]
        },
        {
            "title": "Projections in practice",
            "body": "Ask the store for what the caller asked you for.",
            "author": { "name": "Mira Okafor" },
            "comments": [
                {
                    "text": "Empty projection selects all fields.",
                    "author": { "name": "Noah Fletcher" }
                }
            ]
        }
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FindOptions;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_seed_populates_every_collection() {
        let store = MemoryStore::new();
        reset_and_seed(&store).await.unwrap();
        for collection in [BOOKS, CONTACTS, USERS, SECRETS, POSTS] {
            let documents = store
                .find(collection, Filter::new(), FindOptions::default())
                .await
                .unwrap();
            assert!(!documents.is_empty(), "{collection} should be seeded");
        }
    }

    #[tokio::test]
    async fn test_seeding_twice_does_not_duplicate() {
        let store = MemoryStore::new();
        reset_and_seed(&store).await.unwrap();
        reset_and_seed(&store).await.unwrap();
        let books = store
            .find(BOOKS, Filter::new(), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(books.len(), 2);
    }
}
