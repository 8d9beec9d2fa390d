use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    AuditEntry, Collection, DocumentStore, ListFilter, NewDocument, ProductSearch, StoreError,
    StoreResult, StoredDocument,
};
use crate::models::AdminUser;

#[derive(Debug, Clone)]
struct Row {
    name: String,
    category_id: Option<String>,
    doc: StoredDocument,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<Collection, Vec<Row>>,
    admins: Vec<AdminUser>,
    audit: Vec<AuditEntry>,
}

/// In-process store keeping insertion order. Backs the tests and
/// `STORE_BACKEND=memory` local runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Audit entries recorded so far, oldest first.
    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.inner.read().await.audit.clone()
    }
}

fn matches_term(row: &Row, term: &str) -> bool {
    let term = term.to_lowercase();
    row.name.to_lowercase().contains(&term)
        || row
            .category_id
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains(&term))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(&self, collection: Collection, id: &str) -> StoreResult<Option<StoredDocument>> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(&collection)
            .and_then(|rows| rows.iter().find(|row| row.doc.id == id))
            .map(|row| row.doc.clone()))
    }

    async fn find_many(&self, collection: Collection, ids: &[String]) -> StoreResult<Vec<StoredDocument>> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| ids.contains(&row.doc.id))
                    .map(|row| row.doc.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list(&self, collection: Collection, filter: &ListFilter) -> StoreResult<(Vec<StoredDocument>, u64)> {
        let inner = self.inner.read().await;
        let matching: Vec<&Row> = inner
            .collections
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| match &filter.category_id {
                        Some(category_id) => row.category_id.as_ref() == Some(category_id),
                        None => true,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .map(|row| row.doc.clone())
            .collect();
        Ok((page, total))
    }

    async fn search(&self, collection: Collection, search: &ProductSearch) -> StoreResult<Vec<StoredDocument>> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_term(row, &search.term))
                    .filter(|row| match &search.category_id {
                        Some(category_id) => row.category_id.as_ref() == Some(category_id),
                        None => true,
                    })
                    .map(|row| row.doc.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, collection: Collection, doc: NewDocument) -> StoreResult<StoredDocument> {
        let mut inner = self.inner.write().await;
        let rows = inner.collections.entry(collection).or_default();
        if rows.iter().any(|row| row.doc.id == doc.id) {
            return Err(StoreError::AlreadyExists(doc.id));
        }
        let now = Utc::now();
        let stored = StoredDocument {
            id: doc.id,
            revision: 1,
            body: doc.body,
            created_at: now,
            updated_at: now,
        };
        rows.push(Row {
            name: doc.name,
            category_id: doc.category_id,
            doc: stored.clone(),
        });
        Ok(stored)
    }

    async fn replace(
        &self,
        collection: Collection,
        doc: NewDocument,
        expected_revision: Option<i64>,
    ) -> StoreResult<StoredDocument> {
        let mut inner = self.inner.write().await;
        let row = inner
            .collections
            .entry(collection)
            .or_default()
            .iter_mut()
            .find(|row| row.doc.id == doc.id)
            .ok_or(StoreError::NotFound)?;
        if let Some(expected) = expected_revision {
            if expected != row.doc.revision {
                return Err(StoreError::Conflict {
                    expected,
                    actual: row.doc.revision,
                });
            }
        }
        row.name = doc.name;
        row.category_id = doc.category_id;
        row.doc.body = doc.body;
        row.doc.revision += 1;
        row.doc.updated_at = Utc::now();
        Ok(row.doc.clone())
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let rows = inner.collections.entry(collection).or_default();
        let before = rows.len();
        rows.retain(|row| row.doc.id != id);
        if rows.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<AdminUser>> {
        let inner = self.inner.read().await;
        Ok(inner.admins.iter().find(|u| u.email == email).cloned())
    }

    async fn upsert_admin(&self, user: AdminUser) -> StoreResult<AdminUser> {
        let mut inner = self.inner.write().await;
        match inner.admins.iter_mut().find(|u| u.email == user.email) {
            Some(existing) => {
                existing.password_hash = user.password_hash;
                existing.role = user.role;
                Ok(existing.clone())
            }
            None => {
                inner.admins.push(user.clone());
                Ok(user)
            }
        }
    }

    async fn record_audit(&self, entry: AuditEntry) -> StoreResult<()> {
        self.inner.write().await.audit.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, name: &str, category_id: Option<&str>) -> NewDocument {
        NewDocument {
            id: id.into(),
            name: name.into(),
            category_id: category_id.map(str::to_string),
            body: json!({ "id": id, "name": name }),
        }
    }

    #[tokio::test]
    async fn replace_bumps_revision_and_checks_it() {
        let store = MemoryStore::new();
        let stored = store
            .insert(Collection::Products, doc("p1", "Loader", Some("c1")))
            .await
            .unwrap();
        assert_eq!(stored.revision, 1);

        let replaced = store
            .replace(Collection::Products, doc("p1", "Loader XL", Some("c1")), Some(1))
            .await
            .unwrap();
        assert_eq!(replaced.revision, 2);

        let stale = store
            .replace(Collection::Products, doc("p1", "Loader XXL", Some("c1")), Some(1))
            .await;
        assert!(matches!(
            stale,
            Err(StoreError::Conflict {
                expected: 1,
                actual: 2
            })
        ));

        let blind = store
            .replace(Collection::Products, doc("p1", "Loader XXL", Some("c1")), None)
            .await
            .unwrap();
        assert_eq!(blind.revision, 3);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_on_name_and_category() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Products, doc("p1", "Wheel Loader", Some("loaders")))
            .await
            .unwrap();
        store
            .insert(Collection::Products, doc("p2", "Excavator", Some("Excavators")))
            .await
            .unwrap();

        let hits = store
            .search(
                Collection::Products,
                &ProductSearch {
                    term: "LOADER".into(),
                    category_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let scoped = store
            .search(
                Collection::Products,
                &ProductSearch {
                    term: "excav".into(),
                    category_id: Some("excavators".into()),
                },
            )
            .await
            .unwrap();
        assert!(scoped.is_empty(), "category scope is case-sensitive");
    }

    #[tokio::test]
    async fn duplicate_insert_and_missing_delete_fail() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Categories, doc("c1", "Loaders", None))
            .await
            .unwrap();
        assert!(matches!(
            store.insert(Collection::Categories, doc("c1", "Loaders", None)).await,
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(matches!(
            store.delete(Collection::Categories, "c2").await,
            Err(StoreError::NotFound)
        ));
    }
}
