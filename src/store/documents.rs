use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::{Collection, DocumentStore, ListFilter, NewDocument, ProductSearch, StoreResult, StoredDocument};
use crate::models::{Category, Enquiry, Product};

/// A typed document living in one collection.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn document_id(&self) -> &str;

    fn index_name(&self) -> &str;

    fn index_category(&self) -> Option<&str> {
        None
    }

    fn revision(&self) -> Option<i64> {
        None
    }

    fn set_revision(&mut self, _revision: Option<i64>) {}
}

impl Document for Product {
    const COLLECTION: Collection = Collection::Products;

    fn document_id(&self) -> &str {
        &self.id
    }

    fn index_name(&self) -> &str {
        &self.name
    }

    fn index_category(&self) -> Option<&str> {
        self.category()
    }

    fn revision(&self) -> Option<i64> {
        self.revision
    }

    fn set_revision(&mut self, revision: Option<i64>) {
        self.revision = revision;
    }
}

impl Document for Category {
    const COLLECTION: Collection = Collection::Categories;

    fn document_id(&self) -> &str {
        &self.id
    }

    fn index_name(&self) -> &str {
        &self.name
    }

    fn revision(&self) -> Option<i64> {
        self.revision
    }

    fn set_revision(&mut self, revision: Option<i64>) {
        self.revision = revision;
    }
}

impl Document for Enquiry {
    const COLLECTION: Collection = Collection::Enquiries;

    fn document_id(&self) -> &str {
        &self.id
    }

    fn index_name(&self) -> &str {
        &self.name
    }
}

/// Serializes a document for storage. The revision lives in its own column
/// and is stripped from the body.
pub fn encode<D: Document>(doc: &D) -> StoreResult<NewDocument> {
    let mut body = serde_json::to_value(doc)?;
    if let Value::Object(map) = &mut body {
        map.remove("revision");
    }
    Ok(NewDocument {
        id: doc.document_id().to_string(),
        name: doc.index_name().to_string(),
        category_id: doc.index_category().map(str::to_string),
        body,
    })
}

pub fn decode<D: Document>(stored: StoredDocument) -> StoreResult<D> {
    let mut doc: D = serde_json::from_value(stored.body)?;
    doc.set_revision(Some(stored.revision));
    Ok(doc)
}

pub async fn fetch<D: Document>(store: &dyn DocumentStore, id: &str) -> StoreResult<Option<D>> {
    store
        .find_one(D::COLLECTION, id)
        .await?
        .map(decode)
        .transpose()
}

pub async fn fetch_many<D: Document>(store: &dyn DocumentStore, ids: &[String]) -> StoreResult<Vec<D>> {
    store
        .find_many(D::COLLECTION, ids)
        .await?
        .into_iter()
        .map(decode)
        .collect()
}

pub async fn list<D: Document>(store: &dyn DocumentStore, filter: &ListFilter) -> StoreResult<(Vec<D>, u64)> {
    let (docs, total) = store.list(D::COLLECTION, filter).await?;
    let items = docs.into_iter().map(decode).collect::<StoreResult<Vec<D>>>()?;
    Ok((items, total))
}

pub async fn search<D: Document>(store: &dyn DocumentStore, search: &ProductSearch) -> StoreResult<Vec<D>> {
    store
        .search(D::COLLECTION, search)
        .await?
        .into_iter()
        .map(decode)
        .collect()
}

pub async fn create<D: Document>(store: &dyn DocumentStore, doc: &D) -> StoreResult<D> {
    let stored = store.insert(D::COLLECTION, encode(doc)?).await?;
    decode(stored)
}

pub async fn save<D: Document>(store: &dyn DocumentStore, doc: &D) -> StoreResult<D> {
    let stored = store
        .replace(D::COLLECTION, encode(doc)?, doc.revision())
        .await?;
    decode(stored)
}

pub async fn remove<D: Document>(store: &dyn DocumentStore, id: &str) -> StoreResult<()> {
    store.delete(D::COLLECTION, id).await
}

/// `base` if no document in the collection uses it yet, otherwise the first
/// free `base-N`.
pub async fn next_free_id(store: &dyn DocumentStore, collection: Collection, base: &str) -> StoreResult<String> {
    let base = if base.is_empty() { "untitled" } else { base };
    let mut candidate = base.to_string();
    let mut n = 2;
    while store.find_one(collection, &candidate).await?.is_some() {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    Ok(candidate)
}
