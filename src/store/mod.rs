//! Document store gateway.
//!
//! Collections hold JSON documents keyed by an application id. Every write is
//! a single-document insert, replace or delete; nothing spans documents.

pub mod documents;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::AdminUser;

pub use documents::Document;
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Categories,
    Enquiries,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Categories => "categories",
            Collection::Enquiries => "enquiry",
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    #[error("document `{0}` already exists")]
    AlreadyExists(String),

    #[error("revision conflict: expected {expected}, stored {actual}")]
    Conflict { expected: i64, actual: i64 },

    #[error("store timed out")]
    Timeout,

    #[error("ORM error")]
    Orm(#[from] sea_orm::DbErr),

    #[error("Database error")]
    Db(#[from] sqlx::Error),

    #[error("malformed document: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A document as the store hands it back.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub revision: i64,
    pub body: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A document on its way into the store, with the fields the store indexes.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub id: String,
    pub name: String,
    pub category_id: Option<String>,
    pub body: Value,
}

/// Case-insensitive substring match against name or category id, optionally
/// restricted to one category (exact match).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSearch {
    pub term: String,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub category_id: Option<String>,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub metadata: Option<Value>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(&self, collection: Collection, id: &str) -> StoreResult<Option<StoredDocument>>;

    /// Documents whose id is in `ids`, in store order.
    async fn find_many(&self, collection: Collection, ids: &[String]) -> StoreResult<Vec<StoredDocument>>;

    /// One page plus the total count matching the filter.
    async fn list(&self, collection: Collection, filter: &ListFilter) -> StoreResult<(Vec<StoredDocument>, u64)>;

    async fn search(&self, collection: Collection, search: &ProductSearch) -> StoreResult<Vec<StoredDocument>>;

    async fn insert(&self, collection: Collection, doc: NewDocument) -> StoreResult<StoredDocument>;

    /// Replaces the whole document. With `expected_revision` set, the write
    /// only happens if the stored revision still matches.
    async fn replace(
        &self,
        collection: Collection,
        doc: NewDocument,
        expected_revision: Option<i64>,
    ) -> StoreResult<StoredDocument>;

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()>;

    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<AdminUser>>;

    async fn upsert_admin(&self, user: AdminUser) -> StoreResult<AdminUser>;

    async fn record_audit(&self, entry: AuditEntry) -> StoreResult<()>;
}
