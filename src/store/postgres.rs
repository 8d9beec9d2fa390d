use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, SqlxPostgresConnector,
};
use uuid::Uuid;

use super::{
    AuditEntry, Collection, DocumentStore, ListFilter, NewDocument, ProductSearch, StoreError,
    StoreResult, StoredDocument,
};
use crate::{
    db::DbPool,
    entity::{
        admin_users::{self, Entity as AdminUsers},
        documents::{ActiveModel, Column, Entity as Documents, Model as DocumentModel},
    },
    models::AdminUser,
};

/// Postgres-backed store. Documents go through SeaORM, the audit log through
/// the raw sqlx pool both share.
#[derive(Clone)]
pub struct PgStore {
    orm: DatabaseConnection,
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        let orm = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
        Self { orm, pool }
    }

    pub fn orm(&self) -> &DatabaseConnection {
        &self.orm
    }

    fn in_collection(collection: Collection) -> Condition {
        Condition::all().add(Column::Collection.eq(collection.as_str()))
    }

    async fn current(&self, collection: Collection, id: &str) -> StoreResult<Option<DocumentModel>> {
        Ok(Documents::find_by_id((collection.as_str().to_string(), id.to_string()))
            .one(&self.orm)
            .await?)
    }
}

/// Escapes LIKE wildcards so the term is matched literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find_one(&self, collection: Collection, id: &str) -> StoreResult<Option<StoredDocument>> {
        self.current(collection, id)
            .await?
            .map(stored_from_entity)
            .transpose()
    }

    async fn find_many(&self, collection: Collection, ids: &[String]) -> StoreResult<Vec<StoredDocument>> {
        let docs = Documents::find()
            .filter(Self::in_collection(collection))
            .filter(Column::Id.is_in(ids.iter().cloned()))
            .order_by_asc(Column::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(stored_from_entity)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(docs)
    }

    async fn list(&self, collection: Collection, filter: &ListFilter) -> StoreResult<(Vec<StoredDocument>, u64)> {
        let mut condition = Self::in_collection(collection);
        if let Some(category_id) = &filter.category_id {
            condition = condition.add(Column::CategoryId.eq(category_id.clone()));
        }

        let finder = Documents::find()
            .filter(condition)
            .order_by_asc(Column::CreatedAt);

        let total = finder.clone().count(&self.orm).await?;

        let docs = finder
            .limit(filter.limit)
            .offset(filter.offset)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(stored_from_entity)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((docs, total))
    }

    async fn search(&self, collection: Collection, search: &ProductSearch) -> StoreResult<Vec<StoredDocument>> {
        let pattern = like_pattern(&search.term);
        let mut condition = Self::in_collection(collection).add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::CategoryId).ilike(pattern)),
        );
        if let Some(category_id) = &search.category_id {
            condition = condition.add(Column::CategoryId.eq(category_id.clone()));
        }

        let docs = Documents::find()
            .filter(condition)
            .order_by_asc(Column::CreatedAt)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(stored_from_entity)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(docs)
    }

    async fn insert(&self, collection: Collection, doc: NewDocument) -> StoreResult<StoredDocument> {
        if self.current(collection, &doc.id).await?.is_some() {
            return Err(StoreError::AlreadyExists(doc.id));
        }
        let now = Utc::now();
        let id = doc.id.clone();
        let active = ActiveModel {
            collection: Set(collection.as_str().to_string()),
            id: Set(doc.id),
            name: Set(doc.name),
            category_id: Set(doc.category_id),
            body: Set(doc.body.to_string()),
            revision: Set(1),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        // A concurrent insert can still win between the check and the write.
        let model = match active.insert(&self.orm).await {
            Ok(model) => model,
            Err(err) if is_unique_violation(&err) => return Err(StoreError::AlreadyExists(id)),
            Err(err) => return Err(err.into()),
        };
        stored_from_entity(model)
    }

    async fn replace(
        &self,
        collection: Collection,
        doc: NewDocument,
        expected_revision: Option<i64>,
    ) -> StoreResult<StoredDocument> {
        let mut condition = Self::in_collection(collection).add(Column::Id.eq(doc.id.clone()));
        if let Some(expected) = expected_revision {
            condition = condition.add(Column::Revision.eq(expected));
        }

        // Single conditional UPDATE ... RETURNING: the revision check, the
        // write and the row handed back are one statement.
        let written = Documents::update_many()
            .col_expr(Column::Name, Expr::value(doc.name))
            .col_expr(Column::CategoryId, Expr::value(doc.category_id))
            .col_expr(Column::Body, Expr::value(doc.body.to_string()))
            .col_expr(Column::Revision, Expr::col(Column::Revision).add(1))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(condition)
            .exec_with_returning(&self.orm)
            .await?;
        if let Some(model) = written.into_iter().next() {
            return stored_from_entity(model);
        }

        match (self.current(collection, &doc.id).await?, expected_revision) {
            (Some(model), Some(expected)) => Err(StoreError::Conflict {
                expected,
                actual: model.revision,
            }),
            _ => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        let result = Documents::delete_by_id((collection.as_str().to_string(), id.to_string()))
            .exec(&self.orm)
            .await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<AdminUser>> {
        let user = AdminUsers::find()
            .filter(admin_users::Column::Email.eq(email))
            .one(&self.orm)
            .await?
            .map(admin_from_entity);
        Ok(user)
    }

    async fn upsert_admin(&self, user: AdminUser) -> StoreResult<AdminUser> {
        let active = admin_users::ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash),
            role: Set(user.role),
            created_at: Set(user.created_at.into()),
        };
        AdminUsers::insert(active)
            .on_conflict(
                OnConflict::column(admin_users::Column::Email)
                    .update_columns([
                        admin_users::Column::PasswordHash,
                        admin_users::Column::Role,
                    ])
                    .to_owned(),
            )
            .exec(&self.orm)
            .await?;

        self.find_admin_by_email(&user.email)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn record_audit(&self, entry: AuditEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, user_id, action, resource, metadata)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.resource)
        .bind(entry.metadata)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn stored_from_entity(model: DocumentModel) -> StoreResult<StoredDocument> {
    Ok(StoredDocument {
        body: serde_json::from_str(&model.body)?,
        id: model.id,
        revision: model.revision,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn admin_from_entity(model: admin_users::Model) -> AdminUser {
    AdminUser {
        id: model.id,
        email: model.email,
        password_hash: model.password_hash,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("c1"), "%c1%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
