//! # Editor sessions
//!
//! One session holds one entity being edited, from load through save:
//!
//! ```text
//! Loading -> Ready -> Submitting -> Saved
//!    |         ^          |
//!    v         |          v
//! LoadFailed   +---- SubmitFailed
//! ```
//!
//! Search results and the active attach target live on the session rather
//! than in shared state. Store round-trips are bounded by a timeout; expiry
//! surfaces as `LoadFailed` or `SubmitFailed`.

use std::{future::Future, time::Duration};

use tokio::time::Instant;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    EditError, EditorError,
    edits::{EntityEdit, validate_category, validate_product},
    resolver::{self, RefTarget, SearchScope},
};
use crate::{
    models::{Category, Product, ProductSummary},
    store::{Collection, DocumentStore, StoreError, StoreResult, documents},
};

/// How long the success banner shows before the editor is closed.
pub const SAVED_DISPLAY_DELAY: Duration = Duration::from_secs(2);

/// Route id that opens a blank entity.
pub const NEW_ENTITY_ID: &str = "new";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Product,
    Category,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Product => "product",
            EntityKind::Category => "category",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", content = "entity", rename_all = "snake_case")]
pub enum EditorEntity {
    Product(Product),
    Category(Category),
}

impl EditorEntity {
    fn blank(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Product => EditorEntity::Product(Product::blank()),
            EntityKind::Category => EditorEntity::Category(Category::blank()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EditorEntity::Product(_) => EntityKind::Product,
            EditorEntity::Category(_) => EntityKind::Category,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            EditorEntity::Product(p) => &p.id,
            EditorEntity::Category(c) => &c.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LoadFailure {
    NotFound,
    Transport { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EditorState {
    Loading,
    Ready,
    Submitting,
    Saved { redirect_after_ms: u64 },
    SubmitFailed { message: String },
    LoadFailed { failure: LoadFailure },
}

impl EditorState {
    pub fn name(&self) -> &'static str {
        match self {
            EditorState::Loading => "loading",
            EditorState::Ready => "ready",
            EditorState::Submitting => "submitting",
            EditorState::Saved { .. } => "saved",
            EditorState::SubmitFailed { .. } => "submit_failed",
            EditorState::LoadFailed { .. } => "load_failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub kind: EntityKind,
    pub is_new: bool,
    pub state: EditorState,
    pub entity: Option<EditorEntity>,
    pub search_results: Vec<ProductSummary>,
    pub active_target: Option<RefTarget>,
    pub edit_count: u64,
}

pub struct EditorSession {
    id: Uuid,
    kind: EntityKind,
    /// `None` until a new entity is saved for the first time.
    entity_id: Option<String>,
    state: EditorState,
    entity: Option<EditorEntity>,
    search_results: Vec<Product>,
    active_target: Option<RefTarget>,
    edit_count: u64,
    last_touched: Instant,
}

async fn bounded<T, F>(limit: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| StoreError::Timeout)?
}

impl EditorSession {
    /// Opens a session in `Loading`; `id` of [`NEW_ENTITY_ID`] edits a blank entity.
    pub fn open(kind: EntityKind, id: &str) -> Self {
        let entity_id = Some(id.trim())
            .filter(|id| !id.is_empty() && *id != NEW_ENTITY_ID)
            .map(str::to_string);
        Self {
            id: Uuid::new_v4(),
            kind,
            entity_id,
            state: EditorState::Loading,
            entity: None,
            search_results: Vec::new(),
            active_target: None,
            edit_count: 0,
            last_touched: Instant::now(),
        }
    }

    /// Marks the session as in use.
    pub fn touch(&mut self) {
        self.last_touched = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_touched.elapsed()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn is_new(&self) -> bool {
        self.entity_id.is_none()
    }

    pub fn entity(&self) -> Option<&EditorEntity> {
        self.entity.as_ref()
    }

    pub fn search_results(&self) -> &[Product] {
        &self.search_results
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            kind: self.kind,
            is_new: self.is_new(),
            state: self.state.clone(),
            entity: self.entity.clone(),
            search_results: self.search_results.iter().map(ProductSummary::from).collect(),
            active_target: self.active_target,
            edit_count: self.edit_count,
        }
    }

    pub async fn load(&mut self, store: &dyn DocumentStore, timeout: Duration) -> &EditorState {
        self.state = EditorState::Loading;
        let Some(id) = self.entity_id.clone() else {
            self.entity = Some(EditorEntity::blank(self.kind));
            self.state = EditorState::Ready;
            return &self.state;
        };

        let fetched = match self.kind {
            EntityKind::Product => bounded(timeout, documents::fetch::<Product>(store, &id))
                .await
                .map(|found| found.map(EditorEntity::Product)),
            EntityKind::Category => bounded(timeout, documents::fetch::<Category>(store, &id))
                .await
                .map(|found| found.map(EditorEntity::Category)),
        };

        self.state = match fetched {
            Ok(Some(entity)) => {
                self.entity = Some(entity);
                EditorState::Ready
            }
            Ok(None) => EditorState::LoadFailed {
                failure: LoadFailure::NotFound,
            },
            Err(err) => {
                tracing::warn!(session = %self.id, entity_id = %id, error = %err, "editor load failed");
                EditorState::LoadFailed {
                    failure: LoadFailure::Transport {
                        message: err.to_string(),
                    },
                }
            }
        };
        &self.state
    }

    /// `SubmitFailed` re-enters `Ready` on the next action.
    fn ensure_editable(&mut self) -> Result<(), EditorError> {
        match self.state {
            EditorState::Ready => Ok(()),
            EditorState::SubmitFailed { .. } => {
                self.state = EditorState::Ready;
                Ok(())
            }
            ref other => Err(EditorError::NotEditable(other.name())),
        }
    }

    fn current(&self) -> Result<&EditorEntity, EditorError> {
        self.entity
            .as_ref()
            .ok_or(EditorError::NotEditable(self.state.name()))
    }

    /// Applies one edit, producing exactly one new snapshot.
    pub fn apply(&mut self, edit: &EntityEdit) -> Result<&EditorEntity, EditorError> {
        self.ensure_editable()?;
        let next = match (self.current()?, edit) {
            (EditorEntity::Product(p), EntityEdit::Product(e)) => EditorEntity::Product(e.apply(p)?),
            (EditorEntity::Category(c), EntityEdit::Category(e)) => EditorEntity::Category(e.apply(c)?),
            (entity, edit) => {
                return Err(EditError::WrongKind {
                    expected: entity.kind().as_str(),
                    got: edit.kind_name(),
                }
                .into());
            }
        };
        tracing::debug!(session = %self.id, edit = edit.name(), "edit applied");
        self.edit_count += 1;
        Ok(self.entity.insert(next))
    }

    /// Searches products for `target`. A failed search leaves an empty result set.
    pub async fn search(
        &mut self,
        store: &dyn DocumentStore,
        term: &str,
        scope: SearchScope,
        target: RefTarget,
        timeout: Duration,
    ) -> Result<&[Product], EditorError> {
        self.ensure_editable()?;
        self.active_target = Some(target);
        match self.run_search(store, term, scope, target, timeout).await {
            Ok(found) => {
                self.search_results = found;
                Ok(&self.search_results)
            }
            Err(err) => {
                self.search_results.clear();
                Err(err)
            }
        }
    }

    async fn run_search(
        &self,
        store: &dyn DocumentStore,
        term: &str,
        scope: SearchScope,
        target: RefTarget,
        timeout: Duration,
    ) -> Result<Vec<Product>, EditorError> {
        let found = match self.current()? {
            EditorEntity::Product(p) => {
                target.ref_list()?;
                let query = resolver::build_search(term, scope, p)?;
                let attached = resolver::attached_ids_on_product(p, target);
                bounded(timeout, resolver::search(store, &query, p, &attached)).await?
            }
            EditorEntity::Category(c) => {
                target.summary_list()?;
                let query = resolver::build_search(term, scope, c)?;
                let attached = resolver::attached_ids_on_category(c, target);
                bounded(timeout, resolver::search(store, &query, c, &attached)).await?
            }
        };
        Ok(found)
    }

    /// Looks a candidate up among the current results, then in the store.
    async fn candidate(
        &self,
        store: &dyn DocumentStore,
        candidate_id: &str,
        timeout: Duration,
    ) -> Result<Product, EditorError> {
        if let Some(found) = self.search_results.iter().find(|p| p.id == candidate_id) {
            return Ok(found.clone());
        }
        bounded(timeout, documents::fetch::<Product>(store, candidate_id))
            .await?
            .ok_or_else(|| EditorError::NotFound(format!("product `{candidate_id}`")))
    }

    pub async fn attach(
        &mut self,
        store: &dyn DocumentStore,
        target: RefTarget,
        candidate_id: &str,
        timeout: Duration,
    ) -> Result<&EditorEntity, EditorError> {
        self.ensure_editable()?;
        // Already attached: nothing to look up, the snapshot stays as it is.
        // References are soft, so the product may no longer exist.
        let attached = match self.current()? {
            EditorEntity::Product(p) => {
                let list = target.ref_list()?;
                if candidate_id == p.id {
                    return Err(EditError::SelfReference(candidate_id.to_string()).into());
                }
                list.of(p).iter().any(|r| r.id() == candidate_id)
            }
            EditorEntity::Category(c) => target
                .summary_list()?
                .of(c)
                .iter()
                .any(|s| s.id == candidate_id),
        };
        if attached {
            self.search_results.retain(|p| p.id != candidate_id);
            return self.current();
        }

        let candidate = self.candidate(store, candidate_id, timeout).await?;
        let next = match self.current()? {
            EditorEntity::Product(p) => {
                EditorEntity::Product(resolver::attach_ref(p, target.ref_list()?, &candidate.id)?)
            }
            EditorEntity::Category(c) => {
                EditorEntity::Category(resolver::attach_summary(c, target.summary_list()?, &candidate))
            }
        };
        self.search_results.retain(|p| p.id != candidate_id);
        self.edit_count += 1;
        Ok(self.entity.insert(next))
    }

    pub fn detach(&mut self, target: RefTarget, candidate_id: &str) -> Result<&EditorEntity, EditorError> {
        self.ensure_editable()?;
        let next = match self.current()? {
            EditorEntity::Product(p) => {
                EditorEntity::Product(resolver::detach_ref(p, target.ref_list()?, candidate_id))
            }
            EditorEntity::Category(c) => {
                EditorEntity::Category(resolver::detach_summary(c, target.summary_list()?, candidate_id))
            }
        };
        self.edit_count += 1;
        Ok(self.entity.insert(next))
    }

    /// Writes the whole snapshot: insert when new, replace otherwise. On
    /// failure every in-memory edit is kept.
    pub async fn submit(
        &mut self,
        store: &dyn DocumentStore,
        timeout: Duration,
    ) -> Result<&EditorEntity, EditorError> {
        self.ensure_editable()?;
        let entity = self.current()?.clone();
        self.state = EditorState::Submitting;

        match self.write(store, entity, timeout).await {
            Ok(saved) => {
                tracing::info!(session = %self.id, kind = self.kind.as_str(), id = saved.id(), "entity saved");
                self.entity_id = Some(saved.id().to_string());
                self.state = EditorState::Saved {
                    redirect_after_ms: SAVED_DISPLAY_DELAY.as_millis() as u64,
                };
                Ok(self.entity.insert(saved))
            }
            Err(err) => {
                tracing::warn!(session = %self.id, error = %err, "submit failed");
                self.state = EditorState::SubmitFailed {
                    message: err.to_string(),
                };
                Err(err)
            }
        }
    }

    async fn write(
        &self,
        store: &dyn DocumentStore,
        entity: EditorEntity,
        timeout: Duration,
    ) -> Result<EditorEntity, EditorError> {
        let saved = match entity {
            EditorEntity::Product(product) => {
                validate_product(&product)?;
                let saved = if self.is_new() {
                    bounded(timeout, documents::create(store, &product)).await?
                } else {
                    bounded(timeout, documents::save(store, &product)).await?
                };
                EditorEntity::Product(saved)
            }
            EditorEntity::Category(mut category) => {
                validate_category(&category)?;
                let saved = if self.is_new() {
                    if category.id.trim().is_empty() {
                        category.id = bounded(
                            timeout,
                            documents::next_free_id(store, Collection::Categories, &category.slug()),
                        )
                        .await?;
                    }
                    bounded(timeout, documents::create(store, &category)).await?
                } else {
                    bounded(timeout, documents::save(store, &category)).await?
                };
                EditorEntity::Category(saved)
            }
        };
        Ok(saved)
    }
}
