use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{config::AppConfig, editor::EditorSession, store::DocumentStore};

pub type SessionHandle = Arc<Mutex<EditorSession>>;

/// Open editor sessions by id.
pub type EditorSessions = Arc<RwLock<HashMap<Uuid, SessionHandle>>>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub sessions: EditorSessions,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: AppConfig) -> Self {
        Self {
            store,
            sessions: EditorSessions::default(),
            config: Arc::new(config),
        }
    }
}
