use serde::Deserialize;
use utoipa::ToSchema;

use crate::editor::{EntityKind, RefTarget, SearchScope};

#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenSessionRequest {
    pub kind: EntityKind,
    /// Entity id, or `"new"` for a blank entity.
    pub id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SessionSearchRequest {
    pub term: String,
    #[serde(default)]
    pub scope: SearchScope,
    pub target: RefTarget,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttachRequest {
    pub target: RefTarget,
    pub product_id: String,
}
