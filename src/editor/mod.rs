//! # Entity editing
//!
//! In-memory editing of products and categories ahead of a wholesale save.
//!
//! Every edit takes the current snapshot by reference and returns a new one;
//! the previous snapshot is never touched. A failed edit leaves the session
//! exactly where it was.

pub mod collection;
pub mod edits;
pub mod resolver;
pub mod session;

use thiserror::Error;

use crate::store::StoreError;

pub use edits::{CategoryEdit, EntityEdit, ProductEdit, TextList};
pub use resolver::{RefTarget, SearchScope};
pub use session::{EditorEntity, EditorSession, EditorState, EntityKind, LoadFailure};

/// Misuse of a nested collection or the related-item resolver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("index {index} out of range for collection of length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("specification `{0}` not found")]
    KeyNotFound(String),

    #[error("specification `{0}` already exists")]
    DuplicateKey(String),

    #[error("current entity has no category to scope the search by")]
    MissingCategory,

    #[error("search term must not be empty")]
    EmptyTerm,

    #[error("product `{0}` cannot reference itself")]
    SelfReference(String),

    #[error("product `{0}` is referenced more than once")]
    DuplicateReference(String),

    #[error("`{target}` is not a list of a {kind}")]
    WrongTarget { target: &'static str, kind: &'static str },

    #[error("expected a {expected} edit, got a {got} edit")]
    WrongKind { expected: &'static str, got: &'static str },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("editor is {0} and cannot accept this action")]
    NotEditable(&'static str),

    #[error("{0} not found")]
    NotFound(String),
}
