//! Error types for the editor

use formwork_schema::{FieldKind, SchemaError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Expected a leaf kind, got {0}")]
    ExpectedLeafKind(FieldKind),

    #[error("Document is not file-backed")]
    NotFileBacked,
}
