use thiserror::Error;

use crate::FieldKind;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Duplicate node id: {0}")]
    DuplicateId(String),

    #[error("Node {id} of kind {kind} cannot have children")]
    LeafWithChildren { id: String, kind: FieldKind },

    #[error("Container node {0} is missing its children")]
    ContainerWithoutChildren(String),

    #[error("Empty node id")]
    EmptyId,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
