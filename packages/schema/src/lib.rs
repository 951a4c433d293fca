//! # Formwork Schema
//!
//! Data model of a form definition: an ordered forest of typed field
//! nodes, where only `section` nodes own children.
//!
//! Nodes are immutable once built. Children are held through `Arc` so an
//! edit can copy the path from the root to the changed node and share
//! every untouched subtree with the previous forest.

mod document;
mod error;
mod id_generator;
mod node;
mod validate;
pub mod visitor;

pub use document::{FormDocument, FormMetadata};
pub use error::SchemaError;
pub use id_generator::IdGenerator;
pub use node::{
    Attribute, ColumnKind, ConditionalRule, FieldAttributes, FieldKind, FieldNode, FieldOption,
    FieldWidth, Forest, GridColumn, Provenance,
};
pub use validate::validate_forest;
pub use visitor::Visitor;
