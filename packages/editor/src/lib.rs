//! # Formwork Editor
//!
//! Editing engine for the Formwork form designer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ schema: field forest, ids, validation       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: session over an immutable forest    │
//! │  - Pure tree primitives (path copying)      │
//! │  - Validated mutations                      │
//! │  - Drop classification and duplication      │
//! │  - Snapshot history (undo/redo/jump)        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ preview: visibility rules, submission       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Forest is a value**: every edit yields a new forest, old ones stay valid
//! 2. **History holds forests**: undo restores a snapshot, nothing is replayed
//! 3. **Rules resolve late**: triggers are looked up by id on each evaluation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use formwork_editor::{Document, EditorConfig, DropPosition};
//! use formwork_schema::FieldKind;
//!
//! let mut doc = Document::load("contact.form.json")?;
//! let mut session = doc.open_session("local", EditorConfig::default())?;
//!
//! let name = session.add_leaf(FieldKind::Text, "Name")?;
//! let group = session.add_field(FieldKind::Section, "Address")?;
//! session.move_node(&name, &group, DropPosition::Inside)?;
//! session.undo();
//!
//! doc.set_fields(session.forest().clone());
//! doc.save()?;
//! ```

mod config;
mod document;
mod drop_position;
mod duplicate;
mod errors;
mod factory;
mod history;
mod mutations;
mod session;
pub mod tree;
mod visibility;

pub use config::{EditorConfig, HistoryConfig, DEFAULT_CONFIG_NAME};
pub use document::{Document, DocumentStorage};
pub use drop_position::{classify, DropPosition, DropRect};
pub use duplicate::{duplicate, duplicate_subtree, DuplicatePlacement};
pub use errors::EditorError;
pub use factory::{
    InMemoryCatalog, MasterDataColumn, MasterDataDefinition, MasterDataShape, NodeFactory,
    SharedFieldDefinition, Template, TemplateCatalog,
};
pub use history::{HistoryTimeline, Snapshot, SnapshotInfo};
pub use mutations::{Mutation, MutationError};
pub use session::{EditSession, HistoryMode};
pub use visibility::{
    collect_submission, dangling_rules, effective_visibility, evaluate, visible_ids, DanglingRule,
    ValueMap, Visibility,
};
