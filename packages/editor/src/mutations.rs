//! # Field Tree Mutations
//!
//! Structural edits expressed as serializable commands.
//!
//! ## Design Principles
//!
//! 1. **Validated**: every command checks its targets before touching the tree
//! 2. **Pure**: `apply` returns a new forest, the input is never modified
//! 3. **Atomic**: a rejected command leaves no trace
//!
//! ## Mutation Semantics
//!
//! ### Move
//! - Detach then re-insert relative to a target
//! - Fails if the target is the node itself or one of its descendants
//! - Fails for `inside` on a leaf target, before anything is detached
//! - An absent target appends at the root, like a drop on the empty canvas
//!
//! ### Insert
//! - Rejects any id already present in the forest
//!
//! ### Delete
//! - Removes the node and all descendants
//! - Rules elsewhere that point at removed nodes are left as they are

use std::collections::HashSet;

use formwork_schema::visitor::IdCollector;
use formwork_schema::{Attribute, FieldKind, FieldNode, Forest, Visitor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree;
use crate::DropPosition;

/// Structural edits on a field forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mutation {
    /// Append a node to a section, or to the root when `parent_id` is `None`
    #[serde(rename_all = "camelCase")]
    InsertNode {
        parent_id: Option<String>,
        node: FieldNode,
    },

    /// Place a node before, after or inside a target
    #[serde(rename_all = "camelCase")]
    InsertAt {
        target_id: String,
        position: DropPosition,
        node: FieldNode,
    },

    /// Remove a node and its subtree
    #[serde(rename_all = "camelCase")]
    DeleteNode { node_id: String },

    /// Relocate an existing node relative to a target
    #[serde(rename_all = "camelCase")]
    MoveNode {
        node_id: String,
        target_id: String,
        position: DropPosition,
    },

    /// Replace a single attribute
    #[serde(rename_all = "camelCase")]
    UpdateAttribute {
        node_id: String,
        attribute: Attribute,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Parent not found: {0}")]
    ParentNotFound(String),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Node {id} of kind {kind} cannot contain children")]
    InvalidContainment { id: String, kind: FieldKind },

    #[error("Duplicate node id: {0}")]
    DuplicateId(String),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

impl Mutation {
    /// Validate and apply, returning the edited forest
    pub fn apply(&self, forest: &Forest) -> Result<Forest, MutationError> {
        self.validate(forest)?;

        let next = match self {
            Mutation::InsertNode { parent_id, node } => match parent_id {
                Some(parent_id) => tree::insert_into_parent(forest, parent_id, node.clone()),
                None => tree::append_root(forest, node.clone()),
            },

            Mutation::InsertAt {
                target_id,
                position,
                node,
            } => tree::insert_at_position(forest, target_id, node.clone(), *position),

            Mutation::DeleteNode { node_id } => tree::delete(forest, node_id),

            Mutation::MoveNode {
                node_id,
                target_id,
                position,
            } => {
                let (node, detached) = tree::detach(forest, node_id);
                let node = node.ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                tree::insert_at_position(&detached, target_id, node, *position)
            }

            Mutation::UpdateAttribute { node_id, attribute } => {
                tree::update_attribute(forest, node_id, attribute)
            }
        };

        Ok(next)
    }

    /// Validate without applying
    pub fn validate(&self, forest: &Forest) -> Result<(), MutationError> {
        match self {
            Mutation::InsertNode { parent_id, node } => {
                Self::check_fresh_ids(forest, node)?;

                if let Some(parent_id) = parent_id {
                    let parent = tree::find(forest, parent_id)
                        .ok_or_else(|| MutationError::ParentNotFound(parent_id.clone()))?;
                    if !parent.can_contain() {
                        return Err(MutationError::InvalidContainment {
                            id: parent.id.clone(),
                            kind: parent.kind,
                        });
                    }
                }
                Ok(())
            }

            Mutation::InsertAt {
                target_id,
                position,
                node,
            } => {
                Self::check_fresh_ids(forest, node)?;
                Self::check_target(forest, target_id, *position)
            }

            Mutation::DeleteNode { node_id } | Mutation::UpdateAttribute { node_id, .. } => {
                tree::find(forest, node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;
                Ok(())
            }

            Mutation::MoveNode {
                node_id,
                target_id,
                position,
            } => {
                tree::find(forest, node_id)
                    .ok_or_else(|| MutationError::NodeNotFound(node_id.clone()))?;

                if node_id == target_id {
                    return Err(MutationError::InvalidStructure(
                        "Cannot move a node relative to itself".to_string(),
                    ));
                }

                if tree::is_descendant(forest, node_id, target_id) {
                    return Err(MutationError::CycleDetected);
                }

                Self::check_target(forest, target_id, *position)
            }
        }
    }

    /// Short human-readable summary, used as the history description
    pub fn describe(&self) -> String {
        match self {
            Mutation::InsertNode { node, .. } | Mutation::InsertAt { node, .. } => {
                format!("Add {} \"{}\"", node.kind, node.label())
            }
            Mutation::DeleteNode { node_id } => format!("Delete {}", node_id),
            Mutation::MoveNode {
                node_id,
                target_id,
                position,
            } => format!("Move {} {} {}", node_id, position.as_str(), target_id),
            Mutation::UpdateAttribute { node_id, attribute } => {
                format!("Update {} of {}", attribute.name(), node_id)
            }
        }
    }

    /// `inside` needs an existing container; an absent target is a root append
    fn check_target(forest: &Forest, target_id: &str, position: DropPosition) -> Result<(), MutationError> {
        if position != DropPosition::Inside {
            return Ok(());
        }
        match tree::find(forest, target_id) {
            Some(target) if !target.can_contain() => Err(MutationError::InvalidContainment {
                id: target.id.clone(),
                kind: target.kind,
            }),
            _ => Ok(()),
        }
    }

    /// Every id in the incoming subtree must be new to the forest and unique
    /// within the subtree itself
    fn check_fresh_ids(forest: &Forest, node: &FieldNode) -> Result<(), MutationError> {
        let mut incoming = IdCollector::default();
        incoming.visit_node(node, 0);

        let existing: HashSet<String> = tree::collect_ids(forest).into_iter().collect();
        let mut seen = HashSet::new();
        for id in incoming.ids {
            if existing.contains(&id) || !seen.insert(id.clone()) {
                return Err(MutationError::DuplicateId(id));
            }
        }
        Ok(())
    }
}
