//! # Duplicate
//!
//! Copies a subtree with a fresh id on every node, not just the root, so
//! the copy can live in the same forest as the original. Grid columns get
//! fresh ids too.
//!
//! Visibility rules inside the copied subtree that point at another node of
//! the same subtree are re-pointed at the corresponding copy. Rules that
//! point outside the subtree are kept as they are.

use std::collections::HashMap;
use std::sync::Arc;

use formwork_schema::visitor::walk_node;
use formwork_schema::{FieldNode, Forest, Visitor};
use serde::{Deserialize, Serialize};

use crate::factory::NodeFactory;
use crate::tree;

const COPY_SUFFIX: &str = " (copy)";

/// Where a duplicate is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DuplicatePlacement {
    /// Sibling immediately after the original
    #[default]
    AfterOriginal,
    /// End of the forest root, wherever the original lives
    Root,
}

/// Node and grid column ids of a subtree, depth-first
#[derive(Debug, Default)]
struct SubtreeIds {
    nodes: Vec<String>,
    columns: Vec<String>,
}

impl Visitor for SubtreeIds {
    fn visit_node(&mut self, node: &FieldNode, depth: usize) {
        self.nodes.push(node.id.clone());
        self.columns
            .extend(node.attributes.columns.iter().map(|column| column.id.clone()));
        walk_node(self, node, depth);
    }
}

/// Old id to new id, kept apart for nodes and columns
#[derive(Debug, Default)]
struct IdRemap {
    nodes: HashMap<String, String>,
    columns: HashMap<String, String>,
}

impl IdRemap {
    fn is_taken(&self, candidate: &str) -> bool {
        self.nodes.values().chain(self.columns.values()).any(|taken| taken == candidate)
    }
}

/// Copy `node` and its whole subtree with fresh ids. The root's label gets
/// a "(copy)" suffix; ids are checked against `forest` so none collides.
pub fn duplicate_subtree(node: &FieldNode, forest: &Forest, factory: &mut NodeFactory) -> FieldNode {
    let mut originals = SubtreeIds::default();
    originals.visit_node(node, 0);

    let mut remap = IdRemap::default();
    for old_id in originals.nodes {
        let new_id = factory
            .next_id_avoiding(|candidate| tree::contains(forest, candidate) || remap.is_taken(candidate));
        remap.nodes.insert(old_id, new_id);
    }
    for old_id in originals.columns {
        let new_id = factory
            .next_id_avoiding(|candidate| tree::contains(forest, candidate) || remap.is_taken(candidate));
        remap.columns.insert(old_id, new_id);
    }

    let mut copy = copy_with_ids(node, &remap);
    copy.attributes.label.push_str(COPY_SUFFIX);
    copy
}

fn copy_with_ids(node: &FieldNode, remap: &IdRemap) -> FieldNode {
    let mut copy = node
        .map_children(|children| {
            children
                .iter()
                .map(|child| Arc::new(copy_with_ids(child, remap)))
                .collect()
        })
        .unwrap_or_else(|| node.clone());

    if let Some(id) = remap.nodes.get(&node.id) {
        copy.id = id.clone();
    }
    if let Some(rule) = copy.attributes.rule.as_mut() {
        if let Some(trigger) = remap.nodes.get(&rule.trigger_id) {
            rule.trigger_id = trigger.clone();
        }
    }
    for column in &mut copy.attributes.columns {
        if let Some(id) = remap.columns.get(&column.id) {
            column.id = id.clone();
        }
    }
    copy
}

/// Duplicate the node `id` and place the copy according to `placement`.
/// Returns the new forest and the id of the copy, or `None` when `id` is
/// not in the forest.
pub fn duplicate(
    forest: &Forest,
    id: &str,
    factory: &mut NodeFactory,
    placement: DuplicatePlacement,
) -> Option<(Forest, String)> {
    let original = tree::find(forest, id)?;
    let copy = duplicate_subtree(original, forest, factory);
    let copy_id = copy.id.clone();

    let next = match placement {
        DuplicatePlacement::AfterOriginal => {
            tree::insert_at_position(forest, id, copy, crate::DropPosition::After)
        }
        DuplicatePlacement::Root => tree::append_root(forest, copy),
    };

    Some((next, copy_id))
}
