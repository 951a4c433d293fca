//! # Visibility Evaluation
//!
//! A node with an active `ConditionalRule` is visible only while the
//! trigger node's current value equals the rule's expected value. Values
//! come from a flat map owned by the preview/runtime layer and are compared
//! as JSON values, so `"1"` and `1` are different.
//!
//! A hidden section hides its whole subtree: descendants are neither shown
//! nor collected, whatever their own rules say.
//!
//! The trigger is looked up by id on every evaluation. A trigger that no
//! longer exists (deleted after the rule was written) resolves to
//! [`Visibility::Hidden`] until the rule is edited.

use std::collections::{BTreeMap, HashMap};

use formwork_schema::visitor::walk_node;
use formwork_schema::{FieldNode, Forest, Visitor};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::tree;

/// Current field values keyed by node id
pub type ValueMap = HashMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }
}

/// Evaluate the node's own rule, ignoring its ancestors
pub fn evaluate(forest: &Forest, node: &FieldNode, values: &ValueMap) -> Visibility {
    let Some(rule) = node.attributes.rule.as_ref().filter(|rule| rule.is_active()) else {
        return Visibility::Visible;
    };

    if !tree::contains(forest, &rule.trigger_id) {
        warn!(node_id = %node.id, trigger_id = %rule.trigger_id, "Visibility rule references a missing node");
        return Visibility::Hidden;
    }

    match values.get(&rule.trigger_id) {
        Some(value) if *value == rule.expected_value => Visibility::Visible,
        _ => Visibility::Hidden,
    }
}

/// Evaluate the node `id` including every ancestor section. `None` when
/// the id is not in the forest.
pub fn effective_visibility(forest: &Forest, id: &str, values: &ValueMap) -> Option<Visibility> {
    let node = tree::find(forest, id)?;

    let mut current = Some(node);
    while let Some(node) = current {
        if evaluate(forest, node, values) == Visibility::Hidden {
            return Some(Visibility::Hidden);
        }
        current = tree::parent_of(forest, &node.id);
    }
    Some(Visibility::Visible)
}

/// Ids of every node that would be rendered, in document order
pub fn visible_ids(forest: &Forest, values: &ValueMap) -> Vec<String> {
    let mut walker = VisibleWalker::new(forest, values);
    walker.visit_forest(forest);
    walker.visible.into_iter().map(|node| node.id).collect()
}

/// Values that would be submitted: one entry per visible value-carrying
/// field that has a value. Hidden subtrees contribute nothing.
pub fn collect_submission(forest: &Forest, values: &ValueMap) -> BTreeMap<String, Value> {
    let mut walker = VisibleWalker::new(forest, values);
    walker.visit_forest(forest);

    walker
        .visible
        .into_iter()
        .filter(|node| node.kind.collects_value())
        .filter_map(|node| values.get(&node.id).map(|value| (node.id.clone(), value.clone())))
        .collect()
}

/// Rule whose trigger no longer resolves
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingRule {
    pub node_id: String,
    pub trigger_id: String,
}

/// Every enabled rule pointing at a node that is not in the forest
pub fn dangling_rules(forest: &Forest) -> Vec<DanglingRule> {
    struct Finder<'a> {
        forest: &'a Forest,
        found: Vec<DanglingRule>,
    }

    impl Visitor for Finder<'_> {
        fn visit_node(&mut self, node: &FieldNode, depth: usize) {
            if let Some(rule) = node.attributes.rule.as_ref().filter(|r| r.is_active()) {
                if !tree::contains(self.forest, &rule.trigger_id) {
                    self.found.push(DanglingRule {
                        node_id: node.id.clone(),
                        trigger_id: rule.trigger_id.clone(),
                    });
                }
            }
            walk_node(self, node, depth);
        }
    }

    let mut finder = Finder {
        forest,
        found: Vec::new(),
    };
    finder.visit_forest(forest);
    finder.found
}

/// Walks the forest, skipping the subtree of every hidden node
struct VisibleWalker<'a> {
    forest: &'a Forest,
    values: &'a ValueMap,
    visible: Vec<FieldNode>,
}

impl<'a> VisibleWalker<'a> {
    fn new(forest: &'a Forest, values: &'a ValueMap) -> Self {
        Self {
            forest,
            values,
            visible: Vec::new(),
        }
    }
}

impl Visitor for VisibleWalker<'_> {
    fn visit_node(&mut self, node: &FieldNode, depth: usize) {
        if evaluate(self.forest, node, self.values) == Visibility::Hidden {
            return;
        }
        self.visible.push(node.clone());
        walk_node(self, node, depth);
    }
}
