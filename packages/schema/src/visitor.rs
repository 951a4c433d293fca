use crate::{FieldNode, Forest};

/// Visitor pattern for traversing a field forest immutably
///
/// Default implementations walk the whole tree depth-first in sibling
/// order. Override `visit_node` to act on nodes; call `walk_node` from the
/// override to keep descending.
pub trait Visitor: Sized {
    fn visit_forest(&mut self, forest: &Forest) {
        walk_forest(self, forest);
    }

    fn visit_node(&mut self, node: &FieldNode, depth: usize) {
        walk_node(self, node, depth);
    }
}

pub fn walk_forest<V: Visitor>(visitor: &mut V, forest: &Forest) {
    for root in forest.roots() {
        visitor.visit_node(root, 0);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &FieldNode, depth: usize) {
    if let Some(children) = node.children() {
        for child in children {
            visitor.visit_node(child, depth + 1);
        }
    }
}

/// Collects every node id in depth-first order
#[derive(Debug, Default)]
pub struct IdCollector {
    pub ids: Vec<String>,
}

impl Visitor for IdCollector {
    fn visit_node(&mut self, node: &FieldNode, depth: usize) {
        self.ids.push(node.id.clone());
        walk_node(self, node, depth);
    }
}

/// Counts nodes in a forest or subtree
#[derive(Debug, Default)]
pub struct NodeCounter {
    pub count: usize,
}

impl Visitor for NodeCounter {
    fn visit_node(&mut self, node: &FieldNode, depth: usize) {
        self.count += 1;
        walk_node(self, node, depth);
    }
}
