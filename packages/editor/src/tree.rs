//! # Tree Primitives
//!
//! Pure functions over a [`Forest`]. None of them mutate their input: each
//! returns a new forest in which the nodes on the path from the root to the
//! edited sibling sequence are shallow-copied, and every other subtree is
//! shared with the input through its `Arc`.
//!
//! An id that cannot be resolved is not an error at this level. The
//! primitive returns a forest equal to (and `ptr_eq` with) its input, so
//! callers can detect the no-op with [`Forest::ptr_eq`].

use std::sync::Arc;

use formwork_schema::visitor::{IdCollector, NodeCounter};
use formwork_schema::{Attribute, FieldNode, Forest, Visitor};
use tracing::debug;

use crate::DropPosition;

/// Position of a node inside its parent sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLocation {
    /// Owning section, `None` at the forest root
    pub parent_id: Option<String>,
    pub index: usize,
}

/// Depth-first lookup by id
pub fn find<'a>(forest: &'a Forest, id: &str) -> Option<&'a Arc<FieldNode>> {
    find_in(forest.roots(), id)
}

fn find_in<'a>(nodes: &'a [Arc<FieldNode>], id: &str) -> Option<&'a Arc<FieldNode>> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = node.children().and_then(|children| find_in(children, id)) {
            return Some(found);
        }
    }
    None
}

pub fn contains(forest: &Forest, id: &str) -> bool {
    find(forest, id).is_some()
}

/// Replace one attribute of the node `id`, wherever it lives
pub fn update_attribute(forest: &Forest, id: &str, attribute: &Attribute) -> Forest {
    let result = edit_siblings(forest.roots(), id, |siblings, index| {
        let mut node = FieldNode::clone(&siblings[index]);
        attribute.apply_to(&mut node.attributes);
        let mut out = siblings.to_vec();
        out[index] = Arc::new(node);
        out
    })
    .ok();

    finish(forest, result, "update_attribute", id)
}

/// Remove the node `id` (and its subtree) from whichever sequence holds it
pub fn delete(forest: &Forest, id: &str) -> Forest {
    let result = edit_siblings(forest.roots(), id, |siblings, index| {
        let mut out = siblings.to_vec();
        out.remove(index);
        out
    })
    .ok();

    finish(forest, result, "delete", id)
}

/// Append `node` to the children of container `parent_id`
pub fn insert_into_parent(
    forest: &Forest,
    parent_id: &str,
    node: impl Into<Arc<FieldNode>>,
) -> Forest {
    match find(forest, parent_id) {
        Some(parent) if parent.can_contain() => {}
        Some(parent) => {
            debug!(parent_id, kind = %parent.kind, "Parent cannot contain children");
            return forest.clone();
        }
        None => {
            debug!(parent_id, "Parent not found");
            return forest.clone();
        }
    }

    let node = node.into();
    let result = edit_node(forest.roots(), parent_id, move |parent| {
        parent.map_children(|children| {
            let mut out = children.to_vec();
            out.push(node);
            out
        })
    });

    finish(forest, result, "insert_into_parent", parent_id)
}

/// Remove the node `id` and hand it back, for move operations
pub fn detach(forest: &Forest, id: &str) -> (Option<Arc<FieldNode>>, Forest) {
    let mut removed = None;
    let result = edit_siblings(forest.roots(), id, |siblings, index| {
        let mut out = siblings.to_vec();
        removed = Some(out.remove(index));
        out
    })
    .ok();

    let forest = finish(forest, result, "detach", id);
    (removed, forest)
}

/// Place `node` relative to `target_id`.
///
/// `Before`/`After` splice the node next to the target in whatever sequence
/// holds it; `Inside` appends to the target's children. A target that does
/// not exist (the empty-canvas case) appends at the forest root so the node
/// is never dropped. `Inside` on a leaf target leaves the forest unchanged.
pub fn insert_at_position(
    forest: &Forest,
    target_id: &str,
    node: impl Into<Arc<FieldNode>>,
    position: DropPosition,
) -> Forest {
    let node = node.into();

    let Some(target) = find(forest, target_id) else {
        debug!(target_id, node_id = %node.id, "Drop target not found, appending at root");
        return append_root(forest, node);
    };

    match position {
        DropPosition::Inside => {
            if !target.can_contain() {
                debug!(target_id, kind = %target.kind, "Cannot drop inside a leaf");
                return forest.clone();
            }
            insert_into_parent(forest, target_id, node)
        }
        DropPosition::Before | DropPosition::After => {
            let result = edit_siblings(forest.roots(), target_id, |siblings, index| {
                let at = if position == DropPosition::Before {
                    index
                } else {
                    index + 1
                };
                let mut out = siblings.to_vec();
                out.insert(at, node);
                out
            })
            .ok();
            finish(forest, result, "insert_at_position", target_id)
        }
    }
}

/// Append `node` at the end of the forest root
pub fn append_root(forest: &Forest, node: impl Into<Arc<FieldNode>>) -> Forest {
    let mut roots = forest.roots().to_vec();
    roots.push(node.into());
    Forest::from_roots(roots)
}

/// Insert `node` at `location`, clamping the index to the sequence length.
/// An unknown or leaf parent leaves the forest unchanged.
pub fn insert_at_location(
    forest: &Forest,
    location: &NodeLocation,
    node: impl Into<Arc<FieldNode>>,
) -> Forest {
    let node = node.into();
    let splice = |children: &[Arc<FieldNode>]| {
        let mut out = children.to_vec();
        out.insert(location.index.min(out.len()), node);
        out
    };

    match &location.parent_id {
        None => Forest::from_roots(splice(forest.roots())),
        Some(parent_id) => {
            let result = edit_node(forest.roots(), parent_id, |parent| parent.map_children(splice));
            finish(forest, result, "insert_at_location", parent_id)
        }
    }
}

/// Where the node `id` currently sits
pub fn location_of(forest: &Forest, id: &str) -> Option<NodeLocation> {
    if let Some(index) = forest.roots().iter().position(|n| n.id == id) {
        return Some(NodeLocation {
            parent_id: None,
            index,
        });
    }
    let parent = parent_of(forest, id)?;
    let index = parent.children()?.iter().position(|n| n.id == id)?;
    Some(NodeLocation {
        parent_id: Some(parent.id.clone()),
        index,
    })
}

/// The section directly holding `id`, `None` for root nodes or unknown ids
pub fn parent_of<'a>(forest: &'a Forest, id: &str) -> Option<&'a Arc<FieldNode>> {
    fn search<'a>(nodes: &'a [Arc<FieldNode>], id: &str) -> Option<&'a Arc<FieldNode>> {
        for node in nodes {
            let Some(children) = node.children() else {
                continue;
            };
            if children.iter().any(|c| c.id == id) {
                return Some(node);
            }
            if let Some(found) = search(children, id) {
                return Some(found);
            }
        }
        None
    }
    search(forest.roots(), id)
}

/// Whether `id` lives somewhere below `ancestor_id`
pub fn is_descendant(forest: &Forest, ancestor_id: &str, id: &str) -> bool {
    find(forest, ancestor_id)
        .and_then(|ancestor| ancestor.children())
        .map(|children| find_in(children, id).is_some())
        .unwrap_or(false)
}

pub fn node_count(forest: &Forest) -> usize {
    let mut counter = NodeCounter::default();
    counter.visit_forest(forest);
    counter.count
}

/// Size of the subtree rooted at `node`, the node included
pub fn subtree_size(node: &FieldNode) -> usize {
    let mut counter = NodeCounter::default();
    counter.visit_node(node, 0);
    counter.count
}

pub fn collect_ids(forest: &Forest) -> Vec<String> {
    let mut collector = IdCollector::default();
    collector.visit_forest(forest);
    collector.ids
}

/// Rebuild `nodes` with `edit` applied to the sibling sequence holding `id`.
///
/// Hands `edit` back in `Err` when no sequence holds the id, so the
/// recursion can keep trying other branches without cloning anything.
fn edit_siblings<F>(nodes: &[Arc<FieldNode>], id: &str, edit: F) -> Result<Vec<Arc<FieldNode>>, F>
where
    F: FnOnce(&[Arc<FieldNode>], usize) -> Vec<Arc<FieldNode>>,
{
    if let Some(index) = nodes.iter().position(|n| n.id == id) {
        return Ok(edit(nodes, index));
    }

    let mut edit = edit;
    for (i, node) in nodes.iter().enumerate() {
        let Some(children) = node.children() else {
            continue;
        };
        match edit_siblings(children, id, edit) {
            Ok(new_children) => {
                let mut out = nodes.to_vec();
                if let Some(parent) = node.map_children(move |_| new_children) {
                    out[i] = Arc::new(parent);
                }
                return Ok(out);
            }
            Err(returned) => edit = returned,
        }
    }

    Err(edit)
}

/// Rebuild `nodes` with the node `id` replaced by `edit(node)`. An `edit`
/// returning `None` keeps the node as it was.
fn edit_node<F>(nodes: &[Arc<FieldNode>], id: &str, edit: F) -> Option<Vec<Arc<FieldNode>>>
where
    F: FnOnce(&FieldNode) -> Option<FieldNode>,
{
    edit_siblings(nodes, id, |siblings: &[Arc<FieldNode>], index: usize| {
        let mut out = siblings.to_vec();
        if let Some(node) = edit(&siblings[index]) {
            out[index] = Arc::new(node);
        }
        out
    })
    .ok()
}

fn finish(forest: &Forest, result: Option<Vec<Arc<FieldNode>>>, op: &str, id: &str) -> Forest {
    match result {
        Some(roots) => Forest::from_roots(roots),
        None => {
            debug!(op, id, "Node not found, forest unchanged");
            forest.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_schema::{FieldAttributes, FieldKind};

    fn leaf(id: &str) -> FieldNode {
        FieldNode::new(id, FieldKind::Text, FieldAttributes::labeled(id.to_uppercase()))
    }

    fn section(id: &str, children: Vec<FieldNode>) -> FieldNode {
        FieldNode::new(id, FieldKind::Section, FieldAttributes::labeled(id.to_uppercase()))
            .with_children(children.into_iter().map(Arc::new).collect())
            .unwrap()
    }

    /// a, s[b, t[c]], d
    fn sample() -> Forest {
        Forest::from_nodes([
            leaf("a"),
            section("s", vec![leaf("b"), section("t", vec![leaf("c")])]),
            leaf("d"),
        ])
    }

    fn root_ids(forest: &Forest) -> Vec<&str> {
        forest.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_find_nested() {
        let forest = sample();
        assert_eq!(find(&forest, "c").map(|n| n.label()), Some("C"));
        assert!(find(&forest, "ghost").is_none());
        assert_eq!(node_count(&forest), 6);
        assert_eq!(collect_ids(&forest), vec!["a", "s", "b", "t", "c", "d"]);
    }

    #[test]
    fn test_update_shares_untouched_subtrees() {
        let forest = sample();
        let next = update_attribute(&forest, "c", &Attribute::Required(true));

        assert!(find(&next, "c").unwrap().attributes.required);
        assert!(!find(&forest, "c").unwrap().attributes.required);
        assert!(Arc::ptr_eq(&forest.roots()[0], &next.roots()[0]));
        assert!(Arc::ptr_eq(&forest.roots()[2], &next.roots()[2]));
        assert!(!Arc::ptr_eq(&forest.roots()[1], &next.roots()[1]));
    }

    #[test]
    fn test_missing_id_returns_same_forest() {
        let forest = sample();
        assert!(delete(&forest, "ghost").ptr_eq(&forest));
        assert!(update_attribute(&forest, "ghost", &Attribute::Required(true)).ptr_eq(&forest));
        assert!(insert_into_parent(&forest, "ghost", leaf("x")).ptr_eq(&forest));
        let (removed, after) = detach(&forest, "ghost");
        assert!(removed.is_none());
        assert!(after.ptr_eq(&forest));
    }

    #[test]
    fn test_delete_removes_subtree() {
        let next = delete(&sample(), "s");
        assert_eq!(root_ids(&next), vec!["a", "d"]);
        assert_eq!(node_count(&next), 2);
    }

    #[test]
    fn test_insert_into_leaf_is_noop() {
        let forest = sample();
        assert!(insert_into_parent(&forest, "a", leaf("x")).ptr_eq(&forest));
        assert!(insert_at_position(&forest, "a", leaf("x"), DropPosition::Inside).ptr_eq(&forest));
    }

    #[test]
    fn test_insert_at_position_nested() {
        let forest = sample();

        let before = insert_at_position(&forest, "b", leaf("x"), DropPosition::Before);
        assert_eq!(location_of(&before, "x"), Some(NodeLocation { parent_id: Some("s".into()), index: 0 }));

        let after = insert_at_position(&forest, "c", leaf("x"), DropPosition::After);
        assert_eq!(location_of(&after, "x"), Some(NodeLocation { parent_id: Some("t".into()), index: 1 }));

        let inside = insert_at_position(&forest, "t", leaf("x"), DropPosition::Inside);
        assert_eq!(parent_of(&inside, "x").map(|p| p.id.as_str()), Some("t"));
    }

    #[test]
    fn test_missing_target_appends_at_root() {
        let next = insert_at_position(&Forest::new(), "nothing", leaf("x"), DropPosition::Before);
        assert_eq!(root_ids(&next), vec!["x"]);
    }

    #[test]
    fn test_detach_and_reinsert_at_location() {
        let forest = sample();
        let location = location_of(&forest, "b").unwrap();
        let (removed, detached) = detach(&forest, "b");
        assert_eq!(node_count(&detached), 5);

        let restored = insert_at_location(&detached, &location, removed.unwrap());
        assert_eq!(collect_ids(&restored), collect_ids(&forest));
    }

    #[test]
    fn test_insert_at_location_clamps_index() {
        let location = NodeLocation {
            parent_id: None,
            index: 99,
        };
        let next = insert_at_location(&sample(), &location, leaf("x"));
        assert_eq!(root_ids(&next), vec!["a", "s", "d", "x"]);
    }

    #[test]
    fn test_ancestry_helpers() {
        let forest = sample();
        assert!(is_descendant(&forest, "s", "c"));
        assert!(!is_descendant(&forest, "t", "b"));
        assert!(!is_descendant(&forest, "a", "a"));
        assert!(parent_of(&forest, "a").is_none());
        assert_eq!(subtree_size(find(&forest, "s").unwrap()), 4);
    }
}
