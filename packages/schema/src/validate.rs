use std::collections::HashSet;

use crate::visitor::{walk_node, Visitor};
use crate::{FieldNode, Forest, SchemaError};

/// Check the structural invariants of a forest that arrived from outside
/// the engine (deserialized, hand-built):
///
/// - every id is non-empty and unique across the whole forest
/// - only container kinds carry a children sequence
/// - every container carries one
pub fn validate_forest(forest: &Forest) -> Result<(), SchemaError> {
    let mut validator = Validator::default();
    validator.visit_forest(forest);
    match validator.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[derive(Default)]
struct Validator {
    seen: HashSet<String>,
    error: Option<SchemaError>,
}

impl Visitor for Validator {
    fn visit_node(&mut self, node: &FieldNode, depth: usize) {
        if self.error.is_some() {
            return;
        }

        if node.id.is_empty() {
            self.error = Some(SchemaError::EmptyId);
            return;
        }

        if !self.seen.insert(node.id.clone()) {
            self.error = Some(SchemaError::DuplicateId(node.id.clone()));
            return;
        }

        match (node.kind.is_container(), node.children().is_some()) {
            (false, true) => {
                self.error = Some(SchemaError::LeafWithChildren {
                    id: node.id.clone(),
                    kind: node.kind,
                });
            }
            (true, false) => {
                self.error = Some(SchemaError::ContainerWithoutChildren(node.id.clone()));
            }
            _ => walk_node(self, node, depth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn forest_from(value: serde_json::Value) -> Forest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_forest() {
        let forest = forest_from(json!([
            { "id": "s", "kind": "section", "attributes": { "label": "Group" }, "children": [
                { "id": "t", "kind": "text", "attributes": { "label": "Name" } }
            ]},
            { "id": "d", "kind": "divider" }
        ]));
        assert!(validate_forest(&forest).is_ok());
    }

    #[test]
    fn test_rejects_nested_duplicate() {
        let forest = forest_from(json!([
            { "id": "a", "kind": "section", "children": [
                { "id": "a", "kind": "text" }
            ]}
        ]));
        assert!(matches!(validate_forest(&forest), Err(SchemaError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn test_rejects_leaf_with_children() {
        let forest = forest_from(json!([
            { "id": "t", "kind": "text", "children": [] }
        ]));
        assert!(matches!(
            validate_forest(&forest),
            Err(SchemaError::LeafWithChildren { .. })
        ));
    }

    #[test]
    fn test_rejects_section_without_children() {
        let forest = forest_from(json!([{ "id": "s", "kind": "section" }]));
        assert!(matches!(
            validate_forest(&forest),
            Err(SchemaError::ContainerWithoutChildren(_))
        ));
    }
}
