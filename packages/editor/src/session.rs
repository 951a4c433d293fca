//! # Edit Session
//!
//! One editor instance's state: the current forest, its history, the
//! selected node and the node factory. The session turns user intents
//! (click, drag, keyboard) into mutations and records snapshots.
//!
//! Structural edits always push a snapshot. Attribute edits push one
//! depending on [`HistoryMode`]. Transient edits stay pending until
//! [`EditSession::commit_pending`], or until the next committed edit or
//! history navigation records them as a snapshot of their own.

use std::collections::BTreeMap;
use std::sync::Arc;

use formwork_schema::{validate_forest, Attribute, FieldKind, FieldNode, Forest};
use serde_json::Value;
use tracing::{debug, info};

use crate::drop_position::{classify, DropPosition, DropRect};
use crate::duplicate;
use crate::factory::{NodeFactory, Template, TemplateCatalog};
use crate::history::{HistoryTimeline, SnapshotInfo};
use crate::tree;
use crate::visibility::{self, ValueMap, Visibility};
use crate::{EditorConfig, EditorError, Mutation, MutationError};

const SEED_DESCRIPTION: &str = "Initial state";

/// Whether an attribute edit lands in the history right away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    /// Push a snapshot now
    Commit,
    /// Apply now, snapshot on the next commit
    Transient,
}

/// Editing state of a single editor instance
#[derive(Debug)]
pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    forest: Forest,
    history: HistoryTimeline,
    selected: Option<String>,
    factory: NodeFactory,
    config: EditorConfig,

    /// Description of transient edits not yet in the history
    pending: Option<String>,
}

impl EditSession {
    /// Start a session on `forest`, which becomes the seed snapshot
    pub fn new(id: impl Into<String>, forest: Forest, config: EditorConfig) -> Result<Self, EditorError> {
        validate_forest(&forest)?;

        let history =
            HistoryTimeline::with_max_levels(forest.clone(), SEED_DESCRIPTION, config.history.max_levels);

        Ok(Self {
            id: id.into(),
            forest,
            history,
            selected: None,
            factory: NodeFactory::new(config.id_prefix.clone()),
            config,
            pending: None,
        })
    }

    /// Start a session on an empty form with default settings
    pub fn empty(id: impl Into<String>) -> Self {
        let config = EditorConfig::default();
        Self {
            id: id.into(),
            forest: Forest::new(),
            history: HistoryTimeline::new(Forest::new(), SEED_DESCRIPTION),
            selected: None,
            factory: NodeFactory::new(config.id_prefix.clone()),
            config,
            pending: None,
        }
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn history(&self) -> &HistoryTimeline {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Replace the forest (e.g. after loading) and restart the history
    pub fn load(&mut self, forest: Forest) -> Result<(), EditorError> {
        validate_forest(&forest)?;
        info!(session_id = %self.id, nodes = tree::node_count(&forest), "Loaded forest");

        self.history.reset(forest.clone(), SEED_DESCRIPTION);
        self.forest = forest;
        self.selected = None;
        self.pending = None;
        Ok(())
    }

    // Selection

    pub fn select(&mut self, id: &str) -> Result<(), EditorError> {
        if !tree::contains(&self.forest, id) {
            return Err(MutationError::NodeNotFound(id.to_string()).into());
        }
        debug!(session_id = %self.id, node_id = id, "Selected node");
        self.selected = Some(id.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_node(&self) -> Option<&Arc<FieldNode>> {
        self.selected.as_deref().and_then(|id| tree::find(&self.forest, id))
    }

    // Creation

    /// Add a new field next to the selection: inside a selected section,
    /// after a selected leaf, or at the end of the root. The new node
    /// becomes the selection.
    pub fn add_field(&mut self, kind: FieldKind, label: &str) -> Result<String, EditorError> {
        let node = self.factory.create_node(kind, label, None);
        self.insert_new(node)
    }

    /// Like [`add_field`](Self::add_field), restricted to leaf kinds
    pub fn add_leaf(&mut self, kind: FieldKind, label: &str) -> Result<String, EditorError> {
        if kind.is_container() {
            return Err(EditorError::ExpectedLeafKind(kind));
        }
        self.add_field(kind, label)
    }

    /// Add a field instantiated from a shared-library or master-data template.
    /// Master-data registries become a `select`.
    pub fn add_from_template(&mut self, template: &Template) -> Result<String, EditorError> {
        self.add_from_template_as(FieldKind::Select, template)
    }

    /// Like [`add_from_template`](Self::add_from_template), with the choice
    /// kind a master-data registry should become (`select`, `radio`,
    /// `checkbox`). Shared definitions keep their own kind.
    pub fn add_from_template_as(&mut self, kind: FieldKind, template: &Template) -> Result<String, EditorError> {
        let node = self.factory.create_node(kind, "", Some(template));
        self.insert_new(node)
    }

    /// Look up `template_id` in `catalog` and add the resulting field
    pub fn add_from_catalog<C>(&mut self, catalog: &C, template_id: &str) -> Result<String, EditorError>
    where
        C: TemplateCatalog + ?Sized,
    {
        let template = catalog
            .template(template_id)
            .ok_or_else(|| EditorError::TemplateNotFound(template_id.to_string()))?;
        self.add_from_template(&template)
    }

    /// Drop a brand-new field relative to `target_id`. A target that does
    /// not exist appends at the root.
    pub fn drop_new(
        &mut self,
        kind: FieldKind,
        label: &str,
        target_id: &str,
        position: DropPosition,
    ) -> Result<String, EditorError> {
        let node = self.factory.create_node(kind, label, None);
        let id = node.id.clone();
        self.apply(Mutation::InsertAt {
            target_id: target_id.to_string(),
            position,
            node,
        })?;
        self.selected = Some(id.clone());
        Ok(id)
    }

    /// Drop a brand-new field at a pointer position over `target_id`
    pub fn drop_new_at(
        &mut self,
        kind: FieldKind,
        label: &str,
        target_id: &str,
        rect: DropRect,
        pointer_y: f64,
    ) -> Result<String, EditorError> {
        let position = self.classify_drop(target_id, rect, pointer_y);
        self.drop_new(kind, label, target_id, position)
    }

    // Structural edits

    pub fn delete(&mut self, id: &str) -> Result<(), EditorError> {
        self.apply(Mutation::DeleteNode {
            node_id: id.to_string(),
        })
    }

    /// Duplicate a node and its subtree; the copy becomes the selection
    pub fn duplicate(&mut self, id: &str) -> Result<String, EditorError> {
        let (next, copy_id) = duplicate::duplicate(
            &self.forest,
            id,
            &mut self.factory,
            self.config.duplicate_placement,
        )
        .ok_or_else(|| MutationError::NodeNotFound(id.to_string()))?;

        self.commit_pending();
        self.forest = next;
        self.record(format!("Duplicate {}", id));
        self.selected = Some(copy_id.clone());
        Ok(copy_id)
    }

    pub fn move_node(&mut self, id: &str, target_id: &str, position: DropPosition) -> Result<(), EditorError> {
        self.apply(Mutation::MoveNode {
            node_id: id.to_string(),
            target_id: target_id.to_string(),
            position,
        })
    }

    /// Move an existing node to where the pointer is over `target_id`
    pub fn drop_existing(
        &mut self,
        id: &str,
        target_id: &str,
        rect: DropRect,
        pointer_y: f64,
    ) -> Result<DropPosition, EditorError> {
        let position = self.classify_drop(target_id, rect, pointer_y);
        self.move_node(id, target_id, position)?;
        Ok(position)
    }

    /// Classify a pointer over `target_id`; unknown targets count as leaves
    pub fn classify_drop(&self, target_id: &str, rect: DropRect, pointer_y: f64) -> DropPosition {
        let kind = tree::find(&self.forest, target_id)
            .map(|node| node.kind)
            .unwrap_or(FieldKind::Text);
        classify(kind, rect, pointer_y)
    }

    // Attribute edits

    /// Update one attribute. Text edits are transient unless the config
    /// asks for a snapshot per change; everything else commits.
    pub fn update_attribute(&mut self, id: &str, attribute: Attribute) -> Result<(), EditorError> {
        let mode = if attribute.is_text_edit() && !self.config.history.snapshot_text_edits {
            HistoryMode::Transient
        } else {
            HistoryMode::Commit
        };
        self.update_attribute_with(id, attribute, mode)
    }

    pub fn update_attribute_with(
        &mut self,
        id: &str,
        attribute: Attribute,
        mode: HistoryMode,
    ) -> Result<(), EditorError> {
        let mutation = Mutation::UpdateAttribute {
            node_id: id.to_string(),
            attribute,
        };
        let next = mutation.apply(&self.forest)?;

        match mode {
            HistoryMode::Commit => {
                self.commit_pending();
                self.forest = next;
                self.record(mutation.describe());
            }
            HistoryMode::Transient => {
                self.forest = next;
                if self.pending.is_none() {
                    self.pending = Some(mutation.describe());
                }
            }
        }
        Ok(())
    }

    /// Push transient edits into the history. Returns false when there was
    /// nothing to commit.
    pub fn commit_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(description) => {
                self.history.push_snapshot(&self.forest, description);
                true
            }
            None => false,
        }
    }

    pub fn has_pending_edits(&self) -> bool {
        self.pending.is_some()
    }

    // History

    pub fn undo(&mut self) -> bool {
        self.commit_pending();
        let Some(forest) = self.history.undo().cloned() else {
            debug!(session_id = %self.id, "Nothing to undo");
            return false;
        };
        self.restore(forest);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.commit_pending();
        let Some(forest) = self.history.redo().cloned() else {
            debug!(session_id = %self.id, "Nothing to redo");
            return false;
        };
        self.restore(forest);
        true
    }

    /// Restore snapshot `index` of the timeline as [`timeline`](Self::timeline)
    /// reported it, without discarding later snapshots.
    ///
    /// Pending edits are committed first. That commit can cut the entries
    /// after the cursor or drop the oldest one, so the target is resolved
    /// by snapshot id afterwards. A target the commit removed is restored
    /// as a new snapshot at the tail.
    pub fn jump_to_version(&mut self, index: usize) -> bool {
        let Some(target) = self.history.get(index) else {
            return false;
        };
        let (target_id, target_forest, target_description) =
            (target.id.clone(), target.forest.clone(), target.description.clone());

        self.commit_pending();

        let forest = match self.history.position_of(&target_id) {
            Some(position) => self.history.jump_to_version(position).cloned(),
            None => {
                debug!(session_id = %self.id, snapshot_id = %target_id, "Jump target discarded by commit, restoring");
                self.history
                    .push_snapshot(&target_forest, format!("Restore \"{}\"", target_description));
                Some(target_forest)
            }
        };

        match forest {
            Some(forest) => {
                self.restore(forest);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.pending.is_some() || self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.pending.is_none() && self.history.can_redo()
    }

    pub fn timeline(&self) -> Vec<SnapshotInfo> {
        self.history.entries()
    }

    // Preview

    /// Visibility of `id` including its ancestors, `None` for unknown ids
    pub fn visibility(&self, id: &str, values: &ValueMap) -> Option<Visibility> {
        visibility::effective_visibility(&self.forest, id, values)
    }

    /// Values that would be submitted from the current form
    pub fn submission(&self, values: &ValueMap) -> BTreeMap<String, Value> {
        visibility::collect_submission(&self.forest, values)
    }

    fn insert_new(&mut self, node: FieldNode) -> Result<String, EditorError> {
        let id = node.id.clone();
        let mutation = match self.selected_node() {
            Some(selected) if selected.can_contain() => Mutation::InsertNode {
                parent_id: Some(selected.id.clone()),
                node,
            },
            Some(selected) => Mutation::InsertAt {
                target_id: selected.id.clone(),
                position: DropPosition::After,
                node,
            },
            None => Mutation::InsertNode {
                parent_id: None,
                node,
            },
        };

        self.apply(mutation)?;
        self.selected = Some(id.clone());
        Ok(id)
    }

    fn apply(&mut self, mutation: Mutation) -> Result<(), EditorError> {
        let next = mutation.apply(&self.forest)?;
        self.commit_pending();
        self.forest = next;
        self.record(mutation.describe());
        self.reconcile_selection();
        Ok(())
    }

    /// Push the current forest. Callers commit pending edits before
    /// replacing the forest, so they get a snapshot of their own.
    fn record(&mut self, description: String) {
        info!(session_id = %self.id, description = %description, "Recorded edit");
        self.history.push_snapshot(&self.forest, description);
    }

    fn restore(&mut self, forest: Forest) {
        self.forest = forest;
        self.reconcile_selection();
        debug!(
            session_id = %self.id,
            index = self.history.current_index(),
            "Restored snapshot"
        );
    }

    fn reconcile_selection(&mut self) {
        if let Some(id) = &self.selected {
            if !tree::contains(&self.forest, id) {
                self.selected = None;
            }
        }
    }
}

impl Default for EditSession {
    fn default() -> Self {
        Self::empty("local")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_schema::FieldAttributes;

    #[test]
    fn test_session_creation() {
        let session = EditSession::empty("client-1");
        assert_eq!(session.id, "client-1");
        assert!(session.forest().is_empty());
        assert_eq!(session.history().len(), 1);
        assert!(session.selected_id().is_none());
        assert!(!session.can_undo());
    }

    #[test]
    fn test_new_rejects_invalid_forest() {
        let forest = Forest::from_nodes([
            FieldNode::new("x", FieldKind::Text, FieldAttributes::default()),
            FieldNode::new("x", FieldKind::Text, FieldAttributes::default()),
        ]);
        let result = EditSession::new("s", forest, EditorConfig::default());
        assert!(matches!(result, Err(EditorError::Schema(_))));
    }

    #[test]
    fn test_select_unknown_node() {
        let mut session = EditSession::empty("s");
        assert!(session.select("ghost").is_err());
    }

    #[test]
    fn test_add_after_selected_leaf() {
        let mut session = EditSession::empty("s");
        let first = session.add_leaf(FieldKind::Text, "First").unwrap();
        let last = session.add_leaf(FieldKind::Text, "Last").unwrap();

        session.select(&first).unwrap();
        let middle = session.add_leaf(FieldKind::Email, "Middle").unwrap();

        let order: Vec<&str> = session.forest().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec![first.as_str(), middle.as_str(), last.as_str()]);
    }

    #[test]
    fn test_add_leaf_rejects_section() {
        let mut session = EditSession::empty("s");
        assert!(matches!(
            session.add_leaf(FieldKind::Section, "Group"),
            Err(EditorError::ExpectedLeafKind(FieldKind::Section))
        ));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_text_edits_are_transient_until_commit() {
        let mut session = EditSession::empty("s");
        let id = session.add_leaf(FieldKind::Text, "Name").unwrap();
        assert_eq!(session.history().len(), 2);

        for label in ["F", "Fu", "Full name"] {
            session
                .update_attribute(&id, Attribute::Label(label.to_string()))
                .unwrap();
        }
        assert_eq!(session.history().len(), 2);
        assert!(session.has_pending_edits());

        assert!(session.commit_pending());
        assert_eq!(session.history().len(), 3);
        assert!(!session.commit_pending());

        assert!(session.undo());
        assert_eq!(tree::find(session.forest(), &id).unwrap().label(), "Name");
    }

    #[test]
    fn test_undo_commits_pending_first() {
        let mut session = EditSession::empty("s");
        let id = session.add_leaf(FieldKind::Text, "Name").unwrap();
        session
            .update_attribute(&id, Attribute::Placeholder(Some("Jane".to_string())))
            .unwrap();

        assert!(session.undo());
        let node = tree::find(session.forest(), &id).unwrap();
        assert_eq!(node.attributes.placeholder, None);
        assert!(session.redo());
        let node = tree::find(session.forest(), &id).unwrap();
        assert_eq!(node.attributes.placeholder.as_deref(), Some("Jane"));
    }

    #[test]
    fn test_non_text_attribute_commits() {
        let mut session = EditSession::empty("s");
        let id = session.add_leaf(FieldKind::Text, "Name").unwrap();
        session.update_attribute(&id, Attribute::Required(true)).unwrap();
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.history().current().description, format!("Update required of {}", id));
    }

    #[test]
    fn test_snapshot_text_edits_config() {
        let mut config = EditorConfig::default();
        config.history.snapshot_text_edits = true;
        let mut session = EditSession::new("s", Forest::new(), config).unwrap();

        let id = session.add_leaf(FieldKind::Text, "Name").unwrap();
        session.update_attribute(&id, Attribute::Label("N".to_string())).unwrap();
        assert_eq!(session.history().len(), 3);
    }

    #[test]
    fn test_structural_edit_records_pending_separately() {
        let mut session = EditSession::empty("s");
        let id = session.add_leaf(FieldKind::Text, "Name").unwrap();
        session
            .update_attribute(&id, Attribute::Label("Full name".to_string()))
            .unwrap();
        session.add_leaf(FieldKind::Email, "Email").unwrap();

        assert!(!session.has_pending_edits());
        let descriptions: Vec<String> = session.timeline().into_iter().map(|e| e.description).collect();
        assert_eq!(
            descriptions,
            vec![
                "Initial state".to_string(),
                "Add text \"Name\"".to_string(),
                format!("Update label of {}", id),
                "Add email \"Email\"".to_string(),
            ]
        );

        // Undoing the add keeps the label edit
        assert!(session.undo());
        assert_eq!(session.forest().len(), 1);
        assert_eq!(tree::find(session.forest(), &id).unwrap().label(), "Full name");

        assert!(session.undo());
        assert_eq!(tree::find(session.forest(), &id).unwrap().label(), "Name");
    }

    #[test]
    fn test_committed_attribute_records_pending_separately() {
        let mut session = EditSession::empty("s");
        let id = session.add_leaf(FieldKind::Text, "Name").unwrap();
        session
            .update_attribute(&id, Attribute::Label("Full name".to_string()))
            .unwrap();
        session.update_attribute(&id, Attribute::Required(true)).unwrap();
        assert_eq!(session.history().len(), 4);

        assert!(session.undo());
        let node = tree::find(session.forest(), &id).unwrap();
        assert_eq!(node.label(), "Full name");
        assert!(!node.attributes.required);
    }

    #[test]
    fn test_jump_with_pending_edit_off_the_tail() {
        let mut session = EditSession::empty("s");
        let a = session.add_leaf(FieldKind::Text, "A").unwrap();
        session.add_leaf(FieldKind::Text, "B").unwrap();
        session.add_leaf(FieldKind::Text, "C").unwrap();

        assert!(session.jump_to_version(1));
        session
            .update_attribute(&a, Attribute::Label("Renamed".to_string()))
            .unwrap();

        // Entry 2 ("Add text B") as listed before the edit
        assert!(session.jump_to_version(2));
        assert_eq!(session.forest().len(), 2);
        assert_eq!(tree::find(session.forest(), &a).unwrap().label(), "A");

        let descriptions: Vec<String> = session.timeline().into_iter().map(|e| e.description).collect();
        assert_eq!(descriptions.len(), 4);
        assert_eq!(descriptions[2], format!("Update label of {}", a));
        assert_eq!(descriptions[3], "Restore \"Add text \"B\"\"");
        assert_eq!(session.history().current_index(), 3);

        // The label edit is still one undo away
        assert!(session.undo());
        assert_eq!(tree::find(session.forest(), &a).unwrap().label(), "Renamed");
    }

    #[test]
    fn test_jump_with_pending_edit_when_oldest_is_dropped() {
        let mut config = EditorConfig::default();
        config.history.max_levels = 3;
        let mut session = EditSession::new("s", Forest::new(), config).unwrap();
        let a = session.add_leaf(FieldKind::Text, "A").unwrap();
        session.add_leaf(FieldKind::Text, "B").unwrap();
        assert_eq!(session.history().len(), 3);

        session
            .update_attribute(&a, Attribute::Label("Renamed".to_string()))
            .unwrap();

        // Entry 1 ("Add text A") shifts to 0 once the commit drops the seed
        assert!(session.jump_to_version(1));
        assert_eq!(session.history().current_index(), 0);
        assert_eq!(session.forest().len(), 1);
        assert_eq!(tree::find(session.forest(), &a).unwrap().label(), "A");
        assert_eq!(session.history().len(), 3);
    }

    #[test]
    fn test_jump_out_of_range() {
        let mut session = EditSession::empty("s");
        let id = session.add_leaf(FieldKind::Text, "A").unwrap();
        session
            .update_attribute(&id, Attribute::Label("B".to_string()))
            .unwrap();

        assert!(!session.jump_to_version(5));
        assert!(session.has_pending_edits());
    }

    #[test]
    fn test_registry_template_as_radio() {
        use crate::factory::{MasterDataDefinition, MasterDataShape};
        use formwork_schema::FieldOption;

        let template = Template::MasterData(MasterDataDefinition {
            id: "md-sizes".to_string(),
            name: "Sizes".to_string(),
            shape: MasterDataShape::Registry {
                entries: vec![FieldOption::new("Small", "s"), FieldOption::new("Large", "l")],
            },
        });

        let mut session = EditSession::empty("s");
        let radio = session.add_from_template_as(FieldKind::Radio, &template).unwrap();
        let select = session.add_from_template(&template).unwrap();

        let radio = tree::find(session.forest(), &radio).unwrap();
        assert_eq!(radio.kind, FieldKind::Radio);
        assert_eq!(radio.attributes.options.len(), 2);
        assert_eq!(radio.label(), "Sizes");
        assert_eq!(tree::find(session.forest(), &select).unwrap().kind, FieldKind::Select);
    }

    #[test]
    fn test_delete_clears_selection() {
        let mut session = EditSession::empty("s");
        let section = session.add_field(FieldKind::Section, "Group").unwrap();
        let child = session.add_leaf(FieldKind::Text, "Child").unwrap();
        assert_eq!(session.selected_id(), Some(child.as_str()));

        session.delete(&section).unwrap();
        assert!(session.selected_id().is_none());
        assert!(session.forest().is_empty());
    }

    #[test]
    fn test_failed_edit_leaves_history_alone() {
        let mut session = EditSession::empty("s");
        assert!(session.delete("ghost").is_err());
        assert!(session.move_node("ghost", "other", DropPosition::After).is_err());
        assert_eq!(session.history().len(), 1);
    }
}
