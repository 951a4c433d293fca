use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::SchemaError;

/// Field kind tag. `Section` is the only kind that may own children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Section,
    Text,
    Textarea,
    Number,
    Email,
    Phone,
    Date,
    Select,
    Radio,
    Checkbox,
    Toggle,
    Grid,
    File,
    Spacer,
    Divider,
    Markdown,
}

impl FieldKind {
    /// Whether nodes of this kind carry a `children` sequence
    pub fn is_container(self) -> bool {
        matches!(self, FieldKind::Section)
    }

    /// Kinds whose value is picked from an options list
    pub fn has_options(self) -> bool {
        matches!(self, FieldKind::Select | FieldKind::Radio)
    }

    /// Layout-only kinds never produce a value
    pub fn collects_value(self) -> bool {
        !matches!(
            self,
            FieldKind::Section | FieldKind::Spacer | FieldKind::Divider | FieldKind::Markdown
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Section => "section",
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Number => "number",
            FieldKind::Email => "email",
            FieldKind::Phone => "phone",
            FieldKind::Date => "date",
            FieldKind::Select => "select",
            FieldKind::Radio => "radio",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Toggle => "toggle",
            FieldKind::Grid => "grid",
            FieldKind::File => "file",
            FieldKind::Spacer => "spacer",
            FieldKind::Divider => "divider",
            FieldKind::Markdown => "markdown",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display width of a field in the rendered form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldWidth {
    #[default]
    Full,
    Half,
}

/// One selectable option of a select/radio field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

impl FieldOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Value type of a grid column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    #[default]
    Text,
    Number,
    Date,
    Select,
    Checkbox,
}

/// Column definition of a grid field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridColumn {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub kind: ColumnKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

/// Link back to the external definition a node or column was created from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum Provenance {
    /// Instantiated from a shared-library field definition
    Shared {
        #[serde(rename = "templateId")]
        template_id: String,
    },

    /// Instantiated from a master-data definition
    MasterData {
        #[serde(rename = "definitionId")]
        definition_id: String,
    },
}

/// Visibility condition on another node's current value.
///
/// `trigger_id` is a weak reference: it names a node by id and is resolved
/// by lookup every time the rule is evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalRule {
    pub trigger_id: String,
    pub expected_value: serde_json::Value,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ConditionalRule {
    pub fn new(trigger_id: impl Into<String>, expected_value: impl Into<serde_json::Value>) -> Self {
        Self {
            trigger_id: trigger_id.into(),
            expected_value: expected_value.into(),
            enabled: true,
        }
    }

    /// A rule only gates visibility when enabled and pointing somewhere
    pub fn is_active(&self) -> bool {
        self.enabled && !self.trigger_id.is_empty()
    }
}

/// Kind-dependent payload of a field node. Missing keys take their
/// defaults, so `{}` is an unlabeled field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldAttributes {
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub width: FieldWidth,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<GridColumn>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<ConditionalRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,

    /// Kind-specific keys the engine carries but does not interpret
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, serde_json::Value>,
}

impl FieldAttributes {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

/// A single attribute assignment, the `(key, value)` pair of an update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "camelCase")]
pub enum Attribute {
    Label(String),
    Placeholder(Option<String>),
    Description(Option<String>),
    Required(bool),
    Width(FieldWidth),
    Options(Vec<FieldOption>),
    Columns(Vec<GridColumn>),
    Rule(Option<ConditionalRule>),
    Provenance(Option<Provenance>),
    Extra {
        key: String,
        value: serde_json::Value,
    },
}

impl Attribute {
    pub fn name(&self) -> &str {
        match self {
            Attribute::Label(_) => "label",
            Attribute::Placeholder(_) => "placeholder",
            Attribute::Description(_) => "description",
            Attribute::Required(_) => "required",
            Attribute::Width(_) => "width",
            Attribute::Options(_) => "options",
            Attribute::Columns(_) => "columns",
            Attribute::Rule(_) => "rule",
            Attribute::Provenance(_) => "provenance",
            Attribute::Extra { key, .. } => key,
        }
    }

    /// Free-text edits arrive per keystroke from the editing surface
    pub fn is_text_edit(&self) -> bool {
        matches!(
            self,
            Attribute::Label(_) | Attribute::Placeholder(_) | Attribute::Description(_)
        )
    }

    pub fn apply_to(&self, attributes: &mut FieldAttributes) {
        match self {
            Attribute::Label(v) => attributes.label = v.clone(),
            Attribute::Placeholder(v) => attributes.placeholder = v.clone(),
            Attribute::Description(v) => attributes.description = v.clone(),
            Attribute::Required(v) => attributes.required = *v,
            Attribute::Width(v) => attributes.width = *v,
            Attribute::Options(v) => attributes.options = v.clone(),
            Attribute::Columns(v) => attributes.columns = v.clone(),
            Attribute::Rule(v) => attributes.rule = v.clone(),
            Attribute::Provenance(v) => attributes.provenance = v.clone(),
            Attribute::Extra { key, value } => {
                attributes.extras.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Atomic entity of the field tree.
///
/// `children` is present only for container kinds. A leaf has no
/// children sequence at all, which is different from an empty section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    pub id: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub attributes: FieldAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<Arc<FieldNode>>>,
}

impl FieldNode {
    /// Create a node; containers start with an empty children sequence
    pub fn new(id: impl Into<String>, kind: FieldKind, attributes: FieldAttributes) -> Self {
        Self {
            id: id.into(),
            kind,
            attributes,
            children: kind.is_container().then(Vec::new),
        }
    }

    pub fn label(&self) -> &str {
        &self.attributes.label
    }

    /// Children of a container, `None` for leaf kinds
    pub fn children(&self) -> Option<&[Arc<FieldNode>]> {
        self.children.as_deref()
    }

    pub fn can_contain(&self) -> bool {
        self.children.is_some()
    }

    /// Replace the children of a container node
    pub fn with_children(mut self, children: Vec<Arc<FieldNode>>) -> Result<Self, SchemaError> {
        if self.children.is_none() {
            return Err(SchemaError::LeafWithChildren {
                id: self.id,
                kind: self.kind,
            });
        }
        self.children = Some(children);
        Ok(self)
    }

    /// Shallow copy of this node with a new children sequence built from
    /// the current one. Returns `None` for leaf kinds.
    pub fn map_children<F>(&self, f: F) -> Option<FieldNode>
    where
        F: FnOnce(&[Arc<FieldNode>]) -> Vec<Arc<FieldNode>>,
    {
        let children = self.children.as_deref()?;
        Some(FieldNode {
            id: self.id.clone(),
            kind: self.kind,
            attributes: self.attributes.clone(),
            children: Some(f(children)),
        })
    }
}

/// Ordered collection of root-level nodes.
///
/// Cloning is cheap: roots are shared through `Arc`, and every edit builds
/// new nodes along the changed path instead of mutating shared ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Forest {
    roots: Vec<Arc<FieldNode>>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_roots(roots: Vec<Arc<FieldNode>>) -> Self {
        Self { roots }
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = FieldNode>) -> Self {
        Self {
            roots: nodes.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn roots(&self) -> &[Arc<FieldNode>] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<Arc<FieldNode>> {
        self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldNode> {
        self.roots.iter().map(|n| n.as_ref())
    }

    /// True when both forests share the exact same root nodes, i.e. an
    /// edit returned its input unchanged.
    pub fn ptr_eq(&self, other: &Forest) -> bool {
        self.roots.len() == other.roots.len()
            && self
                .roots
                .iter()
                .zip(&other.roots)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}
