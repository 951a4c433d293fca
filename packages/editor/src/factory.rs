//! # Node Factory
//!
//! Builds new field nodes with fresh ids and kind-appropriate defaults,
//! optionally from an external template:
//!
//! - **Shared-library definitions** supply kind, label and options verbatim
//! - **Master-data definitions** supply an options list (registry) or
//!   column definitions (grid)
//!
//! Both stamp a [`Provenance`] marker on the node so the editing surface
//! can show where it came from.

use std::collections::HashMap;

use formwork_schema::{
    ColumnKind, FieldAttributes, FieldKind, FieldNode, FieldOption, FieldWidth, GridColumn,
    IdGenerator, Provenance,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

const SPACER_LABEL: &str = "Spacer";

/// Field definition from the shared library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedFieldDefinition {
    pub id: String,
    pub kind: FieldKind,
    pub label: String,
    #[serde(default)]
    pub options: Vec<FieldOption>,
}

/// Column of a master-data grid definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterDataColumn {
    pub label: String,
    #[serde(default)]
    pub kind: ColumnKind,
}

/// Shape of a master-data definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum MasterDataShape {
    /// Flat list of entries, rendered as a choice field
    Registry { entries: Vec<FieldOption> },
    /// Tabular definition, rendered as a grid field
    Grid { columns: Vec<MasterDataColumn> },
}

/// Definition from the master-data catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterDataDefinition {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub shape: MasterDataShape,
}

/// External template a node can be instantiated from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "catalog", rename_all = "camelCase")]
pub enum Template {
    Shared(SharedFieldDefinition),
    MasterData(MasterDataDefinition),
}

impl Template {
    pub fn id(&self) -> &str {
        match self {
            Template::Shared(def) => &def.id,
            Template::MasterData(def) => &def.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Template::Shared(def) => &def.label,
            Template::MasterData(def) => &def.name,
        }
    }
}

/// Read-only lookup of templates by id
pub trait TemplateCatalog {
    fn template(&self, id: &str) -> Option<Template>;
}

/// Catalog backed by a map, for tests and preloaded libraries
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    templates: HashMap<String, Template>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template: Template) {
        self.templates.insert(template.id().to_string(), template);
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl FromIterator<Template> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = Template>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for template in iter {
            catalog.insert(template);
        }
        catalog
    }
}

impl TemplateCatalog for InMemoryCatalog {
    fn template(&self, id: &str) -> Option<Template> {
        self.templates.get(id).cloned()
    }
}

/// Creates nodes with session-unique ids
#[derive(Debug, Clone, Default)]
pub struct NodeFactory {
    ids: IdGenerator,
}

impl NodeFactory {
    pub fn new(id_prefix: impl Into<String>) -> Self {
        Self {
            ids: IdGenerator::new(id_prefix),
        }
    }

    pub fn next_id(&mut self) -> String {
        self.ids.new_id()
    }

    /// Fresh id that `is_taken` does not know about
    pub fn next_id_avoiding<F>(&mut self, is_taken: F) -> String
    where
        F: Fn(&str) -> bool,
    {
        self.ids.new_id_avoiding(is_taken)
    }

    /// Build a node of `kind`. A template overrides kind, label and the
    /// option/column payload, and stamps provenance.
    pub fn create_node(&mut self, kind: FieldKind, label: &str, template: Option<&Template>) -> FieldNode {
        let id = self.next_id();

        let node = match template {
            None => FieldNode::new(id, kind, FieldAttributes::labeled(label)),
            Some(Template::Shared(def)) => {
                let mut attributes = FieldAttributes::labeled(def.label.clone());
                attributes.options = def.options.clone();
                attributes.provenance = Some(Provenance::Shared {
                    template_id: def.id.clone(),
                });
                FieldNode::new(id, def.kind, attributes)
            }
            Some(Template::MasterData(def)) => self.build_master_data(id, kind, label, def),
        };

        debug!(node_id = %node.id, kind = %node.kind, templated = template.is_some(), "Created node");
        self.apply_defaults(node, template.is_some())
    }

    fn build_master_data(&mut self, id: String, kind: FieldKind, label: &str, def: &MasterDataDefinition) -> FieldNode {
        let label = if label.is_empty() { def.name.as_str() } else { label };
        let provenance = Provenance::MasterData {
            definition_id: def.id.clone(),
        };
        let mut attributes = FieldAttributes::labeled(label);
        attributes.provenance = Some(provenance.clone());

        match &def.shape {
            MasterDataShape::Registry { entries } => {
                attributes.options = entries.clone();
                let kind = if kind.has_options() { kind } else { FieldKind::Select };
                FieldNode::new(id, kind, attributes)
            }
            MasterDataShape::Grid { columns } => {
                attributes.columns = columns
                    .iter()
                    .map(|column| GridColumn {
                        id: self.ids.new_id(),
                        label: column.label.clone(),
                        kind: column.kind,
                        provenance: Some(provenance.clone()),
                    })
                    .collect();
                FieldNode::new(id, FieldKind::Grid, attributes)
            }
        }
    }

    fn apply_defaults(&mut self, mut node: FieldNode, templated: bool) -> FieldNode {
        match node.kind {
            FieldKind::Grid if node.attributes.columns.is_empty() => {
                node.attributes.columns = (1..=2)
                    .map(|n| GridColumn {
                        id: self.ids.new_id(),
                        label: format!("Column {}", n),
                        kind: ColumnKind::Text,
                        provenance: None,
                    })
                    .collect();
            }
            FieldKind::Spacer => {
                node.attributes.width = FieldWidth::Half;
                node.attributes.label = SPACER_LABEL.to_string();
            }
            kind if kind.has_options() && !templated && node.attributes.options.is_empty() => {
                node.attributes.options = vec![
                    FieldOption::new("Option 1", "option_1"),
                    FieldOption::new("Option 2", "option_2"),
                ];
            }
            _ => {}
        }
        node
    }
}
