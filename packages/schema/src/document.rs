use serde::{Deserialize, Serialize};

use crate::{validate_forest, Forest, SchemaError};

/// Metadata envelope stored next to the field tree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormMetadata {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Serialized form definition: metadata plus the field forest
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormDocument {
    pub metadata: FormMetadata,
    #[serde(default)]
    pub fields: Forest,
}

impl FormDocument {
    pub fn new(metadata: FormMetadata, fields: Forest) -> Self {
        Self { metadata, fields }
    }

    /// Parse and validate a document
    pub fn from_json(source: &str) -> Result<Self, SchemaError> {
        let document: FormDocument = serde_json::from_str(source)?;
        validate_forest(&document.fields)?;
        Ok(document)
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
