//! # Document Handle
//!
//! A form definition plus its persistence. Documents can be:
//! - **Memory-backed**: built in code or parsed from a string
//! - **File-backed**: loaded from and saved to a JSON file
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Validate → Edit (session) → Store back → Save
//!   ↓        ↓            ↓               ↓         ↓
//! File    Forest      Snapshots      set_fields   File
//! ```

use std::path::{Path, PathBuf};

use formwork_schema::{FormDocument, FormMetadata, Forest};
use tracing::info;

use crate::{EditSession, EditorConfig, EditorError};

/// Editable form document
#[derive(Debug)]
pub struct Document {
    /// Incremented every time the fields are replaced
    pub version: u64,

    storage: DocumentStorage,
}

/// Storage backend for a document
#[derive(Debug)]
pub enum DocumentStorage {
    /// In-memory only
    Memory { form: FormDocument },

    /// Backed by a file on disk
    File {
        path: PathBuf,
        form: FormDocument,
        dirty: bool,
    },
}

impl Document {
    pub fn from_form(form: FormDocument) -> Self {
        Self {
            version: 0,
            storage: DocumentStorage::Memory { form },
        }
    }

    /// Parse a memory-backed document
    pub fn from_json(source: &str) -> Result<Self, EditorError> {
        Ok(Self::from_form(FormDocument::from_json(source)?))
    }

    /// Load a file-backed document
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, EditorError> {
        let path = path.into();
        let source = std::fs::read_to_string(&path)?;
        let form = FormDocument::from_json(&source)?;
        info!(path = %path.display(), fields = form.fields.len(), "Loaded form");

        Ok(Self {
            version: 0,
            storage: DocumentStorage::File {
                path,
                form,
                dirty: false,
            },
        })
    }

    /// Write back to the file this document was loaded from
    pub fn save(&mut self) -> Result<(), EditorError> {
        match &mut self.storage {
            DocumentStorage::File { path, form, dirty } => {
                std::fs::write(&*path, form.to_json()?)?;
                *dirty = false;
                info!(path = %path.display(), "Saved form");
                Ok(())
            }
            DocumentStorage::Memory { .. } => Err(EditorError::NotFileBacked),
        }
    }

    /// Write to `path` and make the document file-backed there
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<(), EditorError> {
        let path = path.into();
        let form = match &self.storage {
            DocumentStorage::Memory { form } | DocumentStorage::File { form, .. } => form.clone(),
        };
        self.storage = DocumentStorage::File {
            path,
            form,
            dirty: true,
        };
        self.save()
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.storage {
            DocumentStorage::File { path, .. } => Some(path),
            DocumentStorage::Memory { .. } => None,
        }
    }

    pub fn form(&self) -> &FormDocument {
        match &self.storage {
            DocumentStorage::Memory { form } | DocumentStorage::File { form, .. } => form,
        }
    }

    pub fn metadata(&self) -> &FormMetadata {
        &self.form().metadata
    }

    pub fn fields(&self) -> &Forest {
        &self.form().fields
    }

    /// Replace the field forest, typically with a session's current state
    pub fn set_fields(&mut self, fields: Forest) {
        if self.fields().ptr_eq(&fields) {
            return;
        }
        self.version += 1;

        match &mut self.storage {
            DocumentStorage::Memory { form } => form.fields = fields,
            DocumentStorage::File { form, dirty, .. } => {
                form.fields = fields;
                *dirty = true;
            }
        }
    }

    /// Check if document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        match &self.storage {
            DocumentStorage::File { dirty, .. } => *dirty,
            DocumentStorage::Memory { .. } => false,
        }
    }

    pub fn to_json(&self) -> Result<String, EditorError> {
        Ok(self.form().to_json()?)
    }

    /// Start an edit session seeded with this document's fields
    pub fn open_session(&self, session_id: impl Into<String>, config: EditorConfig) -> Result<EditSession, EditorError> {
        EditSession::new(session_id, self.fields().clone(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_schema::FieldKind;

    const SAMPLE: &str = r#"{
        "metadata": { "id": "contact", "title": "Contact" },
        "fields": [
            { "id": "name", "kind": "text", "attributes": { "label": "Name" } }
        ]
    }"#;

    #[test]
    fn test_memory_document_cannot_save() {
        let mut doc = Document::from_json(SAMPLE).unwrap();
        assert!(doc.path().is_none());
        assert!(matches!(doc.save(), Err(EditorError::NotFileBacked)));
    }

    #[test]
    fn test_set_fields_marks_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contact.form.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let mut doc = Document::load(&path).unwrap();
        assert!(!doc.is_dirty());

        let mut session = doc.open_session("s", EditorConfig::default()).unwrap();
        session.add_leaf(FieldKind::Email, "Email").unwrap();
        doc.set_fields(session.forest().clone());

        assert!(doc.is_dirty());
        assert_eq!(doc.version, 1);
        doc.save().unwrap();
        assert!(!doc.is_dirty());

        let reloaded = Document::load(&path).unwrap();
        assert_eq!(reloaded.fields().len(), 2);
        assert_eq!(reloaded.metadata().title, "Contact");
    }

    #[test]
    fn test_unchanged_fields_keep_version() {
        let mut doc = Document::from_json(SAMPLE).unwrap();
        let same = doc.fields().clone();
        doc.set_fields(same);
        assert_eq!(doc.version, 0);
    }

    #[test]
    fn test_save_as_switches_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        let mut doc = Document::from_json(SAMPLE).unwrap();
        doc.save_as(&path).unwrap();

        assert_eq!(doc.path(), Some(path.as_path()));
        assert!(Document::load(&path).is_ok());
    }
}
