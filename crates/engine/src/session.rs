//! The single-owner editing session: one document, one schema, one
//! ruleset, behind a string-path API.
//!
//! A session owns its document outright; callers that need transactional
//! edits take a [`snapshot`](SectionSession::snapshot), mutate a clone, and
//! [`commit`](SectionSession::commit) it back, or simply rely on the
//! engines' no-mutation-on-error guarantee for single operations.

use std::sync::Arc;

use tracing::debug;

use formdoc_core::document::SectionDocument;
use formdoc_core::error::{FormError, FormResult};
use formdoc_core::field::{FieldValue, YesNo};
use formdoc_core::path::FieldPath;
use formdoc_core::schema::SectionSchema;

use crate::collection::{CollectionManager, RemoveOutcome};
use crate::update::{CascadeMap, UpdateEngine, WriteOutcome};
use crate::validate::{Ruleset, ValidationEngine, ValidationOutcome};

/// An editing session over one section document.
pub struct SectionSession {
    schema: Arc<SectionSchema>,
    ruleset: Ruleset,
    updater: UpdateEngine,
    collections: CollectionManager,
    validator: ValidationEngine,
    doc: SectionDocument,
}

impl SectionSession {
    /// Open a session on a fresh default document.
    pub fn new(schema: SectionSchema, ruleset: Ruleset, cascades: CascadeMap) -> Self {
        let schema = Arc::new(schema);
        let doc = schema.create_default();
        debug!(target: "formdoc::session", section = %schema.key, "session opened");
        Self {
            updater: UpdateEngine::new(Arc::clone(&schema), cascades),
            collections: CollectionManager::new(Arc::clone(&schema)),
            validator: ValidationEngine::new(Arc::clone(&schema)),
            schema,
            ruleset,
            doc,
        }
    }

    /// Open a session on an existing document (e.g. one restored from
    /// storage). The document must belong to this schema's section.
    pub fn resume(
        schema: SectionSchema,
        ruleset: Ruleset,
        cascades: CascadeMap,
        doc: SectionDocument,
    ) -> FormResult<Self> {
        let mut session = Self::new(schema, ruleset, cascades);
        session.commit(doc)?;
        Ok(session)
    }

    /// The current document.
    pub fn document(&self) -> &SectionDocument {
        &self.doc
    }

    /// The session's schema.
    pub fn schema(&self) -> &SectionSchema {
        &self.schema
    }

    /// Read the value of the field at `path`.
    pub fn field_value(&self, path: &str) -> FormResult<&FieldValue> {
        let path: FieldPath = path.parse()?;
        Ok(&self.doc.field_at(&path)?.value)
    }

    /// Write a field. See [`UpdateEngine::update`].
    pub fn update_field(
        &mut self,
        path: &str,
        value: impl Into<FieldValue>,
    ) -> FormResult<WriteOutcome> {
        let path: FieldPath = path.parse()?;
        self.updater.update(&mut self.doc, &path, value.into())
    }

    /// Append a default entry to the collection at `collection`, returning
    /// its index. See [`CollectionManager::add`].
    pub fn add_entry(&mut self, collection: &str) -> FormResult<usize> {
        let path: FieldPath = collection.parse()?;
        self.collections.add(&mut self.doc, &path)
    }

    /// Remove the entry at `index`. See [`CollectionManager::remove`].
    pub fn remove_entry(&mut self, collection: &str, index: usize) -> FormResult<RemoveOutcome> {
        let path: FieldPath = collection.parse()?;
        self.collections.remove(&mut self.doc, &path, index)
    }

    /// Write a gate field and apply its cascade. See
    /// [`CollectionManager::set_gate`].
    pub fn set_gate(&mut self, gate: &str, value: YesNo) -> FormResult<()> {
        let path: FieldPath = gate.parse()?;
        self.collections.set_gate(&mut self.doc, &path, value)
    }

    /// Validate the whole document against the session ruleset.
    pub fn validate(&self) -> FormResult<ValidationOutcome> {
        self.validator.validate(&self.doc, &self.ruleset)
    }

    /// Validate a single entry against the session ruleset.
    pub fn validate_entry(&self, collection: &str, index: usize) -> FormResult<ValidationOutcome> {
        let path: FieldPath = collection.parse()?;
        self.validator
            .validate_entry(&self.doc, &path, index, &self.ruleset)
    }

    /// Discard all edits and return to the schema's canonical zero state.
    pub fn reset(&mut self) {
        self.doc = self.schema.create_default();
        debug!(target: "formdoc::session", section = %self.schema.key, "session reset");
    }

    /// A deep copy of the current document, for multi-step edits that must
    /// land atomically via [`commit`](Self::commit).
    pub fn snapshot(&self) -> SectionDocument {
        self.doc.clone()
    }

    /// Replace the session document with `doc`, which must belong to this
    /// session's section.
    pub fn commit(&mut self, doc: SectionDocument) -> FormResult<()> {
        if doc.id != self.schema.id || doc.key != self.schema.key {
            return Err(FormError::shape_mismatch(
                doc.key.clone(),
                format!("document does not belong to section '{}'", self.schema.key),
            ));
        }
        self.doc = doc;
        Ok(())
    }
}
