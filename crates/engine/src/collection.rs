//! Entry collection management: bounded add, dense-reindex remove, and
//! gate writes with their cascade.
//!
//! Invariant maintained after every operation here: a collection's gate at
//! `Yes` implies at least one entry, and a gate at `No` implies zero
//! entries.
//!
//! Removal policy: removing the last entry while the gate is affirmative is
//! allowed; the manager immediately creates one fresh default entry in its
//! place ([`RemoveOutcome::Replaced`]) instead of blocking the removal.

use std::sync::Arc;

use tracing::{debug, warn};

use formdoc_core::document::SectionDocument;
use formdoc_core::error::{FormError, FormResult};
use formdoc_core::field::{FieldValue, ValueKind, YesNo};
use formdoc_core::path::FieldPath;
use formdoc_core::schema::SectionSchema;

/// What a successful removal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The entry was removed; later entries shifted down by one.
    Removed,
    /// The entry was removed and, because it was the last one while the
    /// gate was affirmative, a fresh default entry was created.
    Replaced,
}

/// Manager for the repeatable entry collections of one section.
///
/// Stateless apart from the shared schema reference; operates on documents
/// passed in by the caller.
#[derive(Clone)]
pub struct CollectionManager {
    schema: Arc<SectionSchema>,
}

impl CollectionManager {
    /// Create a manager for the given section schema.
    pub fn new(schema: Arc<SectionSchema>) -> Self {
        Self { schema }
    }

    /// Append one default-built entry to the collection at `collection`.
    ///
    /// Returns the new entry's positional index. Adding to a gated
    /// collection implies the affirmative answer: a gate currently at `No`
    /// is flipped to `Yes` as part of the add, keeping the gate/entry
    /// consistency rule intact. Fails with `CollectionFull` when the
    /// schema-declared maximum is reached; the document is unchanged on any
    /// failure.
    pub fn add(&self, doc: &mut SectionDocument, collection: &FieldPath) -> FormResult<usize> {
        let tpl = self.schema.collection_at(collection)?;
        // All checks precede the first mutation.
        if doc.collection_at(collection)?.len() >= tpl.max_entries {
            warn!(
                target: "formdoc::collection",
                collection = %collection,
                max = tpl.max_entries,
                "add rejected; collection is full"
            );
            return Err(FormError::collection_full(&tpl.name, tpl.max_entries));
        }
        let prefix = doc.field_id_prefix(collection)?;
        if let Some(gate) = &tpl.gate {
            let gate_path = collection.parent().unwrap_or_default().key(gate.clone());
            let field = doc.field_at_mut(&gate_path)?;
            if field.value.as_yes_no() == Some(YesNo::No) {
                field.value = FieldValue::YesNo(YesNo::Yes);
                debug!(
                    target: "formdoc::collection",
                    collection = %collection,
                    gate = %gate_path,
                    "gate affirmed by add"
                );
            }
        }
        let list = doc.collection_at_mut(collection)?;
        let id = list.allocate_id();
        list.push(tpl.build_entry(&prefix, id));
        debug!(
            target: "formdoc::collection",
            collection = %collection,
            entry_id = id,
            len = list.len(),
            "entry added"
        );
        Ok(list.len() - 1)
    }

    /// Remove the entry at `index`; later entries shift down by one so
    /// indices stay dense. Entry ids are untouched.
    ///
    /// Per the removal policy, emptying a collection whose gate is
    /// affirmative immediately creates one fresh default entry.
    pub fn remove(
        &self,
        doc: &mut SectionDocument,
        collection: &FieldPath,
        index: usize,
    ) -> FormResult<RemoveOutcome> {
        let tpl = self.schema.collection_at(collection)?;
        let gate_is_yes = match &tpl.gate {
            Some(gate) => {
                let gate_path = collection.parent().unwrap_or_default().key(gate.clone());
                doc.field_at(&gate_path)?.value.as_yes_no() == Some(YesNo::Yes)
            }
            None => false,
        };
        let prefix = doc.field_id_prefix(collection)?;
        let list = doc.collection_at_mut(collection)?;
        if index >= list.len() {
            warn!(
                target: "formdoc::collection",
                collection = %collection,
                index,
                len = list.len(),
                "remove rejected; index out of bounds"
            );
            return Err(FormError::index_out_of_bounds(&tpl.name, index, list.len()));
        }
        let removed = list.remove(index);
        debug!(
            target: "formdoc::collection",
            collection = %collection,
            entry_id = removed.id,
            index,
            "entry removed"
        );
        if gate_is_yes && list.is_empty() {
            let id = list.allocate_id();
            list.push(tpl.build_entry(&prefix, id));
            debug!(
                target: "formdoc::collection",
                collection = %collection,
                entry_id = id,
                "last entry removed under affirmative gate; default entry created"
            );
            return Ok(RemoveOutcome::Replaced);
        }
        Ok(RemoveOutcome::Removed)
    }

    /// Write a gate field and apply its cascade: the negative sentinel
    /// clears every collection gated by the field, the affirmative sentinel
    /// auto-creates one default entry in each gated collection that is
    /// empty.
    pub fn set_gate(
        &self,
        doc: &mut SectionDocument,
        gate_path: &FieldPath,
        value: YesNo,
    ) -> FormResult<()> {
        let gated = self.schema.collections_gated_by(gate_path)?;
        // All checks precede the first mutation.
        let field = doc.field_at(gate_path)?;
        if field.value.kind() != ValueKind::YesNo {
            return Err(FormError::shape_mismatch(
                gate_path.to_string(),
                format!("'{}' is not a gate field ({})", field.name, field.value.kind()),
            ));
        }
        for c in &gated {
            doc.collection_at(c)?;
        }

        doc.field_at_mut(gate_path)?.value = FieldValue::YesNo(value);
        doc.touch_entries(&gate_path.without_value_suffix())?;
        debug!(target: "formdoc::collection", gate = %gate_path, value = %value, "gate set");
        for c in &gated {
            apply_gate_cascade(&self.schema, doc, c, value)?;
        }
        Ok(())
    }
}

/// Enforce the gate/entry consistency rule on one collection: clear on
/// `No`, ensure one default entry on `Yes`. No-op when the collection is
/// already consistent, so repeated gate writes have no further effect.
pub(crate) fn apply_gate_cascade(
    schema: &SectionSchema,
    doc: &mut SectionDocument,
    collection: &FieldPath,
    value: YesNo,
) -> FormResult<()> {
    match value {
        YesNo::No => {
            let list = doc.collection_at_mut(collection)?;
            if !list.is_empty() {
                let cleared = list.len();
                list.clear();
                debug!(
                    target: "formdoc::collection",
                    collection = %collection,
                    cleared,
                    "collection cleared by negative gate"
                );
            }
            Ok(())
        }
        YesNo::Yes => {
            let tpl = schema.collection_at(collection)?;
            let prefix = doc.field_id_prefix(collection)?;
            let list = doc.collection_at_mut(collection)?;
            if list.is_empty() {
                let id = list.allocate_id();
                list.push(tpl.build_entry(&prefix, id));
                debug!(
                    target: "formdoc::collection",
                    collection = %collection,
                    entry_id = id,
                    "default entry created by affirmative gate"
                );
            }
            Ok(())
        }
    }
}
