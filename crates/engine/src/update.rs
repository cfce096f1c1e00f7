//! The path-addressed field update engine.
//!
//! One entry point, [`UpdateEngine::update`], serves every field write in a
//! section. A write is checked fully before the first mutation: the target
//! must exist in the schema, the value kind must agree with the schema
//! default, indices must be in bounds, and any cascade target must resolve.
//! Missing intermediate structure (dropped by serialization of empty
//! members) is synthesized from the schema before the write lands.
//!
//! Cascades are declarative data, not code: a [`CascadeRule`] pairs a path
//! pattern with an effect, and gate semantics stay in schema/rule files
//! rather than per-section handlers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use formdoc_core::document::SectionDocument;
use formdoc_core::error::{FormError, FormResult};
use formdoc_core::field::FieldValue;
use formdoc_core::path::{FieldPath, PathPattern};
use formdoc_core::schema::{NodeTemplate, SectionSchema};

use crate::collection::apply_gate_cascade;

/// Whether a write changed the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The value differed and was written; cascades fired.
    Applied,
    /// The value was already in place; nothing changed, including
    /// timestamps and cascade state.
    Unchanged,
}

/// The effect a cascade rule applies when its trigger matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum CascadeEffect {
    /// Treat the written field as the gate of a sibling collection:
    /// clear it on the negative sentinel, ensure one default entry on the
    /// affirmative one.
    GateCollection {
        /// Member name of the gated sibling collection.
        collection: String,
    },
}

/// One declarative cascade: trigger pattern plus effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeRule {
    /// Pattern the written field's path must match (`[]` matches any
    /// index, so one rule covers every entry).
    pub trigger: PathPattern,
    /// What to do when it matches.
    #[serde(flatten)]
    pub effect: CascadeEffect,
}

/// The cascade rules for one section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadeMap {
    /// Rules in declaration order; the first trigger match wins.
    pub rules: Vec<CascadeRule>,
}

impl CascadeMap {
    /// A cascade map with the given rules.
    pub fn new(rules: Vec<CascadeRule>) -> Self {
        Self { rules }
    }

    /// The first rule whose trigger matches `path`.
    pub fn rule_for(&self, path: &FieldPath) -> Option<&CascadeRule> {
        self.rules.iter().find(|r| r.trigger.matches(path))
    }
}

/// Stateless engine applying field writes to documents of one section.
#[derive(Clone)]
pub struct UpdateEngine {
    schema: Arc<SectionSchema>,
    cascades: CascadeMap,
}

impl UpdateEngine {
    /// Create an engine for the given schema and cascade rules.
    pub fn new(schema: Arc<SectionSchema>, cascades: CascadeMap) -> Self {
        Self { schema, cascades }
    }

    /// Write `value` to the field at `path` (a trailing `.value` segment is
    /// accepted and ignored).
    ///
    /// Fails without mutating the document when the path is unknown to the
    /// schema, the value kind disagrees with the field's declared kind, or
    /// an index is out of bounds. Writing the already-present value returns
    /// [`WriteOutcome::Unchanged`] and has no side effects; otherwise the
    /// write lands, entry timestamps along the path are bumped, and any
    /// matching cascade fires.
    pub fn update(
        &self,
        doc: &mut SectionDocument,
        path: &FieldPath,
        value: FieldValue,
    ) -> FormResult<WriteOutcome> {
        let field_path = path.without_value_suffix();

        let tpl = match self.schema.template_at(&field_path)? {
            NodeTemplate::Field(f) => f,
            other => {
                return Err(FormError::shape_mismatch(
                    path.to_string(),
                    format!("'{}' is not a field", other.name()),
                ));
            }
        };
        if tpl.default.kind() != value.kind() {
            warn!(
                target: "formdoc::update",
                path = %field_path,
                expected = %tpl.default.kind(),
                got = %value.kind(),
                "write rejected; value kind disagrees with schema"
            );
            return Err(FormError::shape_mismatch(
                path.to_string(),
                format!(
                    "field '{}' holds {} values, got {}",
                    tpl.name,
                    tpl.default.kind(),
                    value.kind()
                ),
            ));
        }

        // Triggers are authored body-relative; normalize the written path so
        // the section-key-prefixed spelling fires the same cascades.
        let rel_path = field_path.strip_leading_key(&self.schema.key);

        // Resolve the cascade target up front so a bad rule rejects the
        // write instead of half-applying it.
        let cascade_target = match self.cascades.rule_for(&rel_path) {
            Some(rule) => {
                let CascadeEffect::GateCollection { collection } = &rule.effect;
                let target = rel_path
                    .parent()
                    .unwrap_or_default()
                    .key(collection.clone());
                self.schema.collection_at(&target)?;
                Some(target)
            }
            None => None,
        };

        self.schema.materialize_path(doc, &field_path)?;
        if let Some(target) = &cascade_target {
            self.schema.materialize_path(doc, target)?;
        }

        if doc.field_at(&field_path)?.value == value {
            debug!(target: "formdoc::update", path = %field_path, "write is a no-op");
            return Ok(WriteOutcome::Unchanged);
        }

        let gate_value = value.as_yes_no();
        doc.field_at_mut(&field_path)?.value = value;
        doc.touch_entries(&field_path)?;
        debug!(target: "formdoc::update", path = %field_path, "field updated");

        if let (Some(target), Some(gate)) = (cascade_target, gate_value) {
            apply_gate_cascade(&self.schema, doc, &target, gate)?;
        }
        Ok(WriteOutcome::Applied)
    }
}
