//! Formdoc: a schema-driven update and validation engine for sectioned
//! form documents.
//!
//! The facade crate re-exports the full public surface:
//!
//! ```
//! use formdoc::SectionSession;
//! # use formdoc::{CascadeMap, Ruleset, SectionSchema, GroupTemplate};
//! # let schema = SectionSchema {
//! #     id: 1,
//! #     key: "section1".to_string(),
//! #     root: GroupTemplate { name: String::new(), members: vec![] },
//! # };
//! let mut session = SectionSession::new(schema, Ruleset::default(), CascadeMap::default());
//! let outcome = session.validate().unwrap();
//! assert!(outcome.is_valid());
//! ```
//!
//! See `formdoc-core` for the data model and `formdoc-engine` for the
//! update, collection, and validation engines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use formdoc_core::{
    CollectionTemplate, Entry, EntryList, Field, FieldPath, FieldTemplate, FieldType,
    FieldValue, FormError, FormResult, GroupTemplate, Node, NodeTemplate, PathPattern,
    PathSegment, PatternSegment, Rect, SectionDocument, SectionSchema, ValueKind, YesNo,
};
pub use formdoc_engine::{
    CascadeEffect, CascadeMap, CascadeRule, CollectionManager, FieldIssue, PatternName,
    RemoveOutcome, Rule, RuleKind, Ruleset, SectionSession, Severity, UpdateEngine,
    ValidationEngine, ValidationOutcome, WriteOutcome,
};
