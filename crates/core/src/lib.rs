//! Core data model for path-addressed form sections.
//!
//! This crate defines the building blocks shared by every engine:
//! - [`field`]: field values, kinds, and the [`Field`](field::Field) leaf
//! - [`document`]: the section document tree and its traversal
//! - [`path`]: the dotted/bracketed path grammar and `[]` patterns
//! - [`schema`]: declarative section schemas and default synthesis
//! - [`error`]: the shared error taxonomy
//!
//! No engine logic lives here; update, collection, and validation
//! semantics are layered on top in `formdoc-engine`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod field;
pub mod path;
pub mod schema;

pub use document::{Entry, EntryList, Node, SectionDocument};
pub use error::{FormError, FormResult};
pub use field::{Field, FieldType, FieldValue, Rect, ValueKind, YesNo};
pub use path::{FieldPath, PathPattern, PathSegment, PatternSegment};
pub use schema::{
    CollectionTemplate, FieldTemplate, GroupTemplate, NodeTemplate, SectionSchema,
};
