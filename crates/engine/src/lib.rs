//! Engines for editing and validating section documents.
//!
//! - [`update`]: the path-addressed field write engine with declarative
//!   cascades
//! - [`collection`]: bounded entry add/remove and gate writes
//! - [`validate`]: rule-driven validation with deterministic output
//! - [`session`]: the single-owner facade tying a document to its schema,
//!   ruleset, and cascade map

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod session;
pub mod update;
pub mod validate;

#[cfg(test)]
mod testutil;

pub use collection::{CollectionManager, RemoveOutcome};
pub use session::SectionSession;
pub use update::{CascadeEffect, CascadeMap, CascadeRule, UpdateEngine, WriteOutcome};
pub use validate::{
    FieldIssue, PatternName, Rule, RuleKind, Ruleset, Severity, ValidationEngine,
    ValidationOutcome,
};
