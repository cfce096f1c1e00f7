//! Error taxonomy for formdoc.
//!
//! Two shapes of failure exist in this system and they are kept strictly
//! apart:
//!
//! - User-input-shaped problems (missing required fields, bad date formats,
//!   collection-size limits reached during editing) are *data*, reported as
//!   structured validation outcomes or typed rejections that leave the
//!   document unchanged.
//! - Programmer-shaped problems (`MalformedPath`, `ShapeMismatch`) indicate
//!   a coding defect upstream. They are still returned as typed errors so
//!   callers can surface them, but no recovery is meaningful.

use thiserror::Error;

/// Result alias used throughout formdoc.
pub type FormResult<T> = Result<T, FormError>;

/// Error type for document operations.
///
/// Every failing operation leaves the document it was applied to unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// A path or entry-removal referenced an index past the end of a
    /// collection. Collections grow one element at a time through the
    /// collection manager, never through blind path writes.
    #[error("index {index} out of bounds for collection '{collection}' (len {len})")]
    IndexOutOfBounds {
        /// Name of the collection that was addressed.
        collection: String,
        /// The offending index.
        index: usize,
        /// Current number of entries in the collection.
        len: usize,
    },

    /// An add was attempted on a collection already at its declared maximum.
    #[error("collection '{collection}' is full (max {max} entries)")]
    CollectionFull {
        /// Name of the full collection.
        collection: String,
        /// The schema-declared maximum entry count.
        max: usize,
    },

    /// A path string does not parse against the dotted/bracketed grammar.
    /// Programmer error: paths are authored in code or configuration, never
    /// typed by end users.
    #[error("malformed path '{path}': {reason}")]
    MalformedPath {
        /// The path string that failed to parse.
        path: String,
        /// What went wrong, with character position where known.
        reason: String,
    },

    /// A document or path does not match the section's expected schema
    /// (missing member, wrong node kind, wrong value kind). Programmer
    /// error: indicates a defect in calling code or configuration.
    #[error("shape mismatch at '{path}': {reason}")]
    ShapeMismatch {
        /// The path at which the mismatch was detected.
        path: String,
        /// Description of the mismatch.
        reason: String,
    },
}

impl FormError {
    /// Create an `IndexOutOfBounds` error.
    pub fn index_out_of_bounds(
        collection: impl Into<String>,
        index: usize,
        len: usize,
    ) -> Self {
        FormError::IndexOutOfBounds {
            collection: collection.into(),
            index,
            len,
        }
    }

    /// Create a `CollectionFull` error.
    pub fn collection_full(collection: impl Into<String>, max: usize) -> Self {
        FormError::CollectionFull {
            collection: collection.into(),
            max,
        }
    }

    /// Create a `MalformedPath` error.
    pub fn malformed_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        FormError::MalformedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a `ShapeMismatch` error.
    pub fn shape_mismatch(path: impl Into<String>, reason: impl Into<String>) -> Self {
        FormError::ShapeMismatch {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
