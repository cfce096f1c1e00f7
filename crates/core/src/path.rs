//! Path grammar for addressing fields inside a section document.
//!
//! Paths are dot-separated property names with optional `[index]` array
//! subscripts, e.g. `section12.entries[2].degrees[0].degreeType.value`.
//! A trailing `.value` segment conventionally addresses a field's value
//! member; engines strip it with [`FieldPath::without_value_suffix`] before
//! traversal, so a member literally named `value` is not supported as the
//! final segment of a field path.
//!
//! [`PathPattern`] extends the grammar with `[]` (any-index) subscripts so
//! one declaration in a cascade map or validation ruleset covers every
//! entry of a collection: `entries[].receivedDegree`.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{FormError, FormResult};

/// A segment in a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object property access: `.foo`
    Key(String),
    /// Array index access: `[0]`
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, ".{}", k),
            PathSegment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// A concrete path into a section document.
///
/// # Examples
///
/// ```
/// use formdoc_core::path::FieldPath;
///
/// let built = FieldPath::root().key("entries").index(0).key("schoolName");
/// let parsed: FieldPath = "entries[0].schoolName".parse().unwrap();
/// assert_eq!(built, parsed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The empty path (addresses the document root).
    pub fn root() -> Self {
        FieldPath {
            segments: Vec::new(),
        }
    }

    /// Build a path from segments.
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        FieldPath { segments }
    }

    /// The path segments.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for the root (empty) path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a key segment (builder pattern).
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Append an index segment (builder pattern).
    pub fn index(mut self, idx: usize) -> Self {
        self.segments.push(PathSegment::Index(idx));
        self
    }

    /// Parent path, or `None` for the root.
    pub fn parent(&self) -> Option<FieldPath> {
        if self.segments.is_empty() {
            None
        } else {
            let mut parent = self.clone();
            parent.segments.pop();
            Some(parent)
        }
    }

    /// Last segment, or `None` for the root.
    pub fn last_segment(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Last key segment's name, if the path ends in a key.
    pub fn last_key(&self) -> Option<&str> {
        match self.segments.last() {
            Some(PathSegment::Key(k)) => Some(k.as_str()),
            _ => None,
        }
    }

    /// Copy of this path with a leading `key` segment removed, bringing a
    /// section-key-prefixed path (`section12.entries[0]...`) into the
    /// body-relative form (`entries[0]...`). Paths not carrying the key
    /// are returned unchanged.
    pub fn strip_leading_key(&self, key: &str) -> FieldPath {
        match self.segments.first() {
            Some(PathSegment::Key(k)) if k == key => FieldPath {
                segments: self.segments[1..].to_vec(),
            },
            _ => self.clone(),
        }
    }

    /// Copy of this path with a trailing `value` key segment removed.
    ///
    /// Field writes address `...field.value` by convention; traversal
    /// operates on the field node itself.
    pub fn without_value_suffix(&self) -> FieldPath {
        match self.segments.last() {
            Some(PathSegment::Key(k)) if k == "value" => {
                let mut stripped = self.clone();
                stripped.segments.pop();
                stripped
            }
            _ => self.clone(),
        }
    }
}

impl FromStr for FieldPath {
    type Err = FormError;

    fn from_str(s: &str) -> FormResult<Self> {
        let segments = parse_segments(s, false)?
            .into_iter()
            .map(|seg| match seg {
                PatternSegment::Key(k) => Ok(PathSegment::Key(k)),
                PatternSegment::Index(i) => Ok(PathSegment::Index(i)),
                PatternSegment::AnyIndex => {
                    Err(FormError::malformed_path(s, "empty index in concrete path"))
                }
            })
            .collect::<FormResult<_>>()?;
        Ok(FieldPath { segments })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.segments {
            match seg {
                PathSegment::Key(k) => {
                    if !first {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", k)?;
                }
                PathSegment::Index(i) => write!(f, "[{}]", i)?,
            }
            first = false;
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// A segment in a path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternSegment {
    /// Object property access: `.foo`
    Key(String),
    /// A specific array index: `[0]`
    Index(usize),
    /// Any array index: `[]`
    AnyIndex,
}

/// A path pattern: the concrete grammar plus `[]` any-index subscripts.
///
/// Used by cascade maps and validation rulesets, where one declaration
/// targets the same field in every entry of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathPattern {
    segments: Vec<PatternSegment>,
}

impl PathPattern {
    /// The pattern segments.
    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// True if `path` matches this pattern segment-for-segment.
    pub fn matches(&self, path: &FieldPath) -> bool {
        if self.segments.len() != path.segments().len() {
            return false;
        }
        self.segments
            .iter()
            .zip(path.segments())
            .all(|(pat, seg)| match (pat, seg) {
                (PatternSegment::Key(a), PathSegment::Key(b)) => a == b,
                (PatternSegment::Index(a), PathSegment::Index(b)) => a == b,
                (PatternSegment::AnyIndex, PathSegment::Index(_)) => true,
                _ => false,
            })
    }
}

impl FromStr for PathPattern {
    type Err = FormError;

    fn from_str(s: &str) -> FormResult<Self> {
        Ok(PathPattern {
            segments: parse_segments(s, true)?,
        })
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.segments {
            match seg {
                PatternSegment::Key(k) => {
                    if !first {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", k)?;
                }
                PatternSegment::Index(i) => write!(f, "[{}]", i)?,
                PatternSegment::AnyIndex => write!(f, "[]")?,
            }
            first = false;
        }
        Ok(())
    }
}

impl Serialize for PathPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PathPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

// =============================================================================
// Shared parser
// =============================================================================

/// Parse the dotted/bracketed grammar into pattern segments, the superset
/// of the concrete grammar. `allow_any_index` admits empty `[]` subscripts
/// (pattern grammar only); with it false the result never contains
/// [`PatternSegment::AnyIndex`].
fn parse_segments(s: &str, allow_any_index: bool) -> FormResult<Vec<PatternSegment>> {
    let mut segments = Vec::new();
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;

    if s.is_empty() {
        return Ok(segments);
    }

    // Skip a single leading dot.
    if chars[0] == '.' {
        i = 1;
    }

    while i < chars.len() {
        if chars[i] == '.' {
            i += 1;
            if i >= chars.len() {
                return Err(FormError::malformed_path(
                    s,
                    format!("empty key at position {}", i),
                ));
            }
        }

        if chars[i] == '[' {
            let open = i;
            i += 1;
            let start = i;
            while i < chars.len() && chars[i] != ']' {
                i += 1;
            }
            if i >= chars.len() {
                return Err(FormError::malformed_path(
                    s,
                    format!("unclosed bracket at position {}", open),
                ));
            }
            let body: String = chars[start..i].iter().collect();
            i += 1; // consume ']'
            if body.is_empty() {
                if allow_any_index {
                    segments.push(PatternSegment::AnyIndex);
                } else {
                    return Err(FormError::malformed_path(
                        s,
                        format!("empty index at position {}", open),
                    ));
                }
            } else {
                let idx = body.parse::<usize>().map_err(|_| {
                    FormError::malformed_path(
                        s,
                        format!("invalid index '{}' at position {}", body, start),
                    )
                })?;
                segments.push(PatternSegment::Index(idx));
            }
        } else if chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '-' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '-')
            {
                i += 1;
            }
            let key: String = chars[start..i].iter().collect();
            segments.push(PatternSegment::Key(key));
        } else {
            return Err(FormError::malformed_path(
                s,
                format!("unexpected character '{}' at position {}", chars[i], i),
            ));
        }
    }

    Ok(segments)
}
