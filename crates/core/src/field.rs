//! Field types: the atomic value containers at the leaves of a section
//! document.
//!
//! A field's value kind is fixed at creation time. Writes carrying a
//! different kind are rejected by the engines; there is no type migration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Presentational control type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text input.
    Text,
    /// Boolean checkbox.
    Checkbox,
    /// Single selection from a dropdown list.
    Dropdown,
    /// Single selection from a radio group.
    Radio,
    /// Textual date (`MM/YYYY` or `MM/DD/YYYY`), never parsed into a date value.
    Date,
    /// Telephone number.
    Telephone,
    /// Email address.
    Email,
    /// Numeric text (ZIP codes and similar).
    Numeric,
}

/// On-page geometry of a field control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// The affirmative/negative sentinel pair used by gate fields.
///
/// Serialized as the literal sentinels `"YES"` / `"NO"`. The default is
/// `No`: a freshly created document has every gate in the negative state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum YesNo {
    /// Affirmative sentinel (`"YES"`).
    Yes,
    /// Negative sentinel (`"NO"`).
    #[default]
    No,
}

impl YesNo {
    /// True for the affirmative sentinel.
    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }

    /// The wire sentinel for this value.
    pub fn as_str(self) -> &'static str {
        match self {
            YesNo::Yes => "YES",
            YesNo::No => "NO",
        }
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value kinds a field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Free text.
    Text,
    /// Boolean flag.
    Flag,
    /// Enumerated choice.
    Choice,
    /// Yes/no sentinel.
    YesNo,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Text => "text",
            ValueKind::Flag => "flag",
            ValueKind::Choice => "choice",
            ValueKind::YesNo => "yesno",
        };
        f.write_str(name)
    }
}

/// A field's semantic value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    /// Free text (also used for textual dates, phones, emails, ZIPs).
    Text(String),
    /// Checkbox state.
    Flag(bool),
    /// Dropdown/radio selection.
    Choice(String),
    /// Gate sentinel.
    YesNo(YesNo),
}

impl FieldValue {
    /// The kind of this value. Fixed per field instance at creation.
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Text(_) => ValueKind::Text,
            FieldValue::Flag(_) => ValueKind::Flag,
            FieldValue::Choice(_) => ValueKind::Choice,
            FieldValue::YesNo(_) => ValueKind::YesNo,
        }
    }

    /// True if this value counts as "not provided" for required-ness rules.
    ///
    /// Gates always carry a sentinel and therefore never count as empty;
    /// their required-ness is expressed through cross-field rules instead.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) => s.is_empty(),
            FieldValue::Flag(b) => !b,
            FieldValue::YesNo(_) => false,
        }
    }

    /// The textual content of `Text`/`Choice` values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Choice(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The flag state of a `Flag` value.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// The sentinel of a `YesNo` value.
    pub fn as_yes_no(&self) -> Option<YesNo> {
        match self {
            FieldValue::YesNo(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<YesNo> for FieldValue {
    fn from(v: YesNo) -> Self {
        FieldValue::YesNo(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Flag(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// The atomic value container: identifier, semantic value, and
/// presentational metadata. Leaf of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Synthesized identifier, unique within the owning document's
    /// flattened field set and stable across entry reindexing (entry ids,
    /// not positional indices, participate in the id).
    pub id: String,
    /// Member name within the owning group or entry.
    pub name: String,
    /// Current value. Kind is fixed at creation.
    pub value: FieldValue,
    /// Presentational control type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    /// On-page geometry.
    #[serde(default)]
    pub rect: Rect,
    /// Page number within the rendered form.
    #[serde(default)]
    pub page: u32,
}
