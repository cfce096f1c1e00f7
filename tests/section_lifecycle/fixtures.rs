//! The school-history section fixture: schema, cascade map, and ruleset,
//! all loaded from JSON the way production section definitions are.

use std::sync::Once;

use formdoc::{CascadeMap, Ruleset, SectionSchema, SectionSession};

static TRACING: Once = Once::new();

/// Route engine logs through the libtest capture.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Section 12 (school history): a gated collection of schools, each with a
/// nested gated collection of degrees.
pub fn school_schema() -> SectionSchema {
    serde_json::from_value(serde_json::json!({
        "id": 12,
        "key": "section12",
        "root": {
            "members": [
                {
                    "node": "field",
                    "name": "hasAttendedSchool",
                    "type": "radio",
                    "label": "Have you attended any schools?",
                    "default": { "kind": "yesno", "value": "NO" },
                    "page": 11
                },
                {
                    "node": "collection",
                    "name": "entries",
                    "max_entries": 4,
                    "gate": "hasAttendedSchool",
                    "entry": {
                        "members": [
                            {
                                "node": "field",
                                "name": "schoolName",
                                "type": "text",
                                "label": "Name of school",
                                "default": { "kind": "text", "value": "" },
                                "page": 11
                            },
                            {
                                "node": "field",
                                "name": "schoolType",
                                "type": "dropdown",
                                "label": "Type of school",
                                "default": { "kind": "choice", "value": "" },
                                "page": 11
                            },
                            {
                                "node": "field",
                                "name": "otherSchoolType",
                                "type": "text",
                                "label": "Provide explanation",
                                "default": { "kind": "text", "value": "" },
                                "page": 11
                            },
                            {
                                "node": "field",
                                "name": "fromDate",
                                "type": "text",
                                "label": "From date (Month/Year)",
                                "default": { "kind": "text", "value": "" },
                                "page": 11
                            },
                            {
                                "node": "field",
                                "name": "toDate",
                                "type": "text",
                                "label": "To date (Month/Year)",
                                "default": { "kind": "text", "value": "" },
                                "page": 11
                            },
                            {
                                "node": "field",
                                "name": "estimatedDates",
                                "type": "checkbox",
                                "label": "Estimated",
                                "default": { "kind": "flag", "value": false },
                                "page": 11
                            },
                            {
                                "node": "field",
                                "name": "receivedDegree",
                                "type": "radio",
                                "label": "Did you receive a degree or diploma?",
                                "default": { "kind": "yesno", "value": "NO" },
                                "page": 12
                            },
                            {
                                "node": "collection",
                                "name": "degrees",
                                "max_entries": 2,
                                "gate": "receivedDegree",
                                "entry": {
                                    "members": [
                                        {
                                            "node": "field",
                                            "name": "degreeType",
                                            "type": "dropdown",
                                            "label": "Type of degree",
                                            "default": { "kind": "choice", "value": "" },
                                            "page": 12
                                        },
                                        {
                                            "node": "field",
                                            "name": "otherDegree",
                                            "type": "text",
                                            "label": "Provide explanation",
                                            "default": { "kind": "text", "value": "" },
                                            "page": 12
                                        },
                                        {
                                            "node": "field",
                                            "name": "dateAwarded",
                                            "type": "text",
                                            "label": "Date awarded (Month/Year)",
                                            "default": { "kind": "text", "value": "" },
                                            "page": 12
                                        }
                                    ]
                                }
                            }
                        ]
                    }
                }
            ]
        }
    }))
    .expect("fixture schema is well-formed")
}

pub fn school_cascades() -> CascadeMap {
    serde_json::from_value(serde_json::json!({
        "rules": [
            {
                "trigger": "hasAttendedSchool",
                "effect": "gate_collection",
                "collection": "entries"
            },
            {
                "trigger": "entries[].receivedDegree",
                "effect": "gate_collection",
                "collection": "degrees"
            }
        ]
    }))
    .expect("fixture cascades are well-formed")
}

pub fn school_rules() -> Ruleset {
    serde_json::from_value(serde_json::json!({
        "rules": [
            {
                "severity": "error",
                "rule": "gate_requires_entries",
                "gate": "hasAttendedSchool",
                "collection": "entries"
            },
            {
                "severity": "error",
                "rule": "entries_require_gate",
                "collection": "entries",
                "gate": "hasAttendedSchool"
            },
            {
                "severity": "error",
                "rule": "required_if_gate",
                "gate": "hasAttendedSchool",
                "target": "entries[].schoolName"
            },
            {
                "severity": "error",
                "rule": "required_if_sibling",
                "target": "entries[].otherSchoolType",
                "sibling": "schoolType",
                "equals": "Other"
            },
            {
                "severity": "error",
                "rule": "required_unless_flag",
                "flag": "estimatedDates",
                "target": "entries[].fromDate"
            },
            {
                "severity": "error",
                "rule": "pattern",
                "target": "entries[].fromDate",
                "format": "month_year"
            },
            {
                "severity": "warning",
                "rule": "pattern",
                "target": "entries[].toDate",
                "format": "month_year"
            },
            {
                "severity": "error",
                "rule": "gate_requires_entries",
                "gate": "entries[].receivedDegree",
                "collection": "entries[].degrees"
            },
            {
                "severity": "error",
                "rule": "entries_require_gate",
                "collection": "entries[].degrees",
                "gate": "entries[].receivedDegree"
            },
            {
                "severity": "error",
                "rule": "required_if_gate",
                "gate": "entries[].receivedDegree",
                "target": "entries[].degrees[].degreeType"
            },
            {
                "severity": "error",
                "rule": "required_if_sibling",
                "target": "entries[].degrees[].otherDegree",
                "sibling": "degreeType",
                "equals": "Other"
            },
            {
                "severity": "error",
                "rule": "pattern",
                "target": "entries[].degrees[].dateAwarded",
                "format": "month_year"
            }
        ]
    }))
    .expect("fixture ruleset is well-formed")
}

/// A fresh session over the school-history section.
pub fn school_session() -> SectionSession {
    init_tracing();
    SectionSession::new(school_schema(), school_rules(), school_cascades())
}
