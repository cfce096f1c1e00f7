//! Shared fixtures for engine tests: a small school-history section with a
//! top-level gated collection and a nested gated sub-collection.

use formdoc_core::field::{FieldType, FieldValue, Rect, YesNo};
use formdoc_core::schema::{
    CollectionTemplate, FieldTemplate, GroupTemplate, NodeTemplate, SectionSchema,
};

pub fn text_field(name: &str) -> NodeTemplate {
    NodeTemplate::Field(FieldTemplate {
        name: name.to_string(),
        field_type: FieldType::Text,
        label: String::new(),
        default: FieldValue::Text(String::new()),
        rect: Rect::default(),
        page: 0,
    })
}

pub fn gate_field(name: &str) -> NodeTemplate {
    NodeTemplate::Field(FieldTemplate {
        name: name.to_string(),
        field_type: FieldType::Radio,
        label: String::new(),
        default: FieldValue::YesNo(YesNo::No),
        rect: Rect::default(),
        page: 0,
    })
}

pub fn school_schema() -> SectionSchema {
    SectionSchema {
        id: 12,
        key: "section12".to_string(),
        root: GroupTemplate {
            name: String::new(),
            members: vec![
                gate_field("hasAttendedSchool"),
                NodeTemplate::Collection(CollectionTemplate {
                    name: "entries".to_string(),
                    max_entries: 4,
                    gate: Some("hasAttendedSchool".to_string()),
                    entry: GroupTemplate {
                        name: String::new(),
                        members: vec![
                            text_field("schoolName"),
                            text_field("fromDate"),
                            gate_field("receivedDegree"),
                            NodeTemplate::Collection(CollectionTemplate {
                                name: "degrees".to_string(),
                                max_entries: 2,
                                gate: Some("receivedDegree".to_string()),
                                entry: GroupTemplate {
                                    name: String::new(),
                                    members: vec![text_field("degreeType")],
                                },
                            }),
                        ],
                    },
                }),
            ],
        },
    }
}
