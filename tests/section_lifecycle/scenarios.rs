//! End-to-end editing scenarios through the session facade.

use formdoc::{FieldValue, FormError, RemoveOutcome, WriteOutcome, YesNo};

use crate::fixtures::school_session;

#[test]
fn full_lifecycle_to_a_valid_section() {
    let mut s = school_session();

    // Default state is valid: gate NO, no entries.
    assert!(s.validate().unwrap().is_valid());

    // Flip the gate; the cascade creates one blank entry.
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    assert_eq!(s.document().collection_at(&"entries".parse().unwrap()).unwrap().len(), 1);

    // The blank entry fails validation as data, not as an error.
    let outcome = s.validate().unwrap();
    assert!(!outcome.is_valid());

    // Fill the entry.
    s.update_field("entries[0].schoolName.value", "Rutgers University").unwrap();
    s.update_field("entries[0].schoolType", FieldValue::Choice("College".into())).unwrap();
    s.update_field("entries[0].fromDate", "09/2015").unwrap();
    s.update_field("entries[0].toDate", "05/2019").unwrap();

    // Degree sub-collection via its own gate.
    s.set_gate("entries[0].receivedDegree", YesNo::Yes).unwrap();
    s.update_field(
        "entries[0].degrees[0].degreeType",
        FieldValue::Choice("Bachelor's".into()),
    )
    .unwrap();
    s.update_field("entries[0].degrees[0].dateAwarded", "05/2019").unwrap();

    let outcome = s.validate().unwrap();
    assert!(outcome.is_valid(), "unexpected findings: {:?}", outcome.errors);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn section_prefixed_paths_behave_like_relative_ones() {
    let mut s = school_session();
    // Writing the gate through the full section-prefixed spelling drives
    // the same cascade as the body-relative one.
    s.update_field("section12.hasAttendedSchool.value", FieldValue::YesNo(YesNo::Yes))
        .unwrap();
    assert_eq!(s.document().collection_at(&"entries".parse().unwrap()).unwrap().len(), 1);
    assert!(!s.validate().unwrap().is_valid());

    s.update_field("section12.entries[0].schoolName.value", "Rutgers University")
        .unwrap();
    assert_eq!(
        s.field_value("entries[0].schoolName").unwrap(),
        &FieldValue::Text("Rutgers University".into())
    );

    s.update_field("section12.hasAttendedSchool", FieldValue::YesNo(YesNo::No))
        .unwrap();
    assert!(s.document().collection_at(&"entries".parse().unwrap()).unwrap().is_empty());
}

#[test]
fn adding_an_entry_implies_the_affirmative_gate() {
    let mut s = school_session();
    assert_eq!(
        s.field_value("hasAttendedSchool").unwrap(),
        &FieldValue::YesNo(YesNo::No)
    );
    s.add_entry("entries").unwrap();
    assert_eq!(
        s.field_value("hasAttendedSchool").unwrap(),
        &FieldValue::YesNo(YesNo::Yes)
    );
    assert_eq!(s.document().collection_at(&"entries".parse().unwrap()).unwrap().len(), 1);
    // Gate and entries agree, so only the blank-entry requirements remain.
    let outcome = s.validate().unwrap();
    assert!(outcome.errors.iter().all(|i| i.path.starts_with("entries[0]")));
}

#[test]
fn negative_gate_discards_all_entry_data() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s.update_field("entries[0].schoolName", "Rutgers University").unwrap();
    s.add_entry("entries").unwrap();
    s.update_field("entries[1].schoolName", "Middlesex County College").unwrap();

    s.set_gate("hasAttendedSchool", YesNo::No).unwrap();
    let entries = s.document().collection_at(&"entries".parse().unwrap()).unwrap();
    assert!(entries.is_empty());
    assert!(s.validate().unwrap().is_valid());

    // Flipping back starts from a blank entry; the discarded data is gone.
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    assert_eq!(
        s.field_value("entries[0].schoolName").unwrap(),
        &FieldValue::Text(String::new())
    );
}

#[test]
fn collection_bound_is_enforced() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    for _ in 1..4 {
        s.add_entry("entries").unwrap();
    }
    let before = s.snapshot();
    let err = s.add_entry("entries").unwrap_err();
    assert_eq!(err, FormError::collection_full("entries", 4));
    assert_eq!(s.document(), &before);
}

#[test]
fn nested_collection_bound_is_enforced() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s.set_gate("entries[0].receivedDegree", YesNo::Yes).unwrap();
    s.add_entry("entries[0].degrees").unwrap();
    let err = s.add_entry("entries[0].degrees").unwrap_err();
    assert_eq!(err, FormError::collection_full("degrees", 2));
}

#[test]
fn removing_the_last_entry_replaces_it_while_gated() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s.update_field("entries[0].schoolName", "Rutgers University").unwrap();

    let outcome = s.remove_entry("entries", 0).unwrap();
    assert_eq!(outcome, RemoveOutcome::Replaced);
    let entries = s.document().collection_at(&"entries".parse().unwrap()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        s.field_value("entries[0].schoolName").unwrap(),
        &FieldValue::Text(String::new())
    );
}

#[test]
fn removal_reindexes_and_preserves_later_data() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s.update_field("entries[0].schoolName", "First").unwrap();
    s.add_entry("entries").unwrap();
    s.update_field("entries[1].schoolName", "Second").unwrap();
    s.add_entry("entries").unwrap();
    s.update_field("entries[2].schoolName", "Third").unwrap();

    assert_eq!(s.remove_entry("entries", 1).unwrap(), RemoveOutcome::Removed);
    assert_eq!(
        s.field_value("entries[0].schoolName").unwrap(),
        &FieldValue::Text("First".into())
    );
    assert_eq!(
        s.field_value("entries[1].schoolName").unwrap(),
        &FieldValue::Text("Third".into())
    );
    let err = s.field_value("entries[2].schoolName").unwrap_err();
    assert_eq!(err, FormError::index_out_of_bounds("entries", 2, 2));
}

#[test]
fn field_ids_do_not_shift_with_removal() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s.add_entry("entries").unwrap();
    let second_id = s
        .document()
        .field_at(&"entries[1].schoolName".parse().unwrap())
        .unwrap()
        .id
        .clone();
    s.remove_entry("entries", 0).unwrap();
    // The surviving entry moved to index 0 but kept its synthesized ids.
    let surviving_id = &s
        .document()
        .field_at(&"entries[0].schoolName".parse().unwrap())
        .unwrap()
        .id;
    assert_eq!(surviving_id, &second_id);
}

#[test]
fn repeated_writes_do_not_change_the_document() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    assert_eq!(
        s.update_field("entries[0].schoolName", "Rutgers University").unwrap(),
        WriteOutcome::Applied
    );
    let snapshot = s.snapshot();
    assert_eq!(
        s.update_field("entries[0].schoolName", "Rutgers University").unwrap(),
        WriteOutcome::Unchanged
    );
    assert_eq!(s.document(), &snapshot);
}

#[test]
fn failed_operations_leave_the_document_untouched() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    let before = s.snapshot();

    assert!(s.update_field("entries[5].schoolName", "x").is_err());
    assert!(s.update_field("entries[0].noSuchField", "x").is_err());
    assert!(s
        .update_field("entries[0].schoolName", FieldValue::Flag(true))
        .is_err());
    assert!(s.remove_entry("entries", 9).is_err());
    assert!(s.update_field("entries[0]]bad", "x").is_err());

    assert_eq!(s.document(), &before);
}

#[test]
fn malformed_paths_are_structured_errors() {
    let mut s = school_session();
    for bad in ["entries[", "entries[x].schoolName", "entries..schoolName", "entries."] {
        let err = s.update_field(bad, "x").unwrap_err();
        assert!(
            matches!(err, FormError::MalformedPath { .. }),
            "'{}' gave {:?}",
            bad,
            err
        );
    }
}

#[test]
fn reset_restores_the_canonical_default() {
    let mut s = school_session();
    let zero = s.snapshot();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s.update_field("entries[0].schoolName", "Rutgers University").unwrap();
    s.set_gate("entries[0].receivedDegree", YesNo::Yes).unwrap();
    s.reset();
    assert_eq!(s.document(), &zero);
}

#[test]
fn document_round_trips_through_json() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s.update_field("entries[0].schoolName", "Rutgers University").unwrap();
    let json = serde_json::to_string_pretty(s.document()).unwrap();
    let restored: formdoc::SectionDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, s.document());

    // Restored documents stay editable.
    s.commit(restored).unwrap();
    s.update_field("entries[0].fromDate", "09/2015").unwrap();
}
