//! Validation behavior through the session facade: findings as data,
//! severities, exemptions, and determinism.

use formdoc::{FieldValue, Severity, YesNo};

use crate::fixtures::school_session;

#[test]
fn blank_gated_entry_reports_every_requirement() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    let outcome = s.validate().unwrap();
    assert!(!outcome.is_valid());
    let paths: Vec<&str> = outcome.errors.iter().map(|i| i.path.as_str()).collect();
    assert!(paths.contains(&"entries[0].schoolName"));
    assert!(paths.contains(&"entries[0].fromDate"));
    // Unconditional requirements only: no degree findings while that gate
    // is NO, no otherSchoolType finding while schoolType is blank.
    assert!(!paths.iter().any(|p| p.contains("degrees")));
    assert!(!paths.contains(&"entries[0].otherSchoolType"));
}

#[test]
fn estimated_flag_exempts_the_from_date() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s.update_field("entries[0].schoolName", "Rutgers University").unwrap();
    let outcome = s.validate().unwrap();
    assert!(outcome.errors.iter().any(|i| i.path == "entries[0].fromDate"));

    s.update_field("entries[0].estimatedDates", true).unwrap();
    let outcome = s.validate().unwrap();
    assert!(outcome.is_valid(), "unexpected findings: {:?}", outcome.errors);
}

#[test]
fn other_school_type_demands_an_explanation() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s.update_field("entries[0].schoolType", FieldValue::Choice("Other".into()))
        .unwrap();
    let outcome = s.validate().unwrap();
    assert!(outcome
        .errors
        .iter()
        .any(|i| i.path == "entries[0].otherSchoolType" && i.message.contains("Other")));

    let mut s2 = school_session();
    s2.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s2.update_field("entries[0].schoolType", FieldValue::Choice("High School".into()))
        .unwrap();
    let outcome = s2.validate().unwrap();
    assert!(!outcome
        .errors
        .iter()
        .any(|i| i.path == "entries[0].otherSchoolType"));
}

#[test]
fn to_date_format_is_only_a_warning() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s.update_field("entries[0].schoolName", "Rutgers University").unwrap();
    s.update_field("entries[0].fromDate", "09/2015").unwrap();
    s.update_field("entries[0].toDate", "May 2019").unwrap();

    let outcome = s.validate().unwrap();
    assert!(outcome.is_valid());
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].path, "entries[0].toDate");
    assert_eq!(outcome.warnings[0].severity, Severity::Warning);
}

#[test]
fn from_date_format_violation_is_an_error() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s.update_field("entries[0].fromDate", "13/2015").unwrap();
    let outcome = s.validate().unwrap();
    assert!(outcome
        .errors
        .iter()
        .any(|i| i.path == "entries[0].fromDate" && i.message.contains("MM/YYYY")));
}

#[test]
fn degree_requirements_follow_their_entry_gate() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s.add_entry("entries").unwrap();
    // Only entry 1 claims a degree.
    s.set_gate("entries[1].receivedDegree", YesNo::Yes).unwrap();

    let outcome = s.validate().unwrap();
    let degree_findings: Vec<&str> = outcome
        .errors
        .iter()
        .filter(|i| i.path.contains("degrees"))
        .map(|i| i.path.as_str())
        .collect();
    assert_eq!(degree_findings, vec!["entries[1].degrees[0].degreeType"]);
}

#[test]
fn findings_follow_schema_traversal_order() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s.add_entry("entries").unwrap();

    let first = s.validate().unwrap();
    let second = s.validate().unwrap();
    assert_eq!(first, second);

    let paths: Vec<&str> = first.errors.iter().map(|i| i.path.as_str()).collect();
    let entry0: Vec<usize> = paths
        .iter()
        .enumerate()
        .filter(|(_, p)| p.starts_with("entries[0]"))
        .map(|(ix, _)| ix)
        .collect();
    let entry1: Vec<usize> = paths
        .iter()
        .enumerate()
        .filter(|(_, p)| p.starts_with("entries[1]"))
        .map(|(ix, _)| ix)
        .collect();
    assert!(entry0.iter().max() < entry1.iter().min());
}

#[test]
fn validate_entry_isolates_one_entry() {
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    s.update_field("entries[0].schoolName", "Rutgers University").unwrap();
    s.update_field("entries[0].fromDate", "09/2015").unwrap();
    s.add_entry("entries").unwrap();

    let complete = s.validate_entry("entries", 0).unwrap();
    assert!(complete.is_valid(), "unexpected findings: {:?}", complete.errors);

    let blank = s.validate_entry("entries", 1).unwrap();
    assert!(!blank.is_valid());
    assert!(blank.errors.iter().all(|i| i.path.starts_with("entries[1]")));
}

#[test]
fn hand_built_inconsistent_state_is_surfaced() {
    // Bypass the cascade by committing a hand-edited snapshot: entries
    // present while the gate is NO.
    let mut s = school_session();
    s.set_gate("hasAttendedSchool", YesNo::Yes).unwrap();
    let mut draft = s.snapshot();
    draft
        .field_at_mut(&"hasAttendedSchool".parse().unwrap())
        .unwrap()
        .value = FieldValue::YesNo(YesNo::No);
    s.commit(draft).unwrap();

    let outcome = s.validate().unwrap();
    assert!(outcome
        .errors
        .iter()
        .any(|i| i.path == "entries" && i.message.contains("NO")));
}
