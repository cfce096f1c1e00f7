//! Rule-driven validation: completeness checks computed as data.
//!
//! Validation never fails an operation. The engine walks the document in
//! schema order, evaluates a declarative ruleset at each site, and returns
//! every finding in one [`ValidationOutcome`]. `Err` is reserved for
//! structural problems (a rule naming a field the schema does not have, or
//! a document shape that disagrees with the schema).
//!
//! Output is deterministic: sites are visited in schema member order with
//! entries in positional order, and rules fire in declaration order at each
//! site, so the same document and ruleset always produce the same findings
//! in the same order.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use formdoc_core::document::{EntryList, Node, SectionDocument};
use formdoc_core::error::{FormError, FormResult};
use formdoc_core::field::{Field, YesNo};
use formdoc_core::path::{FieldPath, PathPattern, PathSegment, PatternSegment};
use formdoc_core::schema::{NodeTemplate, SectionSchema};

static MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0[1-9]|1[0-2])/\d{4}$").unwrap()
});
static MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0[1-9]|1[0-2])/(0[1-9]|[12]\d|3[01])/\d{4}$").unwrap()
});
static TELEPHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\(?\d{3}\)?[ -]?\d{3}-?\d{4}$").unwrap()
});
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap()
});
static ZIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5}(-\d{4})?$").unwrap());

/// Named value formats a `Pattern` rule can demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternName {
    /// `MM/YYYY`, year within the plausible window.
    MonthYear,
    /// `MM/DD/YYYY`, year within the plausible window.
    MonthDayYear,
    /// US telephone: `(555) 123-4567`, `555-123-4567`, `5551234567`.
    Telephone,
    /// Email address.
    Email,
    /// US ZIP: `08901` or `08901-1234`.
    Zip,
}

impl PatternName {
    /// True when `text` satisfies this format.
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            PatternName::MonthYear => MONTH_YEAR.is_match(text) && year_in_window(text),
            PatternName::MonthDayYear => {
                MONTH_DAY_YEAR.is_match(text) && year_in_window(text)
            }
            PatternName::Telephone => TELEPHONE.is_match(text),
            PatternName::Email => EMAIL.is_match(text),
            PatternName::Zip => ZIP.is_match(text),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            PatternName::MonthYear => "MM/YYYY",
            PatternName::MonthDayYear => "MM/DD/YYYY",
            PatternName::Telephone => "telephone",
            PatternName::Email => "email",
            PatternName::Zip => "ZIP code",
        }
    }
}

/// Year window for date formats: 1900 through ten years from now. The date
/// text keeps its year in the final four characters.
fn year_in_window(text: &str) -> bool {
    let year: i32 = match text.get(text.len().saturating_sub(4)..) {
        Some(tail) => match tail.parse() {
            Ok(y) => y,
            Err(_) => return false,
        },
        None => return false,
    };
    (1900..=Utc::now().year() + 10).contains(&year)
}

/// Finding severity. Errors make the outcome invalid; warnings do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks submission.
    Error,
    /// Advisory only.
    Warning,
}

/// The check a rule performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleKind {
    /// Fields (or collections) matching `target` must be non-empty when
    /// the gate at `gate` is affirmative. Open `[]` indices in the gate
    /// bind to the matched site's indices, so one rule covers a per-entry
    /// gate in every entry.
    RequiredIfGate {
        /// Pattern of the governing gate field.
        gate: PathPattern,
        /// Sites the requirement applies to.
        target: PathPattern,
    },
    /// Fields matching `target` must be non-empty unless the sibling flag
    /// named `flag` is set (an "estimated"/"not applicable" checkbox).
    RequiredUnlessFlag {
        /// Sibling member name of the exempting flag.
        flag: String,
        /// Sites the requirement applies to.
        target: PathPattern,
    },
    /// Non-empty text at `target` must satisfy `format`.
    Pattern {
        /// Sites the format applies to.
        target: PathPattern,
        /// Required format.
        format: PatternName,
    },
    /// Collections matching `collection` must hold at least one entry
    /// while the gate at `gate` is affirmative.
    GateRequiresEntries {
        /// Pattern of the governing gate field.
        gate: PathPattern,
        /// The gated collection.
        collection: PathPattern,
    },
    /// Collections matching `collection` must be empty while the gate at
    /// `gate` is negative.
    EntriesRequireGate {
        /// The gated collection.
        collection: PathPattern,
        /// Pattern of the governing gate field.
        gate: PathPattern,
    },
    /// Fields matching `target` must be non-empty when the sibling member
    /// named `sibling` carries the text `equals` (e.g. an "Other" choice
    /// requiring an explanation).
    RequiredIfSibling {
        /// Sites the requirement applies to.
        target: PathPattern,
        /// Sibling member name to inspect.
        sibling: String,
        /// Text the sibling must equal for the requirement to apply.
        equals: String,
    },
}

/// One validation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Severity of the findings this rule produces.
    pub severity: Severity,
    /// The check.
    #[serde(flatten)]
    pub kind: RuleKind,
}

/// The declarative ruleset for one section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    /// Rules in declaration order.
    pub rules: Vec<Rule>,
}

impl Ruleset {
    /// A ruleset with the given rules.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }
}

/// One finding at one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// Concrete path of the site the finding is anchored to.
    pub path: String,
    /// Human-readable message.
    pub message: String,
    /// Finding severity.
    pub severity: Severity,
}

/// The result of a validation pass. Plain data, never an `Err`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Findings that block submission.
    pub errors: Vec<FieldIssue>,
    /// Advisory findings.
    pub warnings: Vec<FieldIssue>,
}

impl ValidationOutcome {
    /// An outcome with no findings.
    pub fn ok() -> Self {
        Self::default()
    }

    /// True when no errors were found (warnings do not count).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record a finding under its severity.
    pub fn push(&mut self, issue: FieldIssue) {
        match issue.severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }

    /// Fold another outcome's findings into this one, preserving order.
    pub fn merge(&mut self, other: ValidationOutcome) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// A rule evaluation site: one field or one collection, at a concrete path.
enum Site<'a> {
    Field { path: FieldPath, field: &'a Field },
    Collection { path: FieldPath, list: &'a EntryList },
}

impl Site<'_> {
    fn path(&self) -> &FieldPath {
        match self {
            Site::Field { path, .. } | Site::Collection { path, .. } => path,
        }
    }
}

/// Stateless engine evaluating rulesets against documents of one section.
#[derive(Clone)]
pub struct ValidationEngine {
    schema: Arc<SectionSchema>,
}

impl ValidationEngine {
    /// Create an engine for the given section schema.
    pub fn new(schema: Arc<SectionSchema>) -> Self {
        Self { schema }
    }

    /// Evaluate `ruleset` against the whole document.
    pub fn validate(
        &self,
        doc: &SectionDocument,
        ruleset: &Ruleset,
    ) -> FormResult<ValidationOutcome> {
        let mut sites = Vec::new();
        collect_sites(&self.schema.root.members, &doc.root, &FieldPath::root(), &mut sites)?;
        let outcome = self.evaluate(doc, &sites, ruleset)?;
        debug!(
            target: "formdoc::validate",
            section = %doc.key,
            errors = outcome.errors.len(),
            warnings = outcome.warnings.len(),
            "validation pass complete"
        );
        Ok(outcome)
    }

    /// Evaluate `ruleset` against a single entry of the collection at
    /// `collection`. Site paths are fully concrete, so rules targeting
    /// entry members via `[]` patterns apply as in a full pass.
    pub fn validate_entry(
        &self,
        doc: &SectionDocument,
        collection: &FieldPath,
        index: usize,
        ruleset: &Ruleset,
    ) -> FormResult<ValidationOutcome> {
        let tpl = self.schema.collection_at(collection)?;
        let list = doc.collection_at(collection)?;
        let entry = list.get(index).ok_or_else(|| {
            FormError::index_out_of_bounds(&tpl.name, index, list.len())
        })?;
        let base = collection.strip_leading_key(&doc.key).index(index);
        let mut sites = Vec::new();
        collect_sites(&tpl.entry.members, &entry.fields, &base, &mut sites)?;
        self.evaluate(doc, &sites, ruleset)
    }

    fn evaluate(
        &self,
        doc: &SectionDocument,
        sites: &[Site<'_>],
        ruleset: &Ruleset,
    ) -> FormResult<ValidationOutcome> {
        let mut outcome = ValidationOutcome::ok();
        for site in sites {
            for rule in &ruleset.rules {
                self.apply_rule(doc, site, rule, &mut outcome)?;
            }
        }
        Ok(outcome)
    }

    fn apply_rule(
        &self,
        doc: &SectionDocument,
        site: &Site<'_>,
        rule: &Rule,
        outcome: &mut ValidationOutcome,
    ) -> FormResult<()> {
        match &rule.kind {
            RuleKind::RequiredIfGate { gate, target } => {
                if !target.matches(site.path()) {
                    return Ok(());
                }
                let gate_path = bind_gate(gate, site.path())?;
                let gate_value = doc.field_at(&gate_path)?.value.as_yes_no();
                if gate_value != Some(YesNo::Yes) {
                    return Ok(());
                }
                match site {
                    Site::Field { path, field } if field.value.is_empty() => {
                        outcome.push(FieldIssue {
                            path: path.to_string(),
                            message: format!("required when '{}' is YES", gate_path),
                            severity: rule.severity,
                        });
                    }
                    Site::Collection { path, list } if list.is_empty() => {
                        outcome.push(FieldIssue {
                            path: path.to_string(),
                            message: format!(
                                "at least one entry is required when '{}' is YES",
                                gate_path
                            ),
                            severity: rule.severity,
                        });
                    }
                    _ => {}
                }
            }
            RuleKind::RequiredUnlessFlag { flag, target } => {
                let Site::Field { path, field } = site else { return Ok(()) };
                if !target.matches(path) || !field.value.is_empty() {
                    return Ok(());
                }
                let flag_path = path.parent().unwrap_or_default().key(flag.clone());
                let flag_field = doc.field_at(&flag_path)?;
                let exempt = flag_field.value.as_flag().ok_or_else(|| {
                    FormError::shape_mismatch(
                        flag_path.to_string(),
                        format!("'{}' is not a flag field", flag),
                    )
                })?;
                if !exempt {
                    outcome.push(FieldIssue {
                        path: path.to_string(),
                        message: format!("required unless '{}' is checked", flag),
                        severity: rule.severity,
                    });
                }
            }
            RuleKind::Pattern { target, format } => {
                let Site::Field { path, field } = site else { return Ok(()) };
                if !target.matches(path) {
                    return Ok(());
                }
                // Empty values are the territory of required-ness rules.
                let Some(text) = field.value.as_text() else { return Ok(()) };
                if !text.is_empty() && !format.is_match(text) {
                    outcome.push(FieldIssue {
                        path: path.to_string(),
                        message: format!(
                            "'{}' does not match the {} format",
                            text,
                            format.describe()
                        ),
                        severity: rule.severity,
                    });
                }
            }
            RuleKind::GateRequiresEntries { gate, collection } => {
                let Site::Collection { path, list } = site else { return Ok(()) };
                if !collection.matches(path) {
                    return Ok(());
                }
                let gate_path = bind_gate(gate, site.path())?;
                let gate_value = doc.field_at(&gate_path)?.value.as_yes_no();
                if gate_value == Some(YesNo::Yes) && list.is_empty() {
                    outcome.push(FieldIssue {
                        path: path.to_string(),
                        message: format!("'{}' is YES but no entries are present", gate_path),
                        severity: rule.severity,
                    });
                }
            }
            RuleKind::EntriesRequireGate { collection, gate } => {
                let Site::Collection { path, list } = site else { return Ok(()) };
                if !collection.matches(path) {
                    return Ok(());
                }
                let gate_path = bind_gate(gate, site.path())?;
                let gate_value = doc.field_at(&gate_path)?.value.as_yes_no();
                if gate_value == Some(YesNo::No) && !list.is_empty() {
                    outcome.push(FieldIssue {
                        path: path.to_string(),
                        message: format!("entries present while '{}' is NO", gate_path),
                        severity: rule.severity,
                    });
                }
            }
            RuleKind::RequiredIfSibling {
                target,
                sibling,
                equals,
            } => {
                let Site::Field { path, field } = site else { return Ok(()) };
                if !target.matches(path) || !field.value.is_empty() {
                    return Ok(());
                }
                let sibling_path = path.parent().unwrap_or_default().key(sibling.clone());
                let sibling_field = doc.field_at(&sibling_path)?;
                if sibling_field.value.as_text() == Some(equals.as_str()) {
                    outcome.push(FieldIssue {
                        path: path.to_string(),
                        message: format!("required when '{}' is '{}'", sibling, equals),
                        severity: rule.severity,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Concretize a gate pattern against the site it governs: each open `[]`
/// index takes the next index from the site's own path, so
/// `entries[].receivedDegree` evaluated at `entries[1].degrees` resolves
/// to `entries[1].receivedDegree`.
fn bind_gate(pattern: &PathPattern, site: &FieldPath) -> FormResult<FieldPath> {
    let mut site_indices = site.segments().iter().filter_map(|s| match s {
        PathSegment::Index(i) => Some(*i),
        _ => None,
    });
    let mut segments = Vec::with_capacity(pattern.segments().len());
    for seg in pattern.segments() {
        segments.push(match seg {
            PatternSegment::Key(k) => PathSegment::Key(k.clone()),
            PatternSegment::Index(i) => PathSegment::Index(*i),
            PatternSegment::AnyIndex => {
                PathSegment::Index(site_indices.next().ok_or_else(|| {
                    FormError::shape_mismatch(
                        pattern.to_string(),
                        format!("gate pattern has more open indices than site '{}'", site),
                    )
                })?)
            }
        });
    }
    Ok(FieldPath::from_segments(segments))
}

/// Walk schema members and document nodes together, recording every field
/// and collection site in schema order. Entries are visited in positional
/// order; a missing member or a kind disagreement is a `ShapeMismatch`.
fn collect_sites<'a>(
    members: &[NodeTemplate],
    map: &'a std::collections::BTreeMap<String, Node>,
    base: &FieldPath,
    out: &mut Vec<Site<'a>>,
) -> FormResult<()> {
    for member in members {
        let path = base.clone().key(member.name().to_string());
        let node = map.get(member.name()).ok_or_else(|| {
            FormError::shape_mismatch(
                path.to_string(),
                format!("document is missing member '{}'", member.name()),
            )
        })?;
        match (member, node) {
            (NodeTemplate::Field(_), Node::Field(field)) => {
                out.push(Site::Field { path, field });
            }
            (NodeTemplate::Group(g), Node::Group(inner)) => {
                collect_sites(&g.members, inner, &path, out)?;
            }
            (NodeTemplate::Collection(c), Node::Collection(list)) => {
                out.push(Site::Collection {
                    path: path.clone(),
                    list,
                });
                for (ix, entry) in list.iter().enumerate() {
                    let entry_path = path.clone().index(ix);
                    collect_sites(&c.entry.members, &entry.fields, &entry_path, out)?;
                }
            }
            (tpl, node) => {
                return Err(FormError::shape_mismatch(
                    path.to_string(),
                    format!(
                        "document has {} where schema declares '{}'",
                        node.kind_name(),
                        tpl.name()
                    ),
                ));
            }
        }
    }
    Ok(())
}
