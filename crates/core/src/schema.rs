//! Declarative section schemas and the default-document factory.
//!
//! A schema describes one section's shape as configuration data: which
//! gate fields exist, which entry collections they govern, each
//! collection's maximum entry count, and every field's type, label, and
//! default. Schemas are serde-loadable so the 30+ per-section layouts stay
//! data, not code.
//!
//! Member order inside a [`GroupTemplate`] is significant: it defines the
//! document traversal order used for deterministic validation output.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::document::{Entry, EntryList, Node, SectionDocument};
use crate::error::{FormError, FormResult};
use crate::field::{Field, FieldType, FieldValue, Rect};
use crate::path::{FieldPath, PathSegment};

/// Template for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTemplate {
    /// Member name.
    pub name: String,
    /// Presentational control type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    /// Default value; also fixes the field's value kind.
    pub default: FieldValue,
    /// On-page geometry.
    #[serde(default)]
    pub rect: Rect,
    /// Page number within the rendered form.
    #[serde(default)]
    pub page: u32,
}

impl FieldTemplate {
    /// Instantiate a field under `parent_prefix` (the synthesized id is
    /// `{parent_prefix}.{name}`).
    fn instantiate(&self, parent_prefix: &str) -> Field {
        Field {
            id: format!("{}.{}", parent_prefix, self.name),
            name: self.name.clone(),
            value: self.default.clone(),
            field_type: self.field_type,
            label: self.label.clone(),
            rect: self.rect,
            page: self.page,
        }
    }
}

/// Template for a nested sub-object. Member order defines traversal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTemplate {
    /// Member name (unused for a schema root or an entry body).
    #[serde(default)]
    pub name: String,
    /// Ordered members.
    pub members: Vec<NodeTemplate>,
}

impl GroupTemplate {
    /// Look up a member by name.
    pub fn member(&self, name: &str) -> Option<&NodeTemplate> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// Instantiate all members under `prefix`.
    pub fn instantiate(&self, prefix: &str) -> BTreeMap<String, Node> {
        self.members
            .iter()
            .map(|m| (m.name().to_string(), m.instantiate(prefix)))
            .collect()
    }
}

/// Template for a repeatable entry collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionTemplate {
    /// Member name.
    pub name: String,
    /// Maximum entry count declared by the section.
    pub max_entries: usize,
    /// Name of the sibling gate field governing this collection, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<String>,
    /// Shape of one entry.
    pub entry: GroupTemplate,
}

impl CollectionTemplate {
    /// Build one default entry. `collection_prefix` is the field-id prefix
    /// of the collection itself (e.g. `section12.entries[3].degrees`); the
    /// entry's stable id, not its position, is appended to field ids.
    pub fn build_entry(&self, collection_prefix: &str, entry_id: u64) -> Entry {
        let now = Utc::now();
        Entry {
            id: entry_id,
            created_at: now,
            updated_at: now,
            fields: self
                .entry
                .instantiate(&format!("{}[{}]", collection_prefix, entry_id)),
        }
    }
}

/// A template node: field, group, or collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum NodeTemplate {
    /// Leaf field.
    Field(FieldTemplate),
    /// Nested sub-object.
    Group(GroupTemplate),
    /// Repeatable entry collection.
    Collection(CollectionTemplate),
}

impl NodeTemplate {
    /// The member name of this template.
    pub fn name(&self) -> &str {
        match self {
            NodeTemplate::Field(f) => &f.name,
            NodeTemplate::Group(g) => &g.name,
            NodeTemplate::Collection(c) => &c.name,
        }
    }

    /// Instantiate this node under `parent_prefix`. Collections start
    /// empty; groups are synthesized structurally complete.
    pub fn instantiate(&self, parent_prefix: &str) -> Node {
        match self {
            NodeTemplate::Field(f) => Node::Field(f.instantiate(parent_prefix)),
            NodeTemplate::Group(g) => {
                Node::Group(g.instantiate(&format!("{}.{}", parent_prefix, g.name)))
            }
            NodeTemplate::Collection(_) => Node::Collection(EntryList::new()),
        }
    }
}

/// Template walker cursor.
enum TCur<'a> {
    Members(&'a [NodeTemplate]),
    Tpl(&'a NodeTemplate),
}

/// One section's declarative schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSchema {
    /// Numeric section identifier.
    pub id: u32,
    /// Section key (e.g. `section12`).
    pub key: String,
    /// The section body.
    pub root: GroupTemplate,
}

impl SectionSchema {
    /// Produce the canonical zero state: every gate field present with its
    /// negative default, every collection empty, every field carrying its
    /// synthesized stable id. Any `reset` returns to exactly this document.
    pub fn create_default(&self) -> SectionDocument {
        SectionDocument {
            id: self.id,
            key: self.key.clone(),
            root: self.root.instantiate(&self.key),
        }
    }

    fn rel_segments<'p>(&self, path: &'p FieldPath) -> &'p [PathSegment] {
        let skip = match path.segments().first() {
            Some(PathSegment::Key(k)) if k == &self.key => 1,
            _ => 0,
        };
        &path.segments()[skip..]
    }

    /// Resolve the template addressed by `path` (a trailing `.value`
    /// segment is accepted and ignored; index values are not bounds-checked,
    /// since templates describe every entry alike).
    pub fn template_at(&self, path: &FieldPath) -> FormResult<&NodeTemplate> {
        let display = path.to_string();
        let stripped = path.without_value_suffix();
        let segs = self.rel_segments(&stripped);
        if segs.is_empty() {
            return Err(FormError::shape_mismatch(
                display,
                "path addresses the section root, not a node",
            ));
        }

        let mut cur = TCur::Members(&self.root.members);
        for seg in segs {
            cur = match (cur, seg) {
                (TCur::Members(ms), PathSegment::Key(k)) => {
                    let tpl = ms.iter().find(|m| m.name() == k.as_str()).ok_or_else(|| {
                        FormError::shape_mismatch(
                            &display,
                            format!("schema has no member '{}'", k),
                        )
                    })?;
                    TCur::Tpl(tpl)
                }
                (TCur::Members(_), PathSegment::Index(_)) => {
                    return Err(FormError::shape_mismatch(
                        display,
                        "index segment must follow a collection",
                    ));
                }
                (TCur::Tpl(NodeTemplate::Group(g)), PathSegment::Key(k)) => {
                    let tpl = g.member(k).ok_or_else(|| {
                        FormError::shape_mismatch(
                            &display,
                            format!("schema has no member '{}'", k),
                        )
                    })?;
                    TCur::Tpl(tpl)
                }
                (TCur::Tpl(NodeTemplate::Collection(c)), PathSegment::Index(_)) => {
                    TCur::Members(&c.entry.members)
                }
                (TCur::Tpl(NodeTemplate::Collection(c)), PathSegment::Key(_)) => {
                    return Err(FormError::shape_mismatch(
                        display,
                        format!("collection '{}' requires an index", c.name),
                    ));
                }
                (TCur::Tpl(NodeTemplate::Field(f)), _) => {
                    return Err(FormError::shape_mismatch(
                        display,
                        format!("cannot descend into field '{}'", f.name),
                    ));
                }
                (TCur::Tpl(NodeTemplate::Group(g)), PathSegment::Index(_)) => {
                    return Err(FormError::shape_mismatch(
                        display,
                        format!("cannot index into group '{}'", g.name),
                    ));
                }
            };
        }

        match cur {
            TCur::Tpl(tpl) => Ok(tpl),
            TCur::Members(_) => Err(FormError::shape_mismatch(
                display,
                "path addresses an entry; expected a field, group, or collection",
            )),
        }
    }

    /// Resolve the collection template addressed by `path`.
    pub fn collection_at(&self, path: &FieldPath) -> FormResult<&CollectionTemplate> {
        match self.template_at(path)? {
            NodeTemplate::Collection(c) => Ok(c),
            other => Err(FormError::shape_mismatch(
                path.to_string(),
                format!("expected a collection, found '{}'", other.name()),
            )),
        }
    }

    /// The ordered member templates of the container addressed by `path`
    /// (the section root for an empty path, a group, or an entry body when
    /// the path ends in an index).
    pub fn member_list_at(&self, path: &FieldPath) -> FormResult<&[NodeTemplate]> {
        let segs = self.rel_segments(path);
        if segs.is_empty() {
            return Ok(&self.root.members);
        }
        // Entry body: re-walk via template_at on the collection and descend.
        match self.template_at(path) {
            Ok(NodeTemplate::Group(g)) => Ok(&g.members),
            Ok(other) => Err(FormError::shape_mismatch(
                path.to_string(),
                format!("'{}' is not a group", other.name()),
            )),
            Err(e) => {
                // A path ending in an index addresses an entry body.
                if let Some(PathSegment::Index(_)) = segs.last() {
                    let parent = FieldPath::from_segments(
                        path.segments()[..path.len() - 1].to_vec(),
                    );
                    Ok(&self.collection_at(&parent)?.entry.members)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Paths of every collection gated by the field at `gate_path`
    /// (collections are always siblings of their gate).
    pub fn collections_gated_by(&self, gate_path: &FieldPath) -> FormResult<Vec<FieldPath>> {
        let stripped = gate_path.without_value_suffix();
        let gate_name = stripped.last_key().ok_or_else(|| {
            FormError::shape_mismatch(
                gate_path.to_string(),
                "gate path must end in a field name",
            )
        })?;
        let parent = stripped.parent().unwrap_or_default();
        let members = self.member_list_at(&parent)?;
        Ok(members
            .iter()
            .filter_map(|m| match m {
                NodeTemplate::Collection(c) if c.gate.as_deref() == Some(gate_name) => {
                    Some(parent.clone().key(c.name.clone()))
                }
                _ => None,
            })
            .collect())
    }

    /// Synthesize any structure missing between the document root and
    /// `path`, using this schema's templates, so that every read into the
    /// same region sees a structurally complete object.
    ///
    /// Missing groups are created whole; missing collections are created
    /// empty. Entry indices are never fabricated: an index at or past a
    /// collection's current length fails `IndexOutOfBounds` before any
    /// mutation. On any error the document is unchanged.
    pub fn materialize_path(
        &self,
        doc: &mut SectionDocument,
        path: &FieldPath,
    ) -> FormResult<()> {
        let target = path.without_value_suffix();
        self.template_at(&target)?;
        self.check_doc_path(doc, &target)?;
        self.fill_doc_path(doc, &target)
    }

    /// Dry run: verify bounds and node kinds along `path` without mutating.
    fn check_doc_path(&self, doc: &SectionDocument, path: &FieldPath) -> FormResult<()> {
        let display = path.to_string();
        let segs = self.rel_segments(path);

        enum Probe<'a> {
            Map(&'a BTreeMap<String, Node>),
            Node(&'a Node),
            Absent,
        }

        let mut cur = Probe::Map(&doc.root);
        let mut last_key = String::new();
        for seg in segs {
            cur = match (cur, seg) {
                (Probe::Map(map), PathSegment::Key(k)) => {
                    last_key = k.clone();
                    match map.get(k) {
                        Some(node) => Probe::Node(node),
                        None => Probe::Absent,
                    }
                }
                (Probe::Node(Node::Group(map)), PathSegment::Key(k)) => {
                    last_key = k.clone();
                    match map.get(k) {
                        Some(node) => Probe::Node(node),
                        None => Probe::Absent,
                    }
                }
                (Probe::Node(Node::Collection(list)), PathSegment::Index(ix)) => {
                    match list.get(*ix) {
                        Some(entry) => Probe::Map(&entry.fields),
                        None => {
                            return Err(FormError::index_out_of_bounds(
                                last_key, *ix, list.len(),
                            ));
                        }
                    }
                }
                (Probe::Absent, PathSegment::Key(_)) => Probe::Absent,
                (Probe::Absent, PathSegment::Index(ix)) => {
                    // The collection itself is missing; it would be created
                    // empty, so any index is out of bounds.
                    return Err(FormError::index_out_of_bounds(last_key, *ix, 0));
                }
                (Probe::Node(node), PathSegment::Index(_)) => {
                    return Err(FormError::shape_mismatch(
                        display,
                        format!("cannot index into {}", node.kind_name()),
                    ));
                }
                (Probe::Node(node), PathSegment::Key(k)) => {
                    return Err(FormError::shape_mismatch(
                        display,
                        format!("cannot descend into {} via '{}'", node.kind_name(), k),
                    ));
                }
                (Probe::Map(_), PathSegment::Index(_)) => {
                    return Err(FormError::shape_mismatch(
                        display,
                        "index segment must follow a collection",
                    ));
                }
            };
        }
        Ok(())
    }

    /// Second pass of [`materialize_path`]: insert missing structure. All
    /// failure cases were rejected by the dry run.
    fn fill_doc_path(&self, doc: &mut SectionDocument, path: &FieldPath) -> FormResult<()> {
        let display = path.to_string();
        let segs = self.rel_segments(path).to_vec();
        let mut prefix = doc.key.clone();

        enum FCur<'a> {
            Map(&'a mut BTreeMap<String, Node>),
            List(&'a mut EntryList),
        }

        let mut members: &[NodeTemplate] = &self.root.members;
        let mut cur = FCur::Map(&mut doc.root);
        for seg in &segs {
            cur = match (cur, seg) {
                (FCur::Map(map), PathSegment::Key(k)) => {
                    let tpl = members.iter().find(|m| m.name() == k.as_str()).ok_or_else(
                        || {
                            FormError::shape_mismatch(
                                &display,
                                format!("schema has no member '{}'", k),
                            )
                        },
                    )?;
                    let node = map
                        .entry(k.clone())
                        .or_insert_with(|| tpl.instantiate(&prefix));
                    match (tpl, node) {
                        (NodeTemplate::Group(g), Node::Group(inner)) => {
                            prefix = format!("{}.{}", prefix, k);
                            members = &g.members;
                            FCur::Map(inner)
                        }
                        (NodeTemplate::Collection(c), Node::Collection(list)) => {
                            prefix = format!("{}.{}", prefix, k);
                            members = &c.entry.members;
                            FCur::List(list)
                        }
                        (NodeTemplate::Field(_), Node::Field(_)) => return Ok(()),
                        (_, node) => {
                            return Err(FormError::shape_mismatch(
                                &display,
                                format!(
                                    "document has {} where schema expects '{}'",
                                    node.kind_name(),
                                    k
                                ),
                            ));
                        }
                    }
                }
                (FCur::List(list), PathSegment::Index(ix)) => {
                    let len = list.len();
                    let entry = list.get_mut(*ix).ok_or_else(|| {
                        FormError::index_out_of_bounds(String::new(), *ix, len)
                    })?;
                    prefix = format!("{}[{}]", prefix, entry.id);
                    FCur::Map(&mut entry.fields)
                }
                _ => {
                    return Err(FormError::shape_mismatch(
                        &display,
                        "path does not traverse groups and collections",
                    ));
                }
            };
        }
        Ok(())
    }
}
