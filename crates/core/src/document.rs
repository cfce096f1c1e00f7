//! The section document tree: fields, nested groups, and bounded entry
//! collections, rooted at one section.
//!
//! A document is a single owned tree with one owner (the active session) at
//! a time. All traversal here is path-addressed; paths may carry the
//! section key as their first segment (`section12.entries[0]...`) or start
//! relative to the section body (`entries[0]...`); both address the same
//! node.
//!
//! Traversal rules:
//! - `Key` segments descend into groups (or an entry's field map).
//! - `Index` segments descend into collections and must be in bounds;
//!   collections never grow through path writes.
//! - A path terminating inside an entry (trailing `Index` segment) does not
//!   address a node; entry-level operations go through collection lookups.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FormError, FormResult};
use crate::field::Field;
use crate::path::{FieldPath, PathSegment};

/// A node in the section document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum Node {
    /// Leaf field.
    Field(Field),
    /// Nested sub-object of named members.
    Group(BTreeMap<String, Node>),
    /// Repeatable, bounded, ordered entry collection.
    Collection(EntryList),
}

impl Node {
    /// The field, if this is a field node.
    pub fn as_field(&self) -> Option<&Field> {
        match self {
            Node::Field(f) => Some(f),
            _ => None,
        }
    }

    /// Mutable field access.
    pub fn as_field_mut(&mut self) -> Option<&mut Field> {
        match self {
            Node::Field(f) => Some(f),
            _ => None,
        }
    }

    /// The entry list, if this is a collection node.
    pub fn as_collection(&self) -> Option<&EntryList> {
        match self {
            Node::Collection(list) => Some(list),
            _ => None,
        }
    }

    /// Mutable entry list access.
    pub fn as_collection_mut(&mut self) -> Option<&mut EntryList> {
        match self {
            Node::Collection(list) => Some(list),
            _ => None,
        }
    }

    /// Human-readable node kind, for shape-mismatch messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Field(_) => "field",
            Node::Group(_) => "group",
            Node::Collection(_) => "collection",
        }
    }
}

/// An ordered, bounded list of entries with a per-collection monotonic id
/// counter. Entry `_id`s survive removal and reindexing; positional indices
/// stay dense.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryList {
    entries: Vec<Entry>,
    next_id: u64,
}

impl EntryList {
    /// An empty list.
    pub fn new() -> Self {
        EntryList {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries exist.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries in positional order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entry at `index`.
    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// Mutable entry at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entry> {
        self.entries.get_mut(index)
    }

    /// Iterate entries in positional order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Allocate the next stable entry id.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append an entry.
    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Remove the entry at `index`; later entries shift down by one.
    /// Caller checks bounds.
    pub fn remove(&mut self, index: usize) -> Entry {
        self.entries.remove(index)
    }

    /// Remove all entries. Ids are not reused: the id counter is untouched.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// One record in a repeatable group. Position in the owning list is the
/// index used by path addressing; `id` is the stable identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Stable identity within the owning collection.
    #[serde(rename = "_id")]
    pub id: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last effective write to any field inside this entry.
    pub updated_at: DateTime<Utc>,
    /// Named members: fields, nested groups, nested sub-collections.
    pub fields: BTreeMap<String, Node>,
}

impl Entry {
    /// Bump `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A section's entire mutable state: gate fields, entry collections, and
/// nested groups keyed by a single section identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDocument {
    /// Numeric section identifier.
    #[serde(rename = "_id")]
    pub id: u32,
    /// Section key (e.g. `section12`), the first segment of full paths.
    pub key: String,
    /// The section body.
    pub root: BTreeMap<String, Node>,
}

/// Immutable traversal cursor.
enum Cur<'a> {
    Map(&'a BTreeMap<String, Node>),
    Node(&'a Node),
}

/// Mutable traversal cursor.
enum CurMut<'a> {
    Map(&'a mut BTreeMap<String, Node>),
    Node(&'a mut Node),
}

impl SectionDocument {
    /// Number of leading segments to skip: 1 when the path starts with this
    /// document's section key.
    fn rel_start(&self, path: &FieldPath) -> usize {
        match path.segments().first() {
            Some(PathSegment::Key(k)) if k == &self.key => 1,
            _ => 0,
        }
    }

    /// Name of the collection addressed by the segment before `i`, for
    /// index-out-of-bounds messages.
    fn collection_name(segs: &[PathSegment], i: usize) -> String {
        if i == 0 {
            return String::new();
        }
        match &segs[i - 1] {
            PathSegment::Key(k) => k.clone(),
            PathSegment::Index(_) => String::new(),
        }
    }

    /// Resolve the node addressed by `path`.
    ///
    /// Fails with `ShapeMismatch` for unknown members or kind disagreement
    /// and `IndexOutOfBounds` for indices past a collection's end.
    pub fn node_at(&self, path: &FieldPath) -> FormResult<&Node> {
        let display = path.to_string();
        let segs = &path.segments()[self.rel_start(path)..];
        if segs.is_empty() {
            return Err(FormError::shape_mismatch(
                display,
                "path addresses the document root, not a node",
            ));
        }

        let mut cur = Cur::Map(&self.root);
        for (i, seg) in segs.iter().enumerate() {
            cur = match (cur, seg) {
                (Cur::Map(map), PathSegment::Key(k)) => {
                    let node = map.get(k).ok_or_else(|| {
                        FormError::shape_mismatch(&display, format!("unknown member '{}'", k))
                    })?;
                    Cur::Node(node)
                }
                (Cur::Map(_), PathSegment::Index(_)) => {
                    return Err(FormError::shape_mismatch(
                        display,
                        "index segment must follow a collection",
                    ));
                }
                (Cur::Node(node), PathSegment::Key(k)) => match node {
                    Node::Group(map) => {
                        let inner = map.get(k).ok_or_else(|| {
                            FormError::shape_mismatch(
                                &display,
                                format!("unknown member '{}'", k),
                            )
                        })?;
                        Cur::Node(inner)
                    }
                    Node::Collection(_) => {
                        return Err(FormError::shape_mismatch(
                            display,
                            format!("collection member '{}' requires an index", k),
                        ));
                    }
                    Node::Field(_) => {
                        return Err(FormError::shape_mismatch(
                            display,
                            format!("cannot descend into field via '{}'", k),
                        ));
                    }
                },
                (Cur::Node(node), PathSegment::Index(ix)) => match node {
                    Node::Collection(list) => {
                        let entry = list.get(*ix).ok_or_else(|| {
                            FormError::index_out_of_bounds(
                                Self::collection_name(segs, i),
                                *ix,
                                list.len(),
                            )
                        })?;
                        Cur::Map(&entry.fields)
                    }
                    other => {
                        return Err(FormError::shape_mismatch(
                            display,
                            format!("cannot index into {}", other.kind_name()),
                        ));
                    }
                },
            };
        }

        match cur {
            Cur::Node(node) => Ok(node),
            Cur::Map(_) => Err(FormError::shape_mismatch(
                display,
                "path addresses an entry; expected a field, group, or collection",
            )),
        }
    }

    /// Mutable variant of [`node_at`](Self::node_at).
    pub fn node_at_mut(&mut self, path: &FieldPath) -> FormResult<&mut Node> {
        let display = path.to_string();
        let skip = self.rel_start(path);
        let segs = &path.segments()[skip..];
        if segs.is_empty() {
            return Err(FormError::shape_mismatch(
                display,
                "path addresses the document root, not a node",
            ));
        }

        let mut cur = CurMut::Map(&mut self.root);
        for (i, seg) in segs.iter().enumerate() {
            cur = match (cur, seg) {
                (CurMut::Map(map), PathSegment::Key(k)) => {
                    let node = map.get_mut(k).ok_or_else(|| {
                        FormError::shape_mismatch(&display, format!("unknown member '{}'", k))
                    })?;
                    CurMut::Node(node)
                }
                (CurMut::Map(_), PathSegment::Index(_)) => {
                    return Err(FormError::shape_mismatch(
                        display,
                        "index segment must follow a collection",
                    ));
                }
                (CurMut::Node(node), PathSegment::Key(k)) => match node {
                    Node::Group(map) => {
                        let inner = map.get_mut(k).ok_or_else(|| {
                            FormError::shape_mismatch(
                                &display,
                                format!("unknown member '{}'", k),
                            )
                        })?;
                        CurMut::Node(inner)
                    }
                    Node::Collection(_) => {
                        return Err(FormError::shape_mismatch(
                            display,
                            format!("collection member '{}' requires an index", k),
                        ));
                    }
                    Node::Field(_) => {
                        return Err(FormError::shape_mismatch(
                            display,
                            format!("cannot descend into field via '{}'", k),
                        ));
                    }
                },
                (CurMut::Node(node), PathSegment::Index(ix)) => match node {
                    Node::Collection(list) => {
                        let len = list.len();
                        let entry = list.get_mut(*ix).ok_or_else(|| {
                            FormError::index_out_of_bounds(
                                Self::collection_name(segs, i),
                                *ix,
                                len,
                            )
                        })?;
                        CurMut::Map(&mut entry.fields)
                    }
                    other => {
                        return Err(FormError::shape_mismatch(
                            display,
                            format!("cannot index into {}", other.kind_name()),
                        ));
                    }
                },
            };
        }

        match cur {
            CurMut::Node(node) => Ok(node),
            CurMut::Map(_) => Err(FormError::shape_mismatch(
                display,
                "path addresses an entry; expected a field, group, or collection",
            )),
        }
    }

    /// Resolve the field addressed by `path` (a trailing `.value` segment
    /// is accepted and ignored).
    pub fn field_at(&self, path: &FieldPath) -> FormResult<&Field> {
        let stripped = path.without_value_suffix();
        let node = self.node_at(&stripped)?;
        node.as_field().ok_or_else(|| {
            FormError::shape_mismatch(
                path.to_string(),
                format!("expected a field, found {}", node.kind_name()),
            )
        })
    }

    /// Mutable variant of [`field_at`](Self::field_at).
    pub fn field_at_mut(&mut self, path: &FieldPath) -> FormResult<&mut Field> {
        let stripped = path.without_value_suffix();
        let node = self.node_at_mut(&stripped)?;
        let kind = node.kind_name();
        node.as_field_mut().ok_or_else(|| {
            FormError::shape_mismatch(
                path.to_string(),
                format!("expected a field, found {}", kind),
            )
        })
    }

    /// Resolve the entry collection addressed by `path`.
    pub fn collection_at(&self, path: &FieldPath) -> FormResult<&EntryList> {
        let node = self.node_at(path)?;
        node.as_collection().ok_or_else(|| {
            FormError::shape_mismatch(
                path.to_string(),
                format!("expected a collection, found {}", node.kind_name()),
            )
        })
    }

    /// Mutable variant of [`collection_at`](Self::collection_at).
    pub fn collection_at_mut(&mut self, path: &FieldPath) -> FormResult<&mut EntryList> {
        let node = self.node_at_mut(path)?;
        let kind = node.kind_name();
        node.as_collection_mut().ok_or_else(|| {
            FormError::shape_mismatch(
                path.to_string(),
                format!("expected a collection, found {}", kind),
            )
        })
    }

    /// The field-id prefix for nodes under `path`, with positional indices
    /// replaced by stable entry ids (`section12.entries[7].degrees`).
    ///
    /// Used when synthesizing default entries so their field ids never
    /// change when earlier entries are removed.
    pub fn field_id_prefix(&self, path: &FieldPath) -> FormResult<String> {
        let display = path.to_string();
        let segs = &path.segments()[self.rel_start(path)..];
        let mut prefix = self.key.clone();
        let mut cur = Cur::Map(&self.root);
        for (i, seg) in segs.iter().enumerate() {
            cur = match (cur, seg) {
                (Cur::Map(map), PathSegment::Key(k)) => {
                    prefix.push('.');
                    prefix.push_str(k);
                    let node = map.get(k).ok_or_else(|| {
                        FormError::shape_mismatch(&display, format!("unknown member '{}'", k))
                    })?;
                    Cur::Node(node)
                }
                (Cur::Node(Node::Group(map)), PathSegment::Key(k)) => {
                    prefix.push('.');
                    prefix.push_str(k);
                    let node = map.get(k).ok_or_else(|| {
                        FormError::shape_mismatch(&display, format!("unknown member '{}'", k))
                    })?;
                    Cur::Node(node)
                }
                (Cur::Node(Node::Collection(list)), PathSegment::Index(ix)) => {
                    let entry = list.get(*ix).ok_or_else(|| {
                        FormError::index_out_of_bounds(
                            Self::collection_name(segs, i),
                            *ix,
                            list.len(),
                        )
                    })?;
                    prefix.push_str(&format!("[{}]", entry.id));
                    Cur::Map(&entry.fields)
                }
                _ => {
                    return Err(FormError::shape_mismatch(
                        display,
                        "path does not traverse groups and collections",
                    ));
                }
            };
        }
        Ok(prefix)
    }

    /// Bump `updated_at` on every entry the path passes through. Used after
    /// an effective field write inside an entry.
    pub fn touch_entries(&mut self, path: &FieldPath) -> FormResult<()> {
        let display = path.to_string();
        let skip = self.rel_start(path);
        let segs = &path.segments()[skip..];
        let mut cur = CurMut::Map(&mut self.root);
        for (i, seg) in segs.iter().enumerate() {
            cur = match (cur, seg) {
                (CurMut::Map(map), PathSegment::Key(k)) => match map.get_mut(k) {
                    Some(node) => CurMut::Node(node),
                    // Nothing to touch past a missing member.
                    None => return Ok(()),
                },
                (CurMut::Node(Node::Group(map)), PathSegment::Key(k)) => {
                    match map.get_mut(k) {
                        Some(node) => CurMut::Node(node),
                        None => return Ok(()),
                    }
                }
                (CurMut::Node(Node::Collection(list)), PathSegment::Index(ix)) => {
                    let len = list.len();
                    let entry = list.get_mut(*ix).ok_or_else(|| {
                        FormError::index_out_of_bounds(
                            Self::collection_name(segs, i),
                            *ix,
                            len,
                        )
                    })?;
                    entry.updated_at = Utc::now();
                    CurMut::Map(&mut entry.fields)
                }
                (CurMut::Node(Node::Field(_)), PathSegment::Key(_)) => return Ok(()),
                _ => {
                    return Err(FormError::shape_mismatch(
                        display,
                        "path does not traverse groups and collections",
                    ));
                }
            };
        }
        Ok(())
    }

    /// All fields in the document, flattened with their concrete paths.
    ///
    /// Order is deterministic: member-name order within each level, entries
    /// in positional order.
    pub fn fields(&self) -> Vec<(FieldPath, &Field)> {
        let mut out = Vec::new();
        collect_fields(&self.root, &FieldPath::root(), &mut out);
        out
    }

    /// First field (in [`fields`](Self::fields) order) whose member name
    /// matches, with its concrete path.
    pub fn find_field(&self, name: &str) -> Option<(FieldPath, &Field)> {
        self.fields().into_iter().find(|(_, f)| f.name == name)
    }
}

fn collect_fields<'a>(
    map: &'a BTreeMap<String, Node>,
    base: &FieldPath,
    out: &mut Vec<(FieldPath, &'a Field)>,
) {
    for (name, node) in map {
        let path = base.clone().key(name.clone());
        match node {
            Node::Field(f) => out.push((path, f)),
            Node::Group(inner) => collect_fields(inner, &path, out),
            Node::Collection(list) => {
                for (ix, entry) in list.iter().enumerate() {
                    let entry_path = path.clone().index(ix);
                    collect_fields(&entry.fields, &entry_path, out);
                }
            }
        }
    }
}
