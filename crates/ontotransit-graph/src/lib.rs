//! The transit knowledge graph store.
//!
//! One `Graph` holds everything a population run produces:
//!
//! 1. **String interning**: class and property names stored once, referenced
//!    by a compact u32 id.
//! 2. **Individuals**: one node per source row, deduplicated by a per-kind
//!    primary-key index; re-encountering a key merges attribute values.
//! 3. **Class membership**: roaring bitmaps per class, with *asserted*
//!    (base kind + taxonomy) and *inferred* (reasoner-materialized) kept
//!    separate so a run can report the diff.
//! 4. **Edges**: object-property assertions with an optional ordinal (trip
//!    stop sequencing) and an origin marker (asserted, derived-reverse, or
//!    reasoner-inferred).
//!
//! The graph is write-once per run: the population stages build it through
//! `&mut`, the reasoner reads it, and the only writes after assembly are the
//! reasoner's materialized entailments (inferred classes and edges).

use ahash::{AHashMap, AHashSet};
use ontotransit_schema::EntityKind;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// String interning
// ============================================================================

/// Interned string id for class and property names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct StrId(u32);

impl StrId {
    pub const fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Default)]
struct StringInterner {
    ids: AHashMap<String, StrId>,
    strings: Vec<String>,
}

impl StringInterner {
    fn intern(&mut self, s: &str) -> StrId {
        if let Some(&id) = self.ids.get(s) {
            return id;
        }
        let id = StrId(self.strings.len() as u32);
        self.ids.insert(s.to_string(), id);
        self.strings.push(s.to_string());
        id
    }

    fn id_of(&self, s: &str) -> Option<StrId> {
        self.ids.get(s).copied()
    }

    fn resolve(&self, id: StrId) -> &str {
        self.strings
            .get(id.0 as usize)
            .map(String::as_str)
            .unwrap_or("")
    }
}

// ============================================================================
// Literals
// ============================================================================

/// A typed data-property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(s) => f.write_str(s),
            Literal::Integer(i) => write!(f, "{i}"),
            Literal::Float(x) => write!(f, "{x}"),
            Literal::Boolean(b) => write!(f, "{b}"),
        }
    }
}

// ============================================================================
// Individuals and edges
// ============================================================================

/// Graph-local individual id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct IndividualId(u32);

impl IndividualId {
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Where an edge came from. Derived-reverse edges (the reverse leg of a
/// bidirectional pathway) are produced by exactly one derivation rule in the
/// relationship builder; inferred edges are materialized by the reasoner
/// from declared property characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeOrigin {
    Asserted,
    DerivedReverse,
    Inferred,
}

/// One object-property assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub subject: IndividualId,
    pub property: StrId,
    pub object: IndividualId,
    /// Source sequence index for ordering-sensitive relationships.
    pub ordinal: Option<u32>,
    pub origin: EdgeOrigin,
}

// ============================================================================
// Graph
// ============================================================================

#[derive(Debug, Default)]
pub struct Graph {
    interner: StringInterner,
    // Per-individual columns.
    kinds: Vec<EntityKind>,
    keys: Vec<String>,
    names: Vec<String>,
    // Primary-key dedup index: kind -> key -> individual.
    key_index: AHashMap<EntityKind, AHashMap<String, IndividualId>>,
    // Class membership, asserted vs inferred.
    asserted: AHashMap<StrId, RoaringBitmap>,
    inferred: AHashMap<StrId, RoaringBitmap>,
    inferred_log: Vec<(IndividualId, StrId)>,
    // Data properties, columnar: property -> individual -> value.
    data: AHashMap<StrId, AHashMap<u32, Literal>>,
    // Object properties.
    edges: Vec<Edge>,
    out: AHashMap<(u32, StrId), Vec<u32>>,
    edge_dedup: AHashSet<(u32, StrId, u32, Option<u32>)>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Individuals
    // ------------------------------------------------------------------

    /// Insert an individual for `(kind, key)`, or return the existing one.
    /// The base kind class is asserted on first insert.
    pub fn insert(&mut self, kind: EntityKind, key: &str) -> IndividualId {
        if let Some(id) = self.lookup(kind, key) {
            return id;
        }
        let id = IndividualId(self.kinds.len() as u32);
        self.kinds.push(kind);
        self.keys.push(key.to_string());
        self.names.push(format!("{}_{}", kind.instance_prefix(), key));
        self.key_index
            .entry(kind)
            .or_default()
            .insert(key.to_string(), id);
        let class = self.interner.intern(kind.name());
        self.asserted.entry(class).or_default().insert(id.0);
        id
    }

    /// Resolve a primary key to an individual, if mapped.
    pub fn lookup(&self, kind: EntityKind, key: &str) -> Option<IndividualId> {
        self.key_index.get(&kind)?.get(key).copied()
    }

    pub fn kind_of(&self, id: IndividualId) -> EntityKind {
        self.kinds[id.0 as usize]
    }

    pub fn key_of(&self, id: IndividualId) -> &str {
        &self.keys[id.0 as usize]
    }

    pub fn name_of(&self, id: IndividualId) -> &str {
        &self.names[id.0 as usize]
    }

    pub fn individual_count(&self) -> usize {
        self.kinds.len()
    }

    pub fn individuals(&self) -> impl Iterator<Item = IndividualId> + '_ {
        (0..self.kinds.len() as u32).map(IndividualId)
    }

    /// Individual for a raw index, if one exists.
    pub fn individual(&self, raw: u32) -> Option<IndividualId> {
        ((raw as usize) < self.kinds.len()).then_some(IndividualId(raw))
    }

    pub fn individuals_of_kind(&self, kind: EntityKind) -> Vec<IndividualId> {
        self.members_asserted(kind.name())
            .iter()
            .map(IndividualId)
            .collect()
    }

    // ------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------

    /// Assert a class membership (taxonomy assignment; additive).
    pub fn assert_class(&mut self, id: IndividualId, class: &str) {
        let cid = self.interner.intern(class);
        self.asserted.entry(cid).or_default().insert(id.0);
    }

    /// Asserted members of a class (base kinds and taxonomy subclasses).
    pub fn members_asserted(&self, class: &str) -> RoaringBitmap {
        self.interner
            .id_of(class)
            .and_then(|cid| self.asserted.get(&cid))
            .cloned()
            .unwrap_or_default()
    }

    /// Members of a class, asserted or inferred.
    pub fn members(&self, class: &str) -> RoaringBitmap {
        let mut out = self.members_asserted(class);
        if let Some(bm) = self
            .interner
            .id_of(class)
            .and_then(|cid| self.inferred.get(&cid))
        {
            out |= bm;
        }
        out
    }

    pub fn has_class(&self, id: IndividualId, class: &str) -> bool {
        match self.interner.id_of(class) {
            Some(cid) => {
                self.asserted.get(&cid).map_or(false, |bm| bm.contains(id.0))
                    || self.inferred.get(&cid).map_or(false, |bm| bm.contains(id.0))
            }
            None => false,
        }
    }

    /// All classes of an individual (base + taxonomy + inferred), sorted.
    pub fn classes_of(&self, id: IndividualId) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for (cid, bm) in self.asserted.iter().chain(self.inferred.iter()) {
            if bm.contains(id.0) {
                let name = self.interner.resolve(*cid).to_string();
                if !out.contains(&name) {
                    out.push(name);
                }
            }
        }
        out.sort();
        out
    }

    /// Every asserted class with its member bitmap (reasoner seed).
    pub fn asserted_class_bitmaps(&self) -> Vec<(String, RoaringBitmap)> {
        self.asserted
            .iter()
            .map(|(cid, bm)| (self.interner.resolve(*cid).to_string(), bm.clone()))
            .collect()
    }

    /// Materialize reasoner-entailed type assertions as derived facts.
    pub fn materialize_inferred(&mut self, assertions: &[(IndividualId, String)]) {
        for (id, class) in assertions {
            let cid = self.interner.intern(class);
            // Skip entailments that merely restate an asserted fact.
            if self.asserted.get(&cid).map_or(false, |bm| bm.contains(id.0)) {
                continue;
            }
            if self.inferred.entry(cid).or_default().insert(id.0) {
                self.inferred_log.push((*id, cid));
            }
        }
    }

    /// The base-vs-inferred diff, in materialization order.
    pub fn inferred_assertions(&self) -> Vec<(IndividualId, String)> {
        self.inferred_log
            .iter()
            .map(|(id, cid)| (*id, self.interner.resolve(*cid).to_string()))
            .collect()
    }

    // ------------------------------------------------------------------
    // Data properties
    // ------------------------------------------------------------------

    /// Set a data-property value. Re-setting merges by overwrite, which is
    /// what key-merging on duplicate rows requires.
    pub fn set_value(&mut self, id: IndividualId, property: &str, value: Literal) {
        let pid = self.interner.intern(property);
        self.data.entry(pid).or_default().insert(id.0, value);
    }

    pub fn value(&self, id: IndividualId, property: &str) -> Option<&Literal> {
        let pid = self.interner.id_of(property)?;
        self.data.get(&pid)?.get(&id.0)
    }

    // ------------------------------------------------------------------
    // Object properties
    // ------------------------------------------------------------------

    /// Assert an edge. Returns false when the identical assertion already
    /// exists (idempotent re-ingestion).
    pub fn assert_edge(
        &mut self,
        subject: IndividualId,
        property: &str,
        object: IndividualId,
        ordinal: Option<u32>,
        origin: EdgeOrigin,
    ) -> bool {
        let pid = self.interner.intern(property);
        if !self.edge_dedup.insert((subject.0, pid, object.0, ordinal)) {
            return false;
        }
        let idx = self.edges.len() as u32;
        self.edges.push(Edge {
            subject,
            property: pid,
            object,
            ordinal,
            origin,
        });
        self.out.entry((subject.0, pid)).or_default().push(idx);
        true
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn property_name(&self, id: StrId) -> &str {
        self.interner.resolve(id)
    }

    /// Outgoing edges for `(subject, property)`, in assertion order.
    pub fn edges_out(&self, id: IndividualId, property: &str) -> Vec<Edge> {
        let Some(pid) = self.interner.id_of(property) else {
            return Vec::new();
        };
        self.out
            .get(&(id.0, pid))
            .map(|idxs| idxs.iter().map(|&i| self.edges[i as usize]).collect())
            .unwrap_or_default()
    }

    /// Related individuals over one property, in assertion order.
    pub fn related(&self, id: IndividualId, property: &str) -> Vec<IndividualId> {
        self.edges_out(id, property)
            .into_iter()
            .map(|e| e.object)
            .collect()
    }

    /// Related individuals with their ordinals, sorted by ordinal (edges
    /// without an ordinal keep assertion order at the end).
    pub fn related_ordered(&self, id: IndividualId, property: &str) -> Vec<(Option<u32>, IndividualId)> {
        let mut out: Vec<(Option<u32>, IndividualId)> = self
            .edges_out(id, property)
            .into_iter()
            .map(|e| (e.ordinal, e.object))
            .collect();
        out.sort_by_key(|(ord, _)| match ord {
            Some(n) => (0u8, *n),
            None => (1u8, 0),
        });
        out
    }

    // ------------------------------------------------------------------
    // Snapshot (query/export surface)
    // ------------------------------------------------------------------

    /// A stable, fully resolved view of the graph. This is the surface an
    /// external writer consumes; tests use it for whole-graph equality.
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut individuals: Vec<IndividualSnapshot> = self
            .individuals()
            .map(|id| {
                let mut values = BTreeMap::new();
                for (pid, column) in self.data.iter() {
                    if let Some(v) = column.get(&id.0) {
                        values.insert(self.interner.resolve(*pid).to_string(), v.clone());
                    }
                }
                IndividualSnapshot {
                    name: self.name_of(id).to_string(),
                    kind: self.kind_of(id).name().to_string(),
                    classes: self.classes_of(id),
                    values,
                }
            })
            .collect();
        individuals.sort_by(|a, b| a.name.cmp(&b.name));

        let mut edges: Vec<EdgeSnapshot> = self
            .edges
            .iter()
            .map(|e| EdgeSnapshot {
                subject: self.name_of(e.subject).to_string(),
                property: self.interner.resolve(e.property).to_string(),
                object: self.name_of(e.object).to_string(),
                ordinal: e.ordinal,
                origin: e.origin,
            })
            .collect();
        edges.sort();

        GraphSnapshot { individuals, edges }
    }
}

/// Resolved view of one individual.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndividualSnapshot {
    pub name: String,
    pub kind: String,
    pub classes: Vec<String>,
    pub values: BTreeMap<String, Literal>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct EdgeSnapshot {
    pub subject: String,
    pub property: String,
    pub object: String,
    pub ordinal: Option<u32>,
    pub origin: EdgeOrigin,
}

impl PartialOrd for EdgeOrigin {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeOrigin {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        fn rank(o: &EdgeOrigin) -> u8 {
            match o {
                EdgeOrigin::Asserted => 0,
                EdgeOrigin::DerivedReverse => 1,
                EdgeOrigin::Inferred => 2,
            }
        }
        rank(self).cmp(&rank(other))
    }
}

/// Whole-graph view, ordered deterministically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSnapshot {
    pub individuals: Vec<IndividualSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_dedupes_by_primary_key() {
        let mut g = Graph::new();
        let a = g.insert(EntityKind::Stop, "S1");
        let b = g.insert(EntityKind::Stop, "S1");
        let c = g.insert(EntityKind::Route, "S1");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(g.individual_count(), 2);
        assert_eq!(g.name_of(a), "stop_S1");
    }

    #[test]
    fn test_reinsert_merges_values() {
        let mut g = Graph::new();
        let a = g.insert(EntityKind::Stop, "S1");
        g.set_value(a, "stop_name", Literal::Text("Old".into()));
        let b = g.insert(EntityKind::Stop, "S1");
        g.set_value(b, "stop_name", Literal::Text("New".into()));
        g.set_value(b, "stop_lat", Literal::Float(42.7));
        assert_eq!(g.value(a, "stop_name"), Some(&Literal::Text("New".into())));
        assert_eq!(g.value(a, "stop_lat"), Some(&Literal::Float(42.7)));
    }

    #[test]
    fn test_edge_assertion_is_idempotent() {
        let mut g = Graph::new();
        let p = g.insert(EntityKind::Pathway, "P1");
        let s = g.insert(EntityKind::Stop, "S1");
        assert!(g.assert_edge(p, "connectsStop", s, None, EdgeOrigin::Asserted));
        assert!(!g.assert_edge(p, "connectsStop", s, None, EdgeOrigin::Asserted));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.related(p, "connectsStop"), vec![s]);
    }

    #[test]
    fn test_ordinals_sort_related() {
        let mut g = Graph::new();
        let t = g.insert(EntityKind::Trip, "T1");
        let s1 = g.insert(EntityKind::Stop, "S1");
        let s2 = g.insert(EntityKind::Stop, "S2");
        let s3 = g.insert(EntityKind::Stop, "S3");
        g.assert_edge(t, "hasStop", s3, Some(7), EdgeOrigin::Asserted);
        g.assert_edge(t, "hasStop", s1, Some(1), EdgeOrigin::Asserted);
        g.assert_edge(t, "hasStop", s2, Some(3), EdgeOrigin::Asserted);
        let ordered = g.related_ordered(t, "hasStop");
        assert_eq!(
            ordered,
            vec![(Some(1), s1), (Some(3), s2), (Some(7), s3)]
        );
    }

    #[test]
    fn test_inferred_classes_stay_separate() {
        let mut g = Graph::new();
        let s = g.insert(EntityKind::Stop, "S1");
        g.assert_class(s, "Stop");
        g.materialize_inferred(&[
            (s, "AccessibleStop".to_string()),
            // Restating an asserted fact must not show up in the diff.
            (s, "Stop".to_string()),
        ]);
        assert!(g.has_class(s, "AccessibleStop"));
        assert_eq!(g.classes_of(s), vec!["AccessibleStop", "Stop"]);
        assert_eq!(
            g.inferred_assertions(),
            vec![(s, "AccessibleStop".to_string())]
        );
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let build = || {
            let mut g = Graph::new();
            let s = g.insert(EntityKind::Stop, "S1");
            let p = g.insert(EntityKind::Pathway, "P1");
            g.set_value(s, "stop_name", Literal::Text("Centre".into()));
            g.assert_edge(p, "connectsStop", s, None, EdgeOrigin::Asserted);
            g.snapshot()
        };
        assert_eq!(build(), build());
    }
}
