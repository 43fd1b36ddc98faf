//! Default reasoning backend: fixpoint model checking over the closed graph.
//!
//! The graph produced by a population run is a complete model (closed-world
//! over the ingested feed), so equivalence axioms can be classified by
//! direct evaluation: an individual is a member of a defined class exactly
//! when it satisfies the definition. Before classification the asserted
//! edges are closed over the declared property characteristics (transitive,
//! symmetric, subproperty), and restrictions evaluate against that closed
//! adjacency. Evaluation runs to a fixpoint because definitions may
//! reference other defined classes. Consistency is checked against the
//! disjointness axioms and the functional property declarations, and
//! unsatisfiability with a conservative syntactic test over each
//! definition's conjuncts.

use ahash::AHashMap;
use ontotransit_graph::{Graph, IndividualId, Literal};
use ontotransit_schema::{AxiomSet, Characteristic, ClassExpr, DisjointClassesAxiom, Schema};
use roaring::RoaringBitmap;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::{EdgeAssertion, Entailment, ReasonError, Reasoner, TypeAssertion};

/// Closed successor sets: property name -> subject -> objects, by raw id.
/// Ordered maps keep entailment output deterministic.
type Adjacency = BTreeMap<String, BTreeMap<u32, BTreeSet<u32>>>;

/// Fixpoint model-checking reasoner. Stateless between runs.
#[derive(Debug, Clone)]
pub struct ModelCheckReasoner {
    max_iterations: usize,
}

impl Default for ModelCheckReasoner {
    fn default() -> Self {
        // Definitions reference at most a handful of other defined classes,
        // so the fixpoint settles in two or three passes in practice.
        Self { max_iterations: 32 }
    }
}

impl ModelCheckReasoner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reasoner for ModelCheckReasoner {
    fn classify(
        &self,
        graph: &Graph,
        schema: &Schema,
        axioms: &AxiomSet,
        deadline: Instant,
    ) -> Result<Entailment, ReasonError> {
        if Instant::now() >= deadline {
            return Err(ReasonError::Timeout);
        }

        let unsatisfiable = unsatisfiable_classes(axioms);

        let (adjacency, inferred_edges) = close_properties(graph, schema, deadline)?;

        // Seed class membership from asserted facts, then close over the
        // declared subclass hierarchy so `Named` lookups see base kinds.
        let mut members: AHashMap<String, RoaringBitmap> = graph
            .asserted_class_bitmaps()
            .into_iter()
            .collect();
        for decl in &schema.subclasses {
            let sub = members.get(decl.class).cloned().unwrap_or_default();
            *members.entry(decl.base.name().to_string()).or_default() |= sub;
        }

        let mut iterations = 0usize;
        loop {
            if Instant::now() >= deadline {
                return Err(ReasonError::Timeout);
            }
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(ReasonError::Backend(format!(
                    "no fixpoint after {} iterations",
                    self.max_iterations
                )));
            }

            let mut changed = false;
            for axiom in &axioms.equivalences {
                let mut bm = graph.members_asserted(&axiom.class);
                for id in graph.individuals() {
                    if eval(&axiom.definition, id, graph, &members, &adjacency) {
                        bm.insert(id.raw());
                    }
                }
                let entry = members.entry(axiom.class.clone()).or_default();
                if *entry != bm {
                    *entry = bm;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let (mut consistent, mut conflict) =
            check_disjointness(graph, &axioms.disjoint, &members);
        if consistent {
            if let Some(message) = functional_conflict(graph, schema, &adjacency) {
                consistent = false;
                conflict = Some(message);
            }
        }

        let mut inferred = Vec::new();
        for axiom in &axioms.equivalences {
            let Some(bm) = members.get(&axiom.class) else {
                continue;
            };
            let asserted = graph.members_asserted(&axiom.class);
            for id in graph.individuals() {
                if bm.contains(id.raw()) && !asserted.contains(id.raw()) {
                    inferred.push(TypeAssertion {
                        individual: id,
                        class: axiom.class.clone(),
                    });
                }
            }
        }

        Ok(Entailment {
            consistent,
            conflict,
            inferred,
            inferred_edges,
            unsatisfiable,
        })
    }
}

/// Close the asserted edges over the declared property characteristics:
/// symmetric properties gain their reverse, subproperties propagate into
/// their superproperty, transitive properties gain their reachability
/// closure. Returns the closed adjacency and the edges that were entailed
/// rather than asserted.
fn close_properties(
    graph: &Graph,
    schema: &Schema,
    deadline: Instant,
) -> Result<(Adjacency, Vec<EdgeAssertion>), ReasonError> {
    let mut adjacency: Adjacency = BTreeMap::new();
    for edge in graph.edges() {
        adjacency
            .entry(graph.property_name(edge.property).to_string())
            .or_default()
            .entry(edge.subject.raw())
            .or_default()
            .insert(edge.object.raw());
    }

    let mut entailed: Vec<(u32, &str, u32)> = Vec::new();

    for decl in &schema.properties {
        let Some(edges) = adjacency.get(decl.name).cloned() else {
            continue;
        };
        if decl.characteristics.contains(&Characteristic::Symmetric) {
            let prop = adjacency.entry(decl.name.to_string()).or_default();
            for (s, objects) in &edges {
                for o in objects {
                    if prop.entry(*o).or_default().insert(*s) {
                        entailed.push((*o, decl.name, *s));
                    }
                }
            }
        }
        if let Some(sup) = decl.subproperty_of {
            let prop = adjacency.entry(sup.to_string()).or_default();
            for (s, objects) in &edges {
                for o in objects {
                    if prop.entry(*s).or_default().insert(*o) {
                        entailed.push((*s, sup, *o));
                    }
                }
            }
        }
    }

    for decl in &schema.properties {
        if !decl.characteristics.contains(&Characteristic::Transitive) {
            continue;
        }
        if Instant::now() >= deadline {
            return Err(ReasonError::Timeout);
        }
        let Some(prop) = adjacency.get_mut(decl.name) else {
            continue;
        };
        let base = prop.clone();
        for (&subject, directs) in &base {
            let mut queue: Vec<u32> = directs.iter().copied().collect();
            let mut reachable: BTreeSet<u32> = BTreeSet::new();
            while let Some(node) = queue.pop() {
                if !reachable.insert(node) {
                    continue;
                }
                if let Some(next) = base.get(&node) {
                    queue.extend(next.iter().copied());
                }
            }
            for object in reachable {
                // Cycles make a node reach itself; reflexive edges are
                // not recorded.
                if object == subject {
                    continue;
                }
                if prop.entry(subject).or_default().insert(object) {
                    entailed.push((subject, decl.name, object));
                }
            }
        }
    }

    let inferred_edges = entailed
        .into_iter()
        .filter_map(|(s, property, o)| {
            match (graph.individual(s), graph.individual(o)) {
                (Some(subject), Some(object)) => Some(EdgeAssertion {
                    subject,
                    property: property.to_string(),
                    object,
                }),
                _ => None,
            }
        })
        .collect();
    Ok((adjacency, inferred_edges))
}

fn successors<'a>(
    adjacency: &'a Adjacency,
    property: &str,
    id: IndividualId,
) -> impl Iterator<Item = u32> + 'a {
    adjacency
        .get(property)
        .and_then(|prop| prop.get(&id.raw()))
        .into_iter()
        .flat_map(|set| set.iter().copied())
}

/// Evaluate a class expression for one individual against the current
/// membership map and the closed adjacency.
fn eval(
    expr: &ClassExpr,
    id: IndividualId,
    graph: &Graph,
    members: &AHashMap<String, RoaringBitmap>,
    adjacency: &Adjacency,
) -> bool {
    match expr {
        ClassExpr::Named { class } => members
            .get(class)
            .map_or(false, |bm| bm.contains(id.raw())),
        ClassExpr::And { exprs } => exprs.iter().all(|e| eval(e, id, graph, members, adjacency)),
        ClassExpr::Or { exprs } => exprs.iter().any(|e| eval(e, id, graph, members, adjacency)),
        ClassExpr::Not { expr } => !eval(expr, id, graph, members, adjacency),
        ClassExpr::SomeValuesFrom { property, filler } => successors(adjacency, property, id)
            .filter_map(|raw| graph.individual(raw))
            .any(|o| eval(filler, o, graph, members, adjacency)),
        ClassExpr::AllValuesFrom { property, filler } => successors(adjacency, property, id)
            .filter_map(|raw| graph.individual(raw))
            .all(|o| eval(filler, o, graph, members, adjacency)),
        ClassExpr::HasValue { property, value } => graph
            .value(id, property)
            .map_or(false, |lit| literal_matches(lit, value)),
        ClassExpr::MinCardinality {
            property,
            min,
            filler,
        } => {
            // The successor sets hold distinct individuals, so parallel
            // edges (e.g. ordinal-bearing trip stops) count once.
            let n = successors(adjacency, property, id)
                .filter_map(|raw| graph.individual(raw))
                .filter(|o| eval(filler, *o, graph, members, adjacency))
                .count();
            n as u32 >= *min
        }
    }
}

fn literal_matches(lit: &Literal, value: &str) -> bool {
    match lit {
        Literal::Text(s) => s == value,
        Literal::Integer(i) => value.parse::<i64>() == Ok(*i),
        Literal::Float(x) => value.parse::<f64>().map_or(false, |v| v == *x),
        Literal::Boolean(b) => value.parse::<bool>() == Ok(*b),
    }
}

/// Conservative syntactic unsatisfiability: a definition whose top-level
/// conjuncts contain both `C` and `not C`, or two classes from the same
/// disjointness group, can never have a member. Disjunctive definitions are
/// not analyzed (never reported unsatisfiable).
fn unsatisfiable_classes(axioms: &AxiomSet) -> Vec<String> {
    let mut out = Vec::new();
    for axiom in &axioms.equivalences {
        let conjuncts = axiom.definition.conjuncts();
        let positives: Vec<&str> = conjuncts
            .iter()
            .filter_map(|c| match c {
                ClassExpr::Named { class } => Some(class.as_str()),
                _ => None,
            })
            .collect();
        let negatives: Vec<&str> = conjuncts
            .iter()
            .filter_map(|c| match c {
                ClassExpr::Not { expr } => match expr.as_ref() {
                    ClassExpr::Named { class } => Some(class.as_str()),
                    _ => None,
                },
                _ => None,
            })
            .collect();

        let contradictory = positives.iter().any(|p| negatives.contains(p))
            || axioms.disjoint.iter().any(|group| {
                positives
                    .iter()
                    .filter(|p| group.classes.iter().any(|c| c == **p))
                    .count()
                    >= 2
            });
        if contradictory {
            out.push(axiom.class.clone());
        }
    }
    out
}

/// Pairwise disjointness over the final membership map. Returns the verdict
/// and a description of the first violation found.
fn check_disjointness(
    graph: &Graph,
    disjoint: &[DisjointClassesAxiom],
    members: &AHashMap<String, RoaringBitmap>,
) -> (bool, Option<String>) {
    for group in disjoint {
        for (i, a) in group.classes.iter().enumerate() {
            for b in &group.classes[i + 1..] {
                let (Some(ma), Some(mb)) = (members.get(a), members.get(b)) else {
                    continue;
                };
                let both = ma & mb;
                if let Some(raw) = both.iter().next() {
                    let name = graph
                        .individual(raw)
                        .map(|id| graph.name_of(id).to_string())
                        .unwrap_or_else(|| raw.to_string());
                    return (
                        false,
                        Some(format!("{name} is a member of disjoint classes {a} and {b}")),
                    );
                }
            }
        }
    }
    (true, None)
}

/// A functional property with more than one distinct value for some subject
/// makes the model inconsistent.
fn functional_conflict(graph: &Graph, schema: &Schema, adjacency: &Adjacency) -> Option<String> {
    for decl in &schema.properties {
        if !decl.characteristics.contains(&Characteristic::Functional) {
            continue;
        }
        let Some(prop) = adjacency.get(decl.name) else {
            continue;
        };
        for (subject, objects) in prop {
            if objects.len() > 1 {
                let name = graph
                    .individual(*subject)
                    .map(|id| graph.name_of(id).to_string())
                    .unwrap_or_else(|| subject.to_string());
                return Some(format!(
                    "{name} has {} values for functional property {}",
                    objects.len(),
                    decl.name
                ));
            }
        }
    }
    None
}
