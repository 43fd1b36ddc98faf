//! Reasoner contract and invocation gateway.
//!
//! The engine that computes entailments is deliberately behind a narrow
//! trait so it can be swapped without touching the population pipeline. The
//! gateway is the one place reasoning is invoked: exactly once per run,
//! after all assertions are complete, as a blocking cancelable unit with a
//! deadline. It never surfaces partial inferred facts: timeout,
//! inconsistency, and unsatisfiable classes all abort before
//! materialization.

pub mod model_check;

pub use model_check::ModelCheckReasoner;

use ontotransit_graph::{EdgeOrigin, Graph, IndividualId};
use ontotransit_schema::{AxiomSet, Schema};
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;

/// One entailed class membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeAssertion {
    pub individual: IndividualId,
    pub class: String,
}

/// One entailed object-property edge, from the closure of the asserted
/// edges over declared property characteristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeAssertion {
    pub subject: IndividualId,
    pub property: String,
    pub object: IndividualId,
}

/// What a reasoner returns: consistency verdict, entailed type and edge
/// assertions, and any provably memberless classes.
#[derive(Debug, Clone)]
pub struct Entailment {
    pub consistent: bool,
    /// Human-readable description of the first conflict, when inconsistent.
    pub conflict: Option<String>,
    pub inferred: Vec<TypeAssertion>,
    pub inferred_edges: Vec<EdgeAssertion>,
    pub unsatisfiable: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ReasonError {
    /// The deadline passed before classification finished. No partial
    /// inferred facts are returned.
    #[error("reasoning deadline exceeded")]
    Timeout,
    /// The asserted facts violate the axioms. Nothing inferred from an
    /// inconsistent ontology can be trusted.
    #[error("ontology inconsistent: {0}")]
    Inconsistent(String),
    /// A class that provably cannot have any member. Always a
    /// configuration error in the axiom set.
    #[error("unsatisfiable classes: {0}")]
    Unsatisfiable(String),
    #[error("reasoner backend error: {0}")]
    Backend(String),
}

/// The pluggable reasoning backend. Implementations must check `deadline`
/// at reasonable intervals and bail with [`ReasonError::Timeout`].
pub trait Reasoner {
    fn classify(
        &self,
        graph: &Graph,
        schema: &Schema,
        axioms: &AxiomSet,
        deadline: Instant,
    ) -> Result<Entailment, ReasonError>;
}

/// Invoke `reasoner` over the fully assembled graph and materialize the
/// entailed type and edge assertions. Fatal conditions (timeout,
/// inconsistency, unsatisfiable classes) leave the graph untouched.
pub fn invoke(
    reasoner: &dyn Reasoner,
    graph: &mut Graph,
    schema: &Schema,
    axioms: &AxiomSet,
    timeout: Duration,
) -> Result<Entailment, ReasonError> {
    let started = Instant::now();
    let deadline = started + timeout;

    let entailment = reasoner.classify(graph, schema, axioms, deadline)?;

    if !entailment.unsatisfiable.is_empty() {
        return Err(ReasonError::Unsatisfiable(
            entailment.unsatisfiable.join(", "),
        ));
    }
    if !entailment.consistent {
        let conflict = entailment
            .conflict
            .clone()
            .unwrap_or_else(|| "unspecified conflict".to_string());
        return Err(ReasonError::Inconsistent(conflict));
    }

    let pairs: Vec<(IndividualId, String)> = entailment
        .inferred
        .iter()
        .map(|a| (a.individual, a.class.clone()))
        .collect();
    graph.materialize_inferred(&pairs);
    for edge in &entailment.inferred_edges {
        graph.assert_edge(
            edge.subject,
            &edge.property,
            edge.object,
            None,
            EdgeOrigin::Inferred,
        );
    }

    tracing::info!(
        inferred = pairs.len(),
        inferred_edges = entailment.inferred_edges.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "reasoning complete"
    );
    Ok(entailment)
}
