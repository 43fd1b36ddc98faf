//! Run report: counts, warnings, and the base-vs-inferred type diff.

use ontotransit_graph::Graph;
use ontotransit_schema::EntityKind;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::Warning;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferredAssertion {
    pub individual: String,
    pub class: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub individuals: usize,
    pub edges: usize,
    pub individuals_by_kind: BTreeMap<String, usize>,
    pub warnings: Vec<String>,
    /// Type assertions added by entailment, in materialization order.
    pub inferred: Vec<InferredAssertion>,
}

const REPORTED_KINDS: [EntityKind; 9] = [
    EntityKind::Level,
    EntityKind::Stop,
    EntityKind::Route,
    EntityKind::Trip,
    EntityKind::ScheduleEntry,
    EntityKind::Transfer,
    EntityKind::Pathway,
    EntityKind::Fare,
    EntityKind::Agency,
];

pub fn build_report(graph: &Graph, warnings: &[Warning]) -> RunReport {
    let individuals_by_kind = REPORTED_KINDS
        .iter()
        .map(|kind| {
            (
                kind.name().to_string(),
                graph.individuals_of_kind(*kind).len(),
            )
        })
        .filter(|(_, n)| *n > 0)
        .collect();

    RunReport {
        individuals: graph.individual_count(),
        edges: graph.edge_count(),
        individuals_by_kind,
        warnings: warnings.iter().map(|w| w.to_string()).collect(),
        inferred: graph
            .inferred_assertions()
            .into_iter()
            .map(|(id, class)| InferredAssertion {
                individual: graph.name_of(id).to_string(),
                class,
            })
            .collect(),
    }
}
