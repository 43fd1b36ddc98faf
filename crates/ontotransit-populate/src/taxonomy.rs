//! Taxonomy Assigner: static subclasses from categorical attribute values.
//!
//! Best-effort over closed-world category sets: values outside the
//! configured vocabulary produce a collected warning and leave the
//! individual with its base type only. The mapping tables and the fast/slow
//! transfer threshold are configuration, not code: real-world category
//! vocabularies vary by transit agency.

use ontotransit_graph::{Graph, IndividualId, Literal};
use ontotransit_schema::{EntityKind, Schema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Warning;

/// Externally loadable configuration for taxonomy assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// Raw `route_type` value (GTFS code or word) -> subclass name.
    pub route_classes: BTreeMap<String, String>,
    /// Raw `pathway_mode` value -> subclass name.
    pub pathway_classes: BTreeMap<String, String>,
    /// Subclass assigned when `pathway_mode` is absent.
    pub default_pathway_class: String,
    /// Transfers strictly below this many seconds are fast; at or above,
    /// slow (the boundary is inclusive on the slow side).
    pub fast_transfer_threshold_secs: i64,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        let route_classes = [
            ("0", "TramRoute"),
            ("tram", "TramRoute"),
            ("1", "MetroRoute"),
            ("metro", "MetroRoute"),
            ("3", "BusRoute"),
            ("bus", "BusRoute"),
            ("11", "TrolleyRoute"),
            ("trolley", "TrolleyRoute"),
            ("trolleybus", "TrolleyRoute"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let pathway_classes = [
            ("1", "Walkway"),
            ("walkway", "Walkway"),
            ("2", "StairsPathway"),
            ("stairs", "StairsPathway"),
            ("4", "EscalatorPathway"),
            ("escalator", "EscalatorPathway"),
            ("5", "ElevatorPathway"),
            ("elevator", "ElevatorPathway"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            route_classes,
            pathway_classes,
            default_pathway_class: "Walkway".to_string(),
            fast_transfer_threshold_secs: 180,
        }
    }
}

/// Assign static subclasses across the whole graph. Returns the collected
/// warnings; never fails the run.
pub fn assign(_schema: &Schema, config: &TaxonomyConfig, graph: &mut Graph) -> Vec<Warning> {
    let mut warnings = Vec::new();

    for id in graph.individuals_of_kind(EntityKind::Route) {
        classify_categorical(
            graph,
            id,
            EntityKind::Route,
            "route_type",
            &config.route_classes,
            None,
            &mut warnings,
        );
    }

    for id in graph.individuals_of_kind(EntityKind::Trip) {
        let accessible = matches!(
            graph.value(id, "wheelchair_accessible"),
            Some(Literal::Text(v)) if v == "accessible"
        );
        if accessible {
            graph.assert_class(id, "WheelchairFriendlyTrip");
        }
    }

    for id in graph.individuals_of_kind(EntityKind::Transfer) {
        if let Some(Literal::Integer(secs)) = graph.value(id, "min_transfer_time").cloned() {
            let class = if secs < config.fast_transfer_threshold_secs {
                "FastTransfer"
            } else {
                "SlowTransfer"
            };
            graph.assert_class(id, class);
        }
    }

    for id in graph.individuals_of_kind(EntityKind::Pathway) {
        classify_categorical(
            graph,
            id,
            EntityKind::Pathway,
            "pathway_mode",
            &config.pathway_classes,
            Some(config.default_pathway_class.as_str()),
            &mut warnings,
        );
    }

    warnings
}

fn classify_categorical(
    graph: &mut Graph,
    id: IndividualId,
    kind: EntityKind,
    attribute: &str,
    classes: &BTreeMap<String, String>,
    absent_default: Option<&str>,
    warnings: &mut Vec<Warning>,
) {
    let raw = graph.value(id, attribute).map(|v| v.to_string());
    match raw {
        Some(value) => match classes.get(&value.to_ascii_lowercase()) {
            Some(class) => graph.assert_class(id, class),
            None => warnings.push(Warning::UnclassifiedIndividual {
                kind,
                key: graph.key_of(id).to_string(),
                attribute: attribute.to_string(),
                value,
            }),
        },
        None => {
            if let Some(default) = absent_default {
                graph.assert_class(id, default);
            }
        }
    }
}
