//! Integration tests for the complete ontology pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Table rows → population pipeline → typed graph
//! - Axiom set → reasoner → materialized inferred classes
//! - Run report over the combined result
//!
//! Run with: cargo test --test integration_tests

use std::time::Duration;

use ontotransit_graph::{EdgeOrigin, Graph};
use ontotransit_populate::{build_report, populate, row::row, TaxonomyConfig, TransitTables};
use ontotransit_reason::{invoke, ModelCheckReasoner, ReasonError};
use ontotransit_schema::{transit_schema, EntityKind};

const TIMEOUT: Duration = Duration::from_secs(5);

/// An underground platform reachable only by stairs from two street-level
/// entrances, served by one tram trip.
fn stairs_interchange() -> TransitTables {
    TransitTables {
        stops: vec![
            row(&[
                ("stop_id", "S"),
                ("stop_name", "Platform"),
                ("wheelchair_boarding", "2"),
            ]),
            row(&[("stop_id", "A"), ("stop_name", "North entrance")]),
            row(&[("stop_id", "B"), ("stop_name", "South entrance")]),
        ],
        routes: vec![row(&[("route_id", "R"), ("route_type", "0")])],
        trips: vec![row(&[
            ("trip_id", "T"),
            ("route_id", "R"),
            ("wheelchair_accessible", "2"),
        ])],
        schedule_entries: vec![
            row(&[("trip_id", "T"), ("stop_id", "S"), ("stop_sequence", "1")]),
            row(&[("trip_id", "T"), ("stop_id", "A"), ("stop_sequence", "2")]),
        ],
        pathways: vec![
            row(&[
                ("pathway_id", "P1"),
                ("from_stop_id", "A"),
                ("to_stop_id", "S"),
                ("pathway_mode", "2"),
                ("is_bidirectional", "1"),
            ]),
            row(&[
                ("pathway_id", "P2"),
                ("from_stop_id", "B"),
                ("to_stop_id", "S"),
                ("pathway_mode", "2"),
            ]),
        ],
        ..Default::default()
    }
}

/// Populate and classify in one go, as the CLI does.
fn run(tables: &TransitTables) -> Graph {
    let schema = transit_schema();
    let mut graph = Graph::new();
    let result = populate(tables, &schema, &TaxonomyConfig::default(), &mut graph).unwrap();
    invoke(
        &ModelCheckReasoner::new(),
        &mut graph,
        &schema,
        &result.axioms,
        TIMEOUT,
    )
    .unwrap();
    graph
}

// ============================================================================
// Population → reasoning end to end
// ============================================================================

#[test]
fn test_stairs_interchange_classification() {
    let graph = run(&stairs_interchange());

    let s = graph.lookup(EntityKind::Stop, "S").unwrap();
    assert_eq!(
        graph.classes_of(s),
        vec!["OnlyStairsAccessibleStop", "Stop"]
    );

    let r = graph.lookup(EntityKind::Route, "R").unwrap();
    assert_eq!(graph.classes_of(r), vec!["Route", "TramRoute"]);

    // Not wheelchair accessible, so the trip keeps its base type only.
    let t = graph.lookup(EntityKind::Trip, "T").unwrap();
    assert_eq!(graph.classes_of(t), vec!["Trip"]);
}

#[test]
fn test_accessible_boarding_overlaps_stairs_classification() {
    // The platform's own boarding attribute says accessible even though
    // every pathway is stairs: both composite classes apply.
    let mut tables = stairs_interchange();
    tables.stops[0] = row(&[("stop_id", "S"), ("wheelchair_boarding", "1")]);

    let graph = run(&tables);
    let s = graph.lookup(EntityKind::Stop, "S").unwrap();
    assert!(graph.has_class(s, "AccessibleStop"));
    assert!(graph.has_class(s, "OnlyStairsAccessibleStop"));
}

#[test]
fn test_elevator_pathway_classification() {
    let mut tables = stairs_interchange();
    tables.pathways.push(row(&[
        ("pathway_id", "P3"),
        ("from_stop_id", "A"),
        ("to_stop_id", "S"),
        ("pathway_mode", "5"),
    ]));

    let graph = run(&tables);
    let s = graph.lookup(EntityKind::Stop, "S").unwrap();
    assert!(graph.has_class(s, "AccessibleStop"));
    // One non-stairs pathway breaks the universal restriction.
    assert!(!graph.has_class(s, "OnlyStairsAccessibleStop"));
}

#[test]
fn test_transfer_route_marks_served_stop() {
    let mut tables = stairs_interchange();
    tables.transfers.push(row(&[
        ("from_stop_id", "S"),
        ("to_stop_id", "A"),
        ("min_transfer_time", "240"),
        ("from_route_id", "R"),
    ]));

    let graph = run(&tables);
    let s = graph.lookup(EntityKind::Stop, "S").unwrap();
    assert!(graph.has_class(s, "ServedStop"));
    let transfer = graph.lookup(EntityKind::Transfer, "S:A:0").unwrap();
    assert!(graph.has_class(transfer, "SlowTransfer"));
}

#[test]
fn test_transfer_chain_closes_transitively() {
    // connectedTo is transitive: two hops of transfers entail the third
    // connection, materialized with an inferred origin.
    let tables = TransitTables {
        stops: vec![
            row(&[("stop_id", "A")]),
            row(&[("stop_id", "B")]),
            row(&[("stop_id", "C")]),
        ],
        transfers: vec![
            row(&[("from_stop_id", "A"), ("to_stop_id", "B")]),
            row(&[("from_stop_id", "B"), ("to_stop_id", "C")]),
        ],
        ..Default::default()
    };

    let graph = run(&tables);
    let a = graph.lookup(EntityKind::Stop, "A").unwrap();
    let c = graph.lookup(EntityKind::Stop, "C").unwrap();
    assert!(graph.related(a, "connectedTo").contains(&c));
    assert!(graph
        .edges_out(a, "connectedTo")
        .iter()
        .any(|e| e.object == c && e.origin == EdgeOrigin::Inferred));
    // No transfer leads back to A, so nothing connects to it.
    assert!(graph.related(c, "connectedTo").is_empty());
}

#[test]
fn test_pathway_links_generalize_to_transport_elements() {
    // connectsStop is a subproperty of connectsTransportElement; the
    // generalized edges appear after reasoning.
    let graph = run(&stairs_interchange());
    let p1 = graph.lookup(EntityKind::Pathway, "P1").unwrap();
    assert_eq!(graph.related(p1, "connectsTransportElement").len(), 2);
}

#[test]
fn test_every_edge_respects_declared_signatures() {
    // Every edge in a finished run, inferred ones included, must use a
    // declared property and satisfy its domain and range.
    let mut tables = stairs_interchange();
    tables.levels.push(row(&[("level_id", "L1"), ("level_index", "-1")]));
    tables.stops[0] = row(&[
        ("stop_id", "S"),
        ("wheelchair_boarding", "2"),
        ("level_id", "L1"),
    ]);
    tables.transfers.push(row(&[
        ("from_stop_id", "S"),
        ("to_stop_id", "A"),
        ("min_transfer_time", "240"),
        ("from_route_id", "R"),
    ]));
    tables.fares.push(row(&[
        ("fare_id", "F1"),
        ("price", "1.60"),
        ("currency_type", "BGN"),
        ("agency_id", "AG"),
    ]));

    let graph = run(&tables);
    let schema = transit_schema();
    for edge in graph.edges() {
        let name = graph.property_name(edge.property);
        let decl = schema
            .property(name)
            .unwrap_or_else(|| panic!("edge uses undeclared property `{name}`"));
        if let Some(domain) = decl.domain {
            assert_eq!(
                graph.kind_of(edge.subject),
                domain,
                "bad subject for `{name}` from {}",
                graph.name_of(edge.subject)
            );
        }
        if let Some(range) = decl.range {
            assert_eq!(
                graph.kind_of(edge.object),
                range,
                "bad object for `{name}` to {}",
                graph.name_of(edge.object)
            );
        }
    }
}

// ============================================================================
// Whole-run properties
// ============================================================================

#[test]
fn test_full_run_is_idempotent() {
    let schema = transit_schema();
    let config = TaxonomyConfig::default();
    let tables = stairs_interchange();
    let reasoner = ModelCheckReasoner::new();

    let mut graph = Graph::new();
    let result = populate(&tables, &schema, &config, &mut graph).unwrap();
    invoke(&reasoner, &mut graph, &schema, &result.axioms, TIMEOUT).unwrap();
    let first = graph.snapshot();

    let result = populate(&tables, &schema, &config, &mut graph).unwrap();
    invoke(&reasoner, &mut graph, &schema, &result.axioms, TIMEOUT).unwrap();
    assert_eq!(graph.snapshot(), first);
}

#[test]
fn test_report_covers_inferred_diff() {
    let schema = transit_schema();
    let mut graph = Graph::new();
    let result = populate(
        &stairs_interchange(),
        &schema,
        &TaxonomyConfig::default(),
        &mut graph,
    )
    .unwrap();
    invoke(
        &ModelCheckReasoner::new(),
        &mut graph,
        &schema,
        &result.axioms,
        TIMEOUT,
    )
    .unwrap();

    let report = build_report(&graph, &result.warnings);
    assert_eq!(report.individuals, graph.individual_count());
    assert!(report
        .inferred
        .iter()
        .any(|a| a.individual == "stop_S" && a.class == "OnlyStairsAccessibleStop"));
    // Inferred classes never leak into the asserted per-kind counts.
    assert_eq!(report.individuals_by_kind["Stop"], 3);
}

#[test]
fn test_zero_timeout_aborts_reasoning() {
    let schema = transit_schema();
    let mut graph = Graph::new();
    let result = populate(
        &stairs_interchange(),
        &schema,
        &TaxonomyConfig::default(),
        &mut graph,
    )
    .unwrap();

    let err = invoke(
        &ModelCheckReasoner::new(),
        &mut graph,
        &schema,
        &result.axioms,
        Duration::ZERO,
    )
    .unwrap_err();
    assert!(matches!(err, ReasonError::Timeout));
    assert!(graph.inferred_assertions().is_empty());
}
