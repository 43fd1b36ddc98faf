//! Population pipeline: tabular transit data in, typed knowledge graph out.
//!
//! A single-pass, single-threaded batch: each stage fully consumes its input
//! before the next begins, over one graph owned by the run.
//!
//! 1. **Row Mapper** (`mapper`): rows → typed individuals with data
//!    properties, deduplicated by primary key.
//! 2. **Relationship Builder** (`relations`): foreign keys → object
//!    properties with inverses; ordinals for trip stop sequencing.
//! 3. **Taxonomy Assigner** (`taxonomy`): categorical values → static
//!    subclasses, driven by external configuration.
//! 4. **Composite Concept Classifier** (`concepts`): restriction axioms
//!    registered for the reasoner; no per-row work.
//!
//! Reasoner invocation lives in `ontotransit-reason`; this crate hands it a
//! complete graph and the axiom set, never a partial one.

pub mod concepts;
pub mod error;
pub mod mapper;
pub mod relations;
pub mod report;
pub mod row;
pub mod taxonomy;

pub use error::{PopulateError, Warning};
pub use mapper::RowMapper;
pub use relations::RelationshipBuilder;
pub use report::{build_report, InferredAssertion, RunReport};
pub use row::Row;
pub use taxonomy::TaxonomyConfig;

use ontotransit_graph::Graph;
use ontotransit_schema::{AxiomSet, EntityKind, Schema};

/// The eight source tables, as delivered by the file-reading boundary:
/// lists of column→value rows, in source order (order encodes sequence for
/// schedule entries).
#[derive(Debug, Clone, Default)]
pub struct TransitTables {
    pub levels: Vec<Row>,
    pub stops: Vec<Row>,
    pub routes: Vec<Row>,
    pub trips: Vec<Row>,
    pub schedule_entries: Vec<Row>,
    pub transfers: Vec<Row>,
    pub pathways: Vec<Row>,
    pub fares: Vec<Row>,
}

impl TransitTables {
    pub fn table(&self, kind: EntityKind) -> &[Row] {
        match kind {
            EntityKind::Level => &self.levels,
            EntityKind::Stop => &self.stops,
            EntityKind::Route => &self.routes,
            EntityKind::Trip => &self.trips,
            EntityKind::ScheduleEntry => &self.schedule_entries,
            EntityKind::Transfer => &self.transfers,
            EntityKind::Pathway => &self.pathways,
            EntityKind::Fare => &self.fares,
            EntityKind::Agency => &[],
        }
    }

    pub fn row_count(&self) -> usize {
        EntityKind::POPULATION_ORDER
            .iter()
            .map(|k| self.table(*k).len())
            .sum()
    }
}

/// Result of a successful population pass: the axioms to reason with and
/// the warnings collected along the way.
#[derive(Debug)]
pub struct PopulationResult {
    pub axioms: AxiomSet,
    pub warnings: Vec<Warning>,
}

/// Run stages 1-4 over `graph`. On error the graph must be discarded: no
/// partial graph is ever handed to the classifier or reasoner.
pub fn populate(
    tables: &TransitTables,
    schema: &Schema,
    config: &TaxonomyConfig,
    graph: &mut Graph,
) -> Result<PopulationResult, PopulateError> {
    let mut mapper = RowMapper::new(schema);
    for kind in EntityKind::POPULATION_ORDER {
        mapper.map_table(graph, kind, tables.table(kind))?;
    }
    tracing::info!(
        individuals = graph.individual_count(),
        rows = tables.row_count(),
        "row mapping complete"
    );

    let builder = RelationshipBuilder::new(schema);
    for kind in EntityKind::POPULATION_ORDER {
        builder.build_table(graph, kind, tables.table(kind))?;
    }
    tracing::info!(edges = graph.edge_count(), "relationship building complete");

    let warnings = taxonomy::assign(schema, config, graph);
    for warning in &warnings {
        tracing::warn!(%warning, "taxonomy assignment");
    }

    let mut axioms = AxiomSet::new();
    concepts::declare_composite_concepts(schema, &mut axioms);

    Ok(PopulationResult { axioms, warnings })
}
