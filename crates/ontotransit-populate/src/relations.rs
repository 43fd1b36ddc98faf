//! Relationship Builder: foreign keys materialized as graph edges.
//!
//! Runs as a second pass over the same rows, after every table has been
//! mapped, so any FK can resolve regardless of table interleaving. Both the
//! declared property and its inverse are asserted. An endpoint key that
//! cannot be found is a hard error: a half-built graph with dangling
//! semantics would produce false reasoner conclusions.

use ontotransit_graph::{EdgeOrigin, Graph, IndividualId, Literal};
use ontotransit_schema::{EntityKind, Schema};

use crate::error::PopulateError;
use crate::row::{raw_text, row_key, Row};

pub struct RelationshipBuilder<'a> {
    schema: &'a Schema,
}

impl<'a> RelationshipBuilder<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    pub fn build_table(
        &self,
        graph: &mut Graph,
        kind: EntityKind,
        rows: &[Row],
    ) -> Result<(), PopulateError> {
        for row in rows {
            let key = row_key(self.schema.kind(kind), row)?;
            match kind {
                EntityKind::Stop => self.link_stop(graph, row, &key)?,
                EntityKind::Route => self.link_route(graph, row),
                EntityKind::Trip => self.link_trip(graph, row, &key)?,
                EntityKind::ScheduleEntry => self.link_schedule_entry(graph, row, &key)?,
                EntityKind::Transfer => self.link_transfer(graph, row, &key)?,
                EntityKind::Pathway => self.link_pathway(graph, row, &key)?,
                EntityKind::Fare => self.link_fare(graph, row, &key)?,
                EntityKind::Level | EntityKind::Agency => {}
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Per-kind link rules
    // ------------------------------------------------------------------

    fn link_stop(&self, graph: &mut Graph, row: &Row, key: &str) -> Result<(), PopulateError> {
        let stop = self.resolve(graph, EntityKind::Stop, key, EntityKind::Stop, key)?;
        if let Some(level_key) = raw_text(row, "level_id") {
            let level = self.resolve(graph, EntityKind::Stop, key, EntityKind::Level, &level_key)?;
            self.link(graph, stop, "hasLevel", level);
        }
        if let Some(parent_key) = raw_text(row, "parent_station") {
            let parent =
                self.resolve(graph, EntityKind::Stop, key, EntityKind::Stop, &parent_key)?;
            self.link(graph, stop, "parentStation", parent);
        }
        Ok(())
    }

    // Agencies have no table of their own in this feed shape; they are
    // created on demand from the columns that mention them.
    fn link_route(&self, graph: &mut Graph, row: &Row) {
        if let Some(agency_key) = raw_text(row, "agency_id") {
            graph.insert(EntityKind::Agency, &agency_key);
        }
    }

    fn link_trip(&self, graph: &mut Graph, row: &Row, key: &str) -> Result<(), PopulateError> {
        let trip = self.resolve(graph, EntityKind::Trip, key, EntityKind::Trip, key)?;
        let route_key = raw_text(row, "route_id").ok_or_else(|| {
            PopulateError::mapping(EntityKind::Trip, key, "missing required column `route_id`")
        })?;
        let route = self.resolve(graph, EntityKind::Trip, key, EntityKind::Route, &route_key)?;
        self.link(graph, trip, "belongsToRoute", route);
        Ok(())
    }

    fn link_schedule_entry(
        &self,
        graph: &mut Graph,
        row: &Row,
        key: &str,
    ) -> Result<(), PopulateError> {
        let kind = EntityKind::ScheduleEntry;
        let entry = self.resolve(graph, kind, key, kind, key)?;

        let trip_key = raw_text(row, "trip_id").unwrap_or_default();
        let stop_key = raw_text(row, "stop_id").ok_or_else(|| {
            PopulateError::mapping(kind, key, "missing required column `stop_id`")
        })?;
        let trip = self.resolve(graph, kind, key, EntityKind::Trip, &trip_key)?;
        let stop = self.resolve(graph, kind, key, EntityKind::Stop, &stop_key)?;

        let ordinal = match graph.value(entry, "stop_sequence") {
            Some(Literal::Integer(n)) => u32::try_from(*n).map_err(|_| {
                PopulateError::mapping(kind, key, format!("stop_sequence {n} out of range"))
            })?,
            _ => {
                return Err(PopulateError::mapping(
                    kind,
                    key,
                    "missing required column `stop_sequence`",
                ))
            }
        };

        self.link(graph, entry, "entryOfTrip", trip);
        self.link(graph, entry, "atStop", stop);
        // The ordinal rides on the edge itself so "next stop on this trip"
        // stays answerable from the graph alone.
        graph.assert_edge(trip, "hasStop", stop, Some(ordinal), EdgeOrigin::Asserted);
        Ok(())
    }

    fn link_transfer(&self, graph: &mut Graph, row: &Row, key: &str) -> Result<(), PopulateError> {
        let kind = EntityKind::Transfer;
        let transfer = self.resolve(graph, kind, key, kind, key)?;

        let from_key = raw_text(row, "from_stop_id").unwrap_or_default();
        let to_key = raw_text(row, "to_stop_id").unwrap_or_default();
        let from = self.resolve(graph, kind, key, EntityKind::Stop, &from_key)?;
        let to = self.resolve(graph, kind, key, EntityKind::Stop, &to_key)?;
        self.link(graph, transfer, "fromStop", from);
        self.link(graph, transfer, "toStop", to);
        graph.assert_edge(from, "connectedTo", to, None, EdgeOrigin::Asserted);

        // Optional route/trip endpoints. A transfer that names a route also
        // weakly asserts that the route serves the involved stop.
        if let Some(route_key) = raw_text(row, "from_route_id") {
            let route = self.resolve(graph, kind, key, EntityKind::Route, &route_key)?;
            self.link(graph, transfer, "fromRoute", route);
            self.link(graph, route, "servesStop", from);
        }
        if let Some(route_key) = raw_text(row, "to_route_id") {
            let route = self.resolve(graph, kind, key, EntityKind::Route, &route_key)?;
            self.link(graph, transfer, "toRoute", route);
            self.link(graph, route, "servesStop", to);
        }
        if let Some(trip_key) = raw_text(row, "from_trip_id") {
            let trip = self.resolve(graph, kind, key, EntityKind::Trip, &trip_key)?;
            self.link(graph, transfer, "fromTrip", trip);
        }
        if let Some(trip_key) = raw_text(row, "to_trip_id") {
            let trip = self.resolve(graph, kind, key, EntityKind::Trip, &trip_key)?;
            self.link(graph, transfer, "toTrip", trip);
        }
        Ok(())
    }

    fn link_pathway(&self, graph: &mut Graph, row: &Row, key: &str) -> Result<(), PopulateError> {
        let kind = EntityKind::Pathway;
        let pathway = self.resolve(graph, kind, key, kind, key)?;

        let from_key = raw_text(row, "from_stop_id").ok_or_else(|| {
            PopulateError::mapping(kind, key, "missing required column `from_stop_id`")
        })?;
        let to_key = raw_text(row, "to_stop_id").ok_or_else(|| {
            PopulateError::mapping(kind, key, "missing required column `to_stop_id`")
        })?;
        let from = self.resolve(graph, kind, key, EntityKind::Stop, &from_key)?;
        let to = self.resolve(graph, kind, key, EntityKind::Stop, &to_key)?;

        self.link(graph, pathway, "connectsStop", from);
        self.link(graph, pathway, "connectsStop", to);
        graph.assert_edge(from, "connectedTo", to, None, EdgeOrigin::Asserted);

        // One derivation rule, not a second independent assertion: the
        // reverse leg exists exactly when the pathway is bidirectional, and
        // is marked as derived so the rule can change without drift.
        let bidirectional =
            matches!(graph.value(pathway, "is_bidirectional"), Some(Literal::Boolean(true)));
        if bidirectional {
            graph.assert_edge(to, "connectedTo", from, None, EdgeOrigin::DerivedReverse);
        }
        Ok(())
    }

    fn link_fare(&self, graph: &mut Graph, row: &Row, key: &str) -> Result<(), PopulateError> {
        if let Some(agency_key) = raw_text(row, "agency_id") {
            let fare = self.resolve(graph, EntityKind::Fare, key, EntityKind::Fare, key)?;
            let agency = graph.insert(EntityKind::Agency, &agency_key);
            self.link(graph, agency, "providesFare", fare);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn resolve(
        &self,
        graph: &Graph,
        kind: EntityKind,
        key: &str,
        target_kind: EntityKind,
        target_key: &str,
    ) -> Result<IndividualId, PopulateError> {
        graph
            .lookup(target_kind, target_key)
            .ok_or_else(|| PopulateError::UnresolvedReference {
                kind,
                key: key.to_string(),
                target_kind,
                target_key: target_key.to_string(),
            })
    }

    /// Assert `subject property object` plus the declared inverse.
    fn link(&self, graph: &mut Graph, subject: IndividualId, property: &str, object: IndividualId) {
        graph.assert_edge(subject, property, object, None, EdgeOrigin::Asserted);
        if let Some(inverse) = self.schema.inverse_of(property) {
            graph.assert_edge(object, inverse, subject, None, EdgeOrigin::Asserted);
        }
    }
}
