//! Row Mapper: one typed individual per source row.
//!
//! Each row is keyed by its kind's declared primary key, deduplicated
//! through the graph's key index (a repeated key merges attribute values
//! into the existing individual), and gets every declared data property set
//! with type-correct coercion. Schedule entries additionally enforce the
//! per-trip ordering invariant here, where the source row order is still
//! visible.

use ontotransit_graph::{Graph, Literal};
use ontotransit_schema::{EntityKind, Schema};
use std::collections::HashMap;

use crate::error::PopulateError;
use crate::row::{coerce, raw_text, row_key, Row};

pub struct RowMapper<'a> {
    schema: &'a Schema,
    /// Last seen stop_sequence per trip key, for the strict-ordering check.
    last_sequence: HashMap<String, i64>,
}

impl<'a> RowMapper<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            last_sequence: HashMap::new(),
        }
    }

    /// Map a whole table in source order.
    pub fn map_table(
        &mut self,
        graph: &mut Graph,
        kind: EntityKind,
        rows: &[Row],
    ) -> Result<(), PopulateError> {
        for row in rows {
            self.map_row(graph, kind, row)?;
        }
        Ok(())
    }

    fn map_row(&mut self, graph: &mut Graph, kind: EntityKind, row: &Row) -> Result<(), PopulateError> {
        let decl = self.schema.kind(kind);
        let key = row_key(decl, row)?;

        if kind == EntityKind::ScheduleEntry {
            self.check_sequence(row, &key)?;
        }

        let id = graph.insert(kind, &key);
        for attr in &decl.attrs {
            match raw_text(row, attr.column) {
                Some(raw) => {
                    let value = coerce(&raw, attr.datatype).map_err(|detail| {
                        PopulateError::mapping(
                            kind,
                            &key,
                            format!("column `{}`: {detail}", attr.column),
                        )
                    })?;
                    graph.set_value(id, attr.column, value);
                }
                None if attr.required => {
                    return Err(PopulateError::mapping(
                        kind,
                        &key,
                        format!("missing required column `{}`", attr.column),
                    ));
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Per-trip stop_sequence must be non-negative and strictly increasing.
    /// Gaps in the source are preserved, never compacted.
    fn check_sequence(&mut self, row: &Row, key: &str) -> Result<(), PopulateError> {
        let trip = raw_text(row, "trip_id").unwrap_or_default();
        let raw = raw_text(row, "stop_sequence").ok_or_else(|| {
            PopulateError::mapping(
                EntityKind::ScheduleEntry,
                key,
                "missing required column `stop_sequence`",
            )
        })?;
        let seq = match coerce(&raw, ontotransit_schema::Datatype::Integer) {
            Ok(Literal::Integer(n)) => n,
            _ => {
                return Err(PopulateError::mapping(
                    EntityKind::ScheduleEntry,
                    key,
                    format!("column `stop_sequence`: expected an integer, got `{raw}`"),
                ))
            }
        };
        if seq < 0 {
            return Err(PopulateError::mapping(
                EntityKind::ScheduleEntry,
                key,
                format!("negative stop_sequence {seq}"),
            ));
        }
        if let Some(&last) = self.last_sequence.get(&trip) {
            if seq <= last {
                return Err(PopulateError::mapping(
                    EntityKind::ScheduleEntry,
                    key,
                    format!("stop_sequence {seq} not strictly increasing after {last}"),
                ));
            }
        }
        self.last_sequence.insert(trip, seq);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::row;
    use ontotransit_schema::transit_schema;

    #[test]
    fn test_maps_stop_with_coerced_values() {
        let schema = transit_schema();
        let mut graph = Graph::new();
        let mut mapper = RowMapper::new(&schema);
        mapper
            .map_table(
                &mut graph,
                EntityKind::Stop,
                &[row(&[
                    ("stop_id", "S1"),
                    ("stop_name", "Centre"),
                    ("stop_lat", "42.69"),
                    ("wheelchair_boarding", "1"),
                ])],
            )
            .unwrap();

        let s = graph.lookup(EntityKind::Stop, "S1").unwrap();
        assert_eq!(graph.value(s, "stop_name"), Some(&Literal::Text("Centre".into())));
        assert_eq!(graph.value(s, "stop_lat"), Some(&Literal::Float(42.69)));
        assert_eq!(
            graph.value(s, "wheelchair_boarding"),
            Some(&Literal::Text("accessible".into()))
        );
    }

    #[test]
    fn test_duplicate_key_merges_not_duplicates() {
        let schema = transit_schema();
        let mut graph = Graph::new();
        let mut mapper = RowMapper::new(&schema);
        mapper
            .map_table(
                &mut graph,
                EntityKind::Stop,
                &[
                    row(&[("stop_id", "S1"), ("stop_name", "Old")]),
                    row(&[("stop_id", "S1"), ("stop_name", "New"), ("stop_lon", "23.3")]),
                ],
            )
            .unwrap();
        assert_eq!(graph.individual_count(), 1);
        let s = graph.lookup(EntityKind::Stop, "S1").unwrap();
        assert_eq!(graph.value(s, "stop_name"), Some(&Literal::Text("New".into())));
        assert_eq!(graph.value(s, "stop_lon"), Some(&Literal::Float(23.3)));
    }

    #[test]
    fn test_non_numeric_latitude_fails() {
        let schema = transit_schema();
        let mut graph = Graph::new();
        let mut mapper = RowMapper::new(&schema);
        let err = mapper
            .map_table(
                &mut graph,
                EntityKind::Stop,
                &[row(&[("stop_id", "S1"), ("stop_lat", "north")])],
            )
            .unwrap_err();
        assert!(matches!(err, PopulateError::Mapping { .. }));
        assert!(err.to_string().contains("stop_lat"));
    }

    #[test]
    fn test_sequence_must_strictly_increase_per_trip() {
        let schema = transit_schema();
        let mut graph = Graph::new();
        let mut mapper = RowMapper::new(&schema);
        // Gap between 1 and 5 is fine; a second trip interleaving is fine.
        mapper
            .map_table(
                &mut graph,
                EntityKind::ScheduleEntry,
                &[
                    row(&[("trip_id", "T1"), ("stop_id", "S1"), ("stop_sequence", "1")]),
                    row(&[("trip_id", "T2"), ("stop_id", "S1"), ("stop_sequence", "1")]),
                    row(&[("trip_id", "T1"), ("stop_id", "S2"), ("stop_sequence", "5")]),
                ],
            )
            .unwrap();

        let err = mapper
            .map_table(
                &mut graph,
                EntityKind::ScheduleEntry,
                &[row(&[("trip_id", "T1"), ("stop_id", "S3"), ("stop_sequence", "5")])],
            )
            .unwrap_err();
        assert!(err.to_string().contains("not strictly increasing"));
    }
}
