//! Composite Concept Classifier: schema-level restriction axioms.
//!
//! Declared once per run, never per row. These are equivalence axioms
//! (necessary *and* sufficient), so the reasoner classifies any individual
//! satisfying the right-hand side even when it was never typed that way.
//! The only observable action here is registering the axioms.

use ontotransit_schema::{AxiomSet, ClassExpr, EntityKind, Schema};

/// Register the composite transit concepts plus the disjointness groups the
/// consistency check relies on.
pub fn declare_composite_concepts(schema: &Schema, axioms: &mut AxiomSet) {
    // AccessibleStop: some non-stairs pathway connects the stop, or the
    // stop's own boarding attribute states accessibility directly.
    axioms.declare_equivalent(
        "AccessibleStop",
        ClassExpr::and(vec![
            ClassExpr::named("Stop"),
            ClassExpr::or(vec![
                ClassExpr::some(
                    "isConnectedBy",
                    ClassExpr::and(vec![
                        ClassExpr::named("Pathway"),
                        ClassExpr::not(ClassExpr::named("StairsPathway")),
                    ]),
                ),
                ClassExpr::has_value("wheelchair_boarding", "accessible"),
            ]),
        ]),
    );

    // OnlyStairsAccessibleStop: every connecting pathway is stairs, and at
    // least one exists, distinguishing "only stairs" from "no pathways".
    axioms.declare_equivalent(
        "OnlyStairsAccessibleStop",
        ClassExpr::and(vec![
            ClassExpr::named("Stop"),
            ClassExpr::only("isConnectedBy", ClassExpr::named("StairsPathway")),
            ClassExpr::some("isConnectedBy", ClassExpr::named("Pathway")),
        ]),
    );

    // ServedStop: some route is known to serve the stop.
    axioms.declare_equivalent(
        "ServedStop",
        ClassExpr::and(vec![
            ClassExpr::named("Stop"),
            ClassExpr::some("isServedBy", ClassExpr::named("Route")),
        ]),
    );

    // A pathway has one mode; a transfer is fast or slow, never both.
    axioms.declare_disjoint(
        schema
            .subclasses_of(EntityKind::Pathway)
            .map(|s| s.class.to_string())
            .collect(),
    );
    axioms.declare_disjoint(vec!["FastTransfer".into(), "SlowTransfer".into()]);
}
