//! Ontotransit schema layer
//!
//! This crate is the *static* half of the system: pure declarations, no
//! pipeline behavior.
//!
//! - `registry`: entity kinds, their data attributes, object-property
//!   signatures (with inverses and characteristics), and the static
//!   subclass vocabulary used by taxonomy assignment.
//! - `restriction`: the description-logic class-expression language
//!   (existential / universal / value / cardinality restrictions) and the
//!   axiom set handed to the reasoner.

pub mod registry;
pub mod restriction;

pub use registry::{
    transit_schema, AttrDecl, Characteristic, Datatype, EntityKind, KeyPart, KindDecl,
    PropertyDecl, Schema, SubclassDecl,
};
pub use restriction::{AxiomSet, ClassExpr, DisjointClassesAxiom, EquivalentClassAxiom};
