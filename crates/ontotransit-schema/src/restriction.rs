//! Description-logic class expressions and the axiom set.
//!
//! Composite concepts are defined as *equivalence* axioms over these
//! expressions (necessary and sufficient), so the reasoner may classify any
//! individual satisfying the right-hand side even when it was never typed
//! explicitly. The expressions are plain tagged data; evaluation lives in
//! the reasoner backend, keeping the engine swappable.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Class expressions
// ============================================================================

/// A class expression in the restriction language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassExpr {
    /// A named class (base kind, static subclass, or composite concept).
    Named { class: String },
    /// Intersection of all sub-expressions.
    And { exprs: Vec<ClassExpr> },
    /// Union of the sub-expressions.
    Or { exprs: Vec<ClassExpr> },
    /// Complement.
    Not { expr: Box<ClassExpr> },
    /// Existential restriction: at least one `property` successor in `filler`.
    SomeValuesFrom {
        property: String,
        filler: Box<ClassExpr>,
    },
    /// Universal restriction: every `property` successor is in `filler`
    /// (vacuously satisfied by individuals with no successors).
    AllValuesFrom {
        property: String,
        filler: Box<ClassExpr>,
    },
    /// Data-property value restriction: `property` has exactly `value`.
    HasValue { property: String, value: String },
    /// Qualified minimum cardinality over `property`.
    MinCardinality {
        property: String,
        min: u32,
        filler: Box<ClassExpr>,
    },
}

impl ClassExpr {
    pub fn named(class: impl Into<String>) -> Self {
        ClassExpr::Named {
            class: class.into(),
        }
    }

    pub fn and(exprs: Vec<ClassExpr>) -> Self {
        ClassExpr::And { exprs }
    }

    pub fn or(exprs: Vec<ClassExpr>) -> Self {
        ClassExpr::Or { exprs }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: ClassExpr) -> Self {
        ClassExpr::Not {
            expr: Box::new(expr),
        }
    }

    pub fn some(property: impl Into<String>, filler: ClassExpr) -> Self {
        ClassExpr::SomeValuesFrom {
            property: property.into(),
            filler: Box::new(filler),
        }
    }

    pub fn only(property: impl Into<String>, filler: ClassExpr) -> Self {
        ClassExpr::AllValuesFrom {
            property: property.into(),
            filler: Box::new(filler),
        }
    }

    pub fn has_value(property: impl Into<String>, value: impl Into<String>) -> Self {
        ClassExpr::HasValue {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn at_least(min: u32, property: impl Into<String>, filler: ClassExpr) -> Self {
        ClassExpr::MinCardinality {
            property: property.into(),
            min,
            filler: Box::new(filler),
        }
    }

    /// Direct conjuncts of a top-level intersection (the expression itself
    /// when it is not an `And`). Used by the conservative satisfiability
    /// check in the reasoner.
    pub fn conjuncts(&self) -> Vec<&ClassExpr> {
        match self {
            ClassExpr::And { exprs } => exprs.iter().flat_map(|e| e.conjuncts()).collect(),
            other => vec![other],
        }
    }
}

impl fmt::Display for ClassExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassExpr::Named { class } => write!(f, "{class}"),
            ClassExpr::And { exprs } => {
                let parts: Vec<String> = exprs.iter().map(|e| e.to_string()).collect();
                write!(f, "({})", parts.join(" and "))
            }
            ClassExpr::Or { exprs } => {
                let parts: Vec<String> = exprs.iter().map(|e| e.to_string()).collect();
                write!(f, "({})", parts.join(" or "))
            }
            ClassExpr::Not { expr } => write!(f, "(not {expr})"),
            ClassExpr::SomeValuesFrom { property, filler } => {
                write!(f, "({property} some {filler})")
            }
            ClassExpr::AllValuesFrom { property, filler } => {
                write!(f, "({property} only {filler})")
            }
            ClassExpr::HasValue { property, value } => write!(f, "({property} value {value})"),
            ClassExpr::MinCardinality {
                property,
                min,
                filler,
            } => write!(f, "({property} min {min} {filler})"),
        }
    }
}

// ============================================================================
// Axioms
// ============================================================================

/// `class ≡ definition`, necessary and sufficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquivalentClassAxiom {
    pub class: String,
    pub definition: ClassExpr,
}

/// Pairwise disjointness over a group of named classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisjointClassesAxiom {
    pub classes: Vec<String>,
}

/// The axioms handed to the reasoner for one run. Registered once at
/// schema level; never per individual.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxiomSet {
    pub equivalences: Vec<EquivalentClassAxiom>,
    pub disjoint: Vec<DisjointClassesAxiom>,
}

impl AxiomSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_equivalent(&mut self, class: impl Into<String>, definition: ClassExpr) {
        self.equivalences.push(EquivalentClassAxiom {
            class: class.into(),
            definition,
        });
    }

    pub fn declare_disjoint(&mut self, classes: Vec<String>) {
        self.disjoint.push(DisjointClassesAxiom { classes });
    }

    pub fn is_empty(&self) -> bool {
        self.equivalences.is_empty() && self.disjoint.is_empty()
    }
}
