//! Error taxonomy for the population pipeline.
//!
//! Mapping and reference errors are fatal: a half-built graph with dangling
//! semantics would produce false reasoner conclusions, so the run aborts on
//! the first one. Classification warnings are collected and ride along with
//! a best-effort result.

use ontotransit_schema::EntityKind;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PopulateError {
    /// Malformed or missing required row data. Carries enough context to
    /// locate the bad record.
    #[error("{kind} row `{key}`: {detail}")]
    Mapping {
        kind: EntityKind,
        key: String,
        detail: String,
    },

    /// A foreign key that does not resolve to a mapped individual.
    #[error("{kind} row `{key}`: unresolved {target_kind} reference `{target_key}`")]
    UnresolvedReference {
        kind: EntityKind,
        key: String,
        target_kind: EntityKind,
        target_key: String,
    },
}

impl PopulateError {
    pub fn mapping(kind: EntityKind, key: impl Into<String>, detail: impl Into<String>) -> Self {
        PopulateError::Mapping {
            kind,
            key: key.into(),
            detail: detail.into(),
        }
    }
}

/// Recoverable findings, reported alongside the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum Warning {
    /// A categorical value outside the configured vocabulary. The
    /// individual keeps its base type only.
    UnclassifiedIndividual {
        kind: EntityKind,
        key: String,
        attribute: String,
        value: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnclassifiedIndividual {
                kind,
                key,
                attribute,
                value,
            } => write!(
                f,
                "{kind} `{key}`: unclassified {attribute} value `{value}`"
            ),
        }
    }
}
