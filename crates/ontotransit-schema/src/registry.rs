//! Static schema registry for the transit domain.
//!
//! Everything here is declaration-only: the population pipeline and the
//! reasoner both consume this registry, neither mutates it. One call to
//! [`transit_schema`] builds the whole thing.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Entity kinds
// ============================================================================

/// The base entity types. Every individual in the graph carries exactly one
/// of these as its base class; taxonomy and reasoning only ever *add* types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Level,
    Stop,
    Route,
    Trip,
    ScheduleEntry,
    Transfer,
    Pathway,
    Fare,
    Agency,
}

impl EntityKind {
    /// Safe population order: foreign keys only ever point at kinds mapped
    /// earlier in this list (Agency individuals are created on demand).
    pub const POPULATION_ORDER: [EntityKind; 8] = [
        EntityKind::Level,
        EntityKind::Stop,
        EntityKind::Route,
        EntityKind::Trip,
        EntityKind::ScheduleEntry,
        EntityKind::Transfer,
        EntityKind::Pathway,
        EntityKind::Fare,
    ];

    /// Class name used in the graph (`Stop`, `Route`, ...).
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Level => "Level",
            EntityKind::Stop => "Stop",
            EntityKind::Route => "Route",
            EntityKind::Trip => "Trip",
            EntityKind::ScheduleEntry => "ScheduleEntry",
            EntityKind::Transfer => "Transfer",
            EntityKind::Pathway => "Pathway",
            EntityKind::Fare => "Fare",
            EntityKind::Agency => "Agency",
        }
    }

    /// Prefix for individual names (`stop_S1`, `schedule_entry_T1:3`, ...).
    pub fn instance_prefix(self) -> &'static str {
        match self {
            EntityKind::Level => "level",
            EntityKind::Stop => "stop",
            EntityKind::Route => "route",
            EntityKind::Trip => "trip",
            EntityKind::ScheduleEntry => "schedule_entry",
            EntityKind::Transfer => "transfer",
            EntityKind::Pathway => "pathway",
            EntityKind::Fare => "fare",
            EntityKind::Agency => "agency",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Data attributes
// ============================================================================

/// Declared datatype of a data property. Coercion from raw row values is the
/// Row Mapper's job; the registry only states what each column must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Datatype {
    Text,
    Integer,
    Float,
    Boolean,
    /// GTFS accessibility code (0/1/2), normalized to the closed set
    /// `unknown` / `accessible` / `not_accessible`.
    AccessibilityCode,
}

/// One data attribute of an entity kind. The column name doubles as the
/// data-property name in the graph.
#[derive(Debug, Clone, Copy)]
pub struct AttrDecl {
    pub column: &'static str,
    pub datatype: Datatype,
    pub required: bool,
}

const fn attr(column: &'static str, datatype: Datatype) -> AttrDecl {
    AttrDecl {
        column,
        datatype,
        required: false,
    }
}

const fn required_attr(column: &'static str, datatype: Datatype) -> AttrDecl {
    AttrDecl {
        column,
        datatype,
        required: true,
    }
}

/// One component of a primary key. A `default` makes the component optional
/// in the source row (GTFS leaves `transfer_type` out for the default type).
#[derive(Debug, Clone, Copy)]
pub struct KeyPart {
    pub column: &'static str,
    pub default: Option<&'static str>,
}

const fn key(column: &'static str) -> KeyPart {
    KeyPart {
        column,
        default: None,
    }
}

const fn key_or(column: &'static str, default: &'static str) -> KeyPart {
    KeyPart {
        column,
        default: Some(default),
    }
}

/// Declaration of one entity kind: its primary key and data attributes.
#[derive(Debug, Clone)]
pub struct KindDecl {
    pub kind: EntityKind,
    pub key: Vec<KeyPart>,
    pub attrs: Vec<AttrDecl>,
}

// ============================================================================
// Object properties
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Characteristic {
    Functional,
    Transitive,
    Symmetric,
}

/// Signature of an object property. `domain`/`range` of `None` means
/// unconstrained (used by the `connectsTransportElement` generalization).
#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub name: &'static str,
    pub domain: Option<EntityKind>,
    pub range: Option<EntityKind>,
    pub inverse: Option<&'static str>,
    pub subproperty_of: Option<&'static str>,
    pub characteristics: &'static [Characteristic],
}

// ============================================================================
// Static subclasses
// ============================================================================

/// A statically assignable subclass, keyed off a categorical attribute by the
/// Taxonomy Assigner. Additive: an individual keeps its base kind.
#[derive(Debug, Clone, Copy)]
pub struct SubclassDecl {
    pub class: &'static str,
    pub base: EntityKind,
}

// ============================================================================
// Schema
// ============================================================================

/// The assembled registry. Built once per run, then read-only.
#[derive(Debug, Clone)]
pub struct Schema {
    pub kinds: Vec<KindDecl>,
    pub properties: Vec<PropertyDecl>,
    pub subclasses: Vec<SubclassDecl>,
}

impl Schema {
    pub fn kind(&self, kind: EntityKind) -> &KindDecl {
        self.kinds
            .iter()
            .find(|k| k.kind == kind)
            .unwrap_or_else(|| panic!("kind `{kind}` missing from registry"))
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn inverse_of(&self, name: &str) -> Option<&'static str> {
        self.property(name).and_then(|p| p.inverse)
    }

    pub fn subclasses_of(&self, base: EntityKind) -> impl Iterator<Item = &SubclassDecl> {
        self.subclasses.iter().filter(move |s| s.base == base)
    }

    /// Base kind of a declared static subclass, if any.
    pub fn base_of(&self, class: &str) -> Option<EntityKind> {
        self.subclasses
            .iter()
            .find(|s| s.class == class)
            .map(|s| s.base)
    }
}

/// Build the transit schema registry.
pub fn transit_schema() -> Schema {
    let kinds = vec![
        KindDecl {
            kind: EntityKind::Level,
            key: vec![key("level_id")],
            attrs: vec![
                attr("level_index", Datatype::Float),
                attr("level_name", Datatype::Text),
            ],
        },
        KindDecl {
            kind: EntityKind::Stop,
            key: vec![key("stop_id")],
            attrs: vec![
                attr("stop_name", Datatype::Text),
                attr("stop_lat", Datatype::Float),
                attr("stop_lon", Datatype::Float),
                attr("location_type", Datatype::Integer),
                attr("wheelchair_boarding", Datatype::AccessibilityCode),
            ],
        },
        KindDecl {
            kind: EntityKind::Route,
            key: vec![key("route_id")],
            attrs: vec![
                attr("route_short_name", Datatype::Text),
                attr("route_long_name", Datatype::Text),
                attr("route_type", Datatype::Text),
                attr("route_color", Datatype::Text),
            ],
        },
        KindDecl {
            kind: EntityKind::Trip,
            key: vec![key("trip_id")],
            attrs: vec![
                attr("trip_headsign", Datatype::Text),
                attr("direction_id", Datatype::Integer),
                attr("wheelchair_accessible", Datatype::AccessibilityCode),
                attr("service_id", Datatype::Text),
            ],
        },
        KindDecl {
            kind: EntityKind::ScheduleEntry,
            key: vec![key("trip_id"), key("stop_sequence")],
            attrs: vec![
                required_attr("stop_sequence", Datatype::Integer),
                attr("arrival_time", Datatype::Text),
                attr("departure_time", Datatype::Text),
                attr("pickup_type", Datatype::Integer),
                attr("drop_off_type", Datatype::Integer),
            ],
        },
        KindDecl {
            kind: EntityKind::Transfer,
            key: vec![
                key("from_stop_id"),
                key("to_stop_id"),
                key_or("transfer_type", "0"),
            ],
            attrs: vec![
                attr("transfer_type", Datatype::Integer),
                attr("min_transfer_time", Datatype::Integer),
            ],
        },
        KindDecl {
            kind: EntityKind::Pathway,
            key: vec![key("pathway_id")],
            attrs: vec![
                attr("pathway_mode", Datatype::Text),
                attr("is_bidirectional", Datatype::Boolean),
                attr("length", Datatype::Float),
                attr("traversal_time", Datatype::Integer),
            ],
        },
        KindDecl {
            kind: EntityKind::Fare,
            key: vec![key("fare_id")],
            attrs: vec![
                attr("price", Datatype::Float),
                attr("currency_type", Datatype::Text),
                attr("payment_method", Datatype::Integer),
                attr("transfers", Datatype::Integer),
                attr("transfer_duration", Datatype::Integer),
            ],
        },
        KindDecl {
            kind: EntityKind::Agency,
            key: vec![key("agency_id")],
            attrs: vec![attr("agency_name", Datatype::Text)],
        },
    ];

    let properties = vec![
        PropertyDecl {
            name: "hasTrip",
            domain: Some(EntityKind::Route),
            range: Some(EntityKind::Trip),
            inverse: Some("belongsToRoute"),
            subproperty_of: None,
            characteristics: &[],
        },
        PropertyDecl {
            name: "belongsToRoute",
            domain: Some(EntityKind::Trip),
            range: Some(EntityKind::Route),
            inverse: Some("hasTrip"),
            subproperty_of: None,
            characteristics: &[Characteristic::Functional],
        },
        // Ordered trip -> stop edges; the edge ordinal carries the source
        // stop_sequence so "next stop on this trip" stays well-defined.
        PropertyDecl {
            name: "hasStop",
            domain: Some(EntityKind::Trip),
            range: Some(EntityKind::Stop),
            inverse: None,
            subproperty_of: None,
            characteristics: &[],
        },
        PropertyDecl {
            name: "entryOfTrip",
            domain: Some(EntityKind::ScheduleEntry),
            range: Some(EntityKind::Trip),
            inverse: None,
            subproperty_of: None,
            characteristics: &[Characteristic::Functional],
        },
        PropertyDecl {
            name: "atStop",
            domain: Some(EntityKind::ScheduleEntry),
            range: Some(EntityKind::Stop),
            inverse: None,
            subproperty_of: None,
            characteristics: &[Characteristic::Functional],
        },
        PropertyDecl {
            name: "fromStop",
            domain: Some(EntityKind::Transfer),
            range: Some(EntityKind::Stop),
            inverse: None,
            subproperty_of: None,
            characteristics: &[],
        },
        PropertyDecl {
            name: "toStop",
            domain: Some(EntityKind::Transfer),
            range: Some(EntityKind::Stop),
            inverse: None,
            subproperty_of: None,
            characteristics: &[],
        },
        PropertyDecl {
            name: "fromRoute",
            domain: Some(EntityKind::Transfer),
            range: Some(EntityKind::Route),
            inverse: None,
            subproperty_of: None,
            characteristics: &[],
        },
        PropertyDecl {
            name: "toRoute",
            domain: Some(EntityKind::Transfer),
            range: Some(EntityKind::Route),
            inverse: None,
            subproperty_of: None,
            characteristics: &[],
        },
        PropertyDecl {
            name: "fromTrip",
            domain: Some(EntityKind::Transfer),
            range: Some(EntityKind::Trip),
            inverse: None,
            subproperty_of: None,
            characteristics: &[],
        },
        PropertyDecl {
            name: "toTrip",
            domain: Some(EntityKind::Transfer),
            range: Some(EntityKind::Trip),
            inverse: None,
            subproperty_of: None,
            characteristics: &[],
        },
        PropertyDecl {
            name: "connectsTransportElement",
            domain: None,
            range: None,
            inverse: None,
            subproperty_of: None,
            characteristics: &[],
        },
        PropertyDecl {
            name: "connectsStop",
            domain: Some(EntityKind::Pathway),
            range: Some(EntityKind::Stop),
            inverse: Some("isConnectedBy"),
            subproperty_of: Some("connectsTransportElement"),
            characteristics: &[],
        },
        PropertyDecl {
            name: "isConnectedBy",
            domain: Some(EntityKind::Stop),
            range: Some(EntityKind::Pathway),
            inverse: Some("connectsStop"),
            subproperty_of: None,
            characteristics: &[],
        },
        PropertyDecl {
            name: "connectedTo",
            domain: Some(EntityKind::Stop),
            range: Some(EntityKind::Stop),
            inverse: None,
            subproperty_of: None,
            characteristics: &[Characteristic::Transitive],
        },
        PropertyDecl {
            name: "hasLevel",
            domain: Some(EntityKind::Stop),
            range: Some(EntityKind::Level),
            inverse: None,
            subproperty_of: Some("connectsTransportElement"),
            characteristics: &[],
        },
        PropertyDecl {
            name: "parentStation",
            domain: Some(EntityKind::Stop),
            range: Some(EntityKind::Stop),
            inverse: None,
            subproperty_of: None,
            characteristics: &[Characteristic::Functional],
        },
        PropertyDecl {
            name: "servesStop",
            domain: Some(EntityKind::Route),
            range: Some(EntityKind::Stop),
            inverse: Some("isServedBy"),
            subproperty_of: None,
            characteristics: &[],
        },
        PropertyDecl {
            name: "isServedBy",
            domain: Some(EntityKind::Stop),
            range: Some(EntityKind::Route),
            inverse: Some("servesStop"),
            subproperty_of: None,
            characteristics: &[],
        },
        PropertyDecl {
            name: "providesFare",
            domain: Some(EntityKind::Agency),
            range: Some(EntityKind::Fare),
            inverse: Some("providedByAgency"),
            subproperty_of: None,
            characteristics: &[],
        },
        PropertyDecl {
            name: "providedByAgency",
            domain: Some(EntityKind::Fare),
            range: Some(EntityKind::Agency),
            inverse: Some("providesFare"),
            subproperty_of: None,
            characteristics: &[],
        },
    ];

    let subclasses = vec![
        SubclassDecl {
            class: "BusRoute",
            base: EntityKind::Route,
        },
        SubclassDecl {
            class: "TramRoute",
            base: EntityKind::Route,
        },
        SubclassDecl {
            class: "TrolleyRoute",
            base: EntityKind::Route,
        },
        SubclassDecl {
            class: "MetroRoute",
            base: EntityKind::Route,
        },
        SubclassDecl {
            class: "WheelchairFriendlyTrip",
            base: EntityKind::Trip,
        },
        SubclassDecl {
            class: "FastTransfer",
            base: EntityKind::Transfer,
        },
        SubclassDecl {
            class: "SlowTransfer",
            base: EntityKind::Transfer,
        },
        SubclassDecl {
            class: "ElevatorPathway",
            base: EntityKind::Pathway,
        },
        SubclassDecl {
            class: "StairsPathway",
            base: EntityKind::Pathway,
        },
        SubclassDecl {
            class: "EscalatorPathway",
            base: EntityKind::Pathway,
        },
        SubclassDecl {
            class: "Walkway",
            base: EntityKind::Pathway,
        },
    ];

    Schema {
        kinds,
        properties,
        subclasses,
    }
}
