use serde::{Deserialize, Serialize};

use crate::field::{one_or_many, Extensions};
use crate::kind::RecordKind;
use crate::value::{Composition, Identifier, License, ProcessStep, Property, Reference};

/// Fields shared by every known variant.
///
/// Serde binds the known fields. Children live under `subSystems` on the
/// wire but are skipped here, since decoding them dispatches on each
/// child's own category tag and that is the codec's job.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct System {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<Identifier>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub preparation: Vec<ProcessStep>,
    /// Constituent records, decoded with the same machinery as top-level ones.
    #[serde(skip)]
    pub sub_systems: Vec<Record>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<License>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl System {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChemicalSystem {
    #[serde(flatten)]
    pub system: System,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chemical_formula: Option<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub composition: Vec<Composition>,
}

impl ChemicalSystem {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            system: System::named(name),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Alloy {
    #[serde(flatten)]
    pub chemical: ChemicalSystem,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<String>,
}

impl Alloy {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            chemical: ChemicalSystem::named(name),
            ..Default::default()
        }
    }
}

/// A record whose category names no known variant, kept verbatim.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnknownRecord {
    pub category: String,
    /// Every field of the source object except the category itself.
    pub fields: Extensions,
}

/// One node of a record tree.
///
/// The variant always agrees with the category tag: a record is encoded with
/// the tag of its variant, and decoding dispatches on the tag.
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    System(System),
    ChemicalSystem(ChemicalSystem),
    Alloy(Alloy),
    Unknown(UnknownRecord),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::System(_) => RecordKind::System,
            Self::ChemicalSystem(_) => RecordKind::ChemicalSystem,
            Self::Alloy(_) => RecordKind::Alloy,
            Self::Unknown(_) => RecordKind::Unknown,
        }
    }

    /// The category tag this record is written with.
    pub fn category(&self) -> &str {
        match self {
            Self::Unknown(unknown) => &unknown.category,
            known => known.kind().category().unwrap_or_default(),
        }
    }

    /// The shared base fields. `None` for unknown records.
    pub fn system(&self) -> Option<&System> {
        match self {
            Self::System(s) => Some(s),
            Self::ChemicalSystem(c) => Some(&c.system),
            Self::Alloy(a) => Some(&a.chemical.system),
            Self::Unknown(_) => None,
        }
    }

    pub fn system_mut(&mut self) -> Option<&mut System> {
        match self {
            Self::System(s) => Some(s),
            Self::ChemicalSystem(c) => Some(&mut c.system),
            Self::Alloy(a) => Some(&mut a.chemical.system),
            Self::Unknown(_) => None,
        }
    }

    pub fn names(&self) -> &[String] {
        self.system().map(|s| s.names.as_slice()).unwrap_or_default()
    }

    pub fn sub_systems(&self) -> &[Record] {
        self.system()
            .map(|s| s.sub_systems.as_slice())
            .unwrap_or_default()
    }

    /// Fields outside the known schema. For unknown records that is every field.
    pub fn extensions(&self) -> &Extensions {
        match self {
            Self::System(s) => &s.extensions,
            Self::ChemicalSystem(c) => &c.system.extensions,
            Self::Alloy(a) => &a.chemical.system.extensions,
            Self::Unknown(unknown) => &unknown.fields,
        }
    }
}

impl From<System> for Record {
    fn from(value: System) -> Self {
        Self::System(value)
    }
}

impl From<ChemicalSystem> for Record {
    fn from(value: ChemicalSystem) -> Self {
        Self::ChemicalSystem(value)
    }
}

impl From<Alloy> for Record {
    fn from(value: Alloy) -> Self {
        Self::Alloy(value)
    }
}

impl From<UnknownRecord> for Record {
    fn from(value: UnknownRecord) -> Self {
        Self::Unknown(value)
    }
}
