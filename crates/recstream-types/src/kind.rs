
use crate::error::TypeError;

/// The concrete variant of a record, selected by its category tag.
///
/// Variants form a single-inheritance hierarchy rooted at [`RecordKind::System`]:
///
/// ```text
/// system
/// └── system.chemical
///     └── system.chemical.alloy
/// ```
///
/// [`RecordKind::Unknown`] stands outside the hierarchy. It is only produced
/// when a codec is configured to preserve records with unrecognised tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// The base (generic) record.
    System,
    /// A system with a chemical formula and composition.
    ChemicalSystem,
    /// A chemical system made of metallic phases.
    Alloy,
    /// A record whose category tag names no known variant.
    Unknown,
}

impl RecordKind {
    /// All variants that carry a category tag, base first.
    pub const KNOWN: [RecordKind; 3] = [Self::System, Self::ChemicalSystem, Self::Alloy];

    /// The category tag written on the wire, `None` for [`RecordKind::Unknown`].
    pub fn category(&self) -> Option<&'static str> {
        match self {
            Self::System => Some("system"),
            Self::ChemicalSystem => Some("system.chemical"),
            Self::Alloy => Some("system.chemical.alloy"),
            Self::Unknown => None,
        }
    }

    /// Resolve a category tag to its variant.
    pub fn from_category(tag: &str) -> Option<Self> {
        Self::KNOWN
            .into_iter()
            .find(|kind| kind.category() == Some(tag))
    }

    /// The direct parent variant.
    pub fn parent(&self) -> Option<Self> {
        match self {
            Self::System | Self::Unknown => None,
            Self::ChemicalSystem => Some(Self::System),
            Self::Alloy => Some(Self::ChemicalSystem),
        }
    }

    /// Returns true if `self` is `ancestor` or one of its sub-variants.
    pub fn is_a(&self, ancestor: RecordKind) -> bool {
        let mut current = Some(*self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.category() {
            Some(tag) => write!(f, "{tag}"),
            None => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_category(s).ok_or_else(|| TypeError::UnknownCategory(s.to_owned()))
    }
}
