//! Leaf values carried by records.
//!
//! Several of these accept a compact form in addition to the full object
//! form (`"12-19"` for [`Pages`], `"Curie, Marie"` for [`Name`], a bare
//! number for [`Scalar`]). They always encode back to the object form.
//!
//! The compact-form types derive their object binding with
//! `#[serde(remote = "Self")]` and wrap it in hand-written trait impls that
//! try the compact form first.

use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::error::{TypeError, TypeResult};
use crate::field::{lenient_int, one_or_many, unexpected, Extensions};

// ---------------------------------------------------------------------------
// Scalar
// ---------------------------------------------------------------------------

/// A single number or piece of text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Number(Number),
    Text(String),
}

impl ScalarValue {
    /// Numeric view. Text is parsed if it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A measured value with optional bounds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Scalar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate: Option<bool>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Scalar {
    pub fn new(value: impl Into<ScalarValue>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Scalar::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => Ok(Self::new(ScalarValue::Number(n))),
            Value::String(s) => Ok(Self::new(ScalarValue::Text(s))),
            object @ Value::Object(_) => Scalar::deserialize(object).map_err(D::Error::custom),
            other => Err(unexpected("scalar", &other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// A page range within a publication.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Pages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Pages {
    /// Parse `"12-19"`, `"12–19"` or a single page `"12"`.
    pub fn parse(field: &str, text: &str) -> TypeResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TypeError::invalid(field, "empty page range"));
        }
        let (start, end) = match text.split_once(['-', '\u{2013}']) {
            Some((start, end)) => (start.trim(), Some(end.trim())),
            None => (text, None),
        };
        if start.is_empty() || end.is_some_and(str::is_empty) {
            return Err(TypeError::invalid(field, format!("malformed page range {text:?}")));
        }
        Ok(Self {
            start: Some(start.to_owned()),
            end: end.map(str::to_owned),
            extensions: Extensions::new(),
        })
    }
}

impl Serialize for Pages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Pages::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Pages {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Self::parse("pages", &s).map_err(D::Error::custom),
            Value::Number(n) => Self::parse("pages", &n.to_string()).map_err(D::Error::custom),
            object @ Value::Object(_) => Pages::deserialize(object).map_err(D::Error::custom),
            other => Err(unexpected("page range", &other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Name
// ---------------------------------------------------------------------------

/// A person's name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct Name {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Name {
    /// Parse `"Family, Given"` or `"Given Family"`. A single word is a family name.
    pub fn parse(field: &str, text: &str) -> TypeResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TypeError::invalid(field, "empty name"));
        }
        let (given, family) = match text.split_once(',') {
            Some((family, given)) => (given.trim(), family.trim()),
            None => match text.rsplit_once(char::is_whitespace) {
                Some((given, family)) => (given.trim(), family),
                None => ("", text),
            },
        };
        Ok(Self {
            given: (!given.is_empty()).then(|| given.to_owned()),
            family: (!family.is_empty()).then(|| family.to_owned()),
            ..Default::default()
        })
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Name::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Self::parse("name", &s).map_err(D::Error::custom),
            object @ Value::Object(_) => Name::deserialize(object).map_err(D::Error::custom),
            other => Err(unexpected("name", &other)),
        }
    }
}

// ---------------------------------------------------------------------------
// License
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self")]
pub struct License {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Serialize for License {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        License::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for License {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) if s.trim().is_empty() => Err(D::Error::custom("empty license")),
            Value::String(s) => Ok(Self {
                name: Some(s.trim().to_owned()),
                ..Default::default()
            }),
            object @ Value::Object(_) => License::deserialize(object).map_err(D::Error::custom),
            other => Err(unexpected("license", &other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Object-only leaves
// ---------------------------------------------------------------------------

/// An external identifier, e.g. a registry number.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A measured or computed property. Conditions are themselves properties.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub scalars: Vec<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Property>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Property {
    pub fn new(name: impl Into<String>, scalar: Scalar) -> Self {
        Self {
            name: Some(name.into()),
            scalars: vec![scalar],
            ..Default::default()
        }
    }
}

/// One step of a preparation procedure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Property>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// The share of one element in a chemical system.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_weight_percent: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_atomic_percent: Option<Scalar>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// A literature reference.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Pages>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Name>,
    #[serde(flatten)]
    pub extensions: Extensions,
}
