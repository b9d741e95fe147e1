use std::io::{Read, Write};

use recstream_types::{decode_field, json_type_name, Record, RecordKind, UnknownRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{CodecConfig, UnknownCategoryPolicy};
use crate::error::{CodecError, CodecResult};

/// Wire name of the child-record list.
const SUB_SYSTEMS: &str = "subSystems";

/// Schema-aware codec for a single record.
///
/// The codec is a plain value: construct one per pipeline and hand it to
/// every stream and encoder that needs it. Child records (`subSystems`)
/// go through the same codec recursively.
#[derive(Clone, Debug, Default)]
pub struct RecordCodec {
    config: CodecConfig,
}

impl RecordCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Decoding
    // -----------------------------------------------------------------------

    /// Decode the next JSON value in `reader` as a record.
    ///
    /// Parsing an object stops at its closing brace, so `reader` is left on
    /// whatever follows the record (a separator, the end of an array).
    pub fn decode_from_reader<R: Read>(&self, reader: R) -> CodecResult<Record> {
        let mut de = serde_json::Deserializer::from_reader(reader);
        let value = Value::deserialize(&mut de)?;
        self.decode_value(value)
    }

    /// Decode a byte slice holding exactly one record object.
    pub fn decode_slice(&self, bytes: &[u8]) -> CodecResult<Record> {
        let value: Value = serde_json::from_slice(bytes)?;
        self.decode_value(value)
    }

    pub fn decode_value(&self, value: Value) -> CodecResult<Record> {
        match value {
            Value::Object(object) => self.decode_object(object),
            other => Err(CodecError::NotAnObject(json_type_name(&other))),
        }
    }

    fn decode_object(&self, mut object: Map<String, Value>) -> CodecResult<Record> {
        let field = &self.config.discriminator_field;
        let category: Option<String> = match object.shift_remove(field) {
            Some(raw) => decode_field(field, raw)?,
            None => None,
        };

        let kind = match category {
            None => RecordKind::System,
            Some(tag) => match RecordKind::from_category(&tag) {
                Some(kind) => kind,
                None => return self.decode_unknown(tag, object),
            },
        };

        let children = object.shift_remove(SUB_SYSTEMS);
        let mut record = match kind {
            RecordKind::ChemicalSystem => Record::ChemicalSystem(decode_body(kind, object)?),
            RecordKind::Alloy => Record::Alloy(decode_body(kind, object)?),
            RecordKind::System | RecordKind::Unknown => {
                Record::System(decode_body(RecordKind::System, object)?)
            }
        };
        if let Some(system) = record.system_mut() {
            system.sub_systems = self.decode_children(children)?;
        }
        Ok(record)
    }

    fn decode_unknown(&self, category: String, fields: Map<String, Value>) -> CodecResult<Record> {
        match self.config.unknown_category {
            UnknownCategoryPolicy::Reject => Err(CodecError::UnknownCategory(category)),
            UnknownCategoryPolicy::Preserve => {
                debug!(%category, "preserving record with unknown category");
                Ok(Record::Unknown(UnknownRecord { category, fields }))
            }
        }
    }

    fn decode_children(&self, raw: Option<Value>) -> CodecResult<Vec<Record>> {
        match raw {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| self.decode_value(item))
                .collect(),
            Some(single) => Ok(vec![self.decode_value(single)?]),
        }
    }

    // -----------------------------------------------------------------------
    // Encoding
    // -----------------------------------------------------------------------

    /// Encode to a JSON object: the category first, then the known fields,
    /// then children, then extension fields.
    pub fn encode_value(&self, record: &Record) -> CodecResult<Value> {
        let discriminator = &self.config.discriminator_field;
        let mut object = Map::new();
        object.insert(
            discriminator.clone(),
            Value::String(record.category().to_owned()),
        );

        let body = match record {
            Record::System(system) => encode_body(system)?,
            Record::ChemicalSystem(chemical) => encode_body(chemical)?,
            Record::Alloy(alloy) => encode_body(alloy)?,
            Record::Unknown(unknown) => unknown.fields.clone(),
        };
        for (key, value) in body {
            object.entry(key).or_insert(value);
        }

        let children = record.sub_systems();
        if !children.is_empty() {
            let encoded = children
                .iter()
                .map(|child| self.encode_value(child))
                .collect::<CodecResult<Vec<_>>>()?;
            object.insert(SUB_SYSTEMS.to_owned(), Value::Array(encoded));
        }

        for key in record.extensions().keys() {
            if key == discriminator {
                continue;
            }
            if let Some(value) = object.shift_remove(key) {
                object.insert(key.clone(), value);
            }
        }
        Ok(Value::Object(object))
    }

    /// Serialize one record as a self-contained JSON chunk.
    pub fn write_record<W: Write>(&self, writer: W, record: &Record) -> CodecResult<()> {
        let value = self.encode_value(record)?;
        let result = if self.config.pretty {
            serde_json::to_writer_pretty(writer, &value)
        } else {
            serde_json::to_writer(writer, &value)
        };
        result.map_err(|e| {
            if e.is_io() {
                CodecError::Io(e.into())
            } else {
                CodecError::Json(e)
            }
        })
    }

    pub fn encode_to_vec(&self, record: &Record) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_record(&mut buf, record)?;
        Ok(buf)
    }
}

fn decode_body<T: DeserializeOwned>(kind: RecordKind, object: Map<String, Value>) -> CodecResult<T> {
    serde_json::from_value(Value::Object(object)).map_err(|source| CodecError::Invalid {
        category: kind.category().unwrap_or_default(),
        source,
    })
}

fn encode_body<T: Serialize>(body: &T) -> CodecResult<Map<String, Value>> {
    match serde_json::to_value(body)? {
        Value::Object(object) => Ok(object),
        other => Err(CodecError::NotAnObject(json_type_name(&other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec;
    use proptest::option;
    use proptest::prelude::*;
    use recstream_types::{
        Alloy, ChemicalSystem, Composition, Extensions, Property, Scalar, ScalarValue, System,
        TypeError,
    };
    use serde_json::json;

    fn codec() -> RecordCodec {
        RecordCodec::default()
    }

    #[test]
    fn decode_base_system() {
        let record = codec()
            .decode_value(json!({"category": "system", "names": ["x"], "uid": "u1"}))
            .unwrap();
        assert_eq!(record.kind(), RecordKind::System);
        assert_eq!(record.names(), ["x".to_string()]);
        assert_eq!(record.system().unwrap().uid.as_deref(), Some("u1"));
    }

    #[test]
    fn missing_category_is_base_variant() {
        let record = codec().decode_value(json!({"names": ["x"]})).unwrap();
        assert_eq!(record.kind(), RecordKind::System);
    }

    #[test]
    fn decode_chemical_system() {
        let record = codec()
            .decode_value(json!({
                "category": "system.chemical",
                "names": ["water"],
                "chemicalFormula": "H2O",
                "composition": [{"element": "H", "actualAtomicPercent": 66.7}]
            }))
            .unwrap();
        let Record::ChemicalSystem(chemical) = record else {
            panic!("wrong variant");
        };
        assert_eq!(chemical.chemical_formula.as_deref(), Some("H2O"));
        assert_eq!(chemical.composition[0].element.as_deref(), Some("H"));
    }

    #[test]
    fn decode_alloy() {
        let record = codec()
            .decode_value(json!({
                "category": "system.chemical.alloy",
                "names": ["steel"],
                "chemicalFormula": "FeC",
                "phases": ["ferrite", "cementite"]
            }))
            .unwrap();
        let Record::Alloy(alloy) = record else {
            panic!("wrong variant");
        };
        assert_eq!(alloy.phases.len(), 2);
        assert_eq!(alloy.chemical.chemical_formula.as_deref(), Some("FeC"));
    }

    #[test]
    fn unknown_category_rejected_by_default() {
        let err = codec()
            .decode_value(json!({"category": "system.organic"}))
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownCategory(ref c) if c == "system.organic"));
    }

    #[test]
    fn unknown_category_preserved_when_lenient() {
        let codec = RecordCodec::new(CodecConfig::lenient());
        let input = json!({"category": "system.organic", "names": ["benzene"], "ring": 6});
        let record = codec.decode_value(input.clone()).unwrap();
        assert_eq!(record.kind(), RecordKind::Unknown);
        assert_eq!(record.category(), "system.organic");
        assert_eq!(codec.encode_value(&record).unwrap(), input);
    }

    #[test]
    fn non_object_rejected() {
        let err = codec().decode_value(json!([1, 2])).unwrap_err();
        assert!(matches!(err, CodecError::NotAnObject("array")));
    }

    #[test]
    fn bad_field_type_is_invalid_record() {
        let err = codec()
            .decode_value(json!({"category": "system.chemical", "names": {"a": 1}}))
            .unwrap_err();
        assert!(matches!(err, CodecError::Invalid { category: "system.chemical", .. }));
        assert!(err.to_string().contains("invalid type: map"));
    }

    #[test]
    fn non_string_category_is_field_error() {
        let err = codec().decode_value(json!({"category": 3})).unwrap_err();
        assert!(matches!(err, CodecError::Field(TypeError::InvalidField { ref field, .. })
            if field == "category"));
    }

    #[test]
    fn null_category_and_children_are_absent() {
        let record = codec()
            .decode_value(json!({"category": null, "subSystems": null, "names": "x"}))
            .unwrap();
        assert_eq!(record.kind(), RecordKind::System);
        assert!(record.sub_systems().is_empty());
        assert!(record.extensions().is_empty());
    }

    #[test]
    fn decode_from_reader_stops_after_the_record() {
        let mut input: &[u8] = br#"{"names": ["a"], "nested": {"k": [1, {}]}} , {"names": ["b"]}"#;
        let record = codec().decode_from_reader(&mut input).unwrap();
        assert_eq!(record.names(), ["a".to_string()]);
        assert_eq!(input, br#" , {"names": ["b"]}"#);
    }

    #[test]
    fn decode_from_reader_reports_syntax_errors() {
        let err = codec()
            .decode_from_reader(&br#"{"names": ["a" "b"]}"#[..])
            .unwrap_err();
        assert!(matches!(err, CodecError::Json(ref e) if e.is_syntax()));
    }

    #[test]
    fn extreme_floats_survive_a_byte_round_trip() {
        let floats = [1.0715660391465826e-75, -1.81996730402717e-179, -1.603964615428183e143];
        let mut system = System::named("x");
        for (i, f) in floats.into_iter().enumerate() {
            system.extensions.insert(format!("x_{i}"), Value::from(f));
            let number = serde_json::Number::from_f64(f).unwrap();
            system.properties.push(Property::new("p", Scalar::new(ScalarValue::Number(number))));
        }
        let record = Record::from(system);
        let bytes = codec().encode_to_vec(&record).unwrap();
        let decoded = codec().decode_slice(&bytes).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.extensions()["x_1"].as_f64(), Some(-1.81996730402717e-179));
    }

    #[test]
    fn extension_fields_preserved_in_order() {
        let input = json!({
            "category": "system",
            "names": ["x"],
            "zeta": 1,
            "alpha": {"nested": [true]},
            "mid": "m"
        });
        let record = codec().decode_value(input.clone()).unwrap();
        let keys: Vec<_> = record.extensions().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(codec().encode_value(&record).unwrap(), input);
    }

    #[test]
    fn children_decode_recursively() {
        let record = codec()
            .decode_value(json!({
                "category": "system",
                "names": ["mixture"],
                "subSystems": [
                    {"category": "system.chemical", "chemicalFormula": "NaCl"},
                    {"category": "system.chemical.alloy", "subSystems": {"names": ["grain"]}}
                ]
            }))
            .unwrap();
        let children = record.sub_systems();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].kind(), RecordKind::ChemicalSystem);
        assert_eq!(children[1].kind(), RecordKind::Alloy);
        assert_eq!(children[1].sub_systems()[0].names(), ["grain".to_string()]);
    }

    #[test]
    fn unknown_child_category_fails_whole_record() {
        let err = codec()
            .decode_value(json!({"subSystems": [{"category": "nope"}]}))
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownCategory(_)));
    }

    #[test]
    fn custom_discriminator_field() {
        let codec = RecordCodec::new(CodecConfig {
            discriminator_field: "type".into(),
            ..Default::default()
        });
        let record = codec
            .decode_value(json!({"type": "system.chemical", "category": "kept"}))
            .unwrap();
        assert_eq!(record.kind(), RecordKind::ChemicalSystem);
        assert_eq!(record.extensions().get("category"), Some(&json!("kept")));
        let encoded = codec.encode_value(&record).unwrap();
        assert_eq!(encoded, json!({"type": "system.chemical", "category": "kept"}));
    }

    #[test]
    fn encode_writes_category_first_and_omits_empty() {
        let record = Record::from(ChemicalSystem::named("water"));
        let bytes = codec().encode_to_vec(&record).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"category":"system.chemical","names":["water"]}"#
        );
    }

    #[test]
    fn encode_nested_leaves() {
        let mut chemical = ChemicalSystem::named("iron");
        chemical.system.properties.push(Property::new("density", Scalar::new(7874_i64)));
        chemical.composition.push(Composition {
            element: Some("Fe".into()),
            ..Default::default()
        });
        let value = codec().encode_value(&Record::from(chemical)).unwrap();
        assert_eq!(
            value,
            json!({
                "category": "system.chemical",
                "names": ["iron"],
                "properties": [{"name": "density", "scalars": [{"value": 7874}]}],
                "composition": [{"element": "Fe"}]
            })
        );
    }

    #[test]
    fn pretty_output_is_multiline() {
        let codec = RecordCodec::new(CodecConfig {
            pretty: true,
            ..Default::default()
        });
        let bytes = codec.encode_to_vec(&Record::from(System::named("x"))).unwrap();
        assert!(bytes.contains(&b'\n'));
    }

    #[test]
    fn decode_slice_single_object() {
        let record = codec()
            .decode_slice(br#" {"category": "system", "names": ["x"]} "#)
            .unwrap();
        assert_eq!(record.names(), ["x".to_string()]);
    }

    #[test]
    fn decode_slice_rejects_trailing_value() {
        let err = codec().decode_slice(br#"{} {}"#).unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }

    #[test]
    fn encode_puts_children_before_extensions() {
        let mut system = System::named("mix");
        system.extensions.insert("zeta".into(), json!(1));
        system.sub_systems.push(ChemicalSystem::named("salt").into());
        let bytes = codec().encode_to_vec(&Record::from(system)).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"category":"system","names":["mix"],"subSystems":[{"category":"system.chemical","names":["salt"]}],"zeta":1}"#
        );
    }

    fn arb_text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 ]{0,12}"
    }

    fn arb_extensions() -> impl Strategy<Value = Extensions> {
        let value = prop_oneof![
            any::<i64>().prop_map(Value::from),
            arb_text().prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
            any::<f64>().prop_filter("finite", |f| f.is_finite()).prop_map(Value::from),
        ];
        vec(("x_[a-z]{1,6}", value), 0..3).prop_map(|pairs| pairs.into_iter().collect())
    }

    fn arb_system() -> impl Strategy<Value = System> {
        (
            option::of(arb_text()),
            vec(arb_text(), 0..3),
            vec(arb_text(), 0..2),
            arb_extensions(),
        )
            .prop_map(|(uid, names, tags, extensions)| System {
                uid,
                names,
                tags,
                extensions,
                ..Default::default()
            })
    }

    fn arb_leaf() -> impl Strategy<Value = Record> {
        prop_oneof![
            arb_system().prop_map(Record::System),
            (arb_system(), option::of("[A-Z][a-z]?[0-9]?")).prop_map(|(system, formula)| {
                Record::ChemicalSystem(ChemicalSystem {
                    system,
                    chemical_formula: formula,
                    composition: Vec::new(),
                })
            }),
            (arb_system(), vec("[a-z]{1,5}", 0..3)).prop_map(|(system, phases)| {
                Record::Alloy(Alloy {
                    chemical: ChemicalSystem {
                        system,
                        ..Default::default()
                    },
                    phases,
                })
            }),
        ]
    }

    fn arb_record() -> impl Strategy<Value = Record> {
        (arb_leaf(), vec(arb_leaf(), 0..3)).prop_map(|(mut record, children)| {
            if let Some(system) = record.system_mut() {
                system.sub_systems = children;
            }
            record
        })
    }

    proptest! {
        #[test]
        fn value_roundtrip(record in arb_record()) {
            let codec = codec();
            let decoded = codec.decode_value(codec.encode_value(&record).unwrap()).unwrap();
            prop_assert_eq!(decoded, record);
        }

        #[test]
        fn bytes_roundtrip(record in arb_record()) {
            let codec = codec();
            let bytes = codec.encode_to_vec(&record).unwrap();
            prop_assert_eq!(codec.decode_slice(&bytes).unwrap(), record);
        }
    }
}
