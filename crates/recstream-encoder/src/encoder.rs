use std::io::{self, Read, Write};

use recstream_codec::RecordCodec;
use recstream_stream::{MemoryStream, RecordStream};
use recstream_types::Record;
use tracing::debug;

use crate::error::{EncodeError, EncodeResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Nothing emitted yet.
    Open,
    /// `[` emitted, pulling records.
    Records,
    /// `]` emitted.
    Done,
    Failed,
    Closed,
}

/// Lazily encodes a record stream as one JSON array, exposed as a byte source.
///
/// At most one encoded record is buffered at a time: a record is pulled from
/// the upstream stream only when the reader has consumed every byte of the
/// previous one. The output is always an array, even for a single record,
/// so it reads back through `ArrayStream` unchanged.
pub struct RecordEncoder<S> {
    stream: S,
    codec: RecordCodec,
    phase: Phase,
    chunk: Vec<u8>,
    position: usize,
    written: u64,
}

impl RecordEncoder<MemoryStream> {
    pub fn from_record(record: Record, codec: RecordCodec) -> Self {
        Self::new(MemoryStream::single(record), codec)
    }

    pub fn from_records(records: Vec<Record>, codec: RecordCodec) -> Self {
        Self::new(MemoryStream::new(records), codec)
    }
}

impl<S: RecordStream> RecordEncoder<S> {
    /// Takes ownership of `stream`; [`RecordEncoder::close`] closes it.
    pub fn new(stream: S, codec: RecordCodec) -> Self {
        Self {
            stream,
            codec,
            phase: Phase::Open,
            chunk: Vec::new(),
            position: 0,
            written: 0,
        }
    }

    /// Records encoded so far.
    pub fn records_written(&self) -> u64 {
        self.written
    }

    /// Size of the chunk currently held in memory.
    pub fn buffered_len(&self) -> usize {
        self.chunk.len()
    }

    /// Returns true once the closing `]` has been produced.
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// The unread remainder of the current chunk, producing the next chunk
    /// if the current one is used up. `None` at the end of output.
    pub fn next_chunk(&mut self) -> EncodeResult<Option<&[u8]>> {
        while self.position >= self.chunk.len() {
            if !self.refill()? {
                return Ok(None);
            }
        }
        let start = self.position;
        self.position = self.chunk.len();
        Ok(Some(&self.chunk[start..]))
    }

    /// Drain the whole encoding into `writer`. Returns the number of bytes written.
    pub fn write_all_to<W: Write>(&mut self, mut writer: W) -> EncodeResult<u64> {
        let mut total = 0u64;
        while let Some(chunk) = self.next_chunk()? {
            writer.write_all(chunk)?;
            total += chunk.len() as u64;
        }
        writer.flush()?;
        Ok(total)
    }

    /// Close the upstream stream and drop any buffered bytes. Idempotent;
    /// reads after close return end of input.
    pub fn close(&mut self) -> EncodeResult<()> {
        if self.phase == Phase::Closed {
            return Ok(());
        }
        self.phase = Phase::Closed;
        self.chunk = Vec::new();
        self.position = 0;
        debug!(records = self.written, "record encoder closed");
        self.stream.close()?;
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Replace the chunk with the next piece of output. Returns false when
    /// there is nothing left to produce.
    fn refill(&mut self) -> EncodeResult<bool> {
        self.chunk.clear();
        self.position = 0;
        match self.produce() {
            Ok(more) => Ok(more),
            Err(err) => {
                self.chunk.clear();
                if !matches!(err, EncodeError::Poisoned) {
                    debug!(error = %err, records = self.written, "record encoder failed");
                    self.phase = Phase::Failed;
                }
                Err(err)
            }
        }
    }

    fn produce(&mut self) -> EncodeResult<bool> {
        let pretty = self.codec.config().pretty;
        match self.phase {
            Phase::Open => {
                self.chunk.push(b'[');
                self.phase = Phase::Records;
                Ok(true)
            }
            Phase::Records => match self.stream.pull()? {
                Some(record) => {
                    if self.written > 0 {
                        self.chunk.push(b',');
                    }
                    if pretty {
                        self.chunk.push(b'\n');
                    }
                    self.codec.write_record(&mut self.chunk, &record)?;
                    self.written += 1;
                    Ok(true)
                }
                None => {
                    if pretty && self.written > 0 {
                        self.chunk.push(b'\n');
                    }
                    self.chunk.push(b']');
                    if pretty {
                        self.chunk.push(b'\n');
                    }
                    self.phase = Phase::Done;
                    debug!(records = self.written, "record encoder finished");
                    Ok(true)
                }
            },
            Phase::Done | Phase::Closed => Ok(false),
            Phase::Failed => Err(EncodeError::Poisoned),
        }
    }
}

impl<S: RecordStream> Read for RecordEncoder<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.position >= self.chunk.len() {
            if !self.refill()? {
                return Ok(0);
            }
        }
        let available = &self.chunk[self.position..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n;
        Ok(n)
    }
}

impl<S> std::fmt::Debug for RecordEncoder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordEncoder")
            .field("phase", &self.phase)
            .field("buffered", &self.chunk.len())
            .field("position", &self.position)
            .field("written", &self.written)
            .finish()
    }
}

/// Encode `records` into one in-memory JSON array.
pub fn encode_to_vec(records: Vec<Record>, codec: RecordCodec) -> EncodeResult<Vec<u8>> {
    let mut encoder = RecordEncoder::from_records(records, codec);
    let mut out = Vec::new();
    encoder.write_all_to(&mut out)?;
    encoder.close()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    use proptest::collection::vec;
    use proptest::option;
    use proptest::prelude::*;
    use recstream_codec::CodecConfig;
    use recstream_stream::ArrayStream;
    use recstream_types::{
        Alloy, ChemicalSystem, Composition, Extensions, Property, Scalar, ScalarValue, System,
        UnknownRecord,
    };
    use serde_json::{Number, Value};

    fn read_all(encoder: &mut impl Read) -> Vec<u8> {
        let mut out = Vec::new();
        encoder.read_to_end(&mut out).unwrap();
        out
    }

    fn decode_all(bytes: &[u8]) -> Vec<Record> {
        ArrayStream::from_slice(bytes, RecordCodec::default())
            .unwrap()
            .records()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn empty_stream_is_empty_array() {
        let bytes = encode_to_vec(Vec::new(), RecordCodec::default()).unwrap();
        assert_eq!(bytes, b"[]");
    }

    #[test]
    fn single_record_is_wrapped() {
        let mut encoder =
            RecordEncoder::from_record(System::named("a").into(), RecordCodec::default());
        let bytes = read_all(&mut encoder);
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"[{"category":"system","names":["a"]}]"#
        );
        assert_eq!(encoder.records_written(), 1);
        assert!(encoder.is_done());
    }

    #[test]
    fn records_are_comma_separated() {
        let bytes = encode_to_vec(
            vec![System::named("a").into(), ChemicalSystem::named("b").into()],
            RecordCodec::default(),
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"[{"category":"system","names":["a"]},{"category":"system.chemical","names":["b"]}]"#
        );
    }

    #[test]
    fn pretty_output_is_valid_json() {
        let codec = RecordCodec::new(CodecConfig {
            pretty: true,
            ..Default::default()
        });
        let bytes = encode_to_vec(
            vec![System::named("a").into(), Alloy::named("b").into()],
            codec,
        )
        .unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(decode_all(&bytes).len(), 2);
    }

    #[test]
    fn buffers_at_most_one_record() {
        let codec = RecordCodec::default();
        let records: Vec<Record> = (0..500)
            .map(|i| {
                let mut system = System::named(format!("record-{i}"));
                system.tags = (0..(i % 7)).map(|t| format!("tag-{t}")).collect();
                Record::from(system)
            })
            .collect();
        let largest = records
            .iter()
            .map(|r| codec.encode_to_vec(r).unwrap().len())
            .max()
            .unwrap();

        let mut encoder = RecordEncoder::from_records(records.clone(), codec);
        let mut out = Vec::new();
        let mut buf = [0u8; 7];
        let mut peak = 0;
        loop {
            let n = encoder.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            peak = peak.max(encoder.buffered_len());
            out.extend_from_slice(&buf[..n]);
        }
        // One record plus its separating comma.
        assert!(peak <= largest + 1, "peak {peak} > {largest} + 1");
        assert_eq!(decode_all(&out), records);
    }

    #[test]
    fn pulls_lazily() {
        let mut encoder = RecordEncoder::from_records(
            vec![System::named("a").into(), System::named("b").into()],
            RecordCodec::default(),
        );
        assert_eq!(encoder.next_chunk().unwrap(), Some(&b"["[..]));
        assert_eq!(encoder.stream.remaining(), 2);
        encoder.next_chunk().unwrap();
        assert_eq!(encoder.stream.remaining(), 1);
        encoder.next_chunk().unwrap();
        assert_eq!(encoder.next_chunk().unwrap(), Some(&b"]"[..]));
        assert_eq!(encoder.next_chunk().unwrap(), None);
    }

    #[test]
    fn works_with_io_copy() {
        let records = vec![Record::from(System::named("x")), Alloy::named("y").into()];
        let mut encoder = RecordEncoder::from_records(records.clone(), RecordCodec::default());
        let mut out = Vec::new();
        let copied = io::copy(&mut encoder, &mut out).unwrap();
        assert_eq!(copied as usize, out.len());
        assert_eq!(decode_all(&out), records);
    }

    #[test]
    fn upstream_error_poisons_the_encoder() {
        let stream = ArrayStream::from_slice(
            br#"[{"names":["a"]},{"category":"bogus"}]"#,
            RecordCodec::default(),
        )
        .unwrap();
        let mut encoder = RecordEncoder::new(stream, RecordCodec::default());
        let mut out = Vec::new();
        let err = encoder.read_to_end(&mut out).unwrap_err();
        assert!(err.to_string().contains("bogus"));
        assert!(matches!(encoder.next_chunk(), Err(EncodeError::Poisoned)));
        encoder.close().unwrap();
        assert_eq!(encoder.read(&mut [0u8; 4]).unwrap(), 0);
    }

    #[test]
    fn close_is_idempotent() {
        let mut encoder =
            RecordEncoder::from_record(System::named("a").into(), RecordCodec::default());
        let mut buf = [0u8; 3];
        // The opening bracket is a chunk of its own.
        assert_eq!(encoder.read(&mut buf).unwrap(), 1);
        assert_eq!(encoder.read(&mut buf).unwrap(), 3);
        encoder.close().unwrap();
        encoder.close().unwrap();
        assert_eq!(encoder.buffered_len(), 0);
        assert_eq!(encoder.read(&mut buf).unwrap(), 0);
        assert_eq!(encoder.next_chunk().unwrap(), None);
    }

    // -----------------------------------------------------------------------
    // Generated record trees
    // -----------------------------------------------------------------------

    fn arb_text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 ,.-]{0,12}"
    }

    fn arb_number() -> impl Strategy<Value = Number> {
        prop_oneof![
            any::<i64>().prop_map(Number::from),
            any::<f64>().prop_filter_map("finite", Number::from_f64),
        ]
    }

    fn arb_extensions() -> impl Strategy<Value = Extensions> {
        let value = prop_oneof![
            arb_number().prop_map(Value::Number),
            arb_text().prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
            Just(Value::Null),
        ];
        vec(("x_[a-z]{1,6}", value), 0..3).prop_map(|pairs| pairs.into_iter().collect())
    }

    fn arb_property() -> impl Strategy<Value = Property> {
        (arb_text(), vec(arb_number(), 1..3), option::of("[a-z/^0-9]{1,6}")).prop_map(
            |(name, numbers, units)| Property {
                name: Some(name),
                scalars: numbers
                    .into_iter()
                    .map(|n| Scalar::new(ScalarValue::Number(n)))
                    .collect(),
                units,
                ..Default::default()
            },
        )
    }

    fn arb_system() -> impl Strategy<Value = System> {
        (
            option::of(arb_text()),
            vec(arb_text(), 0..3),
            vec(arb_property(), 0..2),
            vec(arb_text(), 0..2),
            arb_extensions(),
        )
            .prop_map(|(uid, names, properties, tags, extensions)| System {
                uid,
                names,
                properties,
                tags,
                extensions,
                ..Default::default()
            })
    }

    fn arb_chemical() -> impl Strategy<Value = ChemicalSystem> {
        (
            arb_system(),
            option::of("[A-Z][a-z]?[0-9]?"),
            vec(("[A-Z][a-z]?", arb_number()), 0..3),
        )
            .prop_map(|(system, chemical_formula, parts)| ChemicalSystem {
                system,
                chemical_formula,
                composition: parts
                    .into_iter()
                    .map(|(element, share)| Composition {
                        element: Some(element),
                        actual_weight_percent: Some(Scalar::new(ScalarValue::Number(share))),
                        ..Default::default()
                    })
                    .collect(),
            })
    }

    fn arb_leaf() -> impl Strategy<Value = Record> {
        prop_oneof![
            arb_system().prop_map(Record::System),
            arb_chemical().prop_map(Record::ChemicalSystem),
            (arb_chemical(), vec("[a-z]{1,5}", 0..3))
                .prop_map(|(chemical, phases)| Record::Alloy(Alloy { chemical, phases })),
            ("[a-z]{3,6}\\.custom", arb_extensions())
                .prop_map(|(category, fields)| Record::Unknown(UnknownRecord { category, fields })),
        ]
    }

    fn arb_record() -> impl Strategy<Value = Record> {
        arb_leaf().prop_recursive(3, 24, 3, |inner| {
            (arb_leaf(), vec(inner, 0..3)).prop_map(|(mut record, children)| {
                if let Some(system) = record.system_mut() {
                    system.sub_systems = children;
                }
                record
            })
        })
    }

    proptest! {
        #[test]
        fn encoded_bytes_read_back(records in vec(arb_record(), 0..8), pretty in any::<bool>()) {
            let codec = RecordCodec::new(CodecConfig { pretty, ..CodecConfig::lenient() });
            let bytes = encode_to_vec(records.clone(), codec.clone()).unwrap();
            let decoded: Vec<Record> = ArrayStream::from_slice(&bytes, codec)
                .unwrap()
                .records()
                .collect::<Result<_, _>>()
                .unwrap();
            prop_assert_eq!(decoded, records);
        }

        #[test]
        fn encoder_feeds_a_stream_directly(records in vec(arb_record(), 0..8), capacity in 1usize..16) {
            let codec = RecordCodec::new(CodecConfig::lenient());
            let encoder = RecordEncoder::from_records(records.clone(), codec.clone());
            let reader = BufReader::with_capacity(capacity, encoder);
            let decoded: Vec<Record> = ArrayStream::from_reader(reader, codec)
                .unwrap()
                .records()
                .collect::<Result<_, _>>()
                .unwrap();
            prop_assert_eq!(decoded, records);
        }
    }
}
