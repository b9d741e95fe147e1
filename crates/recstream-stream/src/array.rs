use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use recstream_codec::RecordCodec;
use recstream_types::Record;
use tracing::{debug, trace};

use crate::error::{StreamError, StreamResult};
use crate::traits::RecordStream;

const BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    /// Constructed, positioned before the first record.
    Unstarted,
    /// At least one pull has happened.
    Active,
    /// No more records. Terminal.
    Exhausted,
    /// A decode failed. Terminal; every further pull fails.
    Failed,
    /// Closed by the caller. Terminal.
    Closed,
}

/// How the top-level value frames its records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Framing {
    /// `[ {..}, {..} ]`
    Array,
    /// A single bare `{..}`, read as a one-record array.
    Bare,
}

/// Record stream decoding a JSON array from a byte source.
///
/// The stream itself only handles the framing bytes between records: the
/// opening `[`, the `,` separators and the closing `]`. Each record is
/// parsed by serde_json straight off the reader, so only one record is
/// ever materialized.
///
/// Construction reads just far enough to normalize the input: an opening
/// `[` is consumed, a bare top-level object is treated as a one-record
/// array, and an empty source is an empty stream. Whether the stream is
/// finished is decided lazily, just before each pull.
pub struct ArrayStream<R> {
    reader: Option<R>,
    codec: RecordCodec,
    framing: Framing,
    state: StreamState,
    pulled: u64,
    /// A record was just read; the next framing byte must be `,` or `]`.
    after_record: bool,
}

impl ArrayStream<BufReader<File>> {
    /// Open a file. The file handle is released by `close()` or on drop.
    pub fn open(path: &Path, codec: RecordCodec) -> StreamResult<Self> {
        let file = File::open(path)?;
        debug!(path = %path.display(), "opening record stream");
        Self::from_reader(BufReader::new(file), codec)
    }
}

impl<'a> ArrayStream<&'a [u8]> {
    pub fn from_slice(bytes: &'a [u8], codec: RecordCodec) -> StreamResult<Self> {
        Self::from_reader(bytes, codec)
    }
}

impl<R: BufRead> ArrayStream<R> {
    pub fn from_reader(mut reader: R, codec: RecordCodec) -> StreamResult<Self> {
        if reader.fill_buf()?.starts_with(BOM) {
            reader.consume(BOM.len());
        }
        let (framing, state) = match peek_byte(&mut reader)? {
            Some(b'[') => {
                reader.consume(1);
                (Framing::Array, StreamState::Unstarted)
            }
            Some(b'{') => (Framing::Bare, StreamState::Unstarted),
            None => (Framing::Array, StreamState::Exhausted),
            Some(other) => {
                return Err(StreamError::Malformed(format!(
                    "top-level value must be an array or an object, found {}",
                    describe(other)
                )))
            }
        };
        Ok(Self {
            reader: Some(reader),
            codec,
            framing,
            state,
            pulled: 0,
            after_record: false,
        })
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Number of records returned so far.
    pub fn pulled(&self) -> u64 {
        self.pulled
    }

    pub fn codec(&self) -> &RecordCodec {
        &self.codec
    }

    fn check_finished(&mut self) -> StreamResult<bool> {
        match self.state {
            StreamState::Exhausted | StreamState::Closed => return Ok(true),
            StreamState::Failed => return Err(StreamError::Poisoned),
            StreamState::Unstarted | StreamState::Active => {}
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(true);
        };
        let finished = match self.framing {
            Framing::Array => next_element(reader, &mut self.after_record)?,
            Framing::Bare if self.after_record => {
                expect_end(reader)?;
                true
            }
            Framing::Bare => false,
        };
        if finished {
            self.state = StreamState::Exhausted;
            debug!(records = self.pulled, "record stream exhausted");
        }
        Ok(finished)
    }

    fn decode_next(&mut self) -> StreamResult<Option<Record>> {
        if self.check_finished()? {
            return Ok(None);
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        self.state = StreamState::Active;
        let record = self.codec.decode_from_reader(reader)?;
        self.after_record = true;
        self.pulled += 1;
        trace!(index = self.pulled - 1, kind = %record.kind(), "decoded record");
        Ok(Some(record))
    }

    fn fail(&mut self, err: StreamError) -> StreamError {
        if !matches!(err, StreamError::Poisoned) {
            debug!(error = %err, index = self.pulled, "record stream failed");
        }
        self.state = StreamState::Failed;
        err
    }
}

impl<R: BufRead> RecordStream for ArrayStream<R> {
    fn pull(&mut self) -> StreamResult<Option<Record>> {
        self.decode_next().map_err(|e| self.fail(e))
    }

    fn is_finished(&mut self) -> StreamResult<bool> {
        self.check_finished().map_err(|e| self.fail(e))
    }

    fn close(&mut self) -> StreamResult<()> {
        if self.state == StreamState::Closed {
            return Ok(());
        }
        self.state = StreamState::Closed;
        if self.reader.take().is_some() {
            debug!(records = self.pulled, "record stream closed");
        }
        Ok(())
    }
}

impl<R> std::fmt::Debug for ArrayStream<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayStream")
            .field("framing", &self.framing)
            .field("state", &self.state)
            .field("pulled", &self.pulled)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Framing bytes
// ---------------------------------------------------------------------------

/// Skip JSON whitespace and return the next byte without consuming it.
fn peek_byte<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    loop {
        let (skip, found) = {
            let buf = match reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if buf.is_empty() {
                return Ok(None);
            }
            match buf.iter().position(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r')) {
                Some(i) => (i, Some(buf[i])),
                None => (buf.len(), None),
            }
        };
        reader.consume(skip);
        if found.is_some() {
            return Ok(found);
        }
    }
}

/// Move past the separator before the next array element. Returns `true`
/// once the closing bracket, and nothing after it, has been read.
fn next_element<R: BufRead>(reader: &mut R, after_record: &mut bool) -> StreamResult<bool> {
    let mut next = peek_byte(reader)?;
    if *after_record {
        match next {
            Some(b',') => {
                reader.consume(1);
                *after_record = false;
                next = peek_byte(reader)?;
                if next == Some(b']') {
                    return Err(StreamError::Malformed("trailing comma before ']'".into()));
                }
            }
            Some(b']') | None => {}
            Some(other) => {
                return Err(StreamError::Malformed(format!(
                    "expected ',' or ']' after a record, found {}",
                    describe(other)
                )))
            }
        }
    }
    match next {
        Some(b']') => {
            reader.consume(1);
            expect_end(reader)?;
            Ok(true)
        }
        Some(_) => Ok(false),
        None => Err(StreamError::Malformed("input ended inside the record array".into())),
    }
}

fn expect_end<R: BufRead>(reader: &mut R) -> StreamResult<()> {
    match peek_byte(reader)? {
        None => Ok(()),
        Some(other) => Err(StreamError::Malformed(format!(
            "trailing characters after the top-level value, starting with {}",
            describe(other)
        ))),
    }
}

fn describe(byte: u8) -> String {
    if byte.is_ascii_graphic() {
        format!("'{}'", byte as char)
    } else {
        format!("byte 0x{byte:02x}")
    }
}
