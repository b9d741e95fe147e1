use recstream_types::{Record, RecordKind};

use crate::error::StreamResult;
use crate::traits::RecordStream;

/// A per-record mutation applied by a [`TransformStream`].
pub trait RecordTransform {
    fn apply(&mut self, record: &mut Record) -> StreamResult<()>;
}

impl<F> RecordTransform for F
where
    F: FnMut(&mut Record) -> StreamResult<()>,
{
    fn apply(&mut self, record: &mut Record) -> StreamResult<()> {
        self(record)
    }
}

/// Applies a transform to every record pulled from an inner stream.
///
/// A failing transform fails that pull; the record is discarded.
pub struct TransformStream<S, T> {
    inner: S,
    transform: T,
}

impl<S: RecordStream, T: RecordTransform> TransformStream<S, T> {
    pub fn new(inner: S, transform: T) -> Self {
        Self { inner, transform }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: RecordStream, T: RecordTransform> RecordStream for TransformStream<S, T> {
    fn pull(&mut self) -> StreamResult<Option<Record>> {
        match self.inner.pull()? {
            Some(mut record) => {
                self.transform.apply(&mut record)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    // Filtering happens before the transform so skipped records are never
    // mutated.
    fn pull_typed(&mut self, kind: RecordKind) -> StreamResult<Option<Record>> {
        match self.inner.pull_typed(kind)? {
            Some(mut record) => {
                self.transform.apply(&mut record)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn is_finished(&mut self) -> StreamResult<bool> {
        self.inner.is_finished()
    }

    fn close(&mut self) -> StreamResult<()> {
        self.inner.close()
    }
}

/// Restricts an inner stream to one record kind and its sub-variants.
///
/// `is_finished()` reports on the inner stream, so it can return `false`
/// when only records of other kinds remain; the next `pull()` then returns
/// `Ok(None)`.
#[derive(Debug)]
pub struct TypedStream<S> {
    inner: S,
    kind: RecordKind,
}

impl<S: RecordStream> TypedStream<S> {
    pub fn new(inner: S, kind: RecordKind) -> Self {
        Self { inner, kind }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: RecordStream> RecordStream for TypedStream<S> {
    fn pull(&mut self) -> StreamResult<Option<Record>> {
        self.inner.pull_typed(self.kind)
    }

    fn pull_typed(&mut self, kind: RecordKind) -> StreamResult<Option<Record>> {
        // Narrow to whichever kind is more specific; disjoint kinds match nothing.
        if kind.is_a(self.kind) {
            self.inner.pull_typed(kind)
        } else if self.kind.is_a(kind) {
            self.inner.pull_typed(self.kind)
        } else {
            while self.inner.pull_typed(self.kind)?.is_some() {}
            Ok(None)
        }
    }

    fn is_finished(&mut self) -> StreamResult<bool> {
        self.inner.is_finished()
    }

    fn close(&mut self) -> StreamResult<()> {
        self.inner.close()
    }
}
