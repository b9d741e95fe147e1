use recstream_types::{Record, RecordKind};

use crate::error::{StreamError, StreamResult};
use crate::traits::RecordStream;

enum Lookahead {
    Empty,
    Ready(Record),
    Failed(StreamError),
    Done,
}

/// Iterator adapter over a [`RecordStream`].
///
/// Each item is a `StreamResult<Record>`. After the first error the iterator
/// yields that error once and then ends. [`Records::has_next`] buffers at
/// most one record (or the error that replaced it).
pub struct Records<S> {
    stream: S,
    kind: Option<RecordKind>,
    lookahead: Lookahead,
}

impl<S: RecordStream> Records<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            kind: None,
            lookahead: Lookahead::Empty,
        }
    }

    /// Yield only records of `kind` and its sub-variants.
    pub fn of_kind(stream: S, kind: RecordKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::new(stream)
        }
    }

    /// Returns true if the next call to `next()` yields an item.
    ///
    /// An error counts as an item: it is held back and reported by `next()`.
    pub fn has_next(&mut self) -> bool {
        if matches!(self.lookahead, Lookahead::Empty) {
            self.lookahead = match self.fetch() {
                Ok(Some(record)) => Lookahead::Ready(record),
                Ok(None) => Lookahead::Done,
                Err(err) => Lookahead::Failed(err),
            };
        }
        matches!(self.lookahead, Lookahead::Ready(_) | Lookahead::Failed(_))
    }

    /// Close the underlying stream. Further iteration yields nothing.
    pub fn close(&mut self) -> StreamResult<()> {
        self.lookahead = Lookahead::Done;
        self.stream.close()
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    fn fetch(&mut self) -> StreamResult<Option<Record>> {
        match self.kind {
            Some(kind) => self.stream.pull_typed(kind),
            None => self.stream.pull(),
        }
    }
}

impl<S: RecordStream> Iterator for Records<S> {
    type Item = StreamResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.has_next();
        match std::mem::replace(&mut self.lookahead, Lookahead::Empty) {
            Lookahead::Ready(record) => Some(Ok(record)),
            Lookahead::Failed(err) => {
                self.lookahead = Lookahead::Done;
                Some(Err(err))
            }
            Lookahead::Done | Lookahead::Empty => {
                self.lookahead = Lookahead::Done;
                None
            }
        }
    }
}

impl<S: RecordStream> std::iter::FusedIterator for Records<S> {}
