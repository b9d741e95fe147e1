use recstream_types::{Record, RecordKind};
use tracing::trace;

use crate::error::StreamResult;
use crate::iter::Records;

/// A single-pass, pull-based source of records.
///
/// All implementations share this contract:
/// - `pull()` returns `Ok(None)` once the stream is exhausted, and keeps
///   returning it; exhaustion is never an error.
/// - `close()` releases whatever the stream owns and is idempotent. After
///   `close()`, `pull()` returns `Ok(None)` and `is_finished()` returns `true`.
/// - Errors from upstream are propagated unchanged.
///
/// A stream is driven by one caller at a time. Streams hold no locks, and
/// concurrent pulls on one stream are the caller's responsibility to prevent.
pub trait RecordStream {
    /// Decode and return the next record.
    fn pull(&mut self) -> StreamResult<Option<Record>>;

    /// Pull until a record of `kind` (or a sub-variant of it) appears.
    ///
    /// Records of other kinds are dropped, not buffered. A caller that needs
    /// several kinds from one source should pull unfiltered and dispatch.
    fn pull_typed(&mut self, kind: RecordKind) -> StreamResult<Option<Record>> {
        while let Some(record) = self.pull()? {
            if record.kind().is_a(kind) {
                return Ok(Some(record));
            }
            trace!(wanted = %kind, found = %record.kind(), "skipping record");
        }
        Ok(None)
    }

    /// Returns true if the next `pull()` would return `Ok(None)`.
    ///
    /// May read ahead in the source, but never past the next record.
    fn is_finished(&mut self) -> StreamResult<bool>;

    /// Release the underlying resource.
    fn close(&mut self) -> StreamResult<()>;

    /// Iterate over every record.
    fn records(self) -> Records<Self>
    where
        Self: Sized,
    {
        Records::new(self)
    }

    /// Iterate over records of `kind` and its sub-variants.
    fn records_of(self, kind: RecordKind) -> Records<Self>
    where
        Self: Sized,
    {
        Records::of_kind(self, kind)
    }
}

impl<S: RecordStream + ?Sized> RecordStream for Box<S> {
    fn pull(&mut self) -> StreamResult<Option<Record>> {
        (**self).pull()
    }

    fn pull_typed(&mut self, kind: RecordKind) -> StreamResult<Option<Record>> {
        (**self).pull_typed(kind)
    }

    fn is_finished(&mut self) -> StreamResult<bool> {
        (**self).is_finished()
    }

    fn close(&mut self) -> StreamResult<()> {
        (**self).close()
    }
}
