use recstream_types::{Record, RecordKind};
use tracing::{debug, warn};

use crate::error::{StreamError, StreamResult};
use crate::traits::RecordStream;

/// Concatenation of several streams, read strictly in sequence.
///
/// Sub-stream `i + 1` is not touched until sub-stream `i` reports exhaustion.
/// Exhausted sub-streams stay open until the merged stream is closed, and
/// closing visits every sub-stream even if some of them fail.
pub struct MergedStream<S = Box<dyn RecordStream>> {
    streams: Vec<S>,
    current: usize,
    closed: bool,
}

impl<S: RecordStream> MergedStream<S> {
    /// The streams are read in the order given.
    pub fn new(streams: Vec<S>) -> Self {
        debug!(streams = streams.len(), "merging record streams");
        Self {
            streams,
            current: 0,
            closed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Index of the sub-stream the next record will come from.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Move past exhausted sub-streams. Returns false once none remain.
    fn seek(&mut self) -> StreamResult<bool> {
        while let Some(stream) = self.streams.get_mut(self.current) {
            if !stream.is_finished()? {
                return Ok(true);
            }
            self.current += 1;
        }
        Ok(false)
    }
}

impl<S: RecordStream> RecordStream for MergedStream<S> {
    fn pull(&mut self) -> StreamResult<Option<Record>> {
        if self.closed {
            return Ok(None);
        }
        while let Some(stream) = self.streams.get_mut(self.current) {
            if let Some(record) = stream.pull()? {
                return Ok(Some(record));
            }
            self.current += 1;
        }
        Ok(None)
    }

    fn pull_typed(&mut self, kind: RecordKind) -> StreamResult<Option<Record>> {
        if self.closed {
            return Ok(None);
        }
        while let Some(stream) = self.streams.get_mut(self.current) {
            if let Some(record) = stream.pull_typed(kind)? {
                return Ok(Some(record));
            }
            self.current += 1;
        }
        Ok(None)
    }

    fn is_finished(&mut self) -> StreamResult<bool> {
        if self.closed {
            return Ok(true);
        }
        Ok(!self.seek()?)
    }

    fn close(&mut self) -> StreamResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut failures = Vec::new();
        for (index, stream) in self.streams.iter_mut().enumerate() {
            if let Err(err) = stream.close() {
                warn!(index, error = %err, "failed to close sub-stream");
                failures.push(err);
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(StreamError::Close(failures))
        }
    }
}

impl<S> std::fmt::Debug for MergedStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergedStream")
            .field("streams", &self.streams.len())
            .field("current", &self.current)
            .field("closed", &self.closed)
            .finish()
    }
}
