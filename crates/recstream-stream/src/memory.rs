use recstream_types::Record;

use crate::error::StreamResult;
use crate::traits::RecordStream;

/// Record stream over records already in memory.
#[derive(Debug)]
pub struct MemoryStream {
    records: std::vec::IntoIter<Record>,
    position: usize,
    closed: bool,
}

impl MemoryStream {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into_iter(),
            position: 0,
            closed: false,
        }
    }

    pub fn single(record: Record) -> Self {
        Self::new(vec![record])
    }

    /// Records handed out so far.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        if self.closed {
            0
        } else {
            self.records.len()
        }
    }
}

impl From<Vec<Record>> for MemoryStream {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

impl RecordStream for MemoryStream {
    fn pull(&mut self) -> StreamResult<Option<Record>> {
        if self.closed {
            return Ok(None);
        }
        let next = self.records.next();
        if next.is_some() {
            self.position += 1;
        }
        Ok(next)
    }

    fn is_finished(&mut self) -> StreamResult<bool> {
        Ok(self.remaining() == 0)
    }

    fn close(&mut self) -> StreamResult<()> {
        self.closed = true;
        Ok(())
    }
}
