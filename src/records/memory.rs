use std::vec;

use super::{Keyed, Pull, RecordSink, RecordStream};
use crate::{FilterError, Identifier};

/// Minimal record: a QNAME plus an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRecord {
    /// Read name.
    pub name: Identifier,
    /// Opaque record body.
    pub payload: Vec<u8>,
}

impl NamedRecord {
    /// Construct a record.
    pub fn new(name: impl Into<Identifier>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }
}

impl Keyed for NamedRecord {
    fn identifier(&self) -> &[u8] {
        self.name.as_bytes()
    }
}

/// Record stream over an owned vector.
#[derive(Debug)]
pub struct MemoryStream<R> {
    records: vec::IntoIter<R>,
    last: Option<Identifier>,
}

impl<R: Keyed> MemoryStream<R> {
    /// Stream the records in order; the last identifier is taken from the final record.
    pub fn new(records: Vec<R>) -> Self {
        let last = records.last().map(|r| Identifier::from(r.identifier()));
        Self {
            records: records.into_iter(),
            last,
        }
    }

    /// Override the last-identifier lookup, e.g. to model a stale index.
    pub fn with_last_identifier(mut self, last: Option<Identifier>) -> Self {
        self.last = last;
        self
    }
}

impl<R: Keyed> RecordStream for MemoryStream<R> {
    type Record = R;

    fn pull(&mut self) -> Result<Pull<R>, FilterError> {
        Ok(self.records.next().map_or(Pull::EndOfStream, Pull::Record))
    }

    fn last_identifier(&mut self) -> Result<Option<Identifier>, FilterError> {
        Ok(self.last.clone())
    }
}

/// Sink collecting records into a vector.
#[derive(Debug)]
pub struct VecSink<R> {
    records: Vec<R>,
}

impl<R> VecSink<R> {
    /// Empty sink.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<R> Default for VecSink<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Clone> RecordSink<R> for VecSink<R> {
    type Output = Vec<R>;

    fn write(&mut self, record: &R) -> Result<(), FilterError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(self) -> Result<Vec<R>, FilterError> {
        Ok(self.records)
    }
}
