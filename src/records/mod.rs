//! Record streams and sinks.
//!
//! The merge only needs three things from an alignment container: the next
//! record, the QNAME of its final record, and somewhere to put survivors.
//! Those seams are the [`RecordStream`] and [`RecordSink`] traits; htslib
//! backs them for real files and in-memory types back them for tests.

mod hts;
mod memory;

pub use hts::{
    count_records, last_identifier, ContainerKind, HtsRecordSink, HtsRecordStream, OutputTarget,
};
pub use memory::{MemoryStream, NamedRecord, VecSink};

use crate::{FilterError, Identifier};

/// Anything carrying a read name.
pub trait Keyed {
    /// QNAME bytes of this record.
    fn identifier(&self) -> &[u8];
}

impl Keyed for rust_htslib::bam::Record {
    fn identifier(&self) -> &[u8] {
        self.qname()
    }
}

/// Result of pulling from a record stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pull<R> {
    /// Next record in stream order.
    Record(R),
    /// No records remain.
    EndOfStream,
}

impl<R> Pull<R> {
    /// Convert into an `Option`, mapping end of stream to `None`.
    pub fn into_option(self) -> Option<R> {
        match self {
            Pull::Record(record) => Some(record),
            Pull::EndOfStream => None,
        }
    }
}

/// Pull-based source of records sorted by QNAME.
pub trait RecordStream {
    /// Record type produced by the stream.
    type Record: Keyed;

    /// Fetch the next record.
    fn pull(&mut self) -> Result<Pull<Self::Record>, FilterError>;

    /// QNAME of the final record, looked up independently of `pull`.
    ///
    /// `None` means the container holds no records.
    fn last_identifier(&mut self) -> Result<Option<Identifier>, FilterError>;
}

/// Destination for surviving records.
///
/// `finish` consumes the sink, so it can only be closed once. Dropping an
/// unfinished sink still releases its resources.
pub trait RecordSink<R> {
    /// Value handed back once the sink is closed.
    type Output;

    /// Write one record, preserving its content.
    fn write(&mut self, record: &R) -> Result<(), FilterError>;

    /// Flush and close.
    fn finish(self) -> Result<Self::Output, FilterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_converts_to_option() {
        assert_eq!(Pull::Record(3).into_option(), Some(3));
        assert_eq!(Pull::<u8>::EndOfStream.into_option(), None);
    }
}
