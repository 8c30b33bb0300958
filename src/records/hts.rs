use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};

use rust_htslib::bam::{self, Read};
use tracing::debug;

use super::{Pull, RecordSink, RecordStream};
use crate::{FileRole, FilterError, Identifier};

/// Alignment container written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Plain-text SAM.
    Sam,
    /// BGZF-compressed BAM.
    Bam,
}

impl ContainerKind {
    /// Detect the container from the extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "sam" => Some(ContainerKind::Sam),
            "bam" => Some(ContainerKind::Bam),
            _ => None,
        }
    }

    fn format(self) -> bam::Format {
        match self {
            ContainerKind::Sam => bam::Format::Sam,
            ContainerKind::Bam => bam::Format::Bam,
        }
    }
}

/// Where surviving records are written, resolved once before the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// SAM or BAM file.
    File {
        /// Destination path.
        path: PathBuf,
        /// Container implied by the extension.
        kind: ContainerKind,
    },
    /// SAM text on stdout.
    Console,
}

impl OutputTarget {
    /// Resolve a destination. `None` and `-` mean stdout.
    pub fn resolve(path: Option<&Path>) -> Result<Self, FilterError> {
        let Some(path) = path.filter(|p| *p != Path::new("-")) else {
            return Ok(OutputTarget::Console);
        };
        let kind = ContainerKind::from_path(path).ok_or_else(|| FilterError::UnsupportedFormat {
            role: FileRole::Output,
            path: path.to_path_buf(),
        })?;
        Ok(OutputTarget::File {
            path: path.to_path_buf(),
            kind,
        })
    }

    /// Destination path, if writing to a file.
    pub fn path(&self) -> Option<&Path> {
        match self {
            OutputTarget::File { path, .. } => Some(path),
            OutputTarget::Console => None,
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::File { path, .. } => write!(f, "{}", path.display()),
            OutputTarget::Console => f.write_str("<stdout>"),
        }
    }
}

fn open_reader(path: &Path, threads: usize) -> Result<bam::Reader, FilterError> {
    let mut reader = bam::Reader::from_path(path)?;
    if threads > 1 {
        reader.set_threads(threads)?;
    }
    Ok(reader)
}

/// QNAME of the final record in a SAM/BAM/CRAM file.
///
/// Scans the whole container with a second reader; the two record buffers
/// are swapped so only one QNAME survives at a time.
pub fn last_identifier(path: impl AsRef<Path>, threads: usize) -> Result<Option<Identifier>, FilterError> {
    let path = path.as_ref();
    let mut reader = open_reader(path, threads)?;
    let mut last = bam::Record::new();
    let mut next = bam::Record::new();
    let mut seen = false;

    while let Some(result) = reader.read(&mut next) {
        result?;
        mem::swap(&mut last, &mut next);
        seen = true;
    }

    let last = seen.then(|| Identifier::from(last.qname()));
    debug!(path = %path.display(), last = ?last.as_ref().map(ToString::to_string), "looked up final QNAME");
    Ok(last)
}

/// Number of records in a SAM/BAM/CRAM file.
pub fn count_records(path: impl AsRef<Path>, threads: usize) -> Result<u64, FilterError> {
    let mut reader = open_reader(path.as_ref(), threads)?;
    let mut record = bam::Record::new();
    let mut count = 0u64;
    while let Some(result) = reader.read(&mut record) {
        result?;
        count += 1;
    }
    Ok(count)
}

/// Queryname-sorted alignments read through htslib.
pub struct HtsRecordStream {
    reader: bam::Reader,
    path: PathBuf,
    threads: usize,
}

impl HtsRecordStream {
    /// Open a SAM, BAM or CRAM file; the format is sniffed by htslib.
    pub fn open(path: impl AsRef<Path>, threads: usize) -> Result<Self, FilterError> {
        let path = path.as_ref();
        Ok(Self {
            reader: open_reader(path, threads)?,
            path: path.to_path_buf(),
            threads,
        })
    }

    /// Header to template the output on.
    pub fn header(&self) -> bam::Header {
        bam::Header::from_template(self.reader.header())
    }

}

impl fmt::Debug for HtsRecordStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtsRecordStream")
            .field("path", &self.path)
            .field("threads", &self.threads)
            .finish()
    }
}

impl RecordStream for HtsRecordStream {
    type Record = bam::Record;

    fn pull(&mut self) -> Result<Pull<bam::Record>, FilterError> {
        let mut record = bam::Record::new();
        match self.reader.read(&mut record) {
            None => Ok(Pull::EndOfStream),
            Some(Ok(())) => Ok(Pull::Record(record)),
            Some(Err(err)) => Err(err.into()),
        }
    }

    fn last_identifier(&mut self) -> Result<Option<Identifier>, FilterError> {
        last_identifier(&self.path, self.threads)
    }
}

/// SAM/BAM writer for surviving alignments.
///
/// The underlying htslib handle is closed when the sink is finished or dropped.
pub struct HtsRecordSink {
    writer: bam::Writer,
    target: OutputTarget,
    written: u64,
}

impl HtsRecordSink {
    /// Create the writer for `target`, copying `header` from the input.
    pub fn create(
        target: &OutputTarget,
        header: &bam::Header,
        threads: usize,
    ) -> Result<Self, FilterError> {
        let mut writer = match target {
            OutputTarget::File { path, kind } => bam::Writer::from_path(path, header, kind.format())?,
            OutputTarget::Console => bam::Writer::from_stdout(header, bam::Format::Sam)?,
        };
        if threads > 1 {
            writer.set_threads(threads)?;
        }
        debug!(target = %target, "opened output");

        Ok(Self {
            writer,
            target: target.clone(),
            written: 0,
        })
    }
}

impl fmt::Debug for HtsRecordSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtsRecordSink")
            .field("target", &self.target)
            .field("written", &self.written)
            .finish()
    }
}

impl RecordSink<bam::Record> for HtsRecordSink {
    type Output = u64;

    fn write(&mut self, record: &bam::Record) -> Result<(), FilterError> {
        self.writer.write(record)?;
        self.written += 1;
        Ok(())
    }

    /// Drops the htslib writer, which flushes and closes it.
    ///
    /// rust-htslib reports nothing from that close, so a failed final flush
    /// (e.g. the BGZF EOF block on a full disk) is not detected here.
    fn finish(self) -> Result<u64, FilterError> {
        let Self { writer, written, .. } = self;
        drop(writer);
        Ok(written)
    }
}
