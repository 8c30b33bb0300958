//! # Streaming QNAME exclusion for queryname-sorted alignments
//!
//! This library removes every alignment whose read name (QNAME) appears in an
//! exclusion list, emitting the surviving records in their original order.
//!
//! ## Core Algorithm
//!
//! 1. **Identifier set**: exclusion QNAMEs are loaded once, deduplicated and
//!    sorted ascending into an immutable array with a forward-only cursor
//! 2. **Sortedness check**: the first record is compared against the largest
//!    excluded QNAME and the final QNAME of the input before any output exists
//! 3. **Exclusion merge**: records and identifiers are walked in lockstep;
//!    identifiers that fall behind the record stream are discarded, records
//!    matching the cursor are dropped, everything else is emitted
//!
//! Result: O(N + M) comparisons with O(M) memory, where N is the number of
//! records and M the number of excluded identifiers.
//!
//! ## Usage Example
//!
//! ```ignore
//! use qname_exclude::{FilterConfig, QnameFilter};
//!
//! let config = FilterConfig::new("sample.queryname.bam", "ambiguous.txt.gz")
//!     .with_output(Some("sample.filtered.bam".into()));
//! let summary = QnameFilter::new(config).run()?;
//! println!("{} records written", summary.records_written);
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod identifiers; // Exclusion identifiers and their ordering
pub mod merge; // Validator and streaming exclusion merge
pub mod records; // Record streams and sinks

pub use identifiers::{ExclusionSourceKind, Identifier, IdentifierOrder, IdentifierSet};
pub use merge::{
    filter_records, BoundaryPolicy, ExclusionMerge, MergeStats, SortBound, SortednessValidator,
    TerminationReason,
};
pub use records::{
    count_records, last_identifier, ContainerKind, HtsRecordSink, HtsRecordStream, Keyed,
    MemoryStream, NamedRecord, OutputTarget, Pull, RecordSink, RecordStream, VecSink,
};

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Kind of file whose format could not be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    /// List of QNAMEs to exclude.
    ExclusionList,
    /// Destination for surviving alignments.
    Output,
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileRole::ExclusionList => f.write_str("QNAME list"),
            FileRole::Output => f.write_str("output"),
        }
    }
}

/// Errors that can occur while filtering alignments
#[derive(Error, Debug)]
pub enum FilterError {
    /// The first record is larger than a value it must not exceed in sorted input.
    #[error("alignment file appears to be unsorted: {first} > {reference} ({bound})")]
    UnsortedInput {
        /// QNAME of the first record in the stream.
        first: Identifier,
        /// Reference QNAME the first record was checked against.
        reference: Identifier,
        /// Which reference point was violated.
        bound: SortBound,
    },

    /// File extension does not map to a supported format.
    #[error("unknown format for {role}: {}", path.display())]
    UnsupportedFormat {
        /// Role of the offending file.
        role: FileRole,
        /// Path as supplied by the caller.
        path: PathBuf,
    },

    /// The merge needed another record but the stream had ended.
    #[error("record stream exhausted {context}")]
    StreamExhaustion {
        /// Where in the pass the stream ran out.
        context: String,
    },

    /// Failure reading a plain or compressed text file.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Failure reported by htslib while decoding or encoding alignments.
    #[error("htslib error: {0}")]
    Hts(#[from] rust_htslib::errors::Error),
}

impl FilterError {
    /// Helper for constructing stream exhaustion errors.
    pub fn stream_exhausted(context: impl Into<String>) -> Self {
        FilterError::StreamExhaustion {
            context: context.into(),
        }
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        FilterError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Configuration for a single filtering pass
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Queryname-sorted SAM/BAM/CRAM input.
    pub input: PathBuf,

    /// Plain (`.txt`) or gzip (`.txt.gz`) list of QNAMEs to exclude.
    pub exclusions: PathBuf,

    /// Destination file; `None` echoes SAM records to stdout.
    pub output: Option<PathBuf>,

    /// Ordering shared by the exclusion list and the record stream.
    pub order: IdentifierOrder,

    /// Handling of the final records of the pass.
    pub policy: BoundaryPolicy,

    /// Extra htslib compression threads; 0 or 1 keeps codecs single-threaded.
    pub threads: usize,
}

impl FilterConfig {
    /// Create a configuration with default ordering and boundary policy.
    pub fn new(input: impl Into<PathBuf>, exclusions: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            exclusions: exclusions.into(),
            output: None,
            order: IdentifierOrder::default(),
            policy: BoundaryPolicy::default(),
            threads: 0,
        }
    }

    /// Set the output destination.
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    /// Set the identifier ordering.
    pub fn with_order(mut self, order: IdentifierOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the boundary policy.
    pub fn with_policy(mut self, policy: BoundaryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the number of htslib worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

/// Outcome of a completed filtering pass
#[derive(Debug, Clone)]
pub struct FilterSummary {
    /// Merge counters and termination reason.
    pub stats: MergeStats,

    /// Non-blank lines read from the exclusion list.
    pub raw_identifiers: usize,

    /// Distinct QNAMEs after deduplication.
    pub unique_identifiers: usize,

    /// Records handed to the sink.
    pub records_written: u64,

    /// Where the records went.
    pub target: OutputTarget,
}

/// Filtering orchestrator
///
/// Wires the exclusion list, the htslib record stream and the output sink
/// into one validated merge pass.
#[derive(Debug)]
pub struct QnameFilter {
    config: FilterConfig,
}

impl QnameFilter {
    /// Create a new filter
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Run the pass
    ///
    /// The output is only created once the input has passed the sortedness
    /// check, so a rejected input never leaves an output file behind. Output
    /// written before a later failure is not removed.
    pub fn run(&self) -> Result<FilterSummary, FilterError> {
        let config = &self.config;
        let target = OutputTarget::resolve(config.output.as_deref())?;

        let set = IdentifierSet::from_path(&config.exclusions, config.order)?;
        let raw_identifiers = set.raw_count();
        let unique_identifiers = set.len();
        info!(
            path = %config.exclusions.display(),
            raw = raw_identifiers,
            unique = unique_identifiers,
            "loaded exclusion QNAMEs"
        );
        if set.is_empty() {
            warn!("exclusion list is empty; every record will be written");
        }

        let stream = HtsRecordStream::open(&config.input, config.threads)?;
        let header = stream.header();
        let merge = ExclusionMerge::start(stream, set, config.policy)?;
        debug!(policy = ?config.policy, order = ?config.order, "input passed sortedness check");

        let sink = HtsRecordSink::create(&target, &header, config.threads)?;
        let (stats, records_written) = filter_records(merge, sink)?;
        info!(
            emitted = stats.emitted,
            excluded = stats.excluded,
            discarded = stats.discarded,
            termination = ?stats.termination,
            "filtering complete"
        );

        Ok(FilterSummary {
            stats,
            raw_identifiers,
            unique_identifiers,
            records_written,
            target,
        })
    }
}
