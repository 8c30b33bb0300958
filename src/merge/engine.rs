use std::cmp::Ordering;
use std::fmt;

use tracing::{debug, trace};

use super::SortednessValidator;
use crate::records::{Keyed, Pull, RecordStream};
use crate::{FilterError, Identifier, IdentifierSet};

/// How the merge treats the end of the exclusion list and of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundaryPolicy {
    /// Plain set difference: every record is examined, the pass ends with the stream.
    #[default]
    Exact,
    /// Historical behaviour of the QNAME-exclusion workflow.
    ///
    /// The pass stops as soon as a record carries the largest excluded QNAME,
    /// stops after excluding a record with the input's final QNAME, and, with
    /// one identifier left, emits exactly one more record after reaching the
    /// final QNAME. Trailing records can be dropped as a result.
    Legacy,
}

/// Why a merge pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The record stream ran out.
    StreamEnd,
    /// The exclusion list ran out and the rest of the stream was copied.
    Drained,
    /// A record carried the largest excluded QNAME (legacy only).
    ExclusionMaximum,
    /// A record with the final QNAME was excluded (legacy only).
    LastIdentifierExcluded,
    /// The record after the final QNAME was emitted (legacy only).
    LastIdentifierEmitted,
    /// An error aborted the pass.
    Failed,
}

/// Counters collected while merging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Records yielded to the caller.
    pub emitted: u64,
    /// Records dropped because their QNAME is excluded.
    pub excluded: u64,
    /// Exclusion identifiers retired without a matching record.
    pub discarded: u64,
    /// Set once the pass has ended.
    pub termination: Option<TerminationReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Merging,
    /// Exclusion list exhausted; copy everything that is left.
    Draining,
    /// Legacy: emit one more record, then stop.
    Tail,
    Finished,
}

/// Lazy set difference of a sorted record stream and an [`IdentifierSet`].
///
/// Each call to `next` pulls at most as many records as it needs to find the
/// next survivor. Identifiers are retired as soon as the stream passes them,
/// so the pass performs O(N + M) comparisons. After yielding an error the
/// iterator is fused.
pub struct ExclusionMerge<S: RecordStream> {
    stream: S,
    set: IdentifierSet,
    /// Record under examination; `None` means pull before the next step.
    current: Option<S::Record>,
    last: Option<Identifier>,
    last_seen: bool,
    policy: BoundaryPolicy,
    phase: Phase,
    stats: MergeStats,
}

impl<S: RecordStream + fmt::Debug> fmt::Debug for ExclusionMerge<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusionMerge")
            .field("stream", &self.stream)
            .field("remaining", &self.set.remaining())
            .field("policy", &self.policy)
            .field("phase", &self.phase)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<S: RecordStream> ExclusionMerge<S> {
    /// Look up the final QNAME, pull the first record and validate it.
    ///
    /// Nothing is yielded unless validation passes. An empty stream yields
    /// nothing; an empty stream whose last-QNAME lookup found a record is an
    /// exhaustion error.
    pub fn start(
        mut stream: S,
        set: IdentifierSet,
        policy: BoundaryPolicy,
    ) -> Result<Self, FilterError> {
        let last = stream.last_identifier()?;
        let first = stream.pull()?.into_option();

        let mut merge = Self {
            stream,
            set,
            current: None,
            last,
            last_seen: false,
            policy,
            phase: Phase::Merging,
            stats: MergeStats::default(),
        };

        match first {
            Some(record) => {
                SortednessValidator::new(merge.set.order()).check(
                    record.identifier(),
                    merge.set.max(),
                    merge.last.as_ref(),
                )?;
                merge.observe(&record);
                merge.current = Some(record);
            }
            None => {
                merge.ensure_last_seen()?;
                merge.finish(TerminationReason::StreamEnd);
            }
        }

        debug!(
            policy = ?policy,
            identifiers = merge.set.len(),
            "merge started"
        );
        Ok(merge)
    }

    /// Counters so far; `termination` is set once the pass has ended.
    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    fn observe(&mut self, record: &S::Record) {
        if !self.last_seen {
            self.last_seen = self.is_last(record.identifier());
        }
    }

    fn is_last(&self, id: &[u8]) -> bool {
        self.last.as_ref().is_some_and(|last| last.as_bytes() == id)
    }

    fn pull(&mut self) -> Result<Option<S::Record>, FilterError> {
        match self.stream.pull()? {
            Pull::Record(record) => {
                self.observe(&record);
                Ok(Some(record))
            }
            Pull::EndOfStream => Ok(None),
        }
    }

    fn pull_required(&mut self, context: &str) -> Result<S::Record, FilterError> {
        self.pull()?.ok_or_else(|| FilterError::stream_exhausted(context))
    }

    fn next_record(&mut self) -> Result<Option<S::Record>, FilterError> {
        match self.current.take() {
            Some(record) => Ok(Some(record)),
            None => self.pull(),
        }
    }

    /// The stream must not end before the looked-up final QNAME shows up.
    fn ensure_last_seen(&self) -> Result<(), FilterError> {
        match &self.last {
            Some(last) if !self.last_seen => Err(FilterError::stream_exhausted(format!(
                "before final QNAME {last} was reached"
            ))),
            _ => Ok(()),
        }
    }

    fn retire_min(&mut self) {
        self.set.advance();
        self.stats.discarded += 1;
    }

    fn finish(&mut self, reason: TerminationReason) {
        self.phase = Phase::Finished;
        self.stats.termination = Some(reason);
        trace!(reason = ?reason, "merge finished");
    }

    fn exact_step(&mut self) -> Result<Option<S::Record>, FilterError> {
        loop {
            let Some(record) = self.next_record()? else {
                self.ensure_last_seen()?;
                self.finish(TerminationReason::StreamEnd);
                return Ok(None);
            };
            let Some(target) = self.set.min() else {
                self.phase = Phase::Draining;
                return Ok(Some(record));
            };

            let ordering = self.set.order().compare(record.identifier(), target.as_bytes());
            match ordering {
                Ordering::Greater => {
                    self.retire_min();
                    self.current = Some(record);
                }
                Ordering::Equal => self.stats.excluded += 1,
                Ordering::Less => return Ok(Some(record)),
            }
        }
    }

    fn legacy_step(&mut self) -> Result<Option<S::Record>, FilterError> {
        loop {
            let record = match self.current.take() {
                Some(record) => record,
                None => self.pull_required("while records were still expected")?,
            };
            let id = record.identifier();

            if self.set.max().is_some_and(|max| max.as_bytes() == id) {
                self.finish(TerminationReason::ExclusionMaximum);
                return Ok(None);
            }
            let Some(target) = self.set.min() else {
                self.phase = Phase::Draining;
                return Ok(Some(record));
            };
            let ordering = self.set.order().compare(id, target.as_bytes());
            let is_last = self.is_last(id);
            let final_identifier = self.set.remaining() == 1;

            match ordering {
                Ordering::Greater if final_identifier => {
                    self.retire_min();
                    self.phase = Phase::Draining;
                    return Ok(Some(record));
                }
                Ordering::Greater => {
                    self.retire_min();
                    self.current = Some(record);
                }
                Ordering::Equal => {
                    self.stats.excluded += 1;
                    if is_last {
                        self.finish(TerminationReason::LastIdentifierExcluded);
                        return Ok(None);
                    }
                }
                Ordering::Less => {
                    if final_identifier && is_last {
                        self.phase = Phase::Tail;
                    }
                    return Ok(Some(record));
                }
            }
        }
    }

    fn drain_step(&mut self) -> Result<Option<S::Record>, FilterError> {
        match self.next_record()? {
            Some(record) => Ok(Some(record)),
            None => {
                if self.policy == BoundaryPolicy::Exact {
                    self.ensure_last_seen()?;
                }
                self.finish(TerminationReason::Drained);
                Ok(None)
            }
        }
    }

    fn tail_step(&mut self) -> Result<Option<S::Record>, FilterError> {
        let record = self.pull_required("after the final QNAME")?;
        self.finish(TerminationReason::LastIdentifierEmitted);
        Ok(Some(record))
    }
}

impl<S: RecordStream> Iterator for ExclusionMerge<S> {
    type Item = Result<S::Record, FilterError>;

    fn next(&mut self) -> Option<Self::Item> {
        let step = match (self.phase, self.policy) {
            (Phase::Finished, _) => return None,
            (Phase::Draining, _) => self.drain_step(),
            (Phase::Tail, _) => self.tail_step(),
            (Phase::Merging, BoundaryPolicy::Exact) => self.exact_step(),
            (Phase::Merging, BoundaryPolicy::Legacy) => self.legacy_step(),
        };

        match step {
            Ok(Some(record)) => {
                self.stats.emitted += 1;
                Some(Ok(record))
            }
            Ok(None) => None,
            Err(err) => {
                self.finish(TerminationReason::Failed);
                Some(Err(err))
            }
        }
    }
}
