//! Sortedness validation and the streaming exclusion merge.

mod engine;
mod validator;

pub use engine::{BoundaryPolicy, ExclusionMerge, MergeStats, TerminationReason};
pub use validator::{SortBound, SortednessValidator};

use crate::records::{RecordSink, RecordStream};
use crate::FilterError;

/// Drive a merge to completion, writing every survivor to `sink`.
///
/// The sink is finished only when the merge succeeds. On error it is dropped,
/// which releases it without removing anything already written.
pub fn filter_records<S, K>(
    mut merge: ExclusionMerge<S>,
    mut sink: K,
) -> Result<(MergeStats, K::Output), FilterError>
where
    S: RecordStream,
    K: RecordSink<S::Record>,
{
    for record in merge.by_ref() {
        sink.write(&record?)?;
    }
    let output = sink.finish()?;
    Ok((merge.stats(), output))
}
