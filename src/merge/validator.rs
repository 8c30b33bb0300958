use std::fmt;

use crate::{FilterError, Identifier, IdentifierOrder};

/// Reference point the first record is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBound {
    /// Largest QNAME in the exclusion list.
    ExclusionMaximum,
    /// QNAME of the final record in the input.
    StreamLast,
}

impl fmt::Display for SortBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortBound::ExclusionMaximum => f.write_str("largest excluded QNAME"),
            SortBound::StreamLast => f.write_str("final QNAME of the input"),
        }
    }
}

/// One-shot check that the record stream starts where sorted input must.
///
/// A queryname-sorted stream cannot open with a QNAME larger than its own
/// final QNAME, nor larger than the largest QNAME it is merged against.
#[derive(Debug, Clone, Copy)]
pub struct SortednessValidator {
    order: IdentifierOrder,
}

impl SortednessValidator {
    /// Validator comparing with `order`.
    pub fn new(order: IdentifierOrder) -> Self {
        Self { order }
    }

    /// Check the first QNAME. Absent reference points are skipped.
    pub fn check(
        &self,
        first: &[u8],
        exclusion_max: Option<&Identifier>,
        stream_last: Option<&Identifier>,
    ) -> Result<(), FilterError> {
        let bounds = [
            (exclusion_max, SortBound::ExclusionMaximum),
            (stream_last, SortBound::StreamLast),
        ];
        for (reference, bound) in bounds {
            let Some(reference) = reference else {
                continue;
            };
            if self.order.exceeds(first, reference.as_bytes()) {
                return Err(FilterError::UnsortedInput {
                    first: Identifier::from(first),
                    reference: reference.clone(),
                    bound,
                });
            }
        }
        Ok(())
    }
}
