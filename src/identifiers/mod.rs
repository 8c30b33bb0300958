//! Exclusion identifiers.
//!
//! QNAMEs are kept as raw bytes and compared with an [`IdentifierOrder`]
//! shared by the exclusion list and the record stream. The list itself is
//! materialised once as an [`IdentifierSet`] and consumed through a
//! forward-only cursor.

mod order;
mod set;
mod source;

pub use order::{Identifier, IdentifierOrder};
pub use set::IdentifierSet;
pub use source::ExclusionSourceKind;
