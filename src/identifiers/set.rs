use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use super::{ExclusionSourceKind, Identifier, IdentifierOrder};
use crate::{FileRole, FilterError};

/// Deduplicated, ascending exclusion list with a forward-only cursor.
///
/// The backing array never changes after construction. Advancing the cursor
/// retires the current minimum for good; nothing is re-inserted and the
/// cursor never moves backwards.
#[derive(Debug, Clone)]
pub struct IdentifierSet {
    ids: Vec<Identifier>,
    cursor: usize,
    order: IdentifierOrder,
    raw_count: usize,
}

impl IdentifierSet {
    /// Build a set from arbitrary identifiers.
    pub fn from_identifiers<I, T>(identifiers: I, order: IdentifierOrder) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Identifier>,
    {
        let mut ids: Vec<Identifier> = identifiers.into_iter().map(Into::into).collect();
        let raw_count = ids.len();
        ids.sort_unstable_by(|a, b| order.compare(a.as_bytes(), b.as_bytes()));
        ids.dedup();
        debug!(raw = raw_count, unique = ids.len(), "built identifier set");

        Self {
            ids,
            cursor: 0,
            order,
            raw_count,
        }
    }

    /// Read a QNAME list from any reader.
    pub fn from_reader<R: Read>(
        kind: ExclusionSourceKind,
        reader: R,
        order: IdentifierOrder,
    ) -> std::io::Result<Self> {
        Ok(Self::from_identifiers(kind.read_identifiers(reader)?, order))
    }

    /// Load a `.txt` or `.txt.gz` QNAME list.
    pub fn from_path(path: impl AsRef<Path>, order: IdentifierOrder) -> Result<Self, FilterError> {
        let path = path.as_ref();
        let kind =
            ExclusionSourceKind::from_path(path).ok_or_else(|| FilterError::UnsupportedFormat {
                role: FileRole::ExclusionList,
                path: path.to_path_buf(),
            })?;
        let file = File::open(path).map_err(|err| FilterError::io(path, err))?;
        Self::from_reader(kind, file, order).map_err(|err| FilterError::io(path, err))
    }

    /// Ordering the set was sorted with.
    pub fn order(&self) -> IdentifierOrder {
        self.order
    }

    /// Number of unique identifiers, including retired ones.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` when the list contained no identifiers at all.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers supplied before deduplication.
    pub fn raw_count(&self) -> usize {
        self.raw_count
    }

    /// Identifiers not yet retired by the cursor.
    pub fn remaining(&self) -> usize {
        self.ids.len() - self.cursor
    }

    /// Returns `true` once every identifier has been retired.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.ids.len()
    }

    /// Largest identifier; fixed for the lifetime of the set.
    pub fn max(&self) -> Option<&Identifier> {
        self.ids.last()
    }

    /// Smallest identifier still in play (the cursor target).
    pub fn min(&self) -> Option<&Identifier> {
        self.ids.get(self.cursor)
    }

    /// Retire the current minimum and return the new one.
    pub fn advance(&mut self) -> Option<&Identifier> {
        if self.cursor < self.ids.len() {
            self.cursor += 1;
        }
        self.min()
    }

    /// Identifiers still in play, ascending.
    pub fn pending(&self) -> &[Identifier] {
        &self.ids[self.cursor..]
    }
}
