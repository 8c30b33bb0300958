use std::cmp::Ordering;
use std::fmt;

/// Read name (QNAME) stored as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(Box<[u8]>);

impl Identifier {
    /// Wrap raw QNAME bytes.
    pub fn new(bytes: impl Into<Box<[u8]>>) -> Self {
        Self(bytes.into())
    }

    /// Underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Identifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Identifier {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }
}

impl From<Vec<u8>> for Identifier {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into_boxed_slice())
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self(name.as_bytes().into())
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self(name.into_bytes().into_boxed_slice())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Total order used to sort the exclusion list and to compare records against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IdentifierOrder {
    /// ASCII case-folded comparison; ties fall back to raw bytes.
    #[default]
    CaseInsensitive,
    /// Plain byte-wise comparison.
    Bytewise,
}

impl IdentifierOrder {
    /// Compare two QNAMEs.
    ///
    /// Both variants only report `Equal` for identical byte strings, so
    /// equality under the order and membership in the set always agree.
    pub fn compare(self, a: &[u8], b: &[u8]) -> Ordering {
        match self {
            IdentifierOrder::Bytewise => a.cmp(b),
            IdentifierOrder::CaseInsensitive => a
                .iter()
                .map(u8::to_ascii_lowercase)
                .cmp(b.iter().map(u8::to_ascii_lowercase))
                .then_with(|| a.cmp(b)),
        }
    }

    /// `true` when `a` sorts strictly after `b`.
    pub fn exceeds(self, a: &[u8], b: &[u8]) -> bool {
        self.compare(a, b) == Ordering::Greater
    }
}
