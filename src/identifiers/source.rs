use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use super::Identifier;

/// Encoding of a QNAME list, resolved from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionSourceKind {
    /// One QNAME per line.
    PlainText,
    /// Gzip (or bgzip) compressed plain text, `.txt.gz`.
    GzipText,
}

impl ExclusionSourceKind {
    /// Detect the kind from the extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".txt.gz") {
            Some(ExclusionSourceKind::GzipText)
        } else if name.ends_with(".txt") {
            Some(ExclusionSourceKind::PlainText)
        } else {
            None
        }
    }

    /// Read every non-blank line as a QNAME, stripping trailing whitespace.
    pub fn read_identifiers<R: Read>(self, reader: R) -> io::Result<Vec<Identifier>> {
        match self {
            ExclusionSourceKind::PlainText => read_lines(BufReader::new(reader)),
            ExclusionSourceKind::GzipText => {
                read_lines(BufReader::new(MultiGzDecoder::new(reader)))
            }
        }
    }
}

fn read_lines<B: BufRead>(reader: B) -> io::Result<Vec<Identifier>> {
    let mut identifiers = Vec::new();
    for line in reader.split(b'\n') {
        let mut line = line?;
        while line.last().is_some_and(u8::is_ascii_whitespace) {
            line.pop();
        }
        if !line.is_empty() {
            identifiers.push(Identifier::from(line));
        }
    }
    Ok(identifiers)
}
