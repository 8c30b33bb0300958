#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use qname_exclude::{
    filter_records, BoundaryPolicy, ExclusionMerge, FilterError, IdentifierOrder, IdentifierSet,
    MemoryStream, NamedRecord, VecSink,
};
use rust_htslib::bam::{self, Read};

pub const SAM_HEADER: &str = "@HD\tVN:1.6\tSO:queryname\n@SQ\tSN:chr1\tLN:1000\n";

/// In-memory records whose payload is their position in the input.
pub fn named_records(names: &[&str]) -> Vec<NamedRecord> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| NamedRecord::new(*name, (i as u32).to_le_bytes().to_vec()))
        .collect()
}

/// Run an in-memory pass and return the surviving names.
pub fn exclude(
    names: &[&str],
    excluded: &[&str],
    policy: BoundaryPolicy,
) -> Result<Vec<String>, FilterError> {
    let stream = MemoryStream::new(named_records(names));
    let set = IdentifierSet::from_identifiers(excluded.iter().copied(), IdentifierOrder::default());
    let merge = ExclusionMerge::start(stream, set, policy)?;
    let (_, records) = filter_records(merge, VecSink::new())?;
    Ok(records.into_iter().map(|r| r.name.to_string()).collect())
}

/// Write a minimal single-contig SAM file, one record per name.
pub fn write_sam(dir: &Path, file: &str, names: &[&str]) -> PathBuf {
    let path = dir.join(file);
    let mut contents = String::from(SAM_HEADER);
    for (i, name) in names.iter().enumerate() {
        contents.push_str(&format!(
            "{name}\t0\tchr1\t{pos}\t60\t4M\t*\t0\t0\tACGT\tIIII\n",
            pos = i + 1
        ));
    }
    fs::write(&path, contents).expect("write SAM fixture");
    path
}

/// Write a QNAME list; gzip-compressed when the name ends in `.gz`.
pub fn write_qnames(dir: &Path, file: &str, names: &[&str]) -> PathBuf {
    let path = dir.join(file);
    let mut contents = names.join("\n");
    contents.push('\n');
    if file.ends_with(".gz") {
        let mut encoder = GzEncoder::new(File::create(&path).expect("create list"), Compression::default());
        encoder.write_all(contents.as_bytes()).expect("compress list");
        encoder.finish().expect("finish gzip stream");
    } else {
        fs::write(&path, contents).expect("write list");
    }
    path
}

/// QNAMEs of every record in a SAM/BAM file, in file order.
pub fn read_names(path: &Path) -> Vec<String> {
    let mut reader = bam::Reader::from_path(path).expect("open alignments");
    reader
        .records()
        .map(|record| {
            let record = record.expect("decode record");
            String::from_utf8_lossy(record.qname()).into_owned()
        })
        .collect()
}
