#[path = "common/mod.rs"]
mod common;

use common::{read_names, write_qnames, write_sam};
use qname_exclude::{
    count_records, last_identifier, BoundaryPolicy, FilterConfig, FilterError, HtsRecordStream,
    Identifier, Pull, QnameFilter, RecordStream, TerminationReason,
};
use std::process::Command;
use tempfile::tempdir;

const INPUT: &[&str] = &["r01", "r02", "r02", "r03", "r04", "r04", "r05"];

#[test]
fn sam_to_sam_with_plain_list() {
    let dir = tempdir().unwrap();
    let input = write_sam(dir.path(), "in.sam", INPUT);
    let qnames = write_qnames(dir.path(), "drop.txt", &["r04", "r02", "r02"]);
    let output = dir.path().join("out.sam");

    let config = FilterConfig::new(&input, &qnames).with_output(Some(output.clone()));
    let summary = QnameFilter::new(config).run().expect("filter succeeds");

    assert_eq!(read_names(&output), ["r01", "r03", "r05"]);
    assert_eq!(summary.records_written, 3);
    assert_eq!(summary.stats.excluded, 4);
    assert_eq!(summary.raw_identifiers, 3);
    assert_eq!(summary.unique_identifiers, 2);
    assert_eq!(summary.stats.termination, Some(TerminationReason::Drained));
    assert_eq!(count_records(&output, 0).unwrap(), 3);
}

#[test]
fn sam_to_bam_with_gzip_list() {
    let dir = tempdir().unwrap();
    let input = write_sam(dir.path(), "in.sam", INPUT);
    let qnames = write_qnames(dir.path(), "drop.txt.gz", &["r01", "r05"]);
    let output = dir.path().join("out.bam");

    let config = FilterConfig::new(&input, &qnames)
        .with_output(Some(output.clone()))
        .with_threads(2);
    QnameFilter::new(config).run().expect("filter succeeds");

    assert_eq!(read_names(&output), ["r02", "r02", "r03", "r04", "r04"]);
}

#[test]
fn legacy_policy_stops_at_list_maximum() {
    let dir = tempdir().unwrap();
    let input = write_sam(dir.path(), "in.sam", &["r01", "r02", "r02", "r03"]);
    let qnames = write_qnames(dir.path(), "drop.txt", &["r02"]);
    let output = dir.path().join("out.sam");

    let config = FilterConfig::new(&input, &qnames)
        .with_output(Some(output.clone()))
        .with_policy(BoundaryPolicy::Legacy);
    let summary = QnameFilter::new(config).run().expect("filter succeeds");

    assert_eq!(read_names(&output), ["r01"]);
    assert_eq!(
        summary.stats.termination,
        Some(TerminationReason::ExclusionMaximum)
    );
}

#[test]
fn unsorted_input_leaves_no_output() {
    let dir = tempdir().unwrap();
    let input = write_sam(dir.path(), "in.sam", &["r09", "r01"]);
    let qnames = write_qnames(dir.path(), "drop.txt", &["r02"]);
    let output = dir.path().join("out.bam");

    let config = FilterConfig::new(&input, &qnames).with_output(Some(output.clone()));
    let err = QnameFilter::new(config).run().unwrap_err();

    assert!(matches!(err, FilterError::UnsortedInput { .. }), "{err}");
    assert!(!output.exists());
}

#[test]
fn unknown_list_extension_is_rejected() {
    let dir = tempdir().unwrap();
    let input = write_sam(dir.path(), "in.sam", INPUT);
    let qnames = write_qnames(dir.path(), "drop.csv", &["r01"]);

    let config = FilterConfig::new(&input, &qnames).with_output(Some(dir.path().join("out.sam")));
    let err = QnameFilter::new(config).run().unwrap_err();
    assert!(matches!(err, FilterError::UnsupportedFormat { .. }), "{err}");
}

#[test]
fn hts_stream_pulls_in_file_order() {
    let dir = tempdir().unwrap();
    let input = write_sam(dir.path(), "in.sam", &["a1", "a2", "b1"]);

    let mut stream = HtsRecordStream::open(&input, 0).unwrap();
    assert_eq!(stream.last_identifier().unwrap(), Some(Identifier::from("b1")));

    let mut names = Vec::new();
    while let Pull::Record(record) = stream.pull().unwrap() {
        names.push(String::from_utf8_lossy(record.qname()).into_owned());
    }
    assert_eq!(names, ["a1", "a2", "b1"]);
}

#[test]
fn header_only_file_has_no_last_identifier() {
    let dir = tempdir().unwrap();
    let input = write_sam(dir.path(), "empty.sam", &[]);

    assert_eq!(last_identifier(&input, 0).unwrap(), None);
    assert_eq!(count_records(&input, 0).unwrap(), 0);
}

#[test]
fn binary_echoes_survivors_to_stdout_without_output_path() {
    let dir = tempdir().unwrap();
    let input = write_sam(dir.path(), "in.sam", INPUT);
    let qnames = write_qnames(dir.path(), "drop.txt", &["r02", "r04"]);

    let run = Command::new(env!("CARGO_BIN_EXE_qname-exclude"))
        .arg("-i")
        .arg(&input)
        .arg("-q")
        .arg(&qnames)
        .env("RUST_LOG", "warn")
        .output()
        .expect("binary runs");
    assert!(run.status.success(), "exit status {:?}", run.status);

    let stdout = String::from_utf8(run.stdout).expect("SAM on stdout is UTF-8");
    let stderr = String::from_utf8_lossy(&run.stderr);

    let body: Vec<&str> = stdout.lines().filter(|line| !line.starts_with('@')).collect();
    let names: Vec<&str> = body
        .iter()
        .map(|line| line.split('\t').next().unwrap_or_default())
        .collect();
    assert_eq!(names, ["r01", "r03", "r05"]);
    assert!(body.iter().all(|line| line.split('\t').count() >= 11));
    assert!(stdout.lines().any(|line| line.starts_with("@SQ\tSN:chr1")));

    assert!(!stdout.contains("Started:"));
    assert!(!stdout.contains("Completed:"));
    assert!(stderr.contains("Started: Processing **in.sam**"));
    assert!(stderr.contains("Completed: Processing **in.sam**"));
    assert!(stderr.contains("Number of records written: 3"));
}

#[test]
fn binary_reports_record_count_of_output_file() {
    let dir = tempdir().unwrap();
    let input = write_sam(dir.path(), "in.sam", INPUT);
    let qnames = write_qnames(dir.path(), "drop.txt.gz", &["r05"]);
    let output = dir.path().join("out.bam");

    let run = Command::new(env!("CARGO_BIN_EXE_qname-exclude"))
        .arg("-i")
        .arg(&input)
        .arg("-q")
        .arg(&qnames)
        .arg("-o")
        .arg(&output)
        .env("RUST_LOG", "warn")
        .output()
        .expect("binary runs");
    assert!(run.status.success(), "exit status {:?}", run.status);

    let stderr = String::from_utf8_lossy(&run.stderr);
    assert!(run.stdout.is_empty());
    assert!(stderr.contains("Generated **out.bam**"));
    assert!(stderr.contains("Number of records in outfile: 6"));
    assert_eq!(read_names(&output).len(), 6);
}

#[test]
fn binary_fails_on_unsupported_list() {
    let dir = tempdir().unwrap();
    let input = write_sam(dir.path(), "in.sam", INPUT);
    let qnames = write_qnames(dir.path(), "drop.csv.gz", &["r01"]);

    let run = Command::new(env!("CARGO_BIN_EXE_qname-exclude"))
        .arg("-i")
        .arg(&input)
        .arg("-q")
        .arg(&qnames)
        .output()
        .expect("binary runs");
    assert!(!run.status.success());
    assert!(String::from_utf8_lossy(&run.stderr).contains("unknown format for QNAME list"));
}
