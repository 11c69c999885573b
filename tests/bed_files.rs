//! File-level tests: BED round trips and the commands run on real files.

use ngs_bed::bed;
use ngs_bed::commands::{
    AnnotateCommand, MergeCommand, Resize, ResizeCommand, SetOpCommand, SetOperation, SortCommand,
};
use ngs_bed::{Error, Genome, IntervalError, MergeOptions};
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

fn bed_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_first_and_last_base_survive_round_trip() {
    let input = bed_file("track name=x\nchr1\t0\t1\tfirst\nchr1\t248956421\t248956422\tlast\n");
    let (headers, set) = bed::load_with_headers(Some(input.path())).unwrap();

    assert_eq!(headers, vec!["track name=x"]);
    assert_eq!((set[0].start(), set[0].end()), (1, 1));
    assert_eq!((set[1].start(), set[1].end()), (248956422, 248956422));

    let dir = tempdir().unwrap();
    let out = dir.path().join("out.bed");
    bed::store(&out, &set, &headers).unwrap();
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "track name=x\nchr1\t0\t1\tfirst\nchr1\t248956421\t248956422\tlast\n"
    );
}

#[test]
fn test_parse_error_reports_line() {
    let input = bed_file("chr1\t0\t10\nchr1\tx\t20\n");
    match bed::load(input.path()) {
        Err(ngs_bed::BedError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {:?}", other.map(|s| s.len())),
    }
}

#[test]
fn test_sort_with_genome_order() {
    let input = bed_file("chr2\t0\t10\nchr10\t0\t10\nchr1\t5\t10\n");
    let genome = Genome::from_reader("chr1\t100\nchr2\t100\nchr10\t100\n".as_bytes()).unwrap();

    let mut out = Vec::new();
    SortCommand::new()
        .with_order(ngs_bed::chromosome::ChromosomeOrder::from_genome(&genome))
        .run(Some(input.path()), &mut out)
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "chr1\t5\t10\nchr2\t0\t10\nchr10\t0\t10\n"
    );
}

#[test]
fn test_merge_names_from_file() {
    let input = bed_file("chr1\t0\t10\tA\nchr1\t10\t20\tB\nchr1\t15\t30\tA\nchr1\t40\t50\tC\n");

    let mut out = Vec::new();
    MergeCommand::new()
        .with_names(true, true)
        .run(Some(input.path()), &mut out)
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "chr1\t0\t30\tA,B\nchr1\t40\t50\tC\n"
    );
}

#[test]
fn test_set_operations_from_files() {
    let a = bed_file("chr1\t0\t100\tgene\nchr2\t0\t10\n");
    let b = bed_file("chr1\t20\t30\nchr1\t25\t40\nchr1\t90\t200\n");

    let run = |operation| {
        let mut out = Vec::new();
        SetOpCommand::new(operation)
            .run(Some(a.path()), b.path(), &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    };

    assert_eq!(
        run(SetOperation::Intersect),
        "chr1\t20\t40\tgene\nchr1\t90\t100\tgene\n"
    );
    assert_eq!(
        run(SetOperation::Subtract),
        "chr1\t0\t20\tgene\nchr1\t40\t90\tgene\nchr2\t0\t10\n"
    );
    assert_eq!(run(SetOperation::Overlapping), "chr1\t0\t100\tgene\n");
}

#[test]
fn test_chunk_file() {
    let input = bed_file("chr1\t0\t100\n");
    let mut out = Vec::new();
    ResizeCommand::new(Resize::Chunk(30))
        .run(Some(input.path()), &mut out)
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "chr1\t0\t34\nchr1\t34\t67\nchr1\t67\t100\n"
    );
}

#[test]
fn test_unmerged_operand_rejected() {
    let set = bed::parse_intervals("chr1\t0\t10\nchr1\t5\t20\n").unwrap();
    let err = ngs_bed::MergedIntervals::try_from(set).unwrap_err();
    assert!(matches!(err, IntervalError::PreconditionViolation(_)));

    let merged = bed::parse_intervals("chr1\t0\t10\nchr1\t5\t20\n")
        .unwrap()
        .into_merged(MergeOptions::default());
    assert_eq!(merged.len(), 1);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = SortCommand::new()
        .run(Some(&dir.path().join("missing.bed")), Vec::new())
        .unwrap_err();
    assert!(matches!(err, Error::Bed(ngs_bed::BedError::Io(_))));
}

#[test]
fn test_annotate_from_file() {
    let input = bed_file("#regions\nchr1\t0\t100\told\nchr1\t200\t300\told\n");
    let genes = bed_file("1\t50\t150\tGENE2\n1\t10\t20\tGENE1\nchr1\t60\t70\tGENE1\n");

    let mut out = Vec::new();
    AnnotateCommand::new()
        .with_no_duplicates(true)
        .with_normalized_chromosomes(true)
        .run(Some(input.path()), genes.path(), &mut out)
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "#regions\nchr1\t0\t100\told\tGENE1,GENE2\nchr1\t200\t300\told\t\n"
    );

    let mut out = Vec::new();
    AnnotateCommand::new()
        .with_clear(true)
        .with_overlap(true)
        .with_normalized_chromosomes(true)
        .run(Some(input.path()), genes.path(), &mut out)
        .unwrap();
    // bases 11-20 and 51-100 of 1-100
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "#regions\nchr1\t0\t100\t0.600 (GENE1,GENE2,GENE1)\nchr1\t200\t300\t0.000\n"
    );
}
