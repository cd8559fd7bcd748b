use clap::Parser;
use rowdupe::app::{run_check, run_show, RunOptions};
use rowdupe::cli::{Cli, Commands};
use rowdupe::config::Config;
use rowdupe::duplicates::{DuplicateFinder, FinderConfig, GroupOrder};
use rowdupe::error::ExitCode;
use rowdupe::fields::{FieldResolver, KeyFieldList, SelectionRequest};
use rowdupe::output::{summarize, Report, TextReport};
use rowdupe::source::{open_input, Dataset, SourceOptions};
use tempfile::tempdir;

use super::common::{write_csv, write_parquet};

const SCENARIO: &str = "id,name\n1,a\n1,a\n2,b\n";

fn run(argv: &[&str]) -> (anyhow::Result<ExitCode>, String) {
    let cli = Cli::try_parse_from(argv).unwrap();
    let options = RunOptions {
        quiet: true,
        color: false,
    };
    let mut out = Vec::new();
    let result = match cli.command {
        Commands::Check(ref args) => run_check(args, &Config::default(), options, &mut out),
        Commands::Show(ref args) => run_show(args, &Config::default(), options, &mut out),
    };
    (result, String::from_utf8(out).unwrap())
}

fn member_indices(dataset: &Dataset, keys: &KeyFieldList) -> Vec<Vec<usize>> {
    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(dataset.rows(), keys);
    groups
        .iter()
        .map(|g| g.members().iter().map(|r| r.index()).collect())
        .collect()
}

#[test]
fn test_full_key_groups_identical_rows() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "a.csv", SCENARIO);
    let dataset = open_input(&path, &SourceOptions::default()).unwrap();
    let keys = KeyFieldList::from_names(dataset.schema(), &["id", "name"]).unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (groups, stats) = finder.find_duplicates(dataset.rows(), &keys);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].count(), 2);
    let first = groups[0].first().unwrap();
    let id = first.get(dataset.schema(), "id").unwrap();
    let name = first.get(dataset.schema(), "name").unwrap();
    assert_eq!(id.as_display(), Some("1"));
    assert_eq!(name.as_display(), Some("a"));
    assert_eq!(summarize(&groups).total_duplicate_records, 1);
    assert_eq!(
        stats.duplicate_records,
        stats.total_rows - stats.distinct_keys
    );
}

#[test]
fn test_partial_key_ignores_other_columns() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "a.csv", "id,name\n1,a\n1,z\n2,b\n");
    let dataset = open_input(&path, &SourceOptions::default()).unwrap();

    let id_only = KeyFieldList::from_names(dataset.schema(), &["id"]).unwrap();
    assert_eq!(member_indices(&dataset, &id_only), vec![vec![0, 1]]);

    let both = KeyFieldList::from_names(dataset.schema(), &["id", "name"]).unwrap();
    assert!(member_indices(&dataset, &both).is_empty());
}

#[test]
fn test_resolved_keys_drive_grouping() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "a.csv", "id,name,ts\n1,a,t1\n1,a,t2\n2,a,t3\n");
    let dataset = open_input(&path, &SourceOptions::default()).unwrap();

    let resolution = FieldResolver::new(dataset.schema())
        .resolve(&SelectionRequest::new().with_indices([1]))
        .unwrap();

    let groups = member_indices(&dataset, &resolution.keys);
    assert_eq!(groups, vec![vec![0, 1, 2]]);
}

#[test]
fn test_group_order_policies() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "a.csv", "v\nz\ny\nz\ny\nx\nx\n");
    let dataset = open_input(&path, &SourceOptions::default()).unwrap();
    let keys = KeyFieldList::from_names(dataset.schema(), &["v"]).unwrap();

    let finder = DuplicateFinder::new(FinderConfig::default().with_threads(4));
    let (first_seen, _) = finder.find_duplicates(dataset.rows(), &keys);
    let firsts: Vec<usize> = first_seen.iter().map(|g| g.members()[0].index()).collect();
    assert_eq!(firsts, [0, 1, 4]);

    let finder = DuplicateFinder::new(FinderConfig::default().with_order(GroupOrder::Digest));
    let (by_digest, _) = finder.find_duplicates(dataset.rows(), &keys);
    let digests: Vec<_> = by_digest.iter().map(|g| g.digest()).collect();
    let mut sorted = digests.clone();
    sorted.sort();
    assert_eq!(digests, sorted);
}

#[test]
fn test_parquet_directory_end_to_end() {
    let dir = tempdir().unwrap();
    let first = [(1, "a", None), (2, "b", Some("n"))];
    let second = [(1, "a", None), (3, "c", None)];
    write_parquet(dir.path(), "part-0.parquet", &first);
    write_parquet(dir.path(), "part-1.parquet", &second);

    let (code, text) = run(&["rowdupe", "check", dir.path().to_str().unwrap(), "-d"]);

    assert_eq!(code.unwrap(), ExitCode::Success);
    assert!(text.contains("Group 1: 2 rows, digest "));
    assert!(text.contains("  0    1   a     NULL"));
    assert!(text.contains("  2    1   a     NULL"));
    assert!(text.contains("Found 1 duplicate group(s), 1 duplicate record(s) across 4 row(s)"));
}

#[test]
fn test_partial_input_exit_code() {
    let dir = tempdir().unwrap();
    write_parquet(dir.path(), "a.parquet", &[(1, "a", None), (1, "a", None)]);
    std::fs::write(dir.path().join("b.parquet"), b"truncated").unwrap();

    let path = dir.path().to_str().unwrap();
    let (code, _) = run(&["rowdupe", "check", path]);
    assert_eq!(code.unwrap(), ExitCode::PartialSuccess);

    let (code, _) = run(&["rowdupe", "check", path, "-f", "name,id", "-i", "0"]);
    assert_eq!(code.unwrap(), ExitCode::PartialSuccess);
}

#[test]
fn test_fatal_conditions() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "a.csv", SCENARIO);

    let (result, out) = run(&["rowdupe", "check", path.to_str().unwrap(), "-f", "bogus"]);
    assert!(result.is_err());
    assert!(out.is_empty());

    let other = dir.path().join("notes.txt");
    std::fs::write(&other, "hello").unwrap();
    let (result, _) = run(&["rowdupe", "check", other.to_str().unwrap()]);
    assert!(format!("{:#}", result.unwrap_err()).contains("Unsupported input"));

    let missing = dir.path().join("nope");
    let (result, _) = run(&["rowdupe", "show", missing.to_str().unwrap()]);
    assert!(format!("{:#}", result.unwrap_err()).contains("Path not found"));
}

#[test]
fn test_limit_and_truncation_in_report() {
    let long = "q".repeat(40);
    let content = format!("k,v\na,{long}\na,{long}\nb,1\nb,1\nc,2\nc,2\n");
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "a.csv", &content);
    let dataset = open_input(&path, &SourceOptions::default()).unwrap();
    let keys = KeyFieldList::from_names(dataset.schema(), &["k", "v"]).unwrap();
    let finder = DuplicateFinder::with_defaults();
    let (groups, stats) = finder.find_duplicates(dataset.rows(), &keys);

    let report = Report::new(dataset.schema(), &keys, groups, stats, 2);
    let mut out = Vec::new();
    TextReport::new(&report).write_to(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains(&format!("a  {}  2", "q".repeat(36))));
    assert!(!text.contains(&"q".repeat(37)));
    assert!(text.contains("... 1 more group(s) not shown"));
    assert!(text.contains("Found 3 duplicate group(s), 3 duplicate record(s) across 6 row(s)"));
}

#[test]
fn test_show_listing() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "a.csv", SCENARIO);

    let (code, text) = run(&["rowdupe", "show", path.to_str().unwrap()]);

    assert_eq!(code.unwrap(), ExitCode::Success);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "id  name");
    assert_eq!(lines[1], "1   a");
    assert_eq!(*lines.last().unwrap(), "Showing 3 of 3 row(s)");
}
