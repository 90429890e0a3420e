//! `iamgraph load` against workbook files on disk

use iamgraph_cli::{command, load_config, run, EXIT_OK, EXIT_SKIPPED};
use iamgraph_sink::GraphSnapshot;
use iamgraph_test_utils::{row, sample_workbook, BROKEN_DOCUMENT};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;

fn write_workbook(dir: &Path, workbook: &iamgraph_loader::Workbook) -> String {
    let path = dir.join("workbook.json");
    std::fs::write(&path, serde_json::to_string(workbook).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

fn invoke(args: &[&str]) -> (anyhow::Result<u8>, String) {
    let matches = command().try_get_matches_from(args).unwrap();
    let config = load_config(&matches).unwrap();
    let mut out = Vec::new();
    let status = run(&matches, config, &mut out);
    (status, String::from_utf8(out).unwrap())
}

#[test]
fn load_prints_summary_and_writes_exports() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_workbook(dir.path(), &sample_workbook());
    let json_path = dir.path().join("graph.json");
    let cypher_path = dir.path().join("graph.cypher");

    let (status, out) = invoke(&[
        "iamgraph",
        "load",
        "--input",
        &input,
        "--export-json",
        json_path.to_str().unwrap(),
        "--export-cypher",
        cypher_path.to_str().unwrap(),
    ]);

    assert_eq!(status.unwrap(), EXIT_OK);
    assert!(out.contains("principals"));
    assert!(out.contains("graph: 10 nodes, 10 relationships"));

    let snapshot: GraphSnapshot = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(snapshot.nodes.len(), 10);
    assert_eq!(snapshot.relationships.len(), 10);

    let cypher = std::fs::read_to_string(&cypher_path).unwrap();
    assert_eq!(cypher.lines().filter(|l| l.starts_with("CREATE (n:")).count(), 10);
    assert_eq!(cypher.lines().filter(|l| l.contains(")-[:")).count(), 10);
}

#[test]
fn report_json_is_machine_readable() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_workbook(dir.path(), &sample_workbook());

    let (status, out) = invoke(&["iamgraph", "load", "--input", &input, "--report-json"]);
    assert_eq!(status.unwrap(), EXIT_OK);

    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["phases"].as_array().unwrap().len(), 4);
    assert_eq!(report["phases"][3]["unmatched"].as_array().unwrap().len(), 2);
}

#[test]
fn strict_exits_nonzero_on_skips() {
    let dir = tempfile::tempdir().unwrap();
    let workbook = iamgraph_loader::Workbook::new().with_sheet(
        "policies",
        vec![row(json!({"PolicyName": "Broken", "PolicyObject": BROKEN_DOCUMENT}))],
    );
    let input = write_workbook(dir.path(), &workbook);

    let (lenient, out) = invoke(&["iamgraph", "load", "--input", &input]);
    assert_eq!(lenient.unwrap(), EXIT_OK);
    assert!(out.contains("skipped policy 'Broken'"));

    let (strict, _) = invoke(&["iamgraph", "load", "--input", &input, "--strict"]);
    assert_eq!(strict.unwrap(), EXIT_SKIPPED);
}

#[test]
fn config_file_renames_sheets() {
    let dir = tempfile::tempdir().unwrap();
    let workbook = iamgraph_loader::Workbook::new().with_sheet(
        "Policies",
        vec![row(json!({"PolicyName": "P1", "PolicyObject": "{'Resource': 'r', 'Action': 'a'}"}))],
    );
    let input = write_workbook(dir.path(), &workbook);
    let config = dir.path().join("loader.toml");
    std::fs::write(&config, "[sheets]\npolicies = \"Policies\"\n").unwrap();

    let (status, out) = invoke(&["iamgraph", "load", "--input", &input, "--config", config.to_str().unwrap()]);
    assert_eq!(status.unwrap(), EXIT_OK);
    assert!(out.contains("graph: 3 nodes, 2 relationships"));
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");

    let (status, _) = invoke(&["iamgraph", "load", "--input", missing.to_str().unwrap()]);
    let err = status.unwrap_err();
    assert!(format!("{err:#}").contains("loading workbook"));
}

#[test]
fn bad_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("loader.toml");
    std::fs::write(&config, "sheets = 3\n").unwrap();

    let matches = command()
        .try_get_matches_from(["iamgraph", "load", "--input", "x.json", "--config", config.to_str().unwrap()])
        .unwrap();
    let err = load_config(&matches).unwrap_err();
    assert!(format!("{err:#}").contains("configuration error"));
}
