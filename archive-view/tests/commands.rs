use std::path::{Path, PathBuf};

use archive_view::cli::Cli;
use clap::Parser;

const SCHEMA: &str = r#"{
    "root": "Archive",
    "sections": [
        {"name": "Archive", "sub_sections": [
            {"name": "run", "section": "Run", "repeats": true},
            {"name": "results", "section": "Results"}
        ]},
        {"name": "Run", "quantities": [
            {"name": "program", "type": "str", "description": "Code that produced the run"}
        ], "sub_sections": [
            {"name": "calc", "section": "Calc", "repeats": true}
        ]},
        {"name": "Calc", "quantities": [
            {"name": "energy", "type": "float64", "unit": "joule"},
            {"name": "temperature", "type": "float64", "unit": "kelvin"}
        ]},
        {"name": "Results", "quantities": [
            {"name": "energy", "type": "float64", "unit": "joule"}
        ]}
    ]
}"#;

const ARCHIVE: &str = r#"{
    "run": [{
        "program": "exciting",
        "calc": [{"energy": 3.204353268e-19, "temperature": 273.15}]
    }],
    "results": {"energy": 1.602176634e-19}
}"#;

fn setup(dir: &Path) -> (PathBuf, PathBuf) {
    let schema = dir.join("schema.json");
    let archive = dir.join("archive.json");
    std::fs::write(&schema, SCHEMA).unwrap();
    std::fs::write(&archive, ARCHIVE).unwrap();
    (schema, archive)
}

async fn run(dir: &Path, args: &[&str]) -> anyhow::Result<String> {
    colored::control::set_override(false);
    let (schema, archive) = setup(dir);
    let config = dir.join("absent.toml");
    let mut argv = vec![
        "archive-view".to_string(),
        "--schema".to_string(),
        schema.display().to_string(),
        "--archive".to_string(),
        archive.display().to_string(),
        "--config".to_string(),
        config.display().to_string(),
    ];
    argv.extend(args.iter().map(|a| a.to_string()));
    let mut out = Vec::new();
    archive_view::run(Cli::parse_from(argv), &mut out).await?;
    Ok(String::from_utf8(out)?)
}

#[tokio::test]
async fn test_show_with_unit_system() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["show", "run:0/calc:0", "--units", "display"])
        .await
        .unwrap();
    assert!(out.contains("+ energy: 2 electron_volt"), "{out}");
    assert!(out.contains("+ temperature: 0 celsius"), "{out}");
}

#[tokio::test]
async fn test_show_json() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["show", "run:0", "--json", "--meta"]).await.unwrap();
    let node: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(node["path"], "run:0");
    assert_eq!(node["meta"]["definition"], "Run");
    assert_eq!(node["children"][0]["key"], "program");
}

#[tokio::test]
async fn test_show_rejects_unknown_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = run(dir.path(), &["show", "run:0/nothing"]).await.unwrap_err();
    assert!(err.to_string().contains("no property `nothing`"));
}

#[tokio::test]
async fn test_lanes() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["lanes", "run:0/calc:0"]).await.unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("Archive"));
    assert!(lines[0].contains("-> run:0"));
    assert!(lines[2].contains("calc:0 Calc"));
}

#[tokio::test]
async fn test_search() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["search", "energy"]).await.unwrap();
    assert_eq!(
        out,
        "energy (calc)  run:0/calc:0/energy\nenergy (results)  results/energy\n"
    );
}

#[tokio::test]
async fn test_config_schema() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["config-schema"]).await.unwrap();
    let schema: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert!(schema["properties"]["pagination"].is_object());
}
