// Tests for mapping resolution and configuration

use std::fs;

use watchfs::config::WatchConfig;
use watchfs::sync::{parse_mapping, resolve_mappings};
use watchfs::WatchFsError;

use crate::common::Workspace;

#[test]
fn test_distinct_roots_parse() {
    let ws = Workspace::new();
    let parsed = parse_mapping(&format!("{}:{}", ws.src.display(), ws.dst.display())).unwrap();

    assert_eq!(parsed.source, ws.src);
    assert_eq!(parsed.destination, ws.dst);
    assert!(!parsed.bidirectional);
}

#[test]
fn test_bidirectional_yields_both_directions() {
    let ws = Workspace::new();
    let raw = format!("{}<->{}", ws.src.display(), ws.dst.display());
    let mappings = resolve_mappings(&[raw]).unwrap();

    assert_eq!(mappings.len(), 2);
    assert_eq!(mappings[0].source(), ws.src.as_path());
    assert_eq!(mappings[0].destination(), ws.dst.as_path());
    assert_eq!(mappings[1].source(), ws.dst.as_path());
    assert_eq!(mappings[1].destination(), ws.src.as_path());
}

#[test]
fn test_relative_paths_are_resolved() {
    let ws = Workspace::new();
    fs::create_dir(ws.src.join("nested")).unwrap();
    let raw = format!("{}/nested/..:{}", ws.src.display(), ws.dst.display());

    let parsed = parse_mapping(&raw).unwrap();

    assert!(parsed.source.is_absolute());
    assert_eq!(parsed.source, ws.src);
}

#[test]
fn test_nested_destination_rejected() {
    let ws = Workspace::new();
    let raw = format!("{}->{}", ws.src.display(), ws.src.join("mirror").display());

    match parse_mapping(&raw) {
        Err(WatchFsError::Parse { message }) => assert!(message.contains("parent directory")),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_config_fails_before_watching() {
    let ws = Workspace::new();
    let config = WatchConfig {
        mappings: vec![
            format!("{}:{}", ws.src.display(), ws.dst.display()),
            "no-separator-here".to_string(),
        ],
        ..WatchConfig::default()
    };

    let err = config.resolve_mappings().unwrap_err();
    assert_eq!(err.exit_code(), 1);
}
