//! Graph builder tests against real directory trees.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::*;
use crate::error::Error;
use crate::workspace::Workspace;

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn setup(files: &[(&str, &str)]) -> (TempDir, Workspace) {
    let temp = TempDir::new().unwrap();
    for (rel, content) in files {
        write(temp.path(), rel, content);
    }
    let ws = Workspace::new(temp.path()).unwrap();
    (temp, ws)
}

#[test]
fn test_app_with_one_dependency() {
    let (_temp, ws) = setup(&[
        ("app/src/ep/app.js", "var u = require('app/src/util');\nu.hello();"),
        ("app/src/util.js", "exports.hello = function () {};"),
    ]);

    let graph = build(&ws, "app/src/ep/app").unwrap();
    assert_eq!(graph.keys(), vec!["app/src/util.js", "app/src/ep/app.js"]);
    assert_eq!(graph.entry().key, "app/src/ep/app.js");

    let entry = graph.entry();
    assert_eq!(entry.deps.len(), 1);
    assert_eq!(entry.deps[0].0, "app/src/util");
    assert_eq!(graph.get(entry.deps[0].1).key, "app/src/util.js");
}

#[test]
fn test_dependencies_precede_dependents() {
    let (_temp, ws) = setup(&[
        ("main.js", "require('./a'); require('./b');"),
        ("a.js", "require('./c');"),
        ("b.js", ""),
        ("c.js", ""),
    ]);

    let graph = build(&ws, "main").unwrap();
    assert_eq!(graph.keys(), vec!["c.js", "a.js", "b.js", "main.js"]);
}

#[test]
fn test_cycle_includes_each_module_once() {
    let (_temp, ws) = setup(&[("a.js", "require('./b');"), ("b.js", "require('./a');")]);

    let graph = build(&ws, "a").unwrap();
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.keys(), vec!["b.js", "a.js"]);

    // The back edge is still recorded
    let b = graph.get(graph.entry().deps[0].1);
    assert_eq!(b.deps[0].1, graph.entry().id);
}

#[test]
fn test_self_reference() {
    let (_temp, ws) = setup(&[("solo.js", "var me = require('./solo');")]);

    let graph = build(&ws, "solo").unwrap();
    assert_eq!(graph.keys(), vec!["solo.js"]);
    assert_eq!(graph.entry().deps[0].1, graph.entry().id);
}

#[test]
fn test_diamond_is_deduplicated() {
    let (_temp, ws) = setup(&[
        ("top.js", "require('./left'); require('./right');"),
        ("left.js", "require('./bottom');"),
        ("right.js", "require('./bottom');"),
        ("bottom.js", ""),
    ]);

    let graph = build(&ws, "top").unwrap();
    assert_eq!(graph.len(), 4);
    assert_eq!(graph.keys(), vec!["bottom.js", "left.js", "right.js", "top.js"]);
}

#[test]
fn test_different_specifiers_same_file() {
    let (_temp, ws) = setup(&[
        ("lib/main.js", "require('./shared'); require('lib/shared.js');"),
        ("lib/shared.js", ""),
    ]);

    let graph = build(&ws, "lib/main").unwrap();
    assert_eq!(graph.len(), 2);

    let entry = graph.entry();
    assert_eq!(entry.deps.len(), 2);
    assert_eq!(entry.deps[0].1, entry.deps[1].1);
}

#[test]
fn test_build_is_deterministic() {
    let (_temp, ws) = setup(&[
        ("main.js", "require('./z'); require('./y'); require('./x');"),
        ("x.js", "require('./y');"),
        ("y.js", ""),
        ("z.js", "require('./x');"),
    ]);

    let first = build(&ws, "main").unwrap();
    let second = build(&ws, "main").unwrap();
    assert_eq!(first.keys(), second.keys());
    assert_eq!(first.keys(), vec!["y.js", "x.js", "z.js", "main.js"]);
}

#[test]
fn test_missing_dependency_is_resolution_error() {
    let (temp, ws) = setup(&[("main.js", "require('./ghost');")]);

    match build(&ws, "main").unwrap_err() {
        Error::Resolution {
            specifier,
            referrer,
        } => {
            assert_eq!(specifier, "./ghost");
            let expected = temp.path().join("main.js").canonicalize().unwrap();
            assert_eq!(referrer, Some(expected));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_entry_has_no_referrer() {
    let (_temp, ws) = setup(&[]);

    match build(&ws, "app/src/ep/app").unwrap_err() {
        Error::Resolution { referrer, .. } => assert!(referrer.is_none()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unreadable_module_is_read_error() {
    let (temp, ws) = setup(&[("main.js", "require('./binary');")]);
    // Invalid UTF-8 cannot be read as module source
    fs::write(temp.path().join("binary.js"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();

    assert!(matches!(build(&ws, "main"), Err(Error::Read { .. })));
}

#[test]
fn test_defect_is_recorded_not_fatal() {
    let (_temp, ws) = setup(&[("main.js", "var s = 'never closed;")]);

    let graph = build(&ws, "main").unwrap();
    assert_eq!(
        graph.entry().defect.map(|d| d.kind),
        Some(DefectKind::StringLiteral)
    );
}

#[test]
fn test_lookup_by_path() {
    let (temp, ws) = setup(&[("main.js", "require('./dep');"), ("dep.js", "")]);

    let graph = build(&ws, "main").unwrap();
    let dep_path = temp.path().join("dep.js").canonicalize().unwrap();
    assert_eq!(graph.lookup(&dep_path).map(|m| m.key.as_str()), Some("dep.js"));
    assert_eq!(graph.position("dep.js"), Some(0));
}

#[test]
fn test_cached_build_matches_uncached() {
    let (temp, ws) = setup(&[("main.js", "require('./a');"), ("a.js", "")]);
    let cache = ScanCache::new();

    let plain = build(&ws, "main").unwrap();
    let cached = build_with_cache(&ws, "main", &cache).unwrap();
    assert_eq!(plain.keys(), cached.keys());
    assert_eq!(cache.len(), 2);

    // Content changes are picked up even with a warm cache
    write(temp.path(), "a.js", "require('./b');");
    write(temp.path(), "b.js", "");
    let rebuilt = build_with_cache(&ws, "main", &cache).unwrap();
    assert_eq!(rebuilt.keys(), vec!["b.js", "a.js", "main.js"]);
}
