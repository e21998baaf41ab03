//! Tests for the report-diff surface: two generated QC reports written to
//! YAML, loaded back, and compared.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sema_tawy::config::{InputSource, MergeOptions};
use sema_tawy::diff::{diff_reports, load_report};
use sema_tawy::emit::write_yaml;
use sema_tawy::error::DiffError;
use sema_tawy::merge::merge;
use sema_tawy::report::Value;

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Run a merge over a small fixture and return the loaded qc_report.yaml.
fn generate_report(dir: &Path, run: &str, extra_node: Option<&str>) -> Value {
    let input = dir.join(format!("input-{run}"));
    std::fs::create_dir_all(&input).unwrap();
    let mut nodes = String::from("id\tcategory\nHGNC:1\tbiolink:Gene\nMONDO:1\tbiolink:Disease\n");
    if let Some(id) = extra_node {
        nodes.push_str(&format!("{id}\tbiolink:Gene\n"));
    }
    write_file(&input, "hgnc_gene_nodes.tsv", &nodes);
    write_file(
        &input,
        "omim_edges.tsv",
        "id\tsubject\tpredicate\tobject\nuuid:1\tHGNC:1\tbiolink:gene_associated_with_condition\tMONDO:1\n",
    );

    let opts = MergeOptions {
        name: format!("kg-{run}"),
        output_dir: dir.join(format!("out-{run}")),
        ..Default::default()
    };
    let source = InputSource::Path(input);
    merge(&opts, &source, &[], None).unwrap();
    load_report(&opts.output_dir.join("qc_report.yaml")).unwrap()
}

#[test]
fn identical_reports_diff_to_empty() {
    let dir = tempfile::TempDir::new().unwrap();
    let a = generate_report(dir.path(), "a", None);
    let b = generate_report(dir.path(), "b", None);

    let delta = diff_reports(&a, &b, false).unwrap();
    assert_eq!(delta, Value::Map(BTreeMap::new()));
}

#[test]
fn changed_counts_surface_as_delta_maps() {
    let dir = tempfile::TempDir::new().unwrap();
    let a = generate_report(dir.path(), "a", Some("HGNC:2"));
    let b = generate_report(dir.path(), "b", None);

    let delta = diff_reports(&a, &b, false).unwrap();
    let Value::Map(top) = &delta else {
        panic!("expected map")
    };
    let Value::Map(nodes) = &top["nodes"] else {
        panic!("expected keyed nodes section")
    };
    let Value::Map(group) = &nodes["hgnc_gene_nodes"] else {
        panic!("expected hgnc group, got {nodes:?}")
    };
    assert_eq!(
        group["total_number"],
        Value::Map(BTreeMap::from([
            ("change".to_string(), Value::Int(1)),
            ("new".to_string(), Value::Int(3)),
            ("old".to_string(), Value::Int(2)),
        ]))
    );

    // Swapping the operands mirrors the sign.
    let delta = diff_reports(&b, &a, false).unwrap();
    let Value::Map(top) = &delta else {
        panic!("expected map")
    };
    let Value::Map(nodes) = &top["nodes"] else {
        panic!("expected keyed nodes section")
    };
    let Value::Map(group) = &nodes["hgnc_gene_nodes"] else {
        panic!("expected hgnc group")
    };
    assert_eq!(
        group["total_number"],
        Value::Map(BTreeMap::from([
            ("change".to_string(), Value::Int(-1)),
            ("new".to_string(), Value::Int(2)),
            ("old".to_string(), Value::Int(3)),
        ]))
    );
}

#[test]
fn show_all_keeps_unchanged_branches() {
    let dir = tempfile::TempDir::new().unwrap();
    let a = generate_report(dir.path(), "a", None);
    let b = generate_report(dir.path(), "b", None);

    let delta = diff_reports(&a, &b, true).unwrap();
    let Value::Map(top) = &delta else {
        panic!("expected map")
    };
    // All five sections survive under show-all even with zero changes.
    assert_eq!(top.len(), 5);
}

#[test]
fn diff_round_trips_through_yaml() {
    let dir = tempfile::TempDir::new().unwrap();
    let a = generate_report(dir.path(), "a", Some("HGNC:2"));
    let b = generate_report(dir.path(), "b", None);

    let delta = diff_reports(&a, &b, false).unwrap();
    let path = dir.path().join("qc_diff.yaml");
    write_yaml(&delta, &path).unwrap();
    let reloaded = load_report(&path).unwrap();
    assert_eq!(reloaded, delta);
}

#[test]
fn incompatible_reports_are_a_hard_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let a = load_report(&write_file(
        dir.path(),
        "a.yaml",
        "nodes:\n  - name: x\n    total_number: 5\n",
    ))
    .unwrap();
    let b = load_report(&write_file(
        dir.path(),
        "b.yaml",
        "nodes:\n  - name: x\n    total_number: five\n",
    ))
    .unwrap();

    assert!(matches!(
        diff_reports(&a, &b, false),
        Err(DiffError::TypeMismatch { .. })
    ));
}

#[test]
fn reports_with_floats_fail_at_load() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_file(dir.path(), "bad.yaml", "nodes:\n  - name: x\n    score: 0.5\n");
    assert!(matches!(
        load_report(&path),
        Err(DiffError::Unsupported { .. })
    ));
}
