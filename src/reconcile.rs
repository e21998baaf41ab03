//! Reconciliation: deduplicate nodes and edges, partition out dangling edges.
//!
//! Works on the unioned (and optionally mapped) tables. Detection passes run
//! against the full pre-clean tables so the QC side-channels see everything;
//! cleaning then produces the merged graph proper.
//!
//! Node and edge cleaning deliberately differ: nodes drop only byte-identical
//! duplicate rows (conflicting rows sharing an id all survive), while edges
//! with a duplicated id are removed entirely, every copy.

use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::table::Table;

/// The merged knowledge graph: deduplicated nodes and edges whose endpoints
/// all resolve.
#[derive(Debug, Clone)]
pub struct MergedGraph {
    pub nodes: Table,
    pub edges: Table,
}

/// QC side-tables captured before cleaning.
#[derive(Debug, Clone)]
pub struct MergeQc {
    /// Every node row whose id occurs more than once.
    pub duplicate_nodes: Table,
    /// Every edge row whose id occurs more than once.
    pub duplicate_edges: Table,
    /// Edges referencing a node id absent from the pre-dedup node set.
    pub dangling_edges: Table,
}

/// Reconcile unioned node and edge tables into a clean graph plus QC
/// side-channels.
///
/// Empty inputs produce empty outputs; nothing here errors.
pub fn reconcile(nodes: Table, edges: Table) -> (MergedGraph, MergeQc) {
    let duplicate_nodes = nodes.subset(&duplicate_id_rows(&nodes));
    let duplicate_edges = edges.subset(&duplicate_id_rows(&edges));

    // Dangling detection runs against the full node set, before any dedup, so
    // an edge can land in both the duplicate and dangling side-tables.
    let all_node_ids: HashSet<&str> = nodes.column_values("id").flatten().collect();
    let dangling_rows: Vec<usize> = (0..edges.len())
        .filter(|&row| is_dangling(&edges, row, &all_node_ids))
        .collect();
    let dangling_edges = edges.subset(&dangling_rows);

    let clean_nodes = drop_identical_rows(&nodes);
    let clean_edges = clean_edge_table(&edges, &clean_nodes);

    info!(
        nodes = clean_nodes.len(),
        edges = clean_edges.len(),
        duplicate_nodes = duplicate_nodes.len(),
        duplicate_edges = duplicate_edges.len(),
        dangling_edges = dangling_edges.len(),
        "reconciled graph"
    );

    (
        MergedGraph {
            nodes: clean_nodes,
            edges: clean_edges,
        },
        MergeQc {
            duplicate_nodes,
            duplicate_edges,
            dangling_edges,
        },
    )
}

/// Rows whose `id` value occurs more than once, every occurrence included.
fn duplicate_id_rows(table: &Table) -> Vec<usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in table.column_values("id").flatten() {
        *counts.entry(id).or_default() += 1;
    }
    (0..table.len())
        .filter(|&row| {
            table
                .value(row, "id")
                .is_some_and(|id| counts[id] > 1)
        })
        .collect()
}

fn is_dangling(edges: &Table, row: usize, node_ids: &HashSet<&str>) -> bool {
    let subject_known = edges
        .value(row, "subject")
        .is_some_and(|s| node_ids.contains(s));
    let object_known = edges
        .value(row, "object")
        .is_some_and(|o| node_ids.contains(o));
    !subject_known || !object_known
}

/// Drop byte-identical duplicate rows, keeping the first occurrence.
///
/// Rows that share an id but differ in any cell all survive; attribute
/// merging is out of scope.
fn drop_identical_rows(table: &Table) -> Table {
    let mut seen: HashSet<&[Option<String>]> = HashSet::new();
    let mut keep = Vec::new();
    for row in 0..table.len() {
        if seen.insert(table.row(row)) {
            keep.push(row);
        }
    }
    table.subset(&keep)
}

/// Remove every copy of duplicated edge ids, then keep only edges whose
/// endpoints both exist in the cleaned node set.
fn clean_edge_table(edges: &Table, clean_nodes: &Table) -> Table {
    let mut id_counts: HashMap<&str, usize> = HashMap::new();
    for id in edges.column_values("id").flatten() {
        *id_counts.entry(id).or_default() += 1;
    }
    let clean_node_ids: HashSet<&str> = clean_nodes.column_values("id").flatten().collect();

    let keep: Vec<usize> = (0..edges.len())
        .filter(|&row| {
            let unique_id = edges
                .value(row, "id")
                .is_some_and(|id| id_counts[id] == 1);
            unique_id && !is_dangling(edges, row, &clean_node_ids)
        })
        .collect();
    edges.subset(&keep)
}
