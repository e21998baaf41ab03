//! The merge pipeline: ingest → union → map → reconcile → emit → report.
//!
//! One call to [`merge`] performs a whole batch run. All tables live in
//! memory for the duration of the run; nothing is shared across runs.

use std::path::Path;

use tracing::info;

use crate::config::{InputSource, MergeOptions};
use crate::emit;
use crate::error::SemaResult;
use crate::ingest::{self, SourceTag};
use crate::mapping::{Crosswalk, apply_mappings};
use crate::reconcile::{MergeQc, MergedGraph, reconcile};
use crate::report::{ReportOptions, create_qc_report};
use crate::schema::SchemaIndex;
use crate::stats::graph_stats;
use crate::table::Table;

/// Counts from one merge run, for CLI display.
#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub nodes: usize,
    pub edges: usize,
    pub duplicate_nodes: usize,
    pub duplicate_edges: usize,
    pub dangling_edges: usize,
}

impl std::fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "nodes:            {}", self.nodes)?;
        writeln!(f, "edges:            {}", self.edges)?;
        writeln!(f, "duplicate nodes:  {}", self.duplicate_nodes)?;
        writeln!(f, "duplicate edges:  {}", self.duplicate_edges)?;
        write!(f, "dangling edges:   {}", self.dangling_edges)
    }
}

/// Run a full merge: read every source table, union, apply mappings,
/// reconcile, and write all outputs into the configured directory.
pub fn merge(
    opts: &MergeOptions,
    source: &InputSource,
    mapping_patterns: &[String],
    schema: Option<&SchemaIndex>,
) -> SemaResult<MergeSummary> {
    info!(name = %opts.name, "reading node and edge files");
    let (node_tables, edge_tables) = ingest::read_kg_tables(
        source,
        &opts.nodes_match,
        &opts.edges_match,
        SourceTag::FromFileStem,
    )?;
    info!(
        node_files = node_tables.len(),
        edge_files = edge_tables.len(),
        "unioning source tables"
    );
    let nodes = Table::union(node_tables)?;
    let mut edges = Table::union(edge_tables)?;

    let mapping_tables = ingest::read_mapping_tables(mapping_patterns)?;
    if !mapping_tables.is_empty() {
        info!(files = mapping_tables.len(), "applying identifier mappings");
        let mapping = Table::union(mapping_tables)?;
        let crosswalk = Crosswalk::from_table(&mapping)?;
        apply_mappings(&mut edges, &crosswalk);
    }

    info!(nodes = nodes.len(), edges = edges.len(), "reconciling");
    let (kg, qc) = reconcile(nodes, edges);

    emit::write_merged(&kg, &qc, &opts.name, &opts.output_dir)?;

    if opts.qc_report {
        info!("generating qc report");
        write_qc_report(&kg, &qc, opts, schema, &opts.output_dir)?;
    }
    if opts.stats {
        info!("generating graph statistics");
        let stats = graph_stats(&kg.nodes, &kg.edges);
        emit::write_yaml(&vec![stats], &opts.output_dir.join("qc_stats.yaml"))?;
    }

    Ok(MergeSummary {
        nodes: kg.nodes.len(),
        edges: kg.edges.len(),
        duplicate_nodes: qc.duplicate_nodes.len(),
        duplicate_edges: qc.duplicate_edges.len(),
        dangling_edges: qc.dangling_edges.len(),
    })
}

/// Build and write `qc_report.yaml` for an already-reconciled graph.
pub fn write_qc_report(
    kg: &MergedGraph,
    qc: &MergeQc,
    opts: &MergeOptions,
    schema: Option<&SchemaIndex>,
    output_dir: &Path,
) -> SemaResult<()> {
    let report_opts = ReportOptions {
        group_by: opts.group_by.clone(),
        shape: opts.shape,
    };
    let report = create_qc_report(kg, qc, &report_opts, schema);
    emit::write_yaml(&report, &output_dir.join("qc_report.yaml"))?;
    Ok(())
}

/// Reload a previously merged graph for standalone QC reporting.
///
/// Accepts the merge archive (or a directory of its contents); duplicate and
/// dangling side-tables are not part of the bundle, so their sections report
/// empty.
pub fn read_merged_kg(
    source: &InputSource,
    opts: &MergeOptions,
) -> SemaResult<(MergedGraph, MergeQc)> {
    let (node_tables, edge_tables) = ingest::read_kg_tables(
        source,
        &opts.nodes_match,
        &opts.edges_match,
        SourceTag::PreserveExisting,
    )?;
    let nodes = Table::union(node_tables)?;
    let edges = Table::union(edge_tables)?;
    Ok((
        MergedGraph { nodes, edges },
        MergeQc {
            duplicate_nodes: Table::new(["id"]),
            duplicate_edges: Table::new(["id", "subject", "object"]),
            dangling_edges: Table::new(["id", "subject", "object"]),
        },
    ))
}
