//! Graph-topology statistics over the merged tables.
//!
//! Builds an undirected petgraph from the node and edge tables and summarizes
//! its shape: counts, connected components, singletons, degree extremes.
//! Edge endpoints absent from the node table are added as vertices, so the
//! numbers reflect exactly the files given.

use std::collections::HashMap;

use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;
use tracing::warn;

use crate::table::Table;

/// Topology summary of one merged graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    #[serde(rename = "Nodes")]
    pub nodes: usize,
    #[serde(rename = "Edges")]
    pub edges: usize,
    #[serde(rename = "ConnectedComponents")]
    pub connected_components: usize,
    #[serde(rename = "Singletons")]
    pub singletons: usize,
    #[serde(rename = "MaxNodeDegree")]
    pub max_node_degree: usize,
    /// Mean degree, formatted to two decimals for the report.
    #[serde(rename = "MeanNodeDegree")]
    pub mean_node_degree: String,
}

/// Compute topology statistics from node and edge tables.
pub fn graph_stats(nodes: &Table, edges: &Table) -> GraphStats {
    let mut graph: UnGraph<(), ()> = UnGraph::new_undirected();
    let mut index: HashMap<String, NodeIndex> = HashMap::new();

    let mut vertex = |graph: &mut UnGraph<(), ()>, id: &str| {
        *index
            .entry(id.to_string())
            .or_insert_with(|| graph.add_node(()))
    };

    for id in nodes.column_values("id").flatten() {
        vertex(&mut graph, id);
    }
    let mut skipped = 0usize;
    for row in 0..edges.len() {
        let (Some(subject), Some(object)) =
            (edges.value(row, "subject"), edges.value(row, "object"))
        else {
            skipped += 1;
            continue;
        };
        let (subject, object) = (subject.to_string(), object.to_string());
        let s = vertex(&mut graph, &subject);
        let o = vertex(&mut graph, &object);
        graph.add_edge(s, o, ());
    }
    if skipped > 0 {
        warn!(skipped, "edges without both endpoints left out of graph stats");
    }

    let node_count = graph.node_count();
    let edge_count = graph.edge_count();
    let degrees: Vec<usize> = graph
        .node_indices()
        .map(|idx| graph.edges(idx).count())
        .collect();
    let singletons = degrees.iter().filter(|&&d| d == 0).count();
    let max_node_degree = degrees.iter().copied().max().unwrap_or(0);
    let mean = if node_count == 0 {
        0.0
    } else {
        2.0 * edge_count as f64 / node_count as f64
    };

    GraphStats {
        nodes: node_count,
        edges: edge_count,
        connected_components: connected_components(&graph),
        singletons,
        max_node_degree,
        mean_node_degree: format!("{mean:.2}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_table(ids: &[&str]) -> Table {
        let mut t = Table::new(["id"]);
        for id in ids {
            t.push_row([Some(id.to_string())]);
        }
        t
    }

    fn edge_table(rows: &[(&str, &str)]) -> Table {
        let mut t = Table::new(["id", "subject", "object"]);
        for (i, (subject, object)) in rows.iter().enumerate() {
            t.push_row([
                Some(format!("uuid:{i}")),
                Some(subject.to_string()),
                Some(object.to_string()),
            ]);
        }
        t
    }

    #[test]
    fn counts_components_and_singletons() {
        let nodes = node_table(&["a", "b", "c", "d", "lone"]);
        let edges = edge_table(&[("a", "b"), ("c", "d")]);
        let stats = graph_stats(&nodes, &edges);

        assert_eq!(stats.nodes, 5);
        assert_eq!(stats.edges, 2);
        assert_eq!(stats.connected_components, 3);
        assert_eq!(stats.singletons, 1);
        assert_eq!(stats.max_node_degree, 1);
        assert_eq!(stats.mean_node_degree, "0.80");
    }

    #[test]
    fn unknown_endpoints_become_vertices() {
        let nodes = node_table(&["a"]);
        let edges = edge_table(&[("a", "ghost")]);
        let stats = graph_stats(&nodes, &edges);
        assert_eq!(stats.nodes, 2);
        assert_eq!(stats.edges, 1);
        assert_eq!(stats.connected_components, 1);
    }

    #[test]
    fn empty_graph_is_all_zeroes() {
        let stats = graph_stats(
            &node_table(&[]),
            &edge_table(&[]),
        );
        assert_eq!(stats.nodes, 0);
        assert_eq!(stats.connected_components, 0);
        assert_eq!(stats.mean_node_degree, "0.00");
    }

    #[test]
    fn duplicate_node_ids_collapse_to_one_vertex() {
        let nodes = node_table(&["a", "a", "b"]);
        let edges = edge_table(&[("a", "b")]);
        let stats = graph_stats(&nodes, &edges);
        assert_eq!(stats.nodes, 2);
    }
}
