//! QC report aggregation.
//!
//! Groups the merged graph and its QC side-tables by a configurable key
//! (default `provided_by`) and builds the nested count structure written out
//! as `qc_report.yaml`: five top-level sections (`nodes`, `duplicate_nodes`,
//! `edges`, `dangling_edges`, `duplicate_edges`) with per-predicate and
//! per-node-type sub-reports inside each edge section.

pub mod container;
pub mod value;

use std::collections::{BTreeMap, BTreeSet, HashSet};

pub use container::{OutputShape, SectionBuilder};
pub use value::Value;

use crate::reconcile::{MergeQc, MergedGraph};
use crate::schema::SchemaIndex;
use crate::table::Table;

/// Sentinel for null `category` cells, so grouping never drops rows.
pub const MISSING_CATEGORY: &str = "missing category";
/// Sentinel for null `in_taxon` cells.
pub const MISSING_TAXON: &str = "missing taxon";

/// Report configuration.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Column to group every section by.
    pub group_by: String,
    /// Container shape for sections and sub-reports.
    pub shape: OutputShape,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            group_by: "provided_by".to_string(),
            shape: OutputShape::List,
        }
    }
}

/// The namespace prefix of an identifier: everything before the first `:`,
/// or the whole id when it has no prefix.
pub fn namespace(id: &str) -> &str {
    id.split(':').next().unwrap_or(id)
}

/// Build the full QC report for one merge run.
///
/// The reference node-id set for every "missing" count is the clean node
/// table's `id` column.
pub fn create_qc_report(
    kg: &MergedGraph,
    qc: &MergeQc,
    opts: &ReportOptions,
    schema: Option<&SchemaIndex>,
) -> Value {
    let nodes = prepare_node_table(&kg.nodes);
    let duplicate_nodes = prepare_node_table(&qc.duplicate_nodes);
    let edges = prepare_edge_table(&kg.edges);
    let dangling_edges = prepare_edge_table(&qc.dangling_edges);
    let duplicate_edges = prepare_edge_table(&qc.duplicate_edges);

    let node_ids: HashSet<&str> = nodes.column_values("id").flatten().collect();

    let mut report = BTreeMap::new();
    report.insert(
        "nodes".to_string(),
        node_section(&nodes, opts, schema),
    );
    report.insert(
        "duplicate_nodes".to_string(),
        node_section(&duplicate_nodes, opts, schema),
    );
    report.insert(
        "edges".to_string(),
        edge_section(&edges, &node_ids, &nodes, opts, schema),
    );
    report.insert(
        "dangling_edges".to_string(),
        edge_section(&dangling_edges, &node_ids, &nodes, opts, schema),
    );
    report.insert(
        "duplicate_edges".to_string(),
        edge_section(&duplicate_edges, &node_ids, &nodes, opts, schema),
    );
    Value::Map(report)
}

/// Sentinel-fill a node table copy before aggregation.
fn prepare_node_table(table: &Table) -> Table {
    let mut table = table.clone();
    table.ensure_column("category");
    table.fill_null("category", MISSING_CATEGORY);
    // Only filled when the column exists; the taxon listing is skipped
    // entirely for tables without one.
    table.fill_null("in_taxon", MISSING_TAXON);
    table
}

fn prepare_edge_table(table: &Table) -> Table {
    let mut table = table.clone();
    table.ensure_column("category");
    table.fill_null("category", MISSING_CATEGORY);
    table
}

/// Group row indices by a column's value, sorted by group name. Null group
/// values land under `missing <column>`.
fn group_rows(table: &Table, column: &str) -> BTreeMap<String, Vec<usize>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for row in 0..table.len() {
        let key = table
            .value(row, column)
            .map(str::to_string)
            .unwrap_or_else(|| format!("missing {column}"));
        groups.entry(key).or_default().push(row);
    }
    groups
}

/// Collect a column's values over a row subset, splitting multivalued cells
/// when a schema says the field is pipe-delimited.
fn cell_values(
    table: &Table,
    rows: &[usize],
    column: &str,
    schema: Option<&SchemaIndex>,
) -> Vec<String> {
    let split = schema.is_some_and(|s| s.is_multivalued(column));
    let mut values = Vec::new();
    for &row in rows {
        let Some(cell) = table.value(row, column) else {
            continue;
        };
        if split {
            values.extend(crate::schema::split_multivalued(cell));
        } else {
            values.push(cell.to_string());
        }
    }
    values
}

/// Distinct non-null values of a column over a row subset.
fn distinct_values<'t>(table: &'t Table, rows: &[usize], column: &str) -> BTreeSet<&'t str> {
    rows.iter()
        .filter_map(|&row| table.value(row, column))
        .collect()
}

// ---------------------------------------------------------------------------
// Node sections
// ---------------------------------------------------------------------------

fn node_section(table: &Table, opts: &ReportOptions, schema: Option<&SchemaIndex>) -> Value {
    let mut section = SectionBuilder::new(opts.shape, "name");
    for (name, rows) in group_rows(table, &opts.group_by) {
        section.push(node_group_entry(table, &name, &rows, schema));
    }
    section.finish()
}

fn node_group_entry(
    table: &Table,
    name: &str,
    rows: &[usize],
    schema: Option<&SchemaIndex>,
) -> BTreeMap<String, Value> {
    let mut entry = BTreeMap::new();
    entry.insert("name".to_string(), Value::from(name));
    entry.insert(
        "namespaces".to_string(),
        Value::sorted_list(
            rows.iter()
                .filter_map(|&row| table.value(row, "id"))
                .map(|id| namespace(id).to_string()),
        ),
    );
    entry.insert(
        "categories".to_string(),
        Value::sorted_list(cell_values(table, rows, "category", schema)),
    );
    entry.insert("total_number".to_string(), Value::from(rows.len()));
    if table.has_column("in_taxon") {
        entry.insert(
            "taxon".to_string(),
            Value::sorted_list(cell_values(table, rows, "in_taxon", schema)),
        );
    }
    entry
}

// ---------------------------------------------------------------------------
// Edge sections
// ---------------------------------------------------------------------------

fn edge_section(
    edges: &Table,
    node_ids: &HashSet<&str>,
    nodes: &Table,
    opts: &ReportOptions,
    schema: Option<&SchemaIndex>,
) -> Value {
    let mut section = SectionBuilder::new(opts.shape, "name");
    for (name, rows) in group_rows(edges, &opts.group_by) {
        section.push(edge_group_entry(edges, &name, &rows, node_ids, nodes, opts, schema));
    }
    section.finish()
}

fn edge_group_entry(
    edges: &Table,
    name: &str,
    rows: &[usize],
    node_ids: &HashSet<&str>,
    nodes: &Table,
    opts: &ReportOptions,
    schema: Option<&SchemaIndex>,
) -> BTreeMap<String, Value> {
    let subjects = distinct_values(edges, rows, "subject");
    let objects = distinct_values(edges, rows, "object");
    // The melted endpoint column: distinct values over subject and object.
    let endpoints: BTreeSet<&str> = subjects.union(&objects).copied().collect();
    let missing = endpoints
        .iter()
        .filter(|&id| !node_ids.contains(id))
        .count();

    let mut entry = BTreeMap::new();
    entry.insert("name".to_string(), Value::from(name));
    entry.insert(
        "namespaces".to_string(),
        Value::sorted_list(endpoints.iter().map(|id| namespace(id).to_string())),
    );
    entry.insert(
        "categories".to_string(),
        Value::sorted_list(cell_values(edges, rows, "category", schema)),
    );
    entry.insert("total_number".to_string(), Value::from(rows.len()));
    entry.insert("missing".to_string(), Value::from(missing));
    entry.insert(
        "predicates".to_string(),
        predicate_report(edges, rows, node_ids, opts),
    );
    entry.insert(
        "node_types".to_string(),
        node_type_report(&subjects, &objects, node_ids, nodes, opts, schema),
    );
    entry
}

/// Per-predicate breakdown within one edge group. Rows with a null predicate
/// stay in the group totals but are not listed here.
fn predicate_report(
    edges: &Table,
    rows: &[usize],
    node_ids: &HashSet<&str>,
    opts: &ReportOptions,
) -> Value {
    let mut by_predicate: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for &row in rows {
        if let Some(predicate) = edges.value(row, "predicate") {
            by_predicate.entry(predicate).or_default().push(row);
        }
    }

    let mut section = SectionBuilder::new(opts.shape, "uri");
    for (predicate, predicate_rows) in by_predicate {
        let missing_subjects: Vec<&str> = distinct_values(edges, &predicate_rows, "subject")
            .into_iter()
            .filter(|id| !node_ids.contains(id))
            .collect();
        let missing_objects: Vec<&str> = distinct_values(edges, &predicate_rows, "object")
            .into_iter()
            .filter(|id| !node_ids.contains(id))
            .collect();

        let mut entry = BTreeMap::new();
        entry.insert("uri".to_string(), Value::from(predicate));
        entry.insert(
            "total_number".to_string(),
            Value::from(predicate_rows.len()),
        );
        entry.insert(
            "missing_subjects".to_string(),
            Value::from(missing_subjects.len()),
        );
        entry.insert(
            "missing_objects".to_string(),
            Value::from(missing_objects.len()),
        );
        entry.insert(
            "missing_subject_namespaces".to_string(),
            Value::sorted_list(missing_subjects.iter().map(|id| namespace(id).to_string())),
        );
        entry.insert(
            "missing_object_namespaces".to_string(),
            Value::sorted_list(missing_objects.iter().map(|id| namespace(id).to_string())),
        );
        section.push(entry);
    }
    section.finish()
}

/// Breakdown of the nodes this edge group touches, grouped by the node
/// table's group key.
///
/// Membership and the listed stats cover the nodes whose id appears among the
/// group's endpoints; `missing` sums the group's node ids absent from the
/// subject role and those absent from the object role.
fn node_type_report(
    subjects: &BTreeSet<&str>,
    objects: &BTreeSet<&str>,
    node_ids: &HashSet<&str>,
    nodes: &Table,
    opts: &ReportOptions,
    schema: Option<&SchemaIndex>,
) -> Value {
    let linked: HashSet<&str> = subjects
        .union(objects)
        .filter(|&&id| node_ids.contains(id))
        .copied()
        .collect();

    let linked_rows: Vec<usize> = (0..nodes.len())
        .filter(|&row| nodes.value(row, "id").is_some_and(|id| linked.contains(id)))
        .collect();

    let mut by_group: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for row in linked_rows {
        let key = nodes
            .value(row, &opts.group_by)
            .map(str::to_string)
            .unwrap_or_else(|| format!("missing {}", opts.group_by));
        by_group.entry(key).or_default().push(row);
    }

    let mut section = SectionBuilder::new(opts.shape, "name");
    for (name, rows) in by_group {
        let ids = distinct_values(nodes, &rows, "id");
        // Node ids the edge group never uses as a subject, plus those it
        // never uses as an object.
        let missing = ids.iter().filter(|&id| !subjects.contains(id)).count()
            + ids.iter().filter(|&id| !objects.contains(id)).count();

        let mut entry = BTreeMap::new();
        entry.insert("name".to_string(), Value::from(name));
        entry.insert(
            "categories".to_string(),
            Value::sorted_list(cell_values(nodes, &rows, "category", schema)),
        );
        entry.insert(
            "namespaces".to_string(),
            Value::sorted_list(ids.iter().map(|id| namespace(id).to_string())),
        );
        entry.insert("total_number".to_string(), Value::from(rows.len()));
        entry.insert("missing".to_string(), Value::from(missing));
        section.push(entry);
    }
    section.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes_fixture() -> Table {
        let mut t = Table::new(["id", "category", "in_taxon", "provided_by"]);
        for (id, category, taxon, source) in [
            ("HGNC:1", "biolink:Gene", "NCBITaxon:9606", "hgnc_gene_nodes"),
            ("HGNC:2", "biolink:Gene", "NCBITaxon:9606", "hgnc_gene_nodes"),
            ("MONDO:1", "biolink:Disease", "", "phenio_nodes"),
            ("HP:1", "", "", "phenio_nodes"),
        ] {
            t.push_row([
                Some(id.to_string()),
                Some(category.to_string()),
                Some(taxon.to_string()),
                Some(source.to_string()),
            ]);
        }
        t
    }

    fn edges_fixture() -> Table {
        let mut t = Table::new(["id", "subject", "object", "predicate", "category", "provided_by"]);
        for (id, subject, object, predicate, source) in [
            ("uuid:1", "HGNC:1", "MONDO:1", "biolink:gene_associated_with_condition", "omim_edges"),
            ("uuid:2", "HGNC:2", "MONDO:1", "biolink:gene_associated_with_condition", "omim_edges"),
            ("uuid:3", "HGNC:1", "HP:9", "biolink:has_phenotype", "hpoa_edges"),
        ] {
            t.push_row([
                Some(id.to_string()),
                Some(subject.to_string()),
                Some(object.to_string()),
                Some(predicate.to_string()),
                None,
                Some(source.to_string()),
            ]);
        }
        t
    }

    fn fixture() -> (MergedGraph, MergeQc) {
        crate::reconcile::reconcile(nodes_fixture(), edges_fixture())
    }

    fn report(shape: OutputShape) -> Value {
        let (kg, qc) = fixture();
        let opts = ReportOptions {
            shape,
            ..ReportOptions::default()
        };
        create_qc_report(&kg, &qc, &opts, None)
    }

    fn section<'v>(report: &'v Value, name: &str) -> &'v Value {
        let Value::Map(map) = report else {
            panic!("report is not a map")
        };
        &map[name]
    }

    fn list_entry<'v>(section: &'v Value, name: &str) -> &'v BTreeMap<String, Value> {
        let Value::List(entries) = section else {
            panic!("section is not a list")
        };
        entries
            .iter()
            .find_map(|e| match e {
                Value::Map(m) if m["name"] == Value::from(name) => Some(m),
                _ => None,
            })
            .expect("group not found")
    }

    #[test]
    fn namespace_is_prefix_before_first_colon() {
        assert_eq!(namespace("TEST:TEST-GENE-010000-1"), "TEST");
        assert_eq!(namespace("bare"), "bare");
    }

    #[test]
    fn report_has_five_sections() {
        let report = report(OutputShape::List);
        let Value::Map(map) = &report else {
            panic!("expected map")
        };
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "dangling_edges",
                "duplicate_edges",
                "duplicate_nodes",
                "edges",
                "nodes"
            ]
        );
    }

    #[test]
    fn node_groups_report_namespaces_categories_and_taxon() {
        let report = report(OutputShape::List);
        let nodes = section(&report, "nodes");

        let hgnc = list_entry(nodes, "hgnc_gene_nodes");
        assert_eq!(hgnc["namespaces"], Value::sorted_list(["HGNC"]));
        assert_eq!(hgnc["categories"], Value::sorted_list(["biolink:Gene"]));
        assert_eq!(hgnc["total_number"], Value::from(2usize));
        assert_eq!(hgnc["taxon"], Value::sorted_list(["NCBITaxon:9606"]));

        // Null category and taxon cells group under the sentinels.
        let phenio = list_entry(nodes, "phenio_nodes");
        assert_eq!(
            phenio["categories"],
            Value::sorted_list(["biolink:Disease", MISSING_CATEGORY])
        );
        assert_eq!(phenio["taxon"], Value::sorted_list([MISSING_TAXON]));
    }

    #[test]
    fn edge_groups_report_missing_against_clean_nodes() {
        let report = report(OutputShape::List);
        let edges = section(&report, "edges");

        let omim = list_entry(edges, "omim_edges");
        assert_eq!(omim["total_number"], Value::from(2usize));
        assert_eq!(omim["missing"], Value::from(0usize));
        assert_eq!(
            omim["namespaces"],
            Value::sorted_list(["HGNC", "MONDO"])
        );
        assert_eq!(omim["categories"], Value::sorted_list([MISSING_CATEGORY]));
    }

    #[test]
    fn dangling_section_counts_unresolved_endpoints() {
        let report = report(OutputShape::List);
        let dangling = section(&report, "dangling_edges");

        // uuid:3 references HP:9, which no node table provides.
        let hpoa = list_entry(dangling, "hpoa_edges");
        assert_eq!(hpoa["total_number"], Value::from(1usize));
        assert_eq!(hpoa["missing"], Value::from(1usize));
    }

    #[test]
    fn predicate_subreport_counts_missing_by_role() {
        let report = report(OutputShape::List);
        let dangling = section(&report, "dangling_edges");
        let hpoa = list_entry(dangling, "hpoa_edges");

        let Value::List(predicates) = &hpoa["predicates"] else {
            panic!("expected predicate list")
        };
        assert_eq!(predicates.len(), 1);
        let Value::Map(has_phenotype) = &predicates[0] else {
            panic!("expected predicate map")
        };
        assert_eq!(
            has_phenotype["uri"],
            Value::from("biolink:has_phenotype")
        );
        assert_eq!(has_phenotype["missing_subjects"], Value::from(0usize));
        assert_eq!(has_phenotype["missing_objects"], Value::from(1usize));
        assert_eq!(
            has_phenotype["missing_object_namespaces"],
            Value::sorted_list(["HP"])
        );
        assert_eq!(
            has_phenotype["missing_subject_namespaces"],
            Value::sorted_list(Vec::<String>::new())
        );
    }

    #[test]
    fn node_type_subreport_groups_linked_nodes() {
        let report = report(OutputShape::List);
        let edges = section(&report, "edges");
        let omim = list_entry(edges, "omim_edges");

        let Value::List(node_types) = &omim["node_types"] else {
            panic!("expected node_types list")
        };
        let names: Vec<_> = node_types
            .iter()
            .map(|e| match e {
                Value::Map(m) => m["name"].clone(),
                _ => panic!("expected map"),
            })
            .collect();
        assert_eq!(
            names,
            [Value::from("hgnc_gene_nodes"), Value::from("phenio_nodes")]
        );

        // HGNC:1 and HGNC:2 appear only as subjects (absent from the object
        // role); MONDO:1 only as an object.
        let Value::Map(hgnc) = &node_types[0] else {
            panic!("expected map")
        };
        assert_eq!(hgnc["total_number"], Value::from(2usize));
        assert_eq!(hgnc["missing"], Value::from(2usize));
        let Value::Map(phenio) = &node_types[1] else {
            panic!("expected map")
        };
        assert_eq!(phenio["missing"], Value::from(1usize));
    }

    #[test]
    fn map_shape_carries_identical_data() {
        let list_report = report(OutputShape::List);
        let map_report = report(OutputShape::Map);

        let nodes_list = section(&list_report, "nodes");
        let nodes_map = section(&map_report, "nodes");
        let Value::Map(by_name) = nodes_map else {
            panic!("expected map section")
        };
        let entry = list_entry(nodes_list, "hgnc_gene_nodes");
        // Sub-reports also honor the shape, so compare the scalar fields.
        let Value::Map(map_entry) = &by_name["hgnc_gene_nodes"] else {
            panic!("expected map entry")
        };
        assert_eq!(map_entry["total_number"], entry["total_number"]);
        assert_eq!(map_entry["namespaces"], entry["namespaces"]);
        assert_eq!(map_entry["categories"], entry["categories"]);
    }

    #[test]
    fn grouping_is_deterministic() {
        let a = report(OutputShape::List);
        let b = report(OutputShape::List);
        assert_eq!(a, b);
    }

    #[test]
    fn custom_group_key() {
        let (kg, qc) = fixture();
        let opts = ReportOptions {
            group_by: "category".to_string(),
            ..ReportOptions::default()
        };
        let report = create_qc_report(&kg, &qc, &opts, None);
        let nodes = section(&report, "nodes");
        let Value::List(groups) = nodes else {
            panic!("expected list")
        };
        // Grouped by category: Gene, Disease, and the sentinel.
        assert_eq!(groups.len(), 3);
    }
}
