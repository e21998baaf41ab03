//! Reading node, edge, and mapping tables from disk.
//!
//! Inputs are tab-separated files with a header row, supplied as explicit
//! file lists, as a source directory (`*_nodes*` / `*_edges*` naming
//! convention), or packed in a gzip-compressed tar archive. Every table gets
//! a `provided_by` column derived from its file stem, overwriting whatever
//! the source carried. Malformed rows are skipped with a warning; only an
//! unreadable header is fatal.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, warn};

use crate::config::InputSource;
use crate::error::IngestError;
use crate::table::Table;

/// How the `provided_by` column is filled at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTag {
    /// Overwrite `provided_by` with the file stem: merge inputs, where the
    /// stem identifies the ingest.
    FromFileStem,
    /// Keep an existing `provided_by` column, stem-tagging only tables that
    /// lack one. Used when reloading previously merged outputs.
    PreserveExisting,
}

/// Read one TSV into a table, tagging rows with the file's stem.
pub fn read_table(path: &Path) -> Result<Table, IngestError> {
    read_table_tagged(path, SourceTag::FromFileStem)
}

/// Read one TSV with an explicit source-tagging mode.
pub fn read_table_tagged(path: &Path, tag: SourceTag) -> Result<Table, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let stem = table_stem(path);
    if path.extension().is_some_and(|ext| ext == "gz") {
        read_table_from(GzDecoder::new(file), path, &stem, tag)
    } else {
        read_table_from(file, path, &stem, tag)
    }
}

/// Parse tab-separated rows from any reader.
///
/// `#`-prefixed lines are treated as comments (SSSOM metadata headers);
/// empty cells read as null.
fn read_table_from<R: Read>(
    reader: R,
    path: &Path,
    stem: &str,
    tag: SourceTag,
) -> Result<Table, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|source| IngestError::Csv {
            path: path.display().to_string(),
            source,
        })?
        .clone();

    let mut table = Table::new(headers.iter());
    let mut skipped = 0usize;
    for record in csv_reader.records() {
        match record {
            Ok(record) => {
                table.push_row(record.iter().map(|cell| Some(cell.to_string())));
            }
            Err(err) => {
                skipped += 1;
                warn!(path = %path.display(), %err, "skipping malformed row");
            }
        }
    }
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "rows skipped during read");
    }

    if tag == SourceTag::FromFileStem || !table.has_column("provided_by") {
        table.fill_column("provided_by", stem);
    }
    debug!(path = %path.display(), rows = table.len(), "read table");
    Ok(table)
}

/// File stem with the `.tsv` / `.gz` extension chain stripped:
/// `data/hgnc_gene_nodes.tsv.gz` → `hgnc_gene_nodes`.
pub fn table_stem(path: &Path) -> String {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    for ext in [".gz", ".tsv"] {
        if let Some(stripped) = name.strip_suffix(ext) {
            name = stripped.to_string();
        }
    }
    name
}

/// Read all node and edge tables from the configured input source.
pub fn read_kg_tables(
    source: &InputSource,
    nodes_match: &str,
    edges_match: &str,
    tag: SourceTag,
) -> Result<(Vec<Table>, Vec<Table>), IngestError> {
    match source {
        InputSource::Path(path) if path.is_dir() => {
            read_dir_tables(path, nodes_match, edges_match, tag)
        }
        InputSource::Path(path) if path.is_file() => {
            read_archive_tables(path, nodes_match, edges_match, tag)
        }
        InputSource::Path(path) => Err(IngestError::BadSource {
            path: path.display().to_string(),
        }),
        InputSource::Files { nodes, edges } => {
            let node_tables = nodes
                .iter()
                .map(|p| read_table_tagged(p, tag))
                .collect::<Result<_, _>>()?;
            let edge_tables = edges
                .iter()
                .map(|p| read_table_tagged(p, tag))
                .collect::<Result<_, _>>()?;
            Ok((node_tables, edge_tables))
        }
    }
}

/// Scan a directory for node and edge files by the filename convention.
/// Files are read in sorted name order so unions are deterministic.
fn read_dir_tables(
    dir: &Path,
    nodes_match: &str,
    edges_match: &str,
    tag: SourceTag,
) -> Result<(Vec<Table>, Vec<Table>), IngestError> {
    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let mut node_files = Vec::new();
    let mut edge_files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| IngestError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if name.contains(nodes_match) {
            node_files.push(path);
        } else if name.contains(edges_match) {
            edge_files.push(path);
        }
    }
    node_files.sort();
    edge_files.sort();

    let nodes = node_files
        .iter()
        .map(|p| read_table_tagged(p, tag))
        .collect::<Result<_, _>>()?;
    let edges = edge_files
        .iter()
        .map(|p| read_table_tagged(p, tag))
        .collect::<Result<_, _>>()?;
    Ok((nodes, edges))
}

/// Read node and edge members out of a gzip-compressed tar archive.
fn read_archive_tables(
    archive_path: &Path,
    nodes_match: &str,
    edges_match: &str,
    tag: SourceTag,
) -> Result<(Vec<Table>, Vec<Table>), IngestError> {
    let file = File::open(archive_path).map_err(|source| IngestError::Io {
        path: archive_path.display().to_string(),
        source,
    })?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let entries = archive.entries().map_err(|source| IngestError::Io {
        path: archive_path.display().to_string(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| IngestError::Io {
            path: archive_path.display().to_string(),
            source,
        })?;
        let member_path: PathBuf = entry
            .path()
            .map_err(|source| IngestError::Io {
                path: archive_path.display().to_string(),
                source,
            })?
            .into_owned();
        let Some(name) = member_path.file_name().map(|n| n.to_string_lossy().into_owned())
        else {
            continue;
        };
        let stem = table_stem(&member_path);
        if name.contains(nodes_match) {
            nodes.push(read_table_from(entry, &member_path, &stem, tag)?);
        } else if name.contains(edges_match) {
            edges.push(read_table_from(entry, &member_path, &stem, tag)?);
        }
    }
    Ok((nodes, edges))
}

/// Read mapping tables from plain paths or glob patterns.
///
/// No patterns (or patterns matching nothing) yield an empty set, which
/// downstream treats as "no mapping step", not an error.
pub fn read_mapping_tables(patterns: &[String]) -> Result<Vec<Table>, IngestError> {
    let mut tables = Vec::new();
    for pattern in patterns {
        if pattern.contains(['*', '?', '[']) {
            let paths = glob::glob(pattern).map_err(|source| IngestError::BadGlob {
                pattern: pattern.clone(),
                source,
            })?;
            let mut matched: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
            matched.sort();
            for path in matched {
                tables.push(read_table(&path)?);
            }
        } else {
            tables.push(read_table(Path::new(pattern))?);
        }
    }
    Ok(tables)
}
