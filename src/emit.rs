//! Writing merge outputs: TSV tables, gzip side-files, tar bundles, YAML.
//!
//! One merge run lays its output directory out as:
//!
//! ```text
//! <out>/<name>_nodes.tsv
//! <out>/<name>_edges.tsv
//! <out>/<name>.tar.gz                     (bundles the two tables above)
//! <out>/qc/<name>-duplicate-nodes.tsv.gz
//! <out>/qc/<name>-duplicate-edges.tsv.gz
//! <out>/qc/<name>-dangling-edges.tsv.gz
//! <out>/qc_report.yaml
//! <out>/qc_stats.yaml                     (only with --stats)
//! ```
//!
//! Reruns into the same directory overwrite; nothing errors on "already
//! exists".

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::info;

use crate::error::EmitError;
use crate::reconcile::{MergeQc, MergedGraph};
use crate::table::Table;

/// Paths produced by one merge run.
#[derive(Debug, Clone)]
pub struct MergeOutputs {
    pub nodes: PathBuf,
    pub edges: PathBuf,
    pub archive: PathBuf,
    pub duplicate_nodes: PathBuf,
    pub duplicate_edges: PathBuf,
    pub dangling_edges: PathBuf,
}

/// Write the merged graph, QC side-files, and tar bundle.
pub fn write_merged(
    kg: &MergedGraph,
    qc: &MergeQc,
    name: &str,
    output_dir: &Path,
) -> Result<MergeOutputs, EmitError> {
    let qc_dir = output_dir.join("qc");
    std::fs::create_dir_all(&qc_dir).map_err(|source| EmitError::Io {
        path: qc_dir.display().to_string(),
        source,
    })?;

    let outputs = MergeOutputs {
        nodes: output_dir.join(format!("{name}_nodes.tsv")),
        edges: output_dir.join(format!("{name}_edges.tsv")),
        archive: output_dir.join(format!("{name}.tar.gz")),
        duplicate_nodes: qc_dir.join(format!("{name}-duplicate-nodes.tsv.gz")),
        duplicate_edges: qc_dir.join(format!("{name}-duplicate-edges.tsv.gz")),
        dangling_edges: qc_dir.join(format!("{name}-dangling-edges.tsv.gz")),
    };

    write_table_tsv(&kg.nodes, &outputs.nodes)?;
    write_table_tsv(&kg.edges, &outputs.edges)?;
    write_table_tsv_gz(&qc.duplicate_nodes, &outputs.duplicate_nodes)?;
    write_table_tsv_gz(&qc.duplicate_edges, &outputs.duplicate_edges)?;
    write_table_tsv_gz(&qc.dangling_edges, &outputs.dangling_edges)?;
    write_tar_gz(
        &outputs.archive,
        &[outputs.nodes.clone(), outputs.edges.clone()],
    )?;

    info!(output_dir = %output_dir.display(), "wrote merged graph");
    Ok(outputs)
}

/// Write one table as TSV with a header row; null cells become empty fields.
pub fn write_table_tsv(table: &Table, path: &Path) -> Result<(), EmitError> {
    let file = File::create(path).map_err(|source| EmitError::Io {
        path: path.display().to_string(),
        source,
    })?;
    write_table_to(table, file, path)
}

/// Write one table as gzip-compressed TSV.
pub fn write_table_tsv_gz(table: &Table, path: &Path) -> Result<(), EmitError> {
    let to_io_err = |source| EmitError::Io {
        path: path.display().to_string(),
        source,
    };
    let file = File::create(path).map_err(to_io_err)?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    write_table_to(table, &mut encoder, path)?;
    encoder.try_finish().map_err(to_io_err)
}

fn write_table_to<W: Write>(table: &Table, writer: W, path: &Path) -> Result<(), EmitError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    let to_emit_err = |source| EmitError::Csv {
        path: path.display().to_string(),
        source,
    };

    csv_writer.write_record(table.columns()).map_err(to_emit_err)?;
    for row in 0..table.len() {
        let record: Vec<&str> = table
            .columns()
            .iter()
            .map(|col| table.value(row, col).unwrap_or(""))
            .collect();
        csv_writer.write_record(&record).map_err(to_emit_err)?;
    }
    csv_writer.flush().map_err(|source| EmitError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Bundle files into a gzip-compressed tar, member names flattened to the
/// file names.
pub fn write_tar_gz(tar_path: &Path, files: &[PathBuf]) -> Result<(), EmitError> {
    let to_io_err = |source| EmitError::Io {
        path: tar_path.display().to_string(),
        source,
    };

    let file = File::create(tar_path).map_err(to_io_err)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for path in files {
        let mut f = File::open(path).map_err(|source| EmitError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        builder.append_file(name, &mut f).map_err(to_io_err)?;
    }
    let encoder = builder.into_inner().map_err(to_io_err)?;
    encoder.finish().map_err(to_io_err)?;
    Ok(())
}

/// Serialize a value to a YAML file.
pub fn write_yaml<T: Serialize>(value: &T, path: &Path) -> Result<(), EmitError> {
    let text = serde_yaml::to_string(value).map_err(|source| EmitError::Yaml {
        path: path.display().to_string(),
        source,
    })?;
    std::fs::write(path, text).map_err(|source| EmitError::Io {
        path: path.display().to_string(),
        source,
    })
}
