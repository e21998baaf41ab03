//! sema-tawy CLI: knowledge-graph merge engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use sema_tawy::config::{InputSource, MergeOptions};
use sema_tawy::diff::{diff_reports, load_report};
use sema_tawy::emit::write_yaml;
use sema_tawy::ingest::read_table;
use sema_tawy::merge::{merge, read_merged_kg, write_qc_report};
use sema_tawy::schema::SchemaIndex;
use sema_tawy::stats::graph_stats;
use sema_tawy::table::Table;

#[derive(Parser)]
#[command(name = "sema", version, about = "Knowledge-graph merge engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge node and edge files into one deduplicated graph.
    Merge {
        /// Name of the merged graph; prefixes every output file.
        #[arg(long, short = 'n')]
        name: Option<String>,

        /// Directory of *_nodes/*_edges TSVs, or a tar.gz archive of them.
        #[arg(long, short = 's')]
        source: Option<PathBuf>,

        /// Explicit node files (requires --edges; conflicts with --source).
        #[arg(long)]
        nodes: Vec<PathBuf>,

        /// Explicit edge files (requires --nodes; conflicts with --source).
        #[arg(long)]
        edges: Vec<PathBuf>,

        /// SSSOM mapping files or glob patterns.
        #[arg(long, short = 'm')]
        mapping: Vec<String>,

        /// Output directory.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Skip the QC report.
        #[arg(long)]
        no_qc_report: bool,

        /// Also write graph-topology statistics.
        #[arg(long)]
        stats: bool,

        /// Column to group report sections by.
        #[arg(long)]
        group_by: Option<String>,

        /// Report container shape: list or map.
        #[arg(long)]
        shape: Option<String>,

        /// LinkML-style schema for multivalued-field splitting.
        #[arg(long)]
        schema: Option<PathBuf>,

        /// TOML config file; CLI flags override its values.
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Build a QC report from a previously merged graph.
    Report {
        /// Merge archive or directory containing the merged tables.
        #[arg(long, short = 's')]
        source: Option<PathBuf>,

        /// Explicit node files.
        #[arg(long)]
        nodes: Vec<PathBuf>,

        /// Explicit edge files.
        #[arg(long)]
        edges: Vec<PathBuf>,

        /// Directory to write qc_report.yaml into.
        #[arg(long, short = 'o', default_value = ".")]
        output: PathBuf,

        /// Column to group report sections by.
        #[arg(long)]
        group_by: Option<String>,

        /// Report container shape: list or map.
        #[arg(long)]
        shape: Option<String>,

        /// LinkML-style schema for multivalued-field splitting.
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Diff two QC reports.
    Diff {
        /// The newer report.
        report_a: PathBuf,

        /// The older report.
        report_b: PathBuf,

        /// Where to write the diff YAML; stdout when omitted.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Also emit unchanged values.
        #[arg(long)]
        show_all: bool,
    },

    /// Graph-topology statistics for node and edge files.
    Stats {
        /// Node files.
        #[arg(long)]
        nodes: Vec<PathBuf>,

        /// Edge files.
        #[arg(long)]
        edges: Vec<PathBuf>,

        /// Output YAML path.
        #[arg(long, short = 'o', default_value = "qc_stats_report.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Merge {
            name,
            source,
            nodes,
            edges,
            mapping,
            output,
            no_qc_report,
            stats,
            group_by,
            shape,
            schema,
            config,
        } => {
            let mut opts = match config {
                Some(path) => MergeOptions::from_toml_file(&path)?,
                None => MergeOptions::default(),
            };
            if let Some(name) = name {
                opts.name = name;
            }
            if let Some(output) = output {
                opts.output_dir = output;
            }
            if let Some(group_by) = group_by {
                opts.group_by = group_by;
            }
            if let Some(shape) = shape {
                opts.shape = shape.parse()?;
            }
            if no_qc_report {
                opts.qc_report = false;
            }
            if stats {
                opts.stats = true;
            }

            let source = InputSource::from_args(source, nodes, edges)?;
            let schema = schema
                .map(|path| SchemaIndex::from_yaml_file(&path))
                .transpose()?;

            let summary = merge(&opts, &source, &mapping, schema.as_ref())?;
            println!("Merged {} into {}", opts.name, opts.output_dir.display());
            println!("{summary}");
        }

        Commands::Report {
            source,
            nodes,
            edges,
            output,
            group_by,
            shape,
            schema,
        } => {
            let mut opts = MergeOptions::default();
            if let Some(group_by) = group_by {
                opts.group_by = group_by;
            }
            if let Some(shape) = shape {
                opts.shape = shape.parse()?;
            }
            let source = InputSource::from_args(source, nodes, edges)?;
            let schema = schema
                .map(|path| SchemaIndex::from_yaml_file(&path))
                .transpose()?;

            let (kg, qc) = read_merged_kg(&source, &opts)?;
            std::fs::create_dir_all(&output).into_diagnostic()?;
            write_qc_report(&kg, &qc, &opts, schema.as_ref(), &output)?;
            println!("Wrote {}", output.join("qc_report.yaml").display());
        }

        Commands::Diff {
            report_a,
            report_b,
            output,
            show_all,
        } => {
            let a = load_report(&report_a)?;
            let b = load_report(&report_b)?;
            let delta = diff_reports(&a, &b, show_all)?;
            match output {
                Some(path) => {
                    write_yaml(&delta, &path)?;
                    println!("Wrote {}", path.display());
                }
                None => {
                    let text = serde_yaml::to_string(&delta)
                        .map_err(|e| miette::miette!("failed to render diff: {e}"))?;
                    print!("{text}");
                }
            }
        }

        Commands::Stats {
            nodes,
            edges,
            output,
        } => {
            let node_tables = nodes
                .iter()
                .map(|p| read_table(p))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let edge_tables = edges
                .iter()
                .map(|p| read_table(p))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let nodes = Table::union(node_tables)?;
            let edges = Table::union(edge_tables)?;

            let stats = graph_stats(&nodes, &edges);
            write_yaml(&vec![stats], &output)?;
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}
