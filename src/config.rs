//! Merge-run configuration and input-source validation.
//!
//! Options come from defaults, then an optional TOML file, then CLI flags;
//! later layers win. Input-source validation happens before any file is
//! touched: the directory/archive style and the explicit file-list style are
//! mutually exclusive, and one of them is required.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::report::OutputShape;

/// Options for one merge run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeOptions {
    /// Name of the merged graph; prefixes every output file.
    pub name: String,
    /// Directory the outputs land in.
    pub output_dir: PathBuf,
    /// Column every report section groups by.
    pub group_by: String,
    /// Report container shape.
    pub shape: OutputShape,
    /// Whether to write qc_report.yaml.
    pub qc_report: bool,
    /// Whether to write qc_stats.yaml (graph topology statistics).
    pub stats: bool,
    /// Substring identifying node files in a directory or archive.
    pub nodes_match: String,
    /// Substring identifying edge files in a directory or archive.
    pub edges_match: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            name: "merged-kg".to_string(),
            output_dir: PathBuf::from("merged-output"),
            group_by: "provided_by".to_string(),
            shape: OutputShape::List,
            qc_report: true,
            stats: false,
            nodes_match: "_nodes".to_string(),
            edges_match: "_edges".to_string(),
        }
    }
}

impl MergeOptions {
    /// Load options from a TOML file.
    pub fn from_toml_file(path: &PathBuf) -> Result<MergeOptions, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Where the node and edge tables come from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// A directory of TSVs or a tar.gz archive of them; which one is decided
    /// when the path is opened.
    Path(PathBuf),
    /// Explicit node and edge file lists.
    Files {
        nodes: Vec<PathBuf>,
        edges: Vec<PathBuf>,
    },
}

impl InputSource {
    /// Validate the CLI argument combination.
    ///
    /// Exactly one input style must be in play; violations are fatal before
    /// any work is attempted.
    pub fn from_args(
        source: Option<PathBuf>,
        nodes: Vec<PathBuf>,
        edges: Vec<PathBuf>,
    ) -> Result<InputSource, ConfigError> {
        match (source, nodes.is_empty(), edges.is_empty()) {
            (Some(_), false, _) | (Some(_), _, false) => Err(ConfigError::ConflictingSources),
            (Some(path), true, true) => Ok(InputSource::Path(path)),
            (None, true, true) => Err(ConfigError::MissingSources),
            (None, false, true) => Err(ConfigError::IncompleteFileLists {
                given: "node",
                missing: "edge",
            }),
            (None, true, false) => Err(ConfigError::IncompleteFileLists {
                given: "edge",
                missing: "node",
            }),
            (None, false, false) => Ok(InputSource::Files { nodes, edges }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn path(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn source_and_file_lists_conflict() {
        let err = InputSource::from_args(
            Some(path("data/")),
            vec![path("a_nodes.tsv")],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingSources));
    }

    #[test]
    fn no_input_at_all_is_an_error() {
        assert!(matches!(
            InputSource::from_args(None, vec![], vec![]),
            Err(ConfigError::MissingSources)
        ));
    }

    #[test]
    fn nodes_without_edges_is_an_error() {
        let err =
            InputSource::from_args(None, vec![path("a_nodes.tsv")], vec![]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::IncompleteFileLists {
                given: "node",
                missing: "edge"
            }
        ));
    }

    #[test]
    fn valid_combinations_pass() {
        assert!(matches!(
            InputSource::from_args(Some(path("data/")), vec![], vec![]),
            Ok(InputSource::Path(_))
        ));
        assert!(matches!(
            InputSource::from_args(
                None,
                vec![path("a_nodes.tsv")],
                vec![path("a_edges.tsv")]
            ),
            Ok(InputSource::Files { .. })
        ));
    }

    #[test]
    fn options_load_from_toml_with_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("merge.toml");
        let mut f = std::fs::File::create(&config_path).unwrap();
        f.write_all(b"name = \"monarch-kg\"\nshape = \"map\"\nstats = true\n")
            .unwrap();

        let opts = MergeOptions::from_toml_file(&config_path).unwrap();
        assert_eq!(opts.name, "monarch-kg");
        assert_eq!(opts.shape, OutputShape::Map);
        assert!(opts.stats);
        // Unset keys fall back to defaults.
        assert_eq!(opts.group_by, "provided_by");
        assert!(opts.qc_report);
        assert_eq!(opts.nodes_match, "_nodes");
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("merge.toml");
        std::fs::write(&config_path, "nmae = \"typo\"\n").unwrap();
        assert!(matches!(
            MergeOptions::from_toml_file(&config_path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
