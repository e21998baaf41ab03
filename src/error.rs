//! Rich diagnostic error types for sema-tawy.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for sema-tawy.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum SemaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("both a source and explicit node/edge file lists were given")]
    #[diagnostic(
        code(sema::config::conflicting_sources),
        help(
            "Pass either --source DIR_OR_ARCHIVE or both --nodes and --edges, \
             never the two styles together."
        )
    )]
    ConflictingSources,

    #[error("no input source specified")]
    #[diagnostic(
        code(sema::config::missing_sources),
        help("Pass --source DIR_OR_ARCHIVE, or both --nodes and --edges file lists.")
    )]
    MissingSources,

    #[error("incomplete file lists: {given} files given without any {missing} files")]
    #[diagnostic(
        code(sema::config::incomplete_file_lists),
        help("Explicit file input needs both --nodes and --edges.")
    )]
    IncompleteFileLists {
        given: &'static str,
        missing: &'static str,
    },

    #[error("unknown output shape: {value}")]
    #[diagnostic(
        code(sema::config::bad_shape),
        help("Valid output shapes are \"list\" and \"map\".")
    )]
    BadShape { value: String },

    #[error("failed to read config file: {path}")]
    #[diagnostic(
        code(sema::config::read),
        help("Check that the file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {path}")]
    #[diagnostic(
        code(sema::config::parse),
        help("The config file must be valid TOML with known keys. {message}")
    )]
    Parse { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Ingestion errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("I/O error reading {path}")]
    #[diagnostic(
        code(sema::ingest::io),
        help("Check that the path exists and has read permissions.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} as tab-separated data")]
    #[diagnostic(
        code(sema::ingest::csv),
        help(
            "The file must be tab-separated with a header row. \
             Individual malformed rows are skipped, but the header must parse."
        )
    )]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("no input tables to union")]
    #[diagnostic(
        code(sema::ingest::empty_union),
        help(
            "At least one node file and one edge file are required. \
             Check the filename patterns (default *_nodes* / *_edges*) against \
             the source directory or archive contents."
        )
    )]
    EmptyUnion,

    #[error("source is not a directory or tar archive: {path}")]
    #[diagnostic(
        code(sema::ingest::bad_source),
        help("--source accepts a directory of TSV files or a .tar.gz archive of them.")
    )]
    BadSource { path: String },

    #[error("invalid glob pattern: {pattern}")]
    #[diagnostic(
        code(sema::ingest::bad_glob),
        help("Mapping inputs may be plain paths or glob patterns like mappings/*.sssom.tsv.")
    )]
    BadGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

// ---------------------------------------------------------------------------
// Mapping errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum MappingError {
    #[error("mapping table is missing the {column} column")]
    #[diagnostic(
        code(sema::mapping::missing_column),
        help(
            "Crosswalk files need subject_id and object_id columns \
             (SSSOM-style identifier equivalences)."
        )
    )]
    MissingColumn { column: &'static str },
}

// ---------------------------------------------------------------------------
// Emission errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EmitError {
    #[error("I/O error writing {path}")]
    #[diagnostic(
        code(sema::emit::io),
        help(
            "Check that the output directory exists, has write permissions, \
             and that the disk is not full."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path} as tab-separated data")]
    #[diagnostic(code(sema::emit::csv), help("A cell could not be encoded as TSV."))]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to serialize YAML for {path}")]
    #[diagnostic(
        code(sema::emit::yaml),
        help("This indicates a bug in report construction; please file an issue.")
    )]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

// ---------------------------------------------------------------------------
// Diff errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DiffError {
    #[error("cannot diff values of different kinds: {left} vs {right}")]
    #[diagnostic(
        code(sema::diff::type_mismatch),
        help(
            "The two reports disagree on the shape of a field. \
             They were probably produced by incompatible versions of the tool."
        )
    )]
    TypeMismatch {
        left: &'static str,
        right: &'static str,
    },

    #[error("both values to compare are absent")]
    #[diagnostic(
        code(sema::diff::both_none),
        help(
            "A field is null on both sides, which a well-formed QC report never \
             produces. Check the report inputs."
        )
    )]
    BothNone,

    #[error("unsupported value kind in report: {kind}")]
    #[diagnostic(
        code(sema::diff::unsupported),
        help(
            "QC reports contain only nulls, integers, strings, lists, and maps. \
             Floats, booleans, and tagged values cannot be diffed."
        )
    )]
    Unsupported { kind: String },

    #[error("report entry has neither a name nor a uri key")]
    #[diagnostic(
        code(sema::diff::unkeyed_entry),
        help(
            "List entries in a QC report are matched between the two sides by \
             their name (or uri) field; an entry without one is malformed."
        )
    )]
    UnkeyedEntry,

    #[error("failed to read report: {path}")]
    #[diagnostic(
        code(sema::diff::read),
        help("Check that the report file exists and is valid YAML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse report YAML: {path}")]
    #[diagnostic(
        code(sema::diff::parse),
        help("The report must be a YAML document produced by the qc reporter.")
    )]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

// ---------------------------------------------------------------------------
// Schema errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    #[error("failed to read schema file: {path}")]
    #[diagnostic(
        code(sema::schema::read),
        help("Check that the schema path exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema YAML: {path}")]
    #[diagnostic(
        code(sema::schema::parse),
        help("The schema must be a LinkML-style YAML document with a top-level slots map.")
    )]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Convenience alias for functions returning sema-tawy results.
pub type SemaResult<T> = std::result::Result<T, SemaError>;
