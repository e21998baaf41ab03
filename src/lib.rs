//! # sema-tawy
//!
//! A knowledge-graph merge engine: unions per-source node and edge tables
//! under one schema, rewrites edge endpoints through identifier crosswalks,
//! deduplicates and partitions out dangling edges, and reports the result as
//! a nested QC summary.
//!
//! ## Architecture
//!
//! - **Tables** (`table`): column-union record tables, the unit every stage
//!   operates on
//! - **Mapping** (`mapping`): SSSOM-style endpoint rewriting with original-id
//!   capture
//! - **Reconcile** (`reconcile`): duplicate/dangling detection and cleaning
//! - **Report** (`report`): grouped QC aggregation in list or map shape
//! - **Diff** (`diff`): structural comparison of two QC reports
//! - **Stats** (`stats`): petgraph-backed topology summary
//!
//! ## Library usage
//!
//! ```no_run
//! use sema_tawy::config::{InputSource, MergeOptions};
//! use sema_tawy::merge::merge;
//!
//! let opts = MergeOptions {
//!     name: "my-kg".to_string(),
//!     ..Default::default()
//! };
//! let source = InputSource::Path("transform_output".into());
//! let summary = merge(&opts, &source, &[], None).unwrap();
//! println!("{summary}");
//! ```

pub mod config;
pub mod diff;
pub mod emit;
pub mod error;
pub mod ingest;
pub mod mapping;
pub mod merge;
pub mod reconcile;
pub mod report;
pub mod schema;
pub mod stats;
pub mod table;
