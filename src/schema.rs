//! Multivalued-field lookup from a LinkML-style schema.
//!
//! KGX exports flatten multivalued fields (categories, xrefs, taxa) into
//! pipe-delimited cells. A [`SchemaIndex`] answers "is this column
//! multivalued?" so the reporter can split such cells before aggregation. The
//! index is an explicit handle constructed by the caller and threaded through
//! as a parameter; [`SchemaCache`] memoizes parses by schema path.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SchemaError;

/// Delimiter used by KGX for multivalued cells.
pub const MULTIVALUED_DELIMITER: char = '|';

/// Slot fields we care about from a LinkML schema document.
#[derive(Debug, Default, Deserialize)]
struct SlotDefinition {
    #[serde(default)]
    multivalued: bool,
}

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    slots: HashMap<String, Option<SlotDefinition>>,
}

/// Lookup table of multivalued slot names.
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    multivalued: BTreeSet<String>,
}

impl SchemaIndex {
    /// Parse a LinkML-style YAML schema, keeping the slots flagged
    /// `multivalued: true`.
    pub fn from_yaml_file(path: &Path) -> Result<SchemaIndex, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let doc: SchemaDocument =
            serde_yaml::from_str(&text).map_err(|source| SchemaError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        let multivalued = doc
            .slots
            .into_iter()
            .filter(|(_, slot)| slot.as_ref().is_some_and(|s| s.multivalued))
            .map(|(name, _)| name)
            .collect();
        Ok(SchemaIndex { multivalued })
    }

    /// The well-known multivalued fields of the KGX format, for when no
    /// schema file is supplied.
    pub fn kgx_defaults() -> SchemaIndex {
        let multivalued = [
            "category",
            "xref",
            "synonym",
            "in_taxon",
            "publications",
            "same_as",
            "qualifiers",
            "knowledge_source",
            "aggregator_knowledge_source",
            "primary_knowledge_source",
            "supporting_data_source",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();
        SchemaIndex { multivalued }
    }

    pub fn is_multivalued(&self, field: &str) -> bool {
        self.multivalued.contains(field)
    }

    pub fn len(&self) -> usize {
        self.multivalued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.multivalued.is_empty()
    }
}

/// Split a pipe-delimited multivalued cell, trimming whitespace and dropping
/// empty segments.
pub fn split_multivalued(cell: &str) -> Vec<String> {
    cell.split(MULTIVALUED_DELIMITER)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Memoized schema parsing, keyed by schema path.
///
/// The path is the invalidation key: asking for a different path parses that
/// file; asking for the same path again returns the cached index.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: HashMap<PathBuf, SchemaIndex>,
}

impl SchemaCache {
    pub fn new() -> SchemaCache {
        SchemaCache::default()
    }

    pub fn load(&mut self, path: &Path) -> Result<&SchemaIndex, SchemaError> {
        if !self.entries.contains_key(path) {
            let index = SchemaIndex::from_yaml_file(path)?;
            self.entries.insert(path.to_path_buf(), index);
        }
        Ok(&self.entries[path])
    }
}
