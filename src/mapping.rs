//! Identifier crosswalk: rewriting edge endpoints to canonical ids.
//!
//! A mapping table carries SSSOM-style equivalence rows (`subject_id`,
//! `object_id`), read as "wherever `object_id` appears as an edge endpoint,
//! replace it with `subject_id`". The prior value is kept in
//! `original_subject` / `original_object`, but only when the rewrite actually
//! changed something.

use std::collections::HashMap;

use tracing::debug;

use crate::error::MappingError;
use crate::table::Table;

/// Column holding the canonical identifier in a mapping table.
const SUBJECT_ID: &str = "subject_id";
/// Column holding the identifier to be replaced.
const OBJECT_ID: &str = "object_id";

/// A directed identifier-equivalence lookup built from one or more mapping
/// tables.
///
/// When several mapping rows target the same `object_id`, the last row read
/// wins. This keeps application deterministic; the upstream data should not
/// contain such conflicts in the first place.
#[derive(Debug, Clone, Default)]
pub struct Crosswalk {
    entries: HashMap<String, String>,
}

impl Crosswalk {
    /// Build a crosswalk from a unioned mapping table.
    pub fn from_table(mapping: &Table) -> Result<Crosswalk, MappingError> {
        if !mapping.has_column(SUBJECT_ID) {
            return Err(MappingError::MissingColumn { column: SUBJECT_ID });
        }
        if !mapping.has_column(OBJECT_ID) {
            return Err(MappingError::MissingColumn { column: OBJECT_ID });
        }

        let mut entries = HashMap::new();
        for row in 0..mapping.len() {
            let (Some(subject_id), Some(object_id)) =
                (mapping.value(row, SUBJECT_ID), mapping.value(row, OBJECT_ID))
            else {
                continue;
            };
            entries.insert(object_id.to_string(), subject_id.to_string());
        }
        debug!(entries = entries.len(), "built identifier crosswalk");
        Ok(Crosswalk { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical id for `id`, if a mapping row targets it.
    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }
}

/// Rewrite `subject` and `object` of every edge through the crosswalk.
///
/// Both lookups are computed from the original, pre-rewrite endpoint values;
/// the object rewrite never sees an already-rewritten subject.
/// `original_subject` / `original_object` are set only when the endpoint
/// actually changed. Edges with no applicable mapping pass through unchanged.
pub fn apply_mappings(edges: &mut Table, crosswalk: &Crosswalk) {
    edges.ensure_column("original_subject");
    edges.ensure_column("original_object");

    let mut rewritten = 0usize;
    for row in 0..edges.len() {
        let subject = edges.value(row, "subject").map(str::to_string);
        let object = edges.value(row, "object").map(str::to_string);

        if let Some(original) = subject {
            if let Some(mapped) = crosswalk.resolve(&original) {
                if mapped != original {
                    edges.set_value(row, "subject", Some(mapped.to_string()));
                    edges.set_value(row, "original_subject", Some(original));
                    rewritten += 1;
                }
            }
        }
        if let Some(original) = object {
            if let Some(mapped) = crosswalk.resolve(&original) {
                if mapped != original {
                    edges.set_value(row, "object", Some(mapped.to_string()));
                    edges.set_value(row, "original_object", Some(original));
                    rewritten += 1;
                }
            }
        }
    }
    debug!(rewritten, "applied identifier mappings to edge endpoints");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping_table(rows: &[(&str, &str)]) -> Table {
        let mut t = Table::new(["subject_id", "object_id"]);
        for (subject_id, object_id) in rows {
            t.push_row([Some(subject_id.to_string()), Some(object_id.to_string())]);
        }
        t
    }

    fn edge_table(rows: &[(&str, &str, &str)]) -> Table {
        let mut t = Table::new(["id", "subject", "object"]);
        for (id, subject, object) in rows {
            t.push_row([
                Some(id.to_string()),
                Some(subject.to_string()),
                Some(object.to_string()),
            ]);
        }
        t
    }

    #[test]
    fn rewrites_subject_and_records_original() {
        let crosswalk = Crosswalk::from_table(&mapping_table(&[("Gene:1", "XGene:1")])).unwrap();
        let mut edges = edge_table(&[("uuid:1", "XGene:1", "Disease:9")]);

        apply_mappings(&mut edges, &crosswalk);

        assert_eq!(edges.value(0, "subject"), Some("Gene:1"));
        assert_eq!(edges.value(0, "original_subject"), Some("XGene:1"));
        // Object had no applicable mapping: untouched, original stays null.
        assert_eq!(edges.value(0, "object"), Some("Disease:9"));
        assert_eq!(edges.value(0, "original_object"), None);
    }

    #[test]
    fn rewrites_object_independently_of_subject() {
        let crosswalk = Crosswalk::from_table(&mapping_table(&[
            ("Gene:1", "XGene:1"),
            ("Disease:2", "XDisease:2"),
        ]))
        .unwrap();
        let mut edges = edge_table(&[("uuid:1", "XGene:1", "XDisease:2")]);

        apply_mappings(&mut edges, &crosswalk);

        assert_eq!(edges.value(0, "subject"), Some("Gene:1"));
        assert_eq!(edges.value(0, "object"), Some("Disease:2"));
        assert_eq!(edges.value(0, "original_subject"), Some("XGene:1"));
        assert_eq!(edges.value(0, "original_object"), Some("XDisease:2"));
    }

    #[test]
    fn self_mapping_leaves_original_null() {
        let crosswalk = Crosswalk::from_table(&mapping_table(&[("Gene:1", "Gene:1")])).unwrap();
        let mut edges = edge_table(&[("uuid:1", "Gene:1", "Disease:9")]);

        apply_mappings(&mut edges, &crosswalk);

        assert_eq!(edges.value(0, "subject"), Some("Gene:1"));
        assert_eq!(edges.value(0, "original_subject"), None);
    }

    #[test]
    fn unmapped_edges_pass_through() {
        let crosswalk = Crosswalk::from_table(&mapping_table(&[("Gene:1", "XGene:1")])).unwrap();
        let mut edges = edge_table(&[("uuid:1", "Gene:7", "Disease:9")]);

        apply_mappings(&mut edges, &crosswalk);

        assert_eq!(edges.value(0, "subject"), Some("Gene:7"));
        assert_eq!(edges.value(0, "original_subject"), None);
        assert_eq!(edges.value(0, "original_object"), None);
    }

    #[test]
    fn object_lookup_uses_pre_rewrite_values() {
        // A chain XGene:1 -> Gene:1 -> Gene:0 must not be followed: the object
        // rewrite looks up the original value, not the rewritten subject.
        let crosswalk = Crosswalk::from_table(&mapping_table(&[
            ("Gene:1", "XGene:1"),
            ("Gene:0", "Gene:1"),
        ]))
        .unwrap();
        let mut edges = edge_table(&[("uuid:1", "XGene:1", "XGene:1")]);

        apply_mappings(&mut edges, &crosswalk);

        assert_eq!(edges.value(0, "subject"), Some("Gene:1"));
        assert_eq!(edges.value(0, "object"), Some("Gene:1"));
    }

    #[test]
    fn last_mapping_row_wins_on_conflict() {
        let crosswalk = Crosswalk::from_table(&mapping_table(&[
            ("Gene:1", "XGene:1"),
            ("Gene:2", "XGene:1"),
        ]))
        .unwrap();
        assert_eq!(crosswalk.resolve("XGene:1"), Some("Gene:2"));
    }

    #[test]
    fn missing_columns_are_an_error() {
        let table = Table::new(["subject_id", "predicate_id"]);
        let err = Crosswalk::from_table(&table).unwrap_err();
        assert!(matches!(
            err,
            MappingError::MissingColumn {
                column: "object_id"
            }
        ));
    }
}
