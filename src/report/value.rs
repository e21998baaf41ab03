//! The closed value space QC reports are built from.
//!
//! Reports and report diffs both operate on [`Value`]: nulls, integers,
//! strings, lists, and string-keyed maps, nothing else. Keeping the union
//! closed is what lets the diff engine do total structural recursion; YAML
//! scalars outside it (floats, booleans) are rejected at load time rather
//! than surfacing as surprises mid-diff.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DiffError;

/// A report value.
///
/// Maps use `BTreeMap` so key order, and therefore YAML output, is
/// deterministic regardless of construction order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert a parsed YAML document into the report value space.
    ///
    /// Anything outside the closed union is a hard `Unsupported` error: such a
    /// document was not produced by the QC reporter.
    pub fn from_yaml(yaml: serde_yaml::Value) -> Result<Value, DiffError> {
        match yaml {
            serde_yaml::Value::Null => Ok(Value::Null),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None => Err(DiffError::Unsupported {
                    kind: "float".to_string(),
                }),
            },
            serde_yaml::Value::Bool(_) => Err(DiffError::Unsupported {
                kind: "boolean".to_string(),
            }),
            serde_yaml::Value::String(s) => Ok(Value::Str(s)),
            serde_yaml::Value::Sequence(seq) => Ok(Value::List(
                seq.into_iter()
                    .map(Value::from_yaml)
                    .collect::<Result<_, _>>()?,
            )),
            serde_yaml::Value::Mapping(mapping) => {
                let mut map = BTreeMap::new();
                for (key, value) in mapping {
                    let serde_yaml::Value::String(key) = key else {
                        return Err(DiffError::Unsupported {
                            kind: "non-string map key".to_string(),
                        });
                    };
                    map.insert(key, Value::from_yaml(value)?);
                }
                Ok(Value::Map(map))
            }
            serde_yaml::Value::Tagged(_) => Err(DiffError::Unsupported {
                kind: "tagged value".to_string(),
            }),
        }
    }

    /// A sorted list of unique strings: the shape every namespace/category/
    /// taxon listing in a report takes.
    pub fn sorted_list<I, S>(values: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items: Vec<String> = values.into_iter().map(Into::into).collect();
        items.sort();
        items.dedup();
        Value::List(items.into_iter().map(Value::Str).collect())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_round_trip_stays_in_the_union() {
        let yaml: serde_yaml::Value = serde_yaml::from_str(
            "nodes:\n  - name: a\n    total_number: 3\n    taxon: []\nedges: null\n",
        )
        .unwrap();
        let value = Value::from_yaml(yaml).unwrap();
        let Value::Map(map) = &value else {
            panic!("expected map")
        };
        assert_eq!(map["edges"], Value::Null);
        let serialized = serde_yaml::to_string(&value).unwrap();
        let reparsed = Value::from_yaml(serde_yaml::from_str(&serialized).unwrap()).unwrap();
        assert_eq!(reparsed, value);
    }

    #[test]
    fn floats_are_rejected() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("x: 1.5").unwrap();
        let err = Value::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, DiffError::Unsupported { kind } if kind == "float"));
    }

    #[test]
    fn booleans_are_rejected() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("x: true").unwrap();
        assert!(matches!(
            Value::from_yaml(yaml),
            Err(DiffError::Unsupported { .. })
        ));
    }

    #[test]
    fn sorted_list_sorts_and_dedups() {
        let value = Value::sorted_list(["MONDO", "HP", "MONDO"]);
        assert_eq!(
            value,
            Value::List(vec![Value::Str("HP".into()), Value::Str("MONDO".into())])
        );
    }
}
