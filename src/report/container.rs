//! Section builders for the two report output shapes.
//!
//! A report section is either a list of per-group objects, each carrying its
//! own key field, or a map keyed by that same field: identical data, only
//! the container differs. The shape is an explicit configuration choice, not
//! something inferred at runtime.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ConfigError;

use super::value::Value;

/// Container shape for report sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputShape {
    /// Each group is an object in a sequence, carrying its own key field.
    #[default]
    List,
    /// Groups keyed by the key field; duplicate keys are a programming error.
    Map,
}

impl std::str::FromStr for OutputShape {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(OutputShape::List),
            "map" => Ok(OutputShape::Map),
            other => Err(ConfigError::BadShape {
                value: other.to_string(),
            }),
        }
    }
}

/// Accumulates per-group report entries into the configured shape.
pub struct SectionBuilder {
    shape: OutputShape,
    key_field: &'static str,
    list: Vec<Value>,
    map: BTreeMap<String, Value>,
}

impl SectionBuilder {
    /// `key_field` is the entry field used as the map key: `"name"` for
    /// source groups, `"uri"` for predicate groups.
    pub fn new(shape: OutputShape, key_field: &'static str) -> Self {
        SectionBuilder {
            shape,
            key_field,
            list: Vec::new(),
            map: BTreeMap::new(),
        }
    }

    /// Add one group entry. The entry must carry the key field; in map shape
    /// a repeated key is a bug in the grouping logic, so it panics.
    pub fn push(&mut self, entry: BTreeMap<String, Value>) {
        match self.shape {
            OutputShape::List => self.list.push(Value::Map(entry)),
            OutputShape::Map => {
                let Some(Value::Str(key)) = entry.get(self.key_field) else {
                    panic!("section entry missing key field '{}'", self.key_field);
                };
                let key = key.clone();
                if self.map.insert(key.clone(), Value::Map(entry)).is_some() {
                    panic!("duplicate section key '{key}'");
                }
            }
        }
    }

    pub fn finish(self) -> Value {
        match self.shape {
            OutputShape::List => Value::List(self.list),
            OutputShape::Map => Value::Map(self.map),
        }
    }
}
