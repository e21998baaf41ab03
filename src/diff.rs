//! Structural diff over QC reports.
//!
//! Compares two report [`Value`] trees field by field and emits a delta tree
//! keyed the same way: `+`-prefixed material present only in the first
//! report, `-`-prefixed material present only in the second, `{change, new,
//! old}` maps for integer deltas, and `["+a", "-b"]` pairs for changed
//! strings. Every recursive call returns `(emitted value, did anything
//! change)`; unchanged branches are omitted entirely unless `show_all` asks
//! for them.
//!
//! Mismatched value kinds and double-nulls are hard errors: they mean the two
//! inputs are not a pair of reports this tool produced.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::DiffError;
use crate::report::Value;

/// Read and parse a report YAML into the closed report value space.
pub fn load_report(path: &Path) -> Result<Value, DiffError> {
    let text = std::fs::read_to_string(path).map_err(|source| DiffError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&text).map_err(|source| DiffError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    Value::from_yaml(yaml)
}

/// Diff two reports. With `show_all` false, `diff(a, a)` is an empty map.
pub fn diff_reports(a: &Value, b: &Value, show_all: bool) -> Result<Value, DiffError> {
    let (value, _changed) = diff_value(non_null(a), non_null(b), show_all)?;
    Ok(value.unwrap_or_else(|| Value::Map(BTreeMap::new())))
}

fn non_null(value: &Value) -> Option<&Value> {
    if value.is_null() { None } else { Some(value) }
}

/// Diff one field. `None` means the side is absent (or null).
///
/// Returns the emitted value (`None` = omit this branch) and whether any leaf
/// under it differed.
fn diff_value(
    a: Option<&Value>,
    b: Option<&Value>,
    show_all: bool,
) -> Result<(Option<Value>, bool), DiffError> {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Err(DiffError::BothNone),
        (Some(x), Some(y)) if std::mem::discriminant(x) != std::mem::discriminant(y) => {
            Err(DiffError::TypeMismatch {
                left: x.kind(),
                right: y.kind(),
            })
        }
        _ => match a.or(b).expect("one side present") {
            Value::Int(_) => diff_int(int_of(a), int_of(b), show_all),
            Value::Str(_) => diff_str(str_of(a), str_of(b), show_all),
            Value::List(_) => diff_list(list_of(a), list_of(b), show_all),
            Value::Map(_) => {
                let (value, changed) = diff_map(map_of(a), map_of(b), show_all)?;
                Ok((value.map(Value::Map), changed))
            }
            Value::Null => unreachable!("nulls filtered above"),
        },
    }
}

fn int_of(v: Option<&Value>) -> Option<i64> {
    match v {
        Some(Value::Int(i)) => Some(*i),
        _ => None,
    }
}

fn str_of(v: Option<&Value>) -> Option<&str> {
    match v {
        Some(Value::Str(s)) => Some(s),
        _ => None,
    }
}

fn list_of(v: Option<&Value>) -> Option<&[Value]> {
    match v {
        Some(Value::List(l)) => Some(l),
        _ => None,
    }
}

fn map_of(v: Option<&Value>) -> Option<&BTreeMap<String, Value>> {
    match v {
        Some(Value::Map(m)) => Some(m),
        _ => None,
    }
}

/// Integer delta: equal values survive only under `show_all`; a one-sided
/// value becomes a signed string; a changed value becomes `{change, new, old}`.
pub fn diff_int(
    a: Option<i64>,
    b: Option<i64>,
    show_all: bool,
) -> Result<(Option<Value>, bool), DiffError> {
    match (a, b) {
        (None, None) => Err(DiffError::BothNone),
        (Some(a), Some(b)) if a == b => Ok((show_all.then_some(Value::Int(a)), false)),
        (Some(a), None) => Ok((Some(Value::Str(format!("+{a}"))), true)),
        (None, Some(b)) => Ok((Some(Value::Str(format!("-{b}"))), true)),
        (Some(a), Some(b)) => {
            let delta = BTreeMap::from([
                ("change".to_string(), Value::Int(a - b)),
                ("new".to_string(), Value::Int(a)),
                ("old".to_string(), Value::Int(b)),
            ]);
            Ok((Some(Value::Map(delta)), true))
        }
    }
}

/// String delta: one-sided values are prefixed, changed values become a
/// `["+a", "-b"]` pair.
pub fn diff_str(
    a: Option<&str>,
    b: Option<&str>,
    show_all: bool,
) -> Result<(Option<Value>, bool), DiffError> {
    match (a, b) {
        (None, None) => Err(DiffError::BothNone),
        (Some(a), Some(b)) if a == b => {
            Ok((show_all.then(|| Value::Str(a.to_string())), false))
        }
        (Some(a), None) => Ok((Some(Value::Str(format!("+{a}"))), true)),
        (None, Some(b)) => Ok((Some(Value::Str(format!("-{b}"))), true)),
        (Some(a), Some(b)) => Ok((
            Some(Value::List(vec![
                Value::Str(format!("+{a}")),
                Value::Str(format!("-{b}")),
            ])),
            true,
        )),
    }
}

/// Lists of maps are matched by their key field; anything else diffs as a
/// set of scalars.
fn diff_list(
    a: Option<&[Value]>,
    b: Option<&[Value]>,
    show_all: bool,
) -> Result<(Option<Value>, bool), DiffError> {
    let first_is_map =
        |side: Option<&[Value]>| matches!(side.and_then(<[Value]>::first), Some(Value::Map(_)));
    if first_is_map(a) || first_is_map(b) {
        let (value, changed) = diff_keyed_list(a.unwrap_or(&[]), b.unwrap_or(&[]), show_all)?;
        Ok((value.map(Value::Map), changed))
    } else {
        diff_scalar_list(a.unwrap_or(&[]), b.unwrap_or(&[]), show_all)
    }
}

/// Symmetric-difference merge of two scalar lists: common elements only under
/// `show_all`, one-sided elements signed.
fn diff_scalar_list(
    a: &[Value],
    b: &[Value],
    show_all: bool,
) -> Result<(Option<Value>, bool), DiffError> {
    if let (Some(x), Some(y)) = (a.first(), b.first()) {
        if std::mem::discriminant(x) != std::mem::discriminant(y) {
            return Err(DiffError::TypeMismatch {
                left: x.kind(),
                right: y.kind(),
            });
        }
    }

    let mut items = Vec::new();
    let mut changed = false;
    let mut seen: Vec<&Value> = Vec::new();
    for element in a.iter().chain(b) {
        if seen.contains(&element) {
            continue;
        }
        seen.push(element);
        let in_a = a.contains(element);
        let in_b = b.contains(element);
        if in_a && in_b {
            if show_all {
                items.push(element.clone());
            }
        } else {
            changed = true;
            let sign = if in_a { '+' } else { '-' };
            items.push(Value::Str(match element {
                Value::Str(s) => format!("{sign}{s}"),
                Value::Int(i) => format!("{sign}{i}"),
                other => {
                    return Err(DiffError::Unsupported {
                        kind: format!("list of {}", other.kind()),
                    });
                }
            }));
        }
    }

    if !changed && !show_all {
        return Ok((None, false));
    }
    Ok((Some(Value::List(items)), changed))
}

/// Convert a list of report entries into (key, entry) pairs via the `name`
/// (or `uri`) field, keeping list order.
fn keyed_entries(list: &[Value]) -> Result<Vec<(String, &BTreeMap<String, Value>)>, DiffError> {
    let mut entries = Vec::new();
    for element in list {
        let Value::Map(map) = element else {
            return Err(DiffError::TypeMismatch {
                left: "map",
                right: element.kind(),
            });
        };
        let key = match (map.get("name"), map.get("uri")) {
            (Some(Value::Str(name)), _) => name.clone(),
            (_, Some(Value::Str(uri))) => uri.clone(),
            _ => return Err(DiffError::UnkeyedEntry),
        };
        entries.push((key, map));
    }
    Ok(entries)
}

fn diff_keyed_list(
    a: &[Value],
    b: &[Value],
    show_all: bool,
) -> Result<(Option<BTreeMap<String, Value>>, bool), DiffError> {
    let a_entries = keyed_entries(a)?;
    let b_entries = keyed_entries(b)?;
    let a_map: BTreeMap<String, Value> = a_entries
        .into_iter()
        .map(|(k, v)| (k, Value::Map(v.clone())))
        .collect();
    let b_map: BTreeMap<String, Value> = b_entries
        .into_iter()
        .map(|(k, v)| (k, Value::Map(v.clone())))
        .collect();
    diff_map(Some(&a_map), Some(&b_map), show_all)
}

/// Diff two maps over the union of their keys.
///
/// A key present on one side only is diffed against a synthesized empty
/// counterpart and emitted under a `+`/`-`-prefixed key.
fn diff_map(
    a: Option<&BTreeMap<String, Value>>,
    b: Option<&BTreeMap<String, Value>>,
    show_all: bool,
) -> Result<(Option<BTreeMap<String, Value>>, bool), DiffError> {
    static EMPTY: BTreeMap<String, Value> = BTreeMap::new();
    let a = a.unwrap_or(&EMPTY);
    let b = b.unwrap_or(&EMPTY);

    let mut result = BTreeMap::new();
    let mut changed = false;
    let keys: Vec<&String> = a.keys().chain(b.keys().filter(|k| !a.contains_key(*k))).collect();

    for key in keys {
        match (a.get(key), b.get(key)) {
            (Some(va), Some(vb)) => {
                let (value, child_changed) = diff_value(Some(va), Some(vb), show_all)?;
                changed |= child_changed;
                if let Some(value) = value {
                    result.insert(key.clone(), value);
                }
            }
            (Some(va), None) => {
                changed = true;
                let empty = empty_counterpart(va);
                let (value, _) = diff_value(Some(va), non_null(&empty), show_all)?;
                if let Some(value) = value {
                    result.insert(format!("+{key}"), value);
                }
            }
            (None, Some(vb)) => {
                changed = true;
                let empty = empty_counterpart(vb);
                let (value, _) = diff_value(non_null(&empty), Some(vb), show_all)?;
                if let Some(value) = value {
                    result.insert(format!("-{key}"), value);
                }
            }
            (None, None) => unreachable!("key came from one of the maps"),
        }
    }

    if !changed && !show_all {
        return Ok((None, false));
    }
    Ok((Some(result), changed))
}

/// An "empty" version of a value: same map keys with null leaves, lists
/// emptied out, scalars dropped to null. Gives a one-sided entry something to
/// diff against, so every element of a one-sided list reads as one-sided
/// itself.
fn empty_counterpart(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Int(_) | Value::Str(_) => Value::Null,
        Value::List(_) => Value::List(Vec::new()),
        Value::Map(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), empty_counterpart(v)))
                .collect(),
        ),
    }
}
