//! Path lookups and key rewriting over decoded JSON payloads.
//!
//! Paths are `/`-separated mapping keys, e.g. `ResultCount/Total`. There is
//! no array indexing or wildcard support: every segment must name a key.

use serde_json::{Map, Value};

use crate::strings::{self, Casing};
use crate::Error;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '/';

/// Returns the value at `path`, or [`Error::MissingKey`] if any segment is
/// absent or lands on a non-mapping node.
pub fn must_get<'a>(data: &'a Value, path: &str) -> Result<&'a Value, Error> {
    let mut current = data;
    for segment in path.split(PATH_SEPARATOR) {
        current = current
            .as_object()
            .and_then(|map| map.get(segment))
            .ok_or_else(|| Error::MissingKey(path.to_string()))?;
    }
    Ok(current)
}

/// Returns the value at `path`, or `None` if it does not exist.
pub fn get<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    must_get(data, path).ok()
}

/// Returns the value at `path`, or `fallback` if it does not exist.
pub fn get_or<'a>(data: &'a Value, path: &str, fallback: &'a Value) -> &'a Value {
    get(data, path).unwrap_or(fallback)
}

/// Writes `value` at `path`, creating intermediate mappings as needed.
///
/// Fails with [`Error::MissingKey`] when an existing intermediate node (or
/// `data` itself) is not a mapping.
pub fn set(data: &mut Value, path: &str, value: Value) -> Result<(), Error> {
    let missing = || Error::MissingKey(path.to_string());
    let mut segments = path.split(PATH_SEPARATOR).peekable();
    let mut current = data;

    while let Some(segment) = segments.next() {
        let map = match current {
            Value::Object(map) => map,
            _ => return Err(missing()),
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return Ok(());
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    Err(missing())
}

/// Recursively rewrites every key in `value` (including mappings nested in
/// arrays) with `key_fn`. Leaf values pass through unchanged.
pub fn mutate_keys<F>(value: &Value, key_fn: &F) -> Value
where
    F: Fn(&str) -> String,
{
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (key_fn(k), mutate_keys(v, key_fn)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| mutate_keys(v, key_fn)).collect()),
        other => other.clone(),
    }
}

/// Rewrites every key in `value` to the given casing.
pub fn convert_keys(value: &Value, casing: Casing) -> Value {
    mutate_keys(value, &|k: &str| strings::convert(k, casing))
}

/// Shorthand for `PascalCase` (`upper_first`) or `camelCase` keys.
pub fn camelize_keys(value: &Value, upper_first: bool) -> Value {
    convert_keys(value, if upper_first { Casing::Pascal } else { Casing::Camel })
}

/// Shorthand for `snake_case` keys.
pub fn underscore_keys(value: &Value) -> Value {
    convert_keys(value, Casing::Snake)
}

/// Returns a copy of `map` without null values.
pub fn compact(map: &Map<String, Value>) -> Map<String, Value> {
    compact_with(map, |_, v| !v.is_null())
}

/// Returns a copy of `map` keeping only entries for which `keep_if` is true.
pub fn compact_with<F>(map: &Map<String, Value>, keep_if: F) -> Map<String, Value>
where
    F: Fn(&str, &Value) -> bool,
{
    map.iter()
        .filter(|(k, v)| keep_if(k, v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
