//! Helper functions for extracting values from KDL nodes.

use kdl::{KdlNode, KdlValue};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::str::FromStr;

use crate::{ConfigError, ConfigResult};

pub(crate) fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

pub(crate) fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

pub(crate) fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

pub(crate) fn get_bool_prop(node: &KdlNode, name: &str) -> Option<bool> {
    node.get(name).and_then(|v| v.as_bool())
}

pub(crate) fn get_int_prop(node: &KdlNode, name: &str) -> ConfigResult<Option<i64>> {
    let Some(value) = node.get(name) else {
        return Ok(None);
    };
    value
        .as_integer()
        .and_then(|i| i64::try_from(i).ok())
        .map(Some)
        .ok_or_else(|| ConfigError::InvalidValue {
            field: name.to_string(),
            message: format!("expected an integer, got {:?}", value),
        })
}

pub(crate) fn get_string_list_prop(node: &KdlNode, name: &str) -> Vec<String> {
    let mut result = Vec::new();

    // Repeated attributes like status="success" status="failure"
    for entry in node.entries() {
        if let Some(entry_name) = entry.name() {
            if entry_name.value() == name {
                if let Some(s) = entry.value().as_string() {
                    result.push(s.to_string());
                }
            }
        }
    }

    if !result.is_empty() {
        return result;
    }

    // Block syntax
    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == name {
                return get_all_string_args(child);
            }
        }
    }

    Vec::new()
}

/// A flag node: `privileged` alone means true, otherwise its first argument.
pub(crate) fn get_flag(node: &KdlNode) -> ConfigResult<bool> {
    match node.entries().iter().find(|e| e.name().is_none()) {
        None => Ok(true),
        Some(entry) => entry.value().as_bool().ok_or_else(|| ConfigError::InvalidValue {
            field: node.name().value().to_string(),
            message: format!("expected a boolean, got {:?}", entry.value()),
        }),
    }
}

/// Require the first string argument of `node`.
pub(crate) fn require_string_arg(node: &KdlNode, what: &str) -> ConfigResult<String> {
    get_first_string_arg(node).ok_or_else(|| ConfigError::MissingField(what.to_string()))
}

/// Collect `KEY "value"` children into a map.
pub(crate) fn get_string_map(node: &KdlNode) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            let key = child.name().value().to_string();
            if let Some(val) = first_arg_as_text(child) {
                map.insert(key, val);
            }
        }
    }
    map
}

/// Parse a string property into `T`, reporting the field on failure.
pub(crate) fn parse_prop<T>(node: &KdlNode, name: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_string_prop(node, name)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                field: name.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}

// Numbers and booleans are accepted where text is expected, e.g. `PORT 5432`.
fn first_arg_as_text(node: &KdlNode) -> Option<String> {
    let value = node.entries().iter().find(|e| e.name().is_none())?.value();
    match kdl_to_json(value) {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Convert a settings node into a JSON value.
///
/// A `from-secret` property becomes a secret reference, child blocks become
/// maps, one argument is a scalar and several arguments form a list.
pub(crate) fn node_to_json(node: &KdlNode) -> Value {
    if let Some(secret) = get_string_prop(node, "from-secret") {
        let mut reference = Map::new();
        reference.insert("from_secret".to_string(), Value::String(secret));
        return Value::Object(reference);
    }

    if let Some(children) = node.children() {
        return Value::Object(
            children
                .nodes()
                .iter()
                .map(|child| (child.name().value().to_string(), node_to_json(child)))
                .collect(),
        );
    }

    let mut args: Vec<Value> = node
        .entries()
        .iter()
        .filter(|e| e.name().is_none())
        .map(|e| kdl_to_json(e.value()))
        .collect();

    match args.len() {
        0 => Value::Null,
        1 => args.remove(0),
        _ => Value::Array(args),
    }
}

fn kdl_to_json(value: &KdlValue) -> Value {
    if let Some(s) = value.as_string() {
        return Value::String(s.to_string());
    }
    if let Some(b) = value.as_bool() {
        return Value::Bool(b);
    }
    if let Some(i) = value.as_integer() {
        return i64::try_from(i)
            .map(|i| Value::Number(i.into()))
            .unwrap_or_else(|_| Value::String(i.to_string()));
    }
    if let Some(f) = value.as_float() {
        return Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string()));
    }
    Value::Null
}
