// src/args/coerce.rs

//! Structural coercion of JSON values to a declared [`ParameterType`].
//!
//! Rules:
//! - `number`: numbers pass; finite numeric strings are parsed.
//! - `integer`: integral numbers pass; numeric strings with no fractional
//!   part are parsed.
//! - `boolean`: booleans pass; `true/false/yes/no/on/off/1/0` strings
//!   (case-insensitive) and the numbers `1`/`0` convert.
//! - `string`: strings pass; numbers and booleans are rendered.
//! - `object` / `array`: recurse field-by-field / element-by-element. A string
//!   holding JSON of the right shape is parsed first.
//! - `any`: everything passes unchanged.

use serde_json::{Map, Value};

use crate::integration::schema::ParameterType;

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_991.0;

/// A value that could not be coerced. `path` locates the offending part
/// inside composite values (`""` for the top level, then `.field` / `[i]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    pub path: String,
    pub expected: String,
    pub found: String,
}

pub fn coerce(value: &Value, ty: &ParameterType) -> Result<Value, CoercionError> {
    coerce_at(value, ty, String::new())
}

/// Render a float as a JSON number, preferring an integer when exact.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INT {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Short human description of a value, for error messages.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(items) => format!("array of {} element(s)", items.len()),
        Value::Object(map) => format!("object with {} field(s)", map.len()),
    }
}

fn coerce_at(value: &Value, ty: &ParameterType, path: String) -> Result<Value, CoercionError> {
    let mismatch = |path: String| CoercionError {
        path,
        expected: ty.to_string(),
        found: describe(value),
    };

    match ty {
        ParameterType::Any => Ok(value.clone()),

        ParameterType::Number => match value {
            Value::Number(_) => Ok(value.clone()),
            Value::String(s) => parse_number(s).map(number_value).ok_or_else(|| mismatch(path)),
            _ => Err(mismatch(path)),
        },

        ParameterType::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
            Value::Number(n) => n
                .as_f64()
                .and_then(exact_integer)
                .ok_or_else(|| mismatch(path)),
            Value::String(s) => parse_number(s)
                .and_then(exact_integer)
                .ok_or_else(|| mismatch(path)),
            _ => Err(mismatch(path)),
        },

        ParameterType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => parse_bool(s).map(Value::Bool).ok_or_else(|| mismatch(path)),
            Value::Number(n) => match n.as_f64() {
                Some(x) if x == 1.0 => Ok(Value::Bool(true)),
                Some(x) if x == 0.0 => Ok(Value::Bool(false)),
                _ => Err(mismatch(path)),
            },
            _ => Err(mismatch(path)),
        },

        ParameterType::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(mismatch(path)),
        },

        ParameterType::Object { properties } => {
            let parsed;
            let map = match value {
                Value::Object(map) => map,
                Value::String(s) => match serde_json::from_str::<Value>(s) {
                    Ok(Value::Object(map)) => {
                        parsed = map;
                        &parsed
                    }
                    _ => return Err(mismatch(path)),
                },
                _ => return Err(mismatch(path)),
            };

            let mut out = Map::with_capacity(map.len());
            for (key, field) in map {
                let coerced = match properties.get(key) {
                    Some(field_ty) => coerce_at(field, field_ty, format!("{path}.{key}"))?,
                    None => field.clone(),
                };
                out.insert(key.clone(), coerced);
            }
            Ok(Value::Object(out))
        }

        ParameterType::Array { items } => {
            let parsed;
            let elements = match value {
                Value::Array(elements) => elements,
                Value::String(s) => match serde_json::from_str::<Value>(s) {
                    Ok(Value::Array(elements)) => {
                        parsed = elements;
                        &parsed
                    }
                    _ => return Err(mismatch(path)),
                },
                _ => return Err(mismatch(path)),
            };

            elements
                .iter()
                .enumerate()
                .map(|(i, element)| coerce_at(element, items, format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
    }
}

fn exact_integer(n: f64) -> Option<Value> {
    (n.fract() == 0.0 && n.abs() <= MAX_EXACT_INT).then(|| Value::from(n as i64))
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
