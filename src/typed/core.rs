// typed/core.rs
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Declared conversion type of a handler parameter or argument-model field.
///
/// Wire data is untyped text; a `ParamType` only says what the text should
/// become *if it can*. See [`convert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Keep the raw text
    #[default]
    Str,
    /// Signed 64-bit integer
    Int,
    /// 64-bit float (finite values only)
    Float,
    /// `true`/`false`/`1`/`0`, case-insensitive
    Bool,
    /// Any JSON document
    Json,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Str => "str",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Bool => "bool",
            ParamType::Json => "json",
        };
        f.write_str(name)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") || raw == "1" {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") || raw == "0" {
        Some(false)
    } else {
        None
    }
}

fn try_convert(raw: &str, ty: ParamType) -> Option<Value> {
    match ty {
        ParamType::Str => Some(Value::String(raw.to_string())),
        ParamType::Int => raw.trim().parse::<i64>().ok().map(Value::from),
        ParamType::Float => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        ParamType::Bool => parse_bool(raw).map(Value::Bool),
        ParamType::Json => serde_json::from_str(raw).ok(),
    }
}

/// Best-effort conversion of a raw wire string to `ty`.
///
/// Never fails: when the text does not convert, the original string is
/// returned unchanged as `Value::String`.
///
/// ```
/// use agirouter::typed::{convert, ParamType};
/// use serde_json::json;
///
/// assert_eq!(convert("55", ParamType::Int), json!(55));
/// assert_eq!(convert("fifty", ParamType::Int), json!("fifty"));
/// ```
#[must_use]
pub fn convert(raw: &str, ty: ParamType) -> Value {
    try_convert(raw, ty).unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Best-effort conversion of an already-structured value (typically a
/// declared default) to `ty`.
///
/// Strings go through [`convert`]. Other values are converted only when no
/// information is lost; anything else, including `null`, is returned as-is.
#[must_use]
pub fn convert_value(value: Value, ty: ParamType) -> Value {
    match (ty, value) {
        (_, Value::String(s)) => convert(&s, ty),
        (ParamType::Str, Value::Number(n)) => Value::String(n.to_string()),
        (ParamType::Str, Value::Bool(b)) => Value::String(b.to_string()),
        (ParamType::Int, Value::Number(n)) => match n.as_i64() {
            Some(i) => Value::from(i),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    Value::from(f as i64)
                }
                _ => Value::Number(n),
            },
        },
        (ParamType::Float, Value::Number(n)) => n
            .as_f64()
            .and_then(Number::from_f64)
            .map_or(Value::Number(n), Value::Number),
        (_, other) => other,
    }
}
