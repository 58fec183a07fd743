// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Script value representation.

use super::function::{FunctionRef, NativeFunction};
use super::object::{ArrayRef, ObjectRef};
use std::fmt;
use std::sync::Arc;

/// A script value.
///
/// Values are thread-safe and can be shared between async tasks. Arrays,
/// objects and functions are references; everything else is copied.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// undefined
    #[default]
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Array reference
    Array(ArrayRef),
    /// Object reference
    Object(ObjectRef),
    /// Function reference
    Function(FunctionRef),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl Value {
    /// Wraps a native function.
    pub fn native(function: NativeFunction) -> Self {
        Value::Function(Arc::new(function.into()))
    }

    /// Creates an array value.
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(ArrayRef::new(values))
    }

    /// Creates an object value from ordered key/value pairs.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(ObjectRef::from_entries(entries))
    }

    /// Returns true if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true if this value is nullish (null or undefined).
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns true if this value is a function.
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Returns the object reference, if this is an object.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Reference identity for arrays, objects and functions; strict
    /// equality for everything else.
    pub fn same(&self, other: &Value) -> bool {
        self.strict_equals(other)
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::String(_))
            | (Value::String(_), Value::Number(_))
            | (Value::Boolean(_), _)
            | (_, Value::Boolean(_)) => {
                if self.is_reference() || other.is_reference() {
                    return false;
                }
                self.to_number() == other.to_number()
            }
            _ => self.strict_equals(other),
        }
    }

    fn is_reference(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_) | Value::Function(_))
    }

    /// Converts the value to a boolean (ToBoolean).
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    /// Converts the value to a number (ToNumber).
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(_) => string_to_number(&self.to_js_string()),
            Value::Object(_) | Value::Function(_) => f64::NAN,
        }
    }

    /// Converts the value to a string (ToString).
    pub fn to_js_string(&self) -> String {
        self.to_string()
    }

    /// Returns the type of this value as a string.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) | Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// Renders the value the way a console would, quoting nested strings.
    pub fn inspect(&self) -> String {
        let mut out = String::new();
        inspect_into(self, &mut out, 0, true);
        out
    }

    /// Converts the value to JSON. Functions and `undefined` are dropped
    /// from objects and become `null` inside arrays.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        self.to_json_at(0)
    }

    fn to_json_at(&self, depth: usize) -> Option<serde_json::Value> {
        use serde_json::Value as Json;
        if depth > MAX_DEPTH {
            return Some(Json::Null);
        }
        let json = match self {
            Value::Undefined | Value::Function(_) => return None,
            Value::Null => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(array) => Json::Array(
                array
                    .to_vec()
                    .iter()
                    .map(|v| v.to_json_at(depth + 1).unwrap_or(Json::Null))
                    .collect(),
            ),
            Value::Object(object) => Json::Object(
                object
                    .entries()
                    .into_iter()
                    .filter_map(|(k, v)| v.to_json_at(depth + 1).map(|v| (k, v)))
                    .collect(),
            ),
        };
        Some(json)
    }

    /// Builds a value from JSON.
    pub fn from_json(json: &serde_json::Value) -> Value {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Boolean(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::array(items.iter().map(Value::from_json).collect()),
            Json::Object(map) => {
                Value::object(map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))))
            }
        }
    }
}

const MAX_DEPTH: usize = 32;

fn number_to_json(n: f64) -> serde_json::Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Parses a string the way `Number(s)` does.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let radix = |prefix: &str| {
        trimmed
            .strip_prefix(prefix)
            .or_else(|| trimmed.strip_prefix(&prefix.to_uppercase()))
    };
    if let Some(hex) = radix("0x") {
        return i64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
    }
    if let Some(bin) = radix("0b") {
        return i64::from_str_radix(bin, 2).map_or(f64::NAN, |n| n as f64);
    }
    if let Some(oct) = radix("0o") {
        return i64::from_str_radix(oct, 8).map_or(f64::NAN, |n| n as f64);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts spellings such as "inf" and "nan" that scripts do not
        _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
            f64::NAN
        }
        _ => trimmed.parse().unwrap_or(f64::NAN),
    }
}

/// Formats a number the way `String(n)` does for common values.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        (if n > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(array) => {
                let parts: Vec<String> = array
                    .to_vec()
                    .iter()
                    .map(|v| {
                        if v.is_nullish() {
                            String::new()
                        } else {
                            v.to_string()
                        }
                    })
                    .collect();
                write!(f, "{}", parts.join(","))
            }
            Value::Object(object) => match object.error_kind() {
                Some(_) => {
                    let name = object.get("name").unwrap_or_default();
                    let message = object.get("message").unwrap_or_default();
                    if message.to_string().is_empty() {
                        write!(f, "{}", name)
                    } else {
                        write!(f, "{}: {}", name, message)
                    }
                }
                None => write!(f, "[object Object]"),
            },
            Value::Function(function) => write!(f, "function {}() {{ [code] }}", function.name()),
        }
    }
}

fn inspect_into(value: &Value, out: &mut String, depth: usize, top: bool) {
    match value {
        Value::String(s) if !top => {
            out.push('\'');
            out.push_str(s);
            out.push('\'');
        }
        Value::Array(array) => {
            if depth > 2 {
                out.push_str("[Array]");
                return;
            }
            let values = array.to_vec();
            if values.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push_str("[ ");
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                inspect_into(v, out, depth + 1, false);
            }
            out.push_str(" ]");
        }
        Value::Object(object) if object.error_kind().is_none() => {
            if depth > 2 {
                out.push_str("[Object]");
                return;
            }
            let entries = object.entries();
            if entries.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{ ");
            for (i, (key, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if is_plain_key(key) {
                    out.push_str(key);
                } else {
                    out.push('\'');
                    out.push_str(key);
                    out.push('\'');
                }
                out.push_str(": ");
                inspect_into(v, out, depth + 1, false);
            }
            out.push_str(" }");
        }
        Value::Function(function) => {
            out.push_str("[Function: ");
            out.push_str(function.name());
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.5), "0.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1f"), 31.0);
        assert_eq!(string_to_number("1e3"), 1000.0);
        assert!(string_to_number("abc").is_nan());
        assert!(string_to_number("inf").is_nan());
    }

    #[test]
    fn test_equality() {
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.strict_equals(&Value::Undefined));
        assert!(Value::from("1").loose_equals(&Value::Number(1.0)));
        assert!(Value::Boolean(true).loose_equals(&Value::Number(1.0)));
        assert!(!Value::Number(f64::NAN).strict_equals(&Value::Number(f64::NAN)));
    }

    #[test]
    fn test_reference_identity() {
        let a = Value::object([("x", Value::Number(1.0))]);
        let b = Value::object([("x", Value::Number(1.0))]);
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
    }

    #[test]
    fn test_to_boolean_and_type_of() {
        assert!(!Value::from("").to_boolean());
        assert!(Value::array(vec![]).to_boolean());
        assert_eq!(Value::Null.type_of(), "object");
        assert_eq!(Value::array(vec![]).type_of(), "object");
    }

    #[test]
    fn test_display_and_inspect() {
        let value = Value::object([
            ("a", Value::Number(1.0)),
            ("b-c", Value::from("x")),
            ("d", Value::array(vec![Value::Number(1.0), Value::Null])),
        ]);
        assert_eq!(value.to_string(), "[object Object]");
        assert_eq!(value.inspect(), "{ a: 1, 'b-c': 'x', d: [ 1, null ] }");
        assert_eq!(Value::array(vec![Value::Number(1.0), Value::Undefined]).to_string(), "1,");
        assert_eq!(Value::from("top").inspect(), "top");
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"x": 42, "list": [1, "two", null], "nested": {"ok": true}});
        let value = Value::from_json(&json);
        assert_eq!(value.to_json(), Some(json));
        assert_eq!(Value::Undefined.to_json(), None);
    }
}
