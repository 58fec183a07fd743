// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! `JSON.stringify` and `JSON.parse`, backed by serde_json.

use super::{arg, namespace};
use crate::runtime::{Exception, NativeFunction, Value};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Creates the `JSON` global.
pub fn create() -> Value {
    namespace(vec![
        NativeFunction::sync("stringify", |_, _, args| {
            let Some(json) = arg(args, 0).to_json() else {
                return Ok(Value::Undefined);
            };
            let indent = match arg(args, 2) {
                Value::Number(n) if n >= 1.0 => " ".repeat(n.min(10.0) as usize),
                Value::String(s) => s.chars().take(10).collect(),
                _ => String::new(),
            };
            stringify(&json, &indent).map(Value::String)
        }),
        NativeFunction::sync("parse", |_, _, args| {
            let text = arg(args, 0).to_js_string();
            serde_json::from_str::<serde_json::Value>(&text)
                .map(|json| Value::from_json(&json))
                .map_err(|e| Exception::error("SyntaxError", format!("JSON.parse: {}", e)))
        }),
    ])
}

fn stringify(json: &serde_json::Value, indent: &str) -> Result<String, Exception> {
    let failed = |e: serde_json::Error| Exception::type_error(format!("JSON.stringify: {}", e));
    if indent.is_empty() {
        return serde_json::to_string(json).map_err(failed);
    }
    let mut out = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    json.serialize(&mut serializer).map_err(failed)?;
    String::from_utf8(out).map_err(|e| Exception::type_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::{Interpreter, Value};

    async fn eval(source: &str) -> Value {
        Interpreter::new().evaluate(source).await.unwrap()
    }

    #[tokio::test]
    async fn test_stringify_keeps_insertion_order() {
        assert_eq!(
            eval("JSON.stringify({ b: 1, a: [true, null, 'x'] })").await,
            Value::from(r#"{"b":1,"a":[true,null,"x"]}"#)
        );
        assert_eq!(eval("JSON.stringify(1.5)").await, Value::from("1.5"));
        assert_eq!(eval("JSON.stringify(undefined)").await, Value::Undefined);
    }

    #[tokio::test]
    async fn test_stringify_indent() {
        assert_eq!(
            eval("JSON.stringify({ a: 1 }, null, 2)").await,
            Value::from("{\n  \"a\": 1\n}")
        );
    }

    #[tokio::test]
    async fn test_parse() {
        assert_eq!(eval("JSON.parse('{\"n\": [1, 2]}').n[1]").await, Value::Number(2.0));
        let err = Interpreter::new().evaluate("JSON.parse('{')").await.unwrap_err();
        assert!(err.to_string().starts_with("SyntaxError: JSON.parse"));
    }
}
