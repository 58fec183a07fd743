// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! String conversion function and string methods.
//!
//! Indices count Unicode scalar values rather than UTF-16 code units.

use super::{arg, relative_index};
use crate::runtime::{Exception, NativeFunction, Value};

/// Longest string, in bytes, that `repeat` and `padStart` will build.
pub const MAX_STRING_LENGTH: usize = 1 << 26;

fn invalid_length() -> Exception {
    Exception::range_error("Invalid string length")
}

/// Creates the `String` global.
pub fn create() -> Value {
    Value::native(
        NativeFunction::sync("String", |_, _, args| {
            Ok(Value::String(match args.first() {
                Some(value) => value.to_js_string(),
                None => String::new(),
            }))
        })
        .constructor(),
    )
}

fn this_string(this: &Value) -> String {
    match this {
        Value::String(s) => s.clone(),
        other => other.to_js_string(),
    }
}

fn string_arg(args: &[Value], index: usize) -> String {
    arg(args, index).to_js_string()
}

/// Looks up a string method by name.
pub fn method(name: &str) -> Option<NativeFunction> {
    let method = match name {
        "toUpperCase" => NativeFunction::sync("toUpperCase", |_, this, _| {
            Ok(Value::String(this_string(this).to_uppercase()))
        }),
        "toLowerCase" => NativeFunction::sync("toLowerCase", |_, this, _| {
            Ok(Value::String(this_string(this).to_lowercase()))
        }),
        "trim" => NativeFunction::sync("trim", |_, this, _| {
            Ok(Value::from(this_string(this).trim()))
        }),
        "includes" => NativeFunction::sync("includes", |_, this, args| {
            Ok(Value::Boolean(this_string(this).contains(&string_arg(args, 0))))
        }),
        "startsWith" => NativeFunction::sync("startsWith", |_, this, args| {
            Ok(Value::Boolean(this_string(this).starts_with(&string_arg(args, 0))))
        }),
        "endsWith" => NativeFunction::sync("endsWith", |_, this, args| {
            Ok(Value::Boolean(this_string(this).ends_with(&string_arg(args, 0))))
        }),
        "indexOf" => NativeFunction::sync("indexOf", |_, this, args| {
            let s = this_string(this);
            let index = s
                .find(&string_arg(args, 0))
                .map_or(-1.0, |byte| s[..byte].chars().count() as f64);
            Ok(Value::Number(index))
        }),
        "split" => NativeFunction::sync("split", |_, this, args| {
            let s = this_string(this);
            let parts: Vec<Value> = match arg(args, 0) {
                Value::Undefined => vec![Value::String(s)],
                separator => {
                    let separator = separator.to_js_string();
                    if separator.is_empty() {
                        s.chars().map(|c| Value::String(c.to_string())).collect()
                    } else {
                        s.split(separator.as_str()).map(Value::from).collect()
                    }
                }
            };
            Ok(Value::array(parts))
        }),
        "slice" => NativeFunction::sync("slice", |_, this, args| {
            let chars: Vec<char> = this_string(this).chars().collect();
            let start = relative_index(&arg(args, 0), chars.len(), 0);
            let end = relative_index(&arg(args, 1), chars.len(), chars.len());
            Ok(Value::String(
                chars.get(start..end.max(start)).unwrap_or_default().iter().collect(),
            ))
        }),
        "replace" => NativeFunction::sync("replace", |_, this, args| {
            // Only literal patterns; the first occurrence is replaced.
            let s = this_string(this);
            let pattern = string_arg(args, 0);
            let replacement = string_arg(args, 1);
            Ok(Value::String(s.replacen(&pattern, &replacement, 1)))
        }),
        "repeat" => NativeFunction::sync("repeat", |_, this, args| {
            let count = arg(args, 0).to_number();
            if count < 0.0 || count.is_infinite() {
                return Err(Exception::range_error(format!("Invalid count value: {}", count)));
            }
            let count = if count.is_nan() { 0 } else { count as usize };
            let s = this_string(this);
            match s.len().checked_mul(count) {
                Some(len) if len <= MAX_STRING_LENGTH => Ok(Value::String(s.repeat(count))),
                _ => Err(invalid_length()),
            }
        }),
        "padStart" => NativeFunction::sync("padStart", |_, this, args| {
            let s = this_string(this);
            let width = arg(args, 0).to_number().max(0.0);
            if width > MAX_STRING_LENGTH as f64 {
                return Err(invalid_length());
            }
            let width = width as usize;
            let fill = match arg(args, 1) {
                Value::Undefined => " ".to_string(),
                other => other.to_js_string(),
            };
            let len = s.chars().count();
            if len >= width || fill.is_empty() {
                return Ok(Value::String(s));
            }
            let padding: String = fill.chars().cycle().take(width - len).collect();
            Ok(Value::String(padding + &s))
        }),
        "toString" => NativeFunction::sync("toString", |_, this, _| Ok(Value::String(this_string(this)))),
        _ => return None,
    };
    Some(method)
}

#[cfg(test)]
mod tests {
    use crate::{Interpreter, Value};

    async fn eval(source: &str) -> Value {
        Interpreter::new()
            .evaluate(source)
            .await
            .unwrap_or_else(|e| panic!("{source}: {e}"))
    }

    #[tokio::test]
    async fn test_case_and_trim() {
        assert_eq!(eval("'  Hello '.trim().toUpperCase()").await, Value::from("HELLO"));
        assert_eq!(eval("'ABC'.toLowerCase()").await, Value::from("abc"));
    }

    #[tokio::test]
    async fn test_searching() {
        assert_eq!(eval("'counter.component'.endsWith('.component')").await, Value::Boolean(true));
        assert_eq!(eval("'./a/b'.startsWith('./')").await, Value::Boolean(true));
        assert_eq!(eval("'héllo'.indexOf('l')").await, Value::Number(2.0));
        assert_eq!(eval("'abc'.includes('d')").await, Value::Boolean(false));
    }

    #[tokio::test]
    async fn test_split_slice_replace_repeat() {
        assert_eq!(eval("'a,b,c'.split(',').length").await, Value::Number(3.0));
        assert_eq!(eval("'abc'.split('').join('-')").await, Value::from("a-b-c"));
        assert_eq!(eval("'component'.slice(-4)").await, Value::from("nent"));
        assert_eq!(eval("'a-a'.replace('a', 'b')").await, Value::from("b-a"));
        assert_eq!(eval("'ab'.repeat(3)").await, Value::from("ababab"));
        assert_eq!(eval("'7'.padStart(3, '0')").await, Value::from("007"));
    }

    #[tokio::test]
    async fn test_oversized_strings_throw_range_errors() {
        let source = "
            const caught = []
            for (const build of [() => 'ab'.repeat(1e19), () => 'x'.repeat(2 ** 40), () => '7'.padStart(1e12)]) {
                try { build() } catch (e) { caught.push(e.name + ': ' + e.message) }
            }
            return caught.join(' | ')
        ";
        assert_eq!(
            eval(source).await,
            Value::from("RangeError: Invalid string length | RangeError: Invalid string length | RangeError: Invalid string length")
        );
        assert_eq!(eval("''.repeat(1e19)").await, Value::from(""));
    }

    #[tokio::test]
    async fn test_length_and_index() {
        assert_eq!(eval("'abc'.length").await, Value::Number(3.0));
        assert_eq!(eval("'abc'[1]").await, Value::from("b"));
        assert_eq!(eval("String(12) + String(null)").await, Value::from("12null"));
    }
}
