// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Number and Boolean conversions, plus the numeric global functions.

use super::{arg, function_with_statics};
use crate::runtime::{number_to_string, Exception, NativeFunction, Value};

/// `Number`, `Boolean`, `parseInt`, `parseFloat` and `isNaN`.
pub fn globals() -> Vec<(&'static str, Value)> {
    let number = NativeFunction::sync("Number", |_, _, args| {
        Ok(Value::Number(args.first().map_or(0.0, Value::to_number)))
    })
    .constructor();
    let number = function_with_statics(
        number,
        vec![
            NativeFunction::sync("isInteger", |_, _, args| {
                Ok(Value::Boolean(matches!(
                    arg(args, 0),
                    Value::Number(n) if n.is_finite() && n.fract() == 0.0
                )))
            }),
            NativeFunction::sync("isFinite", |_, _, args| {
                Ok(Value::Boolean(matches!(arg(args, 0), Value::Number(n) if n.is_finite())))
            }),
        ],
    );

    vec![
        ("Number", number),
        (
            "Boolean",
            Value::native(
                NativeFunction::sync("Boolean", |_, _, args| {
                    Ok(Value::Boolean(arg(args, 0).to_boolean()))
                })
                .constructor(),
            ),
        ),
        (
            "parseInt",
            Value::native(NativeFunction::sync("parseInt", |_, _, args| {
                let radix = match arg(args, 1) {
                    Value::Undefined => 10,
                    other => other.to_number() as u32,
                };
                Ok(Value::Number(parse_int(&arg(args, 0).to_js_string(), radix)))
            })),
        ),
        (
            "parseFloat",
            Value::native(NativeFunction::sync("parseFloat", |_, _, args| {
                Ok(Value::Number(parse_float(&arg(args, 0).to_js_string())))
            })),
        ),
        (
            "isNaN",
            Value::native(NativeFunction::sync("isNaN", |_, _, args| {
                Ok(Value::Boolean(arg(args, 0).to_number().is_nan()))
            })),
        ),
    ]
}

/// Parses the longest valid integer prefix.
fn parse_int(s: &str, radix: u32) -> f64 {
    let s = s.trim_start();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, s) = match (radix, s.get(..2)) {
        (0 | 16, Some("0x" | "0X")) => (16, &s[2..]),
        (0, _) => (10, s),
        (radix, _) => (radix, s),
    };
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    let digits: String = s.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    let value = digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
    if negative {
        -value
    } else {
        value
    }
}

/// Parses the longest valid decimal prefix.
fn parse_float(s: &str) -> f64 {
    let s = s.trim_start();
    if s.starts_with("Infinity") || s.starts_with("+Infinity") {
        return f64::INFINITY;
    }
    if s.starts_with("-Infinity") {
        return f64::NEG_INFINITY;
    }
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let bytes = s.as_bytes();
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {}
            b'+' | b'-' if end == 0 || matches!(bytes[end - 1], b'e' | b'E') => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if !seen_exp && end > 0 => seen_exp = true,
            _ => break,
        }
        end += 1;
    }
    // Back off trailing characters that do not complete a number.
    while end > 0 {
        if let Ok(value) = s[..end].parse::<f64>() {
            return value;
        }
        end -= 1;
    }
    f64::NAN
}

/// Looks up a number method by name.
pub fn method(name: &str) -> Option<NativeFunction> {
    let method = match name {
        "toFixed" => NativeFunction::sync("toFixed", |_, this, args| {
            let digits = arg(args, 0).to_number();
            let digits = if digits.is_nan() { 0.0 } else { digits };
            if !(0.0..=100.0).contains(&digits) {
                return Err(Exception::range_error(
                    "toFixed() digits argument must be between 0 and 100",
                ));
            }
            Ok(Value::String(format!(
                "{:.*}",
                digits as usize,
                this.to_number()
            )))
        }),
        "toString" => NativeFunction::sync("toString", |_, this, _| {
            Ok(Value::String(number_to_string(this.to_number())))
        }),
        _ => return None,
    };
    Some(method)
}
