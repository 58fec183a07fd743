// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Console built-in object.
//!
//! Output goes through `tracing` under the `loom::console` target instead of
//! stdout, so embedders decide where script logging ends up.

use super::namespace;
use crate::runtime::{NativeFunction, Value};
use tracing::{debug, error, info, warn};

fn format_args(args: &[Value]) -> String {
    args.iter()
        .map(Value::inspect)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Creates the `console` object.
pub fn create() -> Value {
    namespace(vec![
        NativeFunction::sync("log", |_, _, args| {
            info!(target: "loom::console", "{}", format_args(args));
            Ok(Value::Undefined)
        }),
        NativeFunction::sync("info", |_, _, args| {
            info!(target: "loom::console", "{}", format_args(args));
            Ok(Value::Undefined)
        }),
        NativeFunction::sync("debug", |_, _, args| {
            debug!(target: "loom::console", "{}", format_args(args));
            Ok(Value::Undefined)
        }),
        NativeFunction::sync("warn", |_, _, args| {
            warn!(target: "loom::console", "{}", format_args(args));
            Ok(Value::Undefined)
        }),
        NativeFunction::sync("error", |_, _, args| {
            error!(target: "loom::console", "{}", format_args(args));
            Ok(Value::Undefined)
        }),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_args() {
        let args = [Value::from("count:"), Value::Number(3.0), Value::object([("a", Value::from("x"))])];
        assert_eq!(format_args(&args), "count: 3 { a: 'x' }");
    }
}
