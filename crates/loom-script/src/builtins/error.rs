// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error constructors.

use super::arg;
use crate::runtime::{NativeFunction, ObjectRef, Value};

const KINDS: [&str; 5] = ["Error", "TypeError", "RangeError", "ReferenceError", "SyntaxError"];

/// The error constructors, keyed by global name.
pub fn constructors() -> Vec<(&'static str, Value)> {
    KINDS
        .iter()
        .map(|&kind| {
            let constructor = NativeFunction::sync(kind, move |_, _, args| {
                let message = arg(args, 0);
                let message = if message.is_undefined() {
                    String::new()
                } else {
                    message.to_js_string()
                };
                Ok(Value::Object(ObjectRef::error(kind, message)))
            })
            .constructor();
            (kind, Value::native(constructor))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::{Interpreter, Value};

    #[tokio::test]
    async fn test_error_construction() {
        let interpreter = Interpreter::new();
        let value = interpreter
            .evaluate("const e = new TypeError('bad input'); [e.name, e.message, String(e)].join('|')")
            .await
            .unwrap();
        assert_eq!(value, Value::from("TypeError|bad input|TypeError: bad input"));
    }

    #[tokio::test]
    async fn test_error_without_new_and_instanceof() {
        let interpreter = Interpreter::new();
        let value = interpreter
            .evaluate("const e = RangeError(); [e instanceof Error, e instanceof RangeError, e instanceof TypeError].join()")
            .await
            .unwrap();
        assert_eq!(value, Value::from("true,true,false"));
    }
}
