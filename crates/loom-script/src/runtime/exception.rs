// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

use super::object::ObjectRef;
use super::value::Value;
use std::fmt;

/// A thrown value unwinding through the interpreter.
#[derive(Debug, Clone)]
pub struct Exception {
    value: Value,
}

impl Exception {
    /// Wraps a thrown value.
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Creates an exception carrying a fresh error object of `kind`.
    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        Self::new(Value::Object(ObjectRef::error(kind, message)))
    }

    /// A `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::error("TypeError", message)
    }

    /// A `ReferenceError`.
    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::error("ReferenceError", message)
    }

    /// A `RangeError`.
    pub fn range_error(message: impl Into<String>) -> Self {
        Self::error("RangeError", message)
    }

    /// The thrown value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the exception, returning the thrown value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// The `message` of a thrown error object, or the thrown value as text.
    pub fn message(&self) -> String {
        match &self.value {
            Value::Object(object) if object.error_kind().is_some() => object
                .get("message")
                .map(|m| m.to_js_string())
                .unwrap_or_default(),
            other => other.to_js_string(),
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Object(object) if object.error_kind().is_some() => {
                write!(f, "{}", self.value)
            }
            other => write!(f, "Uncaught {}", other.inspect()),
        }
    }
}

impl std::error::Error for Exception {}
