// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Built-in globals.
//!
//! The global surface is deliberately small: console, the error
//! constructors, `Object`, `Array`, `JSON`, `Math` and the primitive
//! conversion functions. Methods of arrays, strings, numbers and objects are
//! resolved on property access through the `method` function of each module.

pub mod array;
pub mod console;
pub mod error;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod string;

use crate::runtime::{FunctionObject, NativeFunction, ObjectRef, Scope, Value};
use std::sync::Arc;

/// Installs every built-in global into `globals`.
pub fn install(globals: &Scope) {
    globals.declare("undefined", Value::Undefined, false);
    globals.declare("NaN", Value::Number(f64::NAN), false);
    globals.declare("Infinity", Value::Number(f64::INFINITY), false);

    globals.declare("console", console::create(), false);
    for (name, value) in error::constructors() {
        globals.declare(name, value, false);
    }
    globals.declare("Object", object::create(), false);
    globals.declare("Array", array::create(), false);
    globals.declare("JSON", json::create(), false);
    globals.declare("Math", math::create(), false);
    globals.declare("String", string::create(), false);
    for (name, value) in number::globals() {
        globals.declare(name, value, false);
    }
}

/// Builds a plain object whose properties are the given native functions.
pub(crate) fn namespace(functions: Vec<NativeFunction>) -> Value {
    Value::Object(ObjectRef::from_entries(
        functions
            .into_iter()
            .map(|function| (function.name.clone(), Value::native(function))),
    ))
}

/// Builds a callable function value that also carries static methods.
pub(crate) fn function_with_statics(function: NativeFunction, statics: Vec<NativeFunction>) -> Value {
    let object = FunctionObject::from(function);
    for method in statics {
        object.properties.set(method.name.clone(), Value::native(method));
    }
    Value::Function(Arc::new(object))
}

/// Returns argument `index`, or `undefined`.
pub(crate) fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// Resolves a relative index argument (negative counts from the end).
pub(crate) fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if value.is_undefined() {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        (n as usize).min(len)
    }
}
