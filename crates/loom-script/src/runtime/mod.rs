// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime types: values, objects, functions, scopes and exceptions.

pub mod environment;
pub mod exception;
pub mod function;
pub mod object;
pub mod value;

pub use environment::{Environment, Scope};
pub use exception::Exception;
pub use function::{Callable, Closure, FunctionObject, FunctionRef, NativeFunction};
pub use object::{ArrayRef, ObjectClass, ObjectRef};
pub use value::{number_to_string, string_to_number, Value};
