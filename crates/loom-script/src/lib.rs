// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # loom-script
//!
//! An embeddable, asynchronous interpreter for the script subset used by
//! loom components.
//!
//! ## Overview
//!
//! This crate provides:
//! - A span-preserving lexer, also used by the component transpiler
//! - A recursive descent parser for functions, closures, destructuring,
//!   template literals, optional chaining and `async`/`await`
//! - A tree-walking interpreter whose evaluation steps are futures, so a
//!   script can `await` host operations
//! - A small standard library (`console`, `JSON`, `Math`, `Object`,
//!   `Array`, errors and primitive conversions)
//!
//! ## Quick Start
//!
//! ```rust
//! use loom_script::{Interpreter, Value};
//!
//! # tokio_test::block_on(async {
//! let interpreter = Interpreter::new();
//! let result = interpreter.evaluate("const [a, b] = [1, 2]; a + b").await?;
//! assert_eq!(result, Value::Number(3.0));
//! # Ok::<(), loom_script::Error>(())
//! # }).unwrap();
//! ```
//!
//! Host functions are plain Rust closures or async blocks wrapped in a
//! [`NativeFunction`] and installed with [`Interpreter::define_global`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod builtins;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod runtime;

pub use error::{Error, Result};
pub use interpreter::Interpreter;
pub use runtime::{ArrayRef, Exception, FunctionRef, NativeFunction, ObjectRef, Value};
