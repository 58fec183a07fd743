// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Function representation.

use super::environment::Scope;
use super::exception::Exception;
use super::object::ObjectRef;
use super::value::Value;
use crate::ast;
use crate::interpreter::Interpreter;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

/// Signature of a native (Rust) function: interpreter, `this`, arguments.
pub type NativeFn = dyn Fn(Interpreter, Value, Vec<Value>) -> BoxFuture<'static, Result<Value, Exception>>
    + Send
    + Sync;

/// A function defined in script source, with its captured scope.
#[derive(Clone)]
pub struct Closure {
    /// The function definition
    pub function: Arc<ast::Function>,
    /// The scope the function was created in
    pub scope: Scope,
    /// Lexical `this` for arrow functions
    pub this: Option<Value>,
}

impl std::fmt::Debug for Closure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The captured scope usually contains the closure itself.
        write!(f, "Closure({})", self.function.name.as_deref().unwrap_or("<anonymous>"))
    }
}

/// A native (Rust) function.
#[derive(Clone)]
pub struct NativeFunction {
    /// The function name
    pub name: String,
    /// Whether `new` may be used with this function
    pub constructor: bool,
    func: Arc<NativeFn>,
}

impl NativeFunction {
    /// Creates a native function from an async closure.
    pub fn new<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Interpreter, Value, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, Exception>> + Send + 'static,
    {
        Self {
            name: name.into(),
            constructor: false,
            func: Arc::new(move |interpreter, this, args| func(interpreter, this, args).boxed()),
        }
    }

    /// Creates a native function that completes without suspending.
    pub fn sync<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Interpreter, &Value, &[Value]) -> Result<Value, Exception> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            constructor: false,
            func: Arc::new(move |interpreter, this, args| {
                futures::future::ready(func(&interpreter, &this, &args)).boxed()
            }),
        }
    }

    /// Marks the function as usable with `new`.
    pub fn constructor(mut self) -> Self {
        self.constructor = true;
        self
    }

    /// Invokes the function.
    pub fn invoke(
        &self,
        interpreter: Interpreter,
        this: Value,
        args: Vec<Value>,
    ) -> BoxFuture<'static, Result<Value, Exception>> {
        (self.func)(interpreter, this, args)
    }
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

/// A callable value - either a script closure or a native function.
#[derive(Debug, Clone)]
pub enum Callable {
    /// A script function
    Closure(Closure),
    /// A native Rust function
    Native(NativeFunction),
}

/// A function value: the callable plus its own properties
/// (`Object.keys`, `JSON.stringify` and friends hang off functions).
#[derive(Debug)]
pub struct FunctionObject {
    /// What runs when the function is called
    pub callable: Callable,
    /// Own properties
    pub properties: ObjectRef,
}

/// Shared reference to a function value.
pub type FunctionRef = Arc<FunctionObject>;

impl FunctionObject {
    /// Returns the function's name, or the empty string.
    pub fn name(&self) -> &str {
        match &self.callable {
            Callable::Closure(closure) => closure.function.name.as_deref().unwrap_or(""),
            Callable::Native(native) => &native.name,
        }
    }

    /// Returns true if `new` may be used with this function.
    pub fn is_constructor(&self) -> bool {
        matches!(&self.callable, Callable::Native(native) if native.constructor)
    }
}

impl From<Callable> for FunctionObject {
    fn from(callable: Callable) -> Self {
        Self {
            callable,
            properties: ObjectRef::new(),
        }
    }
}

impl From<NativeFunction> for FunctionObject {
    fn from(native: NativeFunction) -> Self {
        Callable::Native(native).into()
    }
}

impl From<Closure> for FunctionObject {
    fn from(closure: Closure) -> Self {
        Callable::Closure(closure).into()
    }
}
