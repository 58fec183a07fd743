// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lexical environments for variable binding.

use super::exception::Exception;
use super::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Shared handle to an environment. Closures keep their defining scope
/// alive through this.
pub type Scope = Arc<Environment>;

/// A lexical environment for variable bindings.
#[derive(Debug, Default)]
pub struct Environment {
    /// The bindings in this environment
    bindings: RwLock<FxHashMap<String, Binding>>,
    /// The outer (parent) environment
    outer: Option<Scope>,
}

/// A variable binding.
#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    mutable: bool,
}

impl Environment {
    /// Creates a new top-level environment.
    pub fn global() -> Scope {
        Arc::new(Self::default())
    }

    /// Creates a new environment nested inside `outer`.
    pub fn child(outer: &Scope) -> Scope {
        Arc::new(Self {
            bindings: RwLock::new(FxHashMap::default()),
            outer: Some(Arc::clone(outer)),
        })
    }

    /// Declares (or redeclares) a binding in this environment.
    pub fn declare(&self, name: impl Into<String>, value: Value, mutable: bool) {
        self.bindings
            .write()
            .insert(name.into(), Binding { value, mutable });
    }

    /// Looks a name up through the scope chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(binding) = self.bindings.read().get(name) {
            return Some(binding.value.clone());
        }
        self.outer.as_ref().and_then(|outer| outer.get(name))
    }

    /// Returns true if the name resolves anywhere in the scope chain.
    pub fn has(&self, name: &str) -> bool {
        self.bindings.read().contains_key(name)
            || self.outer.as_ref().is_some_and(|outer| outer.has(name))
    }

    /// Assigns to an existing binding.
    pub fn set(&self, name: &str, value: Value) -> Result<(), Exception> {
        {
            let mut bindings = self.bindings.write();
            if let Some(binding) = bindings.get_mut(name) {
                if !binding.mutable {
                    return Err(Exception::type_error("Assignment to constant variable."));
                }
                binding.value = value;
                return Ok(());
            }
        }
        match &self.outer {
            Some(outer) => outer.set(name, value),
            None => Err(Exception::reference_error(format!("{} is not defined", name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outward() {
        let global = Environment::global();
        global.declare("a", Value::Number(1.0), true);
        let inner = Environment::child(&global);
        inner.declare("b", Value::Number(2.0), true);

        assert_eq!(inner.get("a"), Some(Value::Number(1.0)));
        assert_eq!(inner.get("b"), Some(Value::Number(2.0)));
        assert_eq!(global.get("b"), None);
    }

    #[test]
    fn test_shadowing() {
        let global = Environment::global();
        global.declare("x", Value::from("outer"), true);
        let inner = Environment::child(&global);
        inner.declare("x", Value::from("inner"), true);
        inner.set("x", Value::from("changed")).unwrap();

        assert_eq!(global.get("x"), Some(Value::from("outer")));
        assert_eq!(inner.get("x"), Some(Value::from("changed")));
    }

    #[test]
    fn test_const_and_undeclared_assignment() {
        let global = Environment::global();
        global.declare("c", Value::Null, false);
        let err = global.set("c", Value::Undefined).unwrap_err();
        assert!(err.message().contains("constant"));

        let err = global.set("missing", Value::Undefined).unwrap_err();
        assert_eq!(err.to_string(), "ReferenceError: missing is not defined");
    }
}
