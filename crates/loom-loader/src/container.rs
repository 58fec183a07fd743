// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Pre-registered, host-provided modules.

use loom_script::Value;
use std::collections::BTreeMap;

use crate::path::capitalize;

/// Name to value map consulted before anything is fetched.
///
/// Values are converted once on insert, so every lookup of a name returns
/// the same object.
#[derive(Debug, Clone, Default)]
pub struct Container {
    entries: BTreeMap<String, Value>,
}

impl Container {
    /// An empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), value);
    }

    /// Builder form of [`Container::insert`].
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Register a JSON value under `name`.
    pub fn insert_json(&mut self, name: impl Into<String>, json: &serde_json::Value) {
        self.insert(name, Value::from_json(json));
    }

    /// Exact lookup.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.entries.get(name).cloned()
    }

    /// Exact lookup, then the capitalized name (`counter` -> `Counter`).
    pub fn find(&self, name: &str) -> Option<Value> {
        self.get(name).or_else(|| {
            let capitalized = capitalize(name);
            if capitalized == name {
                None
            } else {
                self.get(&capitalized)
            }
        })
    }

    /// Registered names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Container {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut container = Container::new();
        for (name, value) in iter {
            container.insert(name, value);
        }
        container
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalized_fallback_returns_same_object() {
        let mut container = Container::new();
        container.insert_json("Counter", &serde_json::json!({ "name": "counter" }));

        let exact = container.find("Counter").unwrap();
        let lower = container.find("counter").unwrap();
        assert!(exact.same(&lower));
        assert!(container.find("widget").is_none());
    }

    #[test]
    fn test_from_iter() {
        let container: Container = vec![("a", Value::Number(1.0)), ("b", Value::Null)].into_iter().collect();
        assert_eq!(container.len(), 2);
        assert_eq!(container.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
