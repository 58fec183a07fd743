// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module cache with in-flight deduplication.
//!
//! Completed modules live in a [`DashMap`] keyed by canonical path. A load
//! that is still running is kept as a [`Shared`] future, so every
//! concurrent request for the same path awaits the same compilation.
//! Failed loads are dropped, not cached.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use loom_script::Value;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{LoadError, Result};
use crate::path::{ModuleKind, ModulePath};

/// A compiled module.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    /// Canonical path
    pub path: ModulePath,
    /// Component or plain script
    pub kind: ModuleKind,
    /// What the factory returned
    pub value: Value,
}

type LoadFuture = Shared<BoxFuture<'static, Result<CompiledModule>>>;

/// Loader state: compiled modules and loads in progress.
#[derive(Default)]
pub struct ModuleCache {
    modules: DashMap<ModulePath, CompiledModule>,
    in_flight: DashMap<ModulePath, LoadFuture>,
    waits: WaitGraph,
}

impl ModuleCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// A compiled module.
    pub fn get(&self, path: &ModulePath) -> Option<CompiledModule> {
        self.modules.get(path).map(|entry| entry.clone())
    }

    /// Whether `path` has been compiled.
    pub fn contains(&self, path: &ModulePath) -> bool {
        self.modules.contains_key(path)
    }

    /// Whether a load of `path` is running.
    pub fn is_loading(&self, path: &ModulePath) -> bool {
        self.in_flight.contains_key(path)
    }

    /// Compiled paths, sorted.
    pub fn paths(&self) -> Vec<ModulePath> {
        let mut paths: Vec<_> = self.modules.iter().map(|entry| entry.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Number of compiled modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True when nothing has been compiled.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Returns the cached module, joins a running load, or starts `load`.
    ///
    /// At most one `load` runs per path at a time; the first successful
    /// result is the only one ever cached.
    pub async fn get_or_load<F>(&self, path: &ModulePath, load: F) -> Result<CompiledModule>
    where
        F: FnOnce() -> BoxFuture<'static, Result<CompiledModule>>,
    {
        if let Some(module) = self.get(path) {
            debug!("Cache hit for {}", path);
            return Ok(module);
        }

        let future = match self.in_flight.entry(path.clone()) {
            Entry::Occupied(entry) => {
                debug!("Joining in-flight load of {}", path);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                // A load may have finished between the lookup above and
                // taking the entry.
                if let Some(module) = self.get(path) {
                    return Ok(module);
                }
                let future = load().shared();
                entry.insert(future.clone());
                future
            }
        };

        let result = future.clone().await;
        match &result {
            Ok(module) => {
                let cached = self
                    .modules
                    .entry(path.clone())
                    .or_insert_with(|| module.clone())
                    .clone();
                self.in_flight.remove_if(path, |_, running| running.ptr_eq(&future));
                Ok(cached)
            }
            Err(_) => {
                self.in_flight.remove_if(path, |_, running| running.ptr_eq(&future));
                result
            }
        }
    }

    /// Records that the module at `from` waits for `to`.
    ///
    /// Fails with [`LoadError::CircularImport`] when `to` is `from` or
    /// already (transitively) waiting for `from`. Drop the returned guard
    /// once the wait is over.
    pub fn begin_wait(&self, from: &ModulePath, to: &ModulePath) -> Result<WaitGuard<'_>> {
        self.waits.add(from, to)?;
        Ok(WaitGuard {
            graph: &self.waits,
            from: from.clone(),
            to: to.clone(),
        })
    }
}

/// Edges "module A is waiting for module B" of loads in progress.
#[derive(Default)]
struct WaitGraph {
    edges: Mutex<HashMap<ModulePath, Vec<ModulePath>>>,
}

impl WaitGraph {
    fn add(&self, from: &ModulePath, to: &ModulePath) -> Result<()> {
        let mut edges = self.edges.lock();
        if let Some(mut chain) = path_between(&edges, to, from) {
            chain.push(to.clone());
            return Err(LoadError::CircularImport {
                chain: chain.into_iter().map(|p| p.to_string()).collect(),
            });
        }
        edges.entry(from.clone()).or_default().push(to.clone());
        Ok(())
    }

    fn remove(&self, from: &ModulePath, to: &ModulePath) {
        let mut edges = self.edges.lock();
        if let Some(targets) = edges.get_mut(from) {
            if let Some(index) = targets.iter().position(|t| t == to) {
                targets.swap_remove(index);
            }
            if targets.is_empty() {
                edges.remove(from);
            }
        }
    }
}

/// Depth-first search for a chain of waits from `start` to `goal`.
fn path_between(
    edges: &HashMap<ModulePath, Vec<ModulePath>>,
    start: &ModulePath,
    goal: &ModulePath,
) -> Option<Vec<ModulePath>> {
    let mut stack = vec![vec![start.clone()]];
    let mut seen = vec![start.clone()];
    while let Some(chain) = stack.pop() {
        let last = chain.last()?;
        if last == goal {
            return Some(chain);
        }
        for next in edges.get(last).into_iter().flatten() {
            if !seen.contains(next) {
                seen.push(next.clone());
                let mut extended = chain.clone();
                extended.push(next.clone());
                stack.push(extended);
            }
        }
    }
    None
}

/// Removes a wait edge when dropped.
pub struct WaitGuard<'a> {
    graph: &'a WaitGraph,
    from: ModulePath,
    to: ModulePath,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        self.graph.remove(&self.from, &self.to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn module(path: &str, n: f64) -> CompiledModule {
        CompiledModule {
            path: ModulePath::new(path),
            kind: ModuleKind::Script,
            value: Value::object([("n", Value::Number(n))]),
        }
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_future() {
        let cache = ModuleCache::new();
        let path = ModulePath::new("/a.js");
        let runs = Arc::new(AtomicUsize::new(0));

        let load = || {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(module("/a.js", 1.0))
            }
            .boxed()
        };

        let (first, second) = tokio::join!(cache.get_or_load(&path, load), cache.get_or_load(&path, load));
        let (first, second) = (first.unwrap(), second.unwrap());
        assert!(first.value.same(&second.value));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&path));
        assert!(!cache.is_loading(&path));

        let third = cache
            .get_or_load(&path, || async { Ok(module("/a.js", 2.0)) }.boxed())
            .await
            .unwrap();
        assert!(third.value.same(&first.value));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = ModuleCache::new();
        let path = ModulePath::new("/a.js");
        let err = cache
            .get_or_load(&path, || async { Err(LoadError::NotFound("/a.js".into())) }.boxed())
            .await;
        assert!(err.is_err());
        assert!(cache.is_empty());

        let ok = cache
            .get_or_load(&path, || async { Ok(module("/a.js", 1.0)) }.boxed())
            .await;
        assert!(ok.is_ok());
        assert_eq!(cache.paths(), vec![path]);
    }

    #[test]
    fn test_wait_graph_detects_cycles() {
        let cache = ModuleCache::new();
        let a = ModulePath::new("/a.js");
        let b = ModulePath::new("/b.js");
        let c = ModulePath::new("/c.js");

        let _ab = cache.begin_wait(&a, &b).unwrap();
        let bc = cache.begin_wait(&b, &c).unwrap();
        match cache.begin_wait(&c, &a) {
            Err(LoadError::CircularImport { chain }) => {
                assert_eq!(chain, vec!["/a.js", "/b.js", "/c.js", "/a.js"]);
            }
            _ => panic!("expected a circular import"),
        }
        assert!(cache.begin_wait(&a, &a).is_err());

        drop(bc);
        assert!(cache.begin_wait(&c, &a).is_ok());
    }
}
