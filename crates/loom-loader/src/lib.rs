// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # loom-loader
//!
//! Runtime loader for single-file components.
//!
//! A component file (`.component`, `.vue`) carries a `<template>`, a
//! `<script>` and an optional `<style>`. The loader:
//!
//! - normalizes import specifiers into canonical paths
//! - fetches documents over HTTP, from disk or from memory
//! - extracts the style, template and script fragments
//! - rewrites `import`/`export` statements into calls on a per-module
//!   `__loader` handle and wraps the script into an async factory
//! - evaluates the factory with [`loom_script`] and caches the result, one
//!   compilation per canonical path
//!
//! ## Quick Start
//!
//! ```rust
//! use loom_loader::{Container, Loader, LoaderConfig, MemoryFetcher};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let fetcher = MemoryFetcher::new()
//!     .with("/app/main.component", r#"
//!         <template><p>{{ greeting }}</p></template>
//!         <script>
//!         import { greeting } from '../shared/text';
//!         export default { name: 'main', greeting };
//!         </script>"#)
//!     .with("/shared/text.js", "export const greeting = 'hello';");
//!
//! let loader = Loader::load(
//!     "/app/main.component",
//!     Arc::new(fetcher),
//!     Container::new(),
//!     LoaderConfig::default(),
//! )
//! .await?;
//!
//! let main = loader.lookup("/app/main.component")?;
//! assert_eq!(
//!     main.inspect(),
//!     "{ name: 'main', greeting: 'hello', template: '<p>{{ greeting }}</p>' }"
//! );
//! # Ok::<(), loom_loader::LoadError>(())
//! # }).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod container;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod loader;
pub mod path;
pub mod report;
pub mod transpile;

// Re-exports
pub use cache::{CompiledModule, ModuleCache};
pub use config::{ErrorPolicy, LoaderConfig};
pub use container::Container;
pub use error::{FetchError, LoadError, Result};
pub use extract::{extract, ComponentFragments, FragmentParser, HtmlFragmentParser};
pub use fetch::{CachePolicy, Fetcher, FsFetcher, HttpFetcher, MemoryFetcher};
pub use loader::{LoadPlan, Loader, LoaderBuilder, NoopRegistrar, Registrar};
pub use path::{normalize, ModuleKind, ModulePath, PathStyle};
pub use report::{CollectingReporter, ErrorReport, ErrorReporter, TracingReporter};
pub use transpile::{TranspiledSource, Transpiler};
