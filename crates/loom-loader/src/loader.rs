// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The loader: fetch, extract, transpile, evaluate, cache, register.
//!
//! Resolution order for a requested path, first match wins:
//!
//! 1. the module cache
//! 2. the container, under the exact name
//! 3. the container, under the capitalized name
//! 4. fetch and compile (deduplicated per path)
//!
//! Each module factory receives its own `__loader` handle with two
//! methods: `load(path)` resolves an import on behalf of that module, and
//! `handleError(e)` reports an error raised by its body.

use futures::future::{join_all, BoxFuture, FutureExt};
use loom_script::{Exception, Interpreter, NativeFunction, ObjectRef, Value};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

use crate::cache::{CompiledModule, ModuleCache};
use crate::config::LoaderConfig;
use crate::container::Container;
use crate::error::{FetchError, LoadError, Result};
use crate::extract::{extract, FragmentParser, HtmlFragmentParser};
use crate::fetch::Fetcher;
use crate::path::{normalize, ModuleKind, ModulePath};
use crate::report::{ErrorReport, ErrorReporter, TracingReporter};
use crate::transpile::{TranspiledSource, Transpiler};

/// Receives every freshly compiled module, e.g. to register components
/// with a UI layer.
pub trait Registrar: Send + Sync {
    /// Called once per compiled module.
    fn register(&self, module: &CompiledModule);
}

/// A [`Registrar`] that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRegistrar;

impl Registrar for NoopRegistrar {
    fn register(&self, _module: &CompiledModule) {}
}

/// Explicit dependency graph: scripts first, then components, then the
/// main entry.
#[derive(Debug, Clone, Default)]
pub struct LoadPlan {
    /// Plain script modules, loaded concurrently
    pub scripts: Vec<String>,
    /// Component modules, loaded concurrently once the scripts are done
    pub components: Vec<String>,
    /// The entry loaded last
    pub main: String,
}

/// Opening tag of the style element spliced into component templates.
const STYLE_OPEN: &str = r#"<component is="style" type="text/css">"#;
const STYLE_CLOSE: &str = "</component>";

/// Builder for [`Loader`].
pub struct LoaderBuilder {
    fetcher: Arc<dyn Fetcher>,
    container: Container,
    config: LoaderConfig,
    reporter: Arc<dyn ErrorReporter>,
    registrar: Arc<dyn Registrar>,
    fragments: Arc<dyn FragmentParser>,
}

impl LoaderBuilder {
    /// Pre-registered modules.
    pub fn container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    /// Loader configuration.
    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Where module errors are reported.
    pub fn reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Who receives compiled modules.
    pub fn registrar(mut self, registrar: Arc<dyn Registrar>) -> Self {
        self.registrar = registrar;
        self
    }

    /// HTML fragment parser used for component documents.
    pub fn fragment_parser(mut self, parser: Arc<dyn FragmentParser>) -> Self {
        self.fragments = parser;
        self
    }

    /// Build the loader.
    pub fn build(self) -> Result<Loader> {
        self.config.validate()?;
        let mut interpreter = Interpreter::new();
        if let Some(limit) = self.config.step_limit {
            interpreter = interpreter.with_step_limit(limit);
        }
        let transpiler = Transpiler::new(self.config.path_style, self.config.default_extension.clone());

        Ok(Loader {
            inner: Arc::new(LoaderInner {
                config: self.config,
                fetcher: self.fetcher,
                container: self.container,
                reporter: self.reporter,
                registrar: self.registrar,
                fragments: self.fragments,
                cache: ModuleCache::new(),
                interpreter,
                transpiler,
            }),
        })
    }
}

struct LoaderInner {
    config: LoaderConfig,
    fetcher: Arc<dyn Fetcher>,
    container: Container,
    reporter: Arc<dyn ErrorReporter>,
    registrar: Arc<dyn Registrar>,
    fragments: Arc<dyn FragmentParser>,
    cache: ModuleCache,
    interpreter: Interpreter,
    transpiler: Transpiler,
}

/// A component loader. Cloning is cheap; clones share all state.
#[derive(Clone)]
pub struct Loader {
    inner: Arc<LoaderInner>,
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("config", &self.inner.config)
            .field("cached", &self.inner.cache.len())
            .finish()
    }
}

/// Errors raised by a module's `__loader.load`, keyed by the thrown object.
type RaisedErrors = Arc<Mutex<Vec<(ObjectRef, LoadError)>>>;

impl Loader {
    /// Start building a loader that fetches through `fetcher`.
    pub fn builder(fetcher: Arc<dyn Fetcher>) -> LoaderBuilder {
        LoaderBuilder {
            fetcher,
            container: Container::new(),
            config: LoaderConfig::default(),
            reporter: Arc::new(TracingReporter),
            registrar: Arc::new(NoopRegistrar),
            fragments: Arc::new(HtmlFragmentParser),
        }
    }

    /// Create a loader and resolve `entry` with it.
    pub async fn load(
        entry: &str,
        fetcher: Arc<dyn Fetcher>,
        container: Container,
        config: LoaderConfig,
    ) -> Result<Loader> {
        let loader = Self::builder(fetcher).container(container).config(config).build()?;
        loader.resolve(entry).await?;
        Ok(loader)
    }

    /// The configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    /// The module cache.
    pub fn cache(&self) -> &ModuleCache {
        &self.inner.cache
    }

    /// The container.
    pub fn container(&self) -> &Container {
        &self.inner.container
    }

    /// Canonical path for a specifier written at the page root.
    pub fn canonical(&self, specifier: &str) -> ModulePath {
        normalize(specifier, &[], self.inner.config.path_style)
            .with_default_extension(&self.inner.config.default_extension)
    }

    /// Resolve a module by specifier.
    pub async fn resolve(&self, specifier: &str) -> Result<Value> {
        let path = self.canonical(specifier);
        self.resolve_path(None, path).await
    }

    /// Look up an already available module without fetching: cache, then
    /// container, then capitalized container name.
    pub fn lookup(&self, name: &str) -> Result<Value> {
        let path = self.canonical(name);
        if let Some(module) = self.inner.cache.get(&path) {
            return Ok(module.value);
        }
        self.inner
            .container
            .find(path.as_str())
            .ok_or_else(|| LoadError::NotFound(name.to_string()))
    }

    /// Fetch, extract and transpile a module without evaluating or caching
    /// it.
    pub async fn source(&self, specifier: &str) -> Result<TranspiledSource> {
        let path = self.canonical(specifier);
        let text = self.fetch(&path).await?;
        let kind = path.kind(&self.inner.config.component_extensions);
        let fragments = extract(self.inner.fragments.as_ref(), kind, &text);
        self.inner
            .transpiler
            .transpile(&path, &fragments.script)
            .map_err(|e| LoadError::syntax(path.as_str(), e.to_string()))
    }

    /// Resolve several entries concurrently. One failure does not affect
    /// the others.
    pub async fn load_all<S: AsRef<str>>(&self, entries: &[S]) -> Vec<(ModulePath, Result<Value>)> {
        let loads = entries.iter().map(|entry| {
            let path = self.canonical(entry.as_ref());
            async move {
                let result = self.resolve_path(None, path.clone()).await;
                match &result {
                    Ok(_) => info!("Loaded {}", path),
                    Err(e) => warn!("Failed to load {}: {}", path, e),
                }
                (path, result)
            }
        });
        join_all(loads).await
    }

    /// Run a [`LoadPlan`]. Each phase runs concurrently and completes
    /// before the next starts; the first failure of a phase is returned
    /// once that phase has finished.
    pub async fn load_plan(&self, plan: &LoadPlan) -> Result<Value> {
        for phase in [&plan.scripts, &plan.components] {
            let results = self.load_all(phase).await;
            if let Some((_, Err(e))) = results.into_iter().find(|(_, r)| r.is_err()) {
                return Err(e);
            }
        }
        self.resolve(&plan.main).await
    }

    fn resolve_path(&self, importer: Option<ModulePath>, path: ModulePath) -> BoxFuture<'static, Result<Value>> {
        let loader = self.clone();
        async move {
            let inner = &loader.inner;
            if let Some(module) = inner.cache.get(&path) {
                debug!("Cache hit for {}", path);
                return Ok(module.value);
            }
            if let Some(value) = inner.container.find(path.as_str()) {
                debug!("Container hit for {}", path);
                return Ok(value);
            }

            let _wait = match &importer {
                Some(from) => Some(inner.cache.begin_wait(from, &path)?),
                None => None,
            };
            let compile = {
                let loader = loader.clone();
                let path = path.clone();
                move || loader.compile(path).boxed()
            };
            let module = inner.cache.get_or_load(&path, compile).await?;
            Ok(module.value)
        }
        .boxed()
    }

    async fn compile(self, path: ModulePath) -> Result<CompiledModule> {
        let inner = &self.inner;
        let text = self.fetch(&path).await?;
        let kind = path.kind(&inner.config.component_extensions);
        let fragments = extract(inner.fragments.as_ref(), kind, &text);

        let transpiled = inner
            .transpiler
            .transpile(&path, &fragments.script)
            .map_err(|e| self.syntax_error(&path, e.to_string()))?;
        for warning in &transpiled.warnings {
            warn!("{}", warning);
        }

        let preloaded = if inner.config.preload_imports {
            self.preload(&path, &transpiled).await
        } else {
            HashMap::new()
        };

        let factory = inner
            .interpreter
            .eval_function(&transpiled.wrapped(inner.config.error_policy))
            .map_err(|e| self.syntax_error(&path, e.message()))?;

        let raised: RaisedErrors = Arc::default();
        let handle = self.module_handle(&path, preloaded, Arc::clone(&raised));
        let value = inner
            .interpreter
            .with_fresh_budget()
            .call(&factory, Value::Undefined, vec![handle])
            .await
            .map_err(|exception| self.evaluation_error(&path, exception, &raised))?;

        if kind == ModuleKind::Component {
            attach_markup(&value, &fragments.template, &fragments.style);
        }

        let module = CompiledModule { path, kind, value };
        inner.registrar.register(&module);
        debug!("Compiled {}", module.path);
        Ok(module)
    }

    async fn fetch(&self, path: &ModulePath) -> Result<String> {
        debug!("Fetching {}", path);
        self.inner
            .fetcher
            .fetch(path.as_str(), self.inner.config.cache_policy())
            .await
            .map_err(|e| match e {
                FetchError::NotFound(_) if path.is_bare() => LoadError::NotFound(path.to_string()),
                other => LoadError::Fetch(other),
            })
    }

    /// Resolve the direct imports of a module concurrently.
    async fn preload(
        &self,
        path: &ModulePath,
        transpiled: &TranspiledSource,
    ) -> HashMap<ModulePath, Result<Value>> {
        let imports = transpiled.import_paths();
        if imports.is_empty() {
            return HashMap::new();
        }
        debug!("Preloading {} imports of {}", imports.len(), path);
        let loads = imports.into_iter().map(|import| {
            let load = self.resolve_path(Some(path.clone()), import.clone());
            async move { (import, load.await) }
        });
        join_all(loads).await.into_iter().collect()
    }

    /// The `__loader` object handed to the factory of `path`.
    fn module_handle(
        &self,
        path: &ModulePath,
        preloaded: HashMap<ModulePath, Result<Value>>,
        raised: RaisedErrors,
    ) -> Value {
        let preloaded = Arc::new(preloaded);
        let weak: Weak<LoaderInner> = Arc::downgrade(&self.inner);

        let importer = path.clone();
        let load = NativeFunction::new("load", move |_, _, args| {
            let weak = weak.clone();
            let preloaded = Arc::clone(&preloaded);
            let raised = Arc::clone(&raised);
            let importer = importer.clone();
            async move {
                let Some(inner) = weak.upgrade() else {
                    return Err(Exception::error("Error", "loader has been dropped"));
                };
                let loader = Loader { inner };
                let specifier = args.first().map(Value::to_js_string).unwrap_or_default();
                let target = loader.canonical(&specifier);

                let result = match preloaded.get(&target) {
                    Some(result) => result.clone(),
                    None => loader.resolve_path(Some(importer), target).await,
                };
                result.map_err(|e| {
                    let error = ObjectRef::error("Error", e.to_string());
                    raised.lock().push((error.clone(), e));
                    Exception::new(Value::Object(error))
                })
            }
        });

        let reporter = Arc::clone(&self.inner.reporter);
        let origin = path.clone();
        let handle_error = NativeFunction::sync("handleError", move |_, _, args| {
            let thrown = args.first().cloned().unwrap_or_default();
            reporter.report(ErrorReport {
                path: origin.clone(),
                message: Exception::new(thrown).message(),
            });
            Ok(Value::Undefined)
        });

        let handle = ObjectRef::from_entries([
            ("load", Value::native(load)),
            ("handleError", Value::native(handle_error)),
        ]);
        handle.freeze();
        Value::Object(handle)
    }

    fn syntax_error(&self, path: &ModulePath, message: String) -> LoadError {
        self.inner.reporter.report(ErrorReport {
            path: path.clone(),
            message: format!("SyntaxError: {}", message),
        });
        LoadError::syntax(path.as_str(), message)
    }

    /// Turns an exception escaping a factory into a [`LoadError`]. Errors
    /// raised by `__loader.load` keep their original kind.
    fn evaluation_error(&self, path: &ModulePath, exception: Exception, raised: &RaisedErrors) -> LoadError {
        if let Value::Object(thrown) = exception.value() {
            let raised = raised.lock();
            if let Some((_, original)) = raised.iter().find(|(error, _)| error.ptr_eq(thrown)) {
                return original.clone();
            }
        }
        LoadError::evaluation(path.as_str(), exception.message())
    }
}

/// Gives a component its extracted template if it has none, then splices
/// the extracted style in front of the template.
fn attach_markup(value: &Value, template: &str, style: &str) {
    let Value::Object(component) = value else {
        return;
    };
    let has_template = component.get("template").is_some_and(|t| t.to_boolean());
    if !has_template && !template.is_empty() {
        component.set("template", Value::from(template));
    }
    if !style.is_empty() {
        let current = component
            .get("template")
            .filter(|t| !t.is_nullish())
            .map(|t| t.to_js_string())
            .unwrap_or_default();
        component.set(
            "template",
            Value::String(format!("{}{}{}{}", STYLE_OPEN, style, STYLE_CLOSE, current)),
        );
    }
}
