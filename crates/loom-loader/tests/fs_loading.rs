// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loading components from a directory on disk.

use loom_loader::{Container, ErrorPolicy, FsFetcher, LoadError, Loader, LoaderConfig, PathStyle};
use loom_script::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(root: &Path, path: &str, text: &str) {
    let file = root.join(path);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, text).unwrap();
}

fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "app/main.vue",
        r#"<template><h1>{{ title }}</h1></template>
<script>
import { title } from '../shared/strings';
import Badge from './badge.vue';
export default { name: 'main', title, badge: Badge.name };
</script>"#,
    );
    write(
        dir.path(),
        "app/badge.vue",
        "<template><em>new</em></template><script>export default { name: 'badge' };</script>",
    );
    write(dir.path(), "shared/strings.js", "export const title = `Hello ${'loom'}`;");
    dir
}

#[tokio::test]
async fn test_loads_component_tree_from_disk() {
    let dir = site();
    let loader = Loader::load(
        "/app/main.vue",
        Arc::new(FsFetcher::new(dir.path())),
        Container::new(),
        LoaderConfig::default(),
    )
    .await
    .unwrap();

    let main = loader.lookup("/app/main.vue").unwrap();
    assert_eq!(
        main.inspect(),
        "{ name: 'main', title: 'Hello loom', badge: 'badge', template: '<h1>{{ title }}</h1>' }"
    );
    assert!(loader.cache().paths().iter().any(|p| p.as_str() == "/app/badge.vue"));
}

#[tokio::test]
async fn test_relative_style_from_config_file() {
    let dir = site();
    let config_file = dir.path().join("loom.toml");
    fs::write(&config_file, "path-style = \"relative\"\ncache-enabled = true\n").unwrap();
    let config = LoaderConfig::from_file(&config_file).unwrap();
    assert_eq!(config.path_style, PathStyle::Relative);

    let loader = Loader::builder(Arc::new(FsFetcher::new(dir.path())))
        .config(config)
        .build()
        .unwrap();
    loader.resolve("app/main.vue").await.unwrap();

    let paths: Vec<String> = loader.cache().paths().iter().map(|p| p.to_string()).collect();
    assert_eq!(
        paths,
        vec!["./app/badge.vue", "./app/main.vue", "./shared/strings.js"]
    );
}

#[tokio::test]
async fn test_step_limit_stops_runaway_factories() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "spin.js", "while (true) {}\nexport default 1;");

    let config = LoaderConfig {
        step_limit: Some(10_000),
        error_policy: ErrorPolicy::Propagate,
        ..Default::default()
    };
    let loader = Loader::builder(Arc::new(FsFetcher::new(dir.path())))
        .config(config)
        .build()
        .unwrap();

    match loader.resolve("/spin.js").await {
        Err(LoadError::Evaluation { path, message }) => {
            assert_eq!(path, "/spin.js");
            assert!(message.contains("step limit"), "{}", message);
        }
        other => panic!("expected an evaluation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let loader = Loader::builder(Arc::new(FsFetcher::new(dir.path()))).build().unwrap();

    let err = loader.resolve("/nothing/here.js").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Cannot find module '/nothing/here.js'");
    assert_eq!(
        loader.lookup("/nothing/here.js").unwrap_err().to_string(),
        "Component not found: '/nothing/here.js'"
    );

    // Files added later are picked up on the next request.
    write(dir.path(), "nothing/here.js", "export default null;");
    assert_eq!(loader.resolve("/nothing/here.js").await.unwrap(), Value::Null);
}
