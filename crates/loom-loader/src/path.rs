// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path normalization.
//!
//! A [`ModulePath`] is the canonical cache key for a module. Specifiers
//! without a `/` are bare names (container-registered components) and are
//! never rewritten. Everything else is resolved against the directory of
//! the importing module:
//!
//! ```text
//! normalize("../shared/util.js", ["app"])    -> /shared/util.js
//! normalize("./widget.component", ["app"])   -> /app/widget.component
//! normalize("/lib/x.js", ["app"])            -> /lib/x.js
//! normalize("Counter", ["app"])              -> Counter
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix convention for normalized paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    /// `/app/main.component`
    #[default]
    Absolute,
    /// `./app/main.component` (relative to the page)
    Relative,
}

impl PathStyle {
    fn prefix(self) -> &'static str {
        match self {
            PathStyle::Absolute => "/",
            PathStyle::Relative => "./",
        }
    }
}

impl std::str::FromStr for PathStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absolute" => Ok(PathStyle::Absolute),
            "relative" => Ok(PathStyle::Relative),
            other => Err(format!("unknown path style '{}'", other)),
        }
    }
}

/// What the loader does with a fetched document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// Markup + style + script bundle
    Component,
    /// The whole document is script
    Script,
}

/// A canonical module path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModulePath(String);

impl ModulePath {
    /// Wraps an already canonical path.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The path as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for container names such as `Counter`.
    pub fn is_bare(&self) -> bool {
        !self.0.contains('/')
    }

    /// The last path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Extension of the last segment, without the dot.
    pub fn extension(&self) -> &str {
        get_extension(&self.0)
    }

    /// Directory segments, used as the base for this module's imports.
    pub fn dir_stack(&self) -> Vec<String> {
        if self.is_bare() {
            return Vec::new();
        }
        let mut segments = segments(&self.0);
        segments.pop();
        segments
    }

    /// Classifies the module by extension.
    pub fn kind(&self, component_extensions: &[String]) -> ModuleKind {
        let extension = self.extension();
        if component_extensions.iter().any(|e| e == extension) {
            ModuleKind::Component
        } else {
            ModuleKind::Script
        }
    }

    /// Appends `.{extension}` to a non-bare path that has none.
    pub fn with_default_extension(self, extension: &str) -> Self {
        if self.is_bare() || !self.extension().is_empty() || extension.is_empty() {
            return self;
        }
        Self(format!("{}.{}", self.0, extension))
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModulePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Splits a path into its meaningful segments (no empty, `.` segments).
fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(String::from)
        .collect()
}

/// Normalizes `specifier` against the directory stack of the importing
/// module.
///
/// `..` segments pop directories and clamp at the root. A specifier starting
/// with `/` is resolved from the root. Normalization never fails; a path
/// that does not exist fails later, when it is fetched.
pub fn normalize(specifier: &str, current_dir: &[String], style: PathStyle) -> ModulePath {
    if !specifier.contains('/') {
        return ModulePath::new(specifier);
    }

    let mut stack: Vec<String> = if specifier.starts_with('/') {
        Vec::new()
    } else {
        current_dir.to_vec()
    };
    for segment in specifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            name => stack.push(name.to_string()),
        }
    }

    ModulePath(format!("{}{}", style.prefix(), stack.join("/")))
}

/// Substring after the final `.` of the last path segment, or empty.
pub fn get_extension(path: &str) -> &str {
    let file_name = path.rsplit('/').next().unwrap_or_default();
    match file_name.rfind('.') {
        Some(dot) if dot + 1 < file_name.len() => &file_name[dot + 1..],
        _ => "",
    }
}

/// Uppercases the first character (`counter` -> `Counter`).
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bare_names_unchanged() {
        assert_eq!(normalize("Counter", &dir(&["app"]), PathStyle::Absolute).as_str(), "Counter");
        assert_eq!(normalize("util.js", &dir(&["app"]), PathStyle::Relative).as_str(), "util.js");
    }

    #[test]
    fn test_relative_specifiers() {
        let base = dir(&["app"]);
        assert_eq!(
            normalize("../shared/util.js", &base, PathStyle::Absolute).as_str(),
            "/shared/util.js"
        );
        assert_eq!(
            normalize("./widget.component", &base, PathStyle::Absolute).as_str(),
            "/app/widget.component"
        );
        assert_eq!(
            normalize("./widget.component", &base, PathStyle::Relative).as_str(),
            "./app/widget.component"
        );
        assert_eq!(normalize("a/./b/../c.js", &base, PathStyle::Absolute).as_str(), "/app/a/c.js");
    }

    #[test]
    fn test_rooted_specifier_ignores_base() {
        assert_eq!(normalize("/lib/x.js", &dir(&["app", "deep"]), PathStyle::Absolute).as_str(), "/lib/x.js");
    }

    #[test]
    fn test_up_levels_clamp_at_root() {
        assert_eq!(normalize("../../../x.js", &dir(&["app"]), PathStyle::Absolute).as_str(), "/x.js");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let base = dir(&["app", "pages"]);
        for spec in ["../shared/util.js", "./a/b.component", "/x/y", "../../../z.js", "Counter"] {
            let once = normalize(spec, &base, PathStyle::Absolute);
            let twice = normalize(once.as_str(), &base, PathStyle::Absolute);
            assert_eq!(once, twice, "{spec}");
        }
        // Relative output is page-root relative.
        let once = normalize("../x.js", &base, PathStyle::Relative);
        assert_eq!(normalize(once.as_str(), &[], PathStyle::Relative), once);
    }

    #[test]
    fn test_get_extension() {
        assert_eq!(get_extension("/app/main.component"), "component");
        assert_eq!(get_extension("./a.b/c"), "");
        assert_eq!(get_extension("/lib/archive.tar.gz"), "gz");
        assert_eq!(get_extension("/noext"), "");
        assert_eq!(get_extension("/trailing."), "");
    }

    #[test]
    fn test_module_path_helpers() {
        let path = ModulePath::new("/app/pages/main.component");
        assert_eq!(path.dir_stack(), dir(&["app", "pages"]));
        assert_eq!(path.file_name(), "main.component");
        assert!(!path.is_bare());
        assert!(ModulePath::new("Counter").is_bare());
        assert!(ModulePath::new("Counter").dir_stack().is_empty());

        let extensions = vec!["component".to_string(), "vue".to_string()];
        assert_eq!(path.kind(&extensions), ModuleKind::Component);
        assert_eq!(ModulePath::new("/a.vue").kind(&extensions), ModuleKind::Component);
        assert_eq!(ModulePath::new("/a.js").kind(&extensions), ModuleKind::Script);
    }

    #[test]
    fn test_default_extension() {
        assert_eq!(ModulePath::new("/lib/util").with_default_extension("js").as_str(), "/lib/util.js");
        assert_eq!(ModulePath::new("/a.vue").with_default_extension("js").as_str(), "/a.vue");
        assert_eq!(ModulePath::new("counter").with_default_extension("js").as_str(), "counter");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("counter"), "Counter");
        assert_eq!(capitalize("Counter"), "Counter");
        assert_eq!(capitalize("ärger"), "Ärger");
        assert_eq!(capitalize(""), "");
    }
}
