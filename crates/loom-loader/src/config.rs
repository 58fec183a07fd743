// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration.
//!
//! Values are layered: defaults, then `loom.toml`, then `LOOM_*`
//! environment variables (`LOOM_CACHE_ENABLED=true` sets `cache-enabled`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LoadError, Result};
use crate::fetch::CachePolicy;
use crate::path::PathStyle;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "loom.toml";

/// What happens when a module factory throws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Report the error and fail the load
    Propagate,
    /// Report the error and resolve the module to `undefined`
    #[default]
    Isolate,
}

impl std::str::FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "propagate" => Ok(ErrorPolicy::Propagate),
            "isolate" => Ok(ErrorPolicy::Isolate),
            other => Err(format!("unknown error policy '{}'", other)),
        }
    }
}

/// Configuration for a [`Loader`](crate::Loader).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoaderConfig {
    /// Let the fetcher use cached responses
    pub cache_enabled: bool,

    /// Prefix convention of normalized paths
    pub path_style: PathStyle,

    /// Extension given to extensionless import paths
    pub default_extension: String,

    /// Extensions of markup-bearing component files
    pub component_extensions: Vec<String>,

    /// Factory error handling
    pub error_policy: ErrorPolicy,

    /// Load a module's direct imports concurrently before running its body
    pub preload_imports: bool,

    /// Evaluation step limit per module
    pub step_limit: Option<u64>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_enabled: false,
            path_style: PathStyle::Absolute,
            default_extension: "js".to_string(),
            component_extensions: vec!["component".to_string(), "vue".to_string()],
            error_policy: ErrorPolicy::Isolate,
            preload_imports: true,
            step_limit: None,
        }
    }
}

impl LoaderConfig {
    /// Load configuration from `path`, or from `loom.toml` in the working
    /// directory when it exists, then apply `LOOM_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = PathBuf::from(CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(std::env::vars())?;
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LoadError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content).map_err(|e| match e {
            LoadError::Config(message) => {
                LoadError::Config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    /// Parse TOML text. Missing keys keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| LoadError::Config(e.message().to_string()))
    }

    /// Apply `LOOM_*` variables from `vars`.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("LOOM_") {
                // LOOM_LOG belongs to the binary's log filter
                if config_key == "LOG" {
                    continue;
                }
                let config_key = config_key.to_lowercase().replace('_', "-");
                self.set(&config_key, &value)?;
            }
        }
        Ok(())
    }

    /// Set a configuration value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |reason: String| LoadError::Config(format!("{} = '{}': {}", key, value, reason));
        match key {
            "cache-enabled" => self.cache_enabled = parse_bool(value).map_err(invalid)?,
            "path-style" => self.path_style = value.parse().map_err(invalid)?,
            "default-extension" => {
                self.default_extension = value.trim_start_matches('.').to_string()
            }
            "component-extensions" => {
                self.component_extensions = value
                    .split(',')
                    .map(|e| e.trim().trim_start_matches('.').to_string())
                    .filter(|e| !e.is_empty())
                    .collect()
            }
            "error-policy" => self.error_policy = value.parse().map_err(invalid)?,
            "preload-imports" => self.preload_imports = parse_bool(value).map_err(invalid)?,
            "step-limit" => {
                self.step_limit = match value {
                    "" | "none" => None,
                    n => Some(n.parse().map_err(|_| invalid("expected a number".into()))?),
                }
            }
            _ => return Err(LoadError::Config(format!("unknown key '{}'", key))),
        }
        Ok(())
    }

    /// Check values that deserialize fine but make no sense.
    pub fn validate(&self) -> Result<()> {
        if self.component_extensions.is_empty() {
            return Err(LoadError::Config(
                "component-extensions must list at least one extension".into(),
            ));
        }
        if self.default_extension.contains('/') {
            return Err(LoadError::Config(format!(
                "default-extension '{}' must not contain '/'",
                self.default_extension
            )));
        }
        Ok(())
    }

    /// Network cache policy for fetches.
    pub fn cache_policy(&self) -> CachePolicy {
        if self.cache_enabled {
            CachePolicy::Default
        } else {
            CachePolicy::NoStore
        }
    }
}

fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(format!("expected a boolean, got '{}'", other)),
    }
}
