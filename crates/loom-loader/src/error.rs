// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the component loader

use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors raised by a [`Fetcher`](crate::fetch::Fetcher)
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Nothing exists at the requested path
    #[error("Cannot find module '{0}'")]
    NotFound(String),

    /// The server answered with a non-success status
    #[error("HTTP {status} fetching '{path}'")]
    Status {
        /// Requested path
        path: String,
        /// HTTP status code
        status: u16,
    },

    /// Transport level failure
    #[error("Network error fetching '{path}': {reason}")]
    Network {
        /// Requested path
        path: String,
        /// Underlying error
        reason: String,
    },

    /// File system failure
    #[error("Failed to read '{path}': {reason}")]
    Io {
        /// Requested path
        path: String,
        /// Underlying error
        reason: String,
    },

    /// The path cannot be turned into a request
    #[error("Invalid module path '{0}'")]
    InvalidPath(String),
}

/// Errors that can occur while resolving a module.
///
/// Cloneable so a single in-flight load can hand its result to every
/// requester.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// Neither cache, container nor fetcher knows the name
    #[error("Component not found: '{0}'")]
    NotFound(String),

    /// The module source could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The module source could not be transpiled or parsed
    #[error("SyntaxError: {message} ({path})")]
    Syntax {
        /// Module path
        path: String,
        /// What went wrong
        message: String,
    },

    /// The module factory threw
    #[error("{message} ({path})")]
    Evaluation {
        /// Module path
        path: String,
        /// Message of the thrown value
        message: String,
    },

    /// A module (indirectly) imports itself while it is still loading
    #[error("Circular import: {}", chain.join(" -> "))]
    CircularImport {
        /// The import chain, starting and ending with the same module
        chain: Vec<String>,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LoadError {
    /// Create a syntax error for `path`
    pub fn syntax(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Syntax {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an evaluation error for `path`
    pub fn evaluation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Evaluation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors meaning "no such module"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Fetch(FetchError::NotFound(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_embed_path() {
        let err = LoadError::evaluation("/app/main.component", "boom");
        assert_eq!(err.to_string(), "boom (/app/main.component)");
        let err = LoadError::syntax("/a.js", "unexpected token ')'");
        assert_eq!(err.to_string(), "SyntaxError: unexpected token ')' (/a.js)");
    }

    #[test]
    fn test_circular_chain_display() {
        let err = LoadError::CircularImport {
            chain: vec!["/a.js".into(), "/b.js".into(), "/a.js".into()],
        };
        assert_eq!(err.to_string(), "Circular import: /a.js -> /b.js -> /a.js");
    }

    #[test]
    fn test_not_found() {
        assert!(LoadError::NotFound("Counter".into()).is_not_found());
        assert!(LoadError::from(FetchError::NotFound("/x.js".into())).is_not_found());
        assert!(!LoadError::Config("bad".into()).is_not_found());
    }
}
