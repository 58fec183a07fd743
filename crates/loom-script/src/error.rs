// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the script engine

use crate::runtime::Exception;
use thiserror::Error;

/// Result type for script engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while parsing or running a script
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The source could not be parsed
    #[error("SyntaxError: {message} (at byte {offset})")]
    Syntax {
        /// What went wrong
        message: String,
        /// Byte offset into the source
        offset: usize,
    },

    /// A value was thrown and not caught
    #[error("{0}")]
    Thrown(Exception),
}

impl Error {
    /// Create a syntax error at the given offset
    pub fn syntax(message: impl Into<String>, offset: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            offset,
        }
    }

    /// Human readable message without the error kind prefix
    pub fn message(&self) -> String {
        match self {
            Error::Syntax { message, .. } => message.clone(),
            Error::Thrown(exception) => exception.message(),
        }
    }
}

impl From<Exception> for Error {
    fn from(exception: Exception) -> Self {
        Self::Thrown(exception)
    }
}
