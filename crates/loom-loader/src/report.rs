// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error reporting collaborators.

use parking_lot::Mutex;
use std::fmt;
use tracing::error;

use crate::path::ModulePath;

/// An error raised while compiling or running a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// The module the error originated in
    pub path: ModulePath,
    /// The error message
    pub message: String,
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.path)
    }
}

/// Receives module errors.
pub trait ErrorReporter: Send + Sync {
    /// Handle one report.
    fn report(&self, report: ErrorReport);
}

/// Logs reports with `tracing::error!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, report: ErrorReport) {
        error!(target: "loom::loader", path = %report.path, "{}", report);
    }
}

/// Stores reports for later inspection.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    reports: Mutex<Vec<ErrorReport>>,
}

impl CollectingReporter {
    /// An empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports received so far, oldest first.
    pub fn reports(&self) -> Vec<ErrorReport> {
        self.reports.lock().clone()
    }

    /// Remove and return all reports.
    pub fn take(&self) -> Vec<ErrorReport> {
        std::mem::take(&mut *self.reports.lock())
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, report: ErrorReport) {
        self.reports.lock().push(report);
    }
}
