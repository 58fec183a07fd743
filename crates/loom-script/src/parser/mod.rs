// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Parser for the script subset.
//!
//! A hand written recursive descent parser producing the tree in
//! [`crate::ast`]. Module syntax (`import`/`export`) is rejected here; the
//! component loader rewrites it before a script reaches the parser.

#[allow(clippy::module_inception)]
mod parser;
mod expressions;

pub use parser::Parser;

use crate::ast::{Expression, Program};
use crate::error::Result;

/// Parses `source` as a script whose top level accepts `return`.
pub fn parse_function_body(source: &str) -> Result<Program> {
    Parser::new(source).parse_function_program()
}

/// Parses `source` as a single expression.
pub fn parse_expression(source: &str) -> Result<Expression> {
    Parser::new(source).parse_standalone_expression()
}
