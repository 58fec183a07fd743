// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lexical analysis (tokenization) for script source code.
//!
//! Every token carries its byte [`Span`], which is what lets the module
//! transpiler rewrite `import`/`export` statements in place without touching
//! lookalike text inside strings or comments.
//!
//! ## Usage
//!
//! ```rust
//! use loom_script::lexer::{Scanner, TokenKind};
//!
//! let mut scanner = Scanner::new("const x = 42;");
//!
//! loop {
//!     let token = scanner.next_token();
//!     if matches!(token.kind, TokenKind::Eof) {
//!         break;
//!     }
//!     println!("{:?}", token.kind);
//! }
//! ```

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Span, Token, TokenKind};
