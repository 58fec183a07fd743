// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The main parser implementation: statements, patterns and token helpers.

use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::{Scanner, Span, Token, TokenKind};
use std::sync::Arc;

/// A recursive descent parser for the script subset.
pub struct Parser<'a> {
    pub(super) source: &'a str,
    pub(super) scanner: Scanner<'a>,
    pub(super) current: Token,
    pub(super) previous: Token,
    /// Nesting of function bodies; `return` is only valid inside one
    pub(super) function_depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self::with_scanner(source, Scanner::new(source))
    }

    /// Creates a parser over `span` of `source`, keeping absolute offsets.
    pub(super) fn new_in(source: &'a str, span: Span) -> Self {
        Self::with_scanner(source, Scanner::new_range(source, span))
    }

    fn with_scanner(source: &'a str, mut scanner: Scanner<'a>) -> Self {
        let current = scanner.next_token();
        Self {
            source,
            scanner,
            current,
            previous: Token::new(TokenKind::Eof, Span::new(0, 0)),
            function_depth: 0,
        }
    }

    /// Parses the source code into a Program AST node.
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        Ok(Program { body })
    }

    /// Parses a program whose top level behaves like a function body, so a
    /// bare `return` is accepted.
    pub fn parse_function_program(&mut self) -> Result<Program> {
        self.function_depth += 1;
        let program = self.parse_program();
        self.function_depth -= 1;
        program
    }

    /// Parses a single expression that must span the whole source.
    pub fn parse_standalone_expression(&mut self) -> Result<Expression> {
        let expression = self.parse_expression()?;
        self.consume_semicolon()?;
        if !self.is_at_end() {
            return Err(self.unexpected());
        }
        Ok(expression)
    }

    /// Parses a single statement.
    pub fn parse_statement(&mut self) -> Result<Statement> {
        match &self.current.kind {
            TokenKind::Var | TokenKind::Const => self.parse_variable_statement(),
            TokenKind::Let if self.let_starts_declaration() => self.parse_variable_statement(),
            TokenKind::Function => {
                let function = self.parse_function(false, true)?;
                Ok(Statement::FunctionDeclaration(function))
            }
            TokenKind::Async if self.peek_kind() == TokenKind::Function && !self.peek_newline() => {
                self.advance(); // consume 'async'
                let function = self.parse_function(true, true)?;
                Ok(Statement::FunctionDeclaration(function))
            }
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => {
                self.advance();
                self.consume_semicolon()?;
                Ok(Statement::Break)
            }
            TokenKind::Continue => {
                self.advance();
                self.consume_semicolon()?;
                Ok(Statement::Continue)
            }
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::LeftBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::Empty)
            }
            TokenKind::Import | TokenKind::Export => Err(self.error(
                "module declarations must be transpiled before evaluation",
            )),
            TokenKind::Class | TokenKind::Switch | TokenKind::Do | TokenKind::Yield => {
                Err(self.error(format!("unsupported syntax '{}'", self.current_text())))
            }
            _ => {
                let expression = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Statement::Expression(expression))
            }
        }
    }

    /// `let` is an identifier unless a binding follows it.
    fn let_starts_declaration(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Identifier(_) | TokenKind::LeftBrace | TokenKind::LeftBracket
        )
    }

    fn parse_variable_statement(&mut self) -> Result<Statement> {
        let declaration = self.parse_variable_declaration(true)?;
        self.consume_semicolon()?;
        Ok(Statement::VariableDeclaration(declaration))
    }

    fn parse_variable_kind(&mut self) -> Result<VariableKind> {
        let kind = match &self.current.kind {
            TokenKind::Var => VariableKind::Var,
            TokenKind::Let => VariableKind::Let,
            TokenKind::Const => VariableKind::Const,
            _ => return Err(self.error("expected variable keyword")),
        };
        self.advance();
        Ok(kind)
    }

    fn parse_variable_declaration(&mut self, require_const_init: bool) -> Result<VariableDeclaration> {
        let kind = self.parse_variable_kind()?;
        let mut declarations = Vec::new();

        loop {
            let id = self.parse_binding_target()?;
            let init = if self.eat(&TokenKind::Equal) {
                Some(self.parse_assignment()?)
            } else {
                None
            };

            if init.is_none() && require_const_init {
                if kind == VariableKind::Const {
                    return Err(self.error("missing initializer in const declaration"));
                }
                if !matches!(id, Pattern::Identifier(_)) {
                    return Err(self.error("missing initializer in destructuring declaration"));
                }
            }

            declarations.push(VariableDeclarator { id, init });

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        Ok(VariableDeclaration { kind, declarations })
    }

    /// Parses an identifier, object pattern or array pattern.
    pub(super) fn parse_binding_target(&mut self) -> Result<Pattern> {
        match &self.current.kind {
            TokenKind::LeftBrace => self.parse_object_pattern(),
            TokenKind::LeftBracket => self.parse_array_pattern(),
            _ => Ok(Pattern::Identifier(self.expect_identifier()?)),
        }
    }

    /// Parses a binding target with an optional `= default`.
    pub(super) fn parse_binding_element(&mut self) -> Result<Pattern> {
        let target = self.parse_binding_target()?;
        if self.eat(&TokenKind::Equal) {
            let default = self.parse_assignment()?;
            return Ok(Pattern::Default(Box::new(target), Box::new(default)));
        }
        Ok(target)
    }

    fn parse_object_pattern(&mut self) -> Result<Pattern> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut properties = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RightBrace) {
            if self.eat(&TokenKind::Ellipsis) {
                rest = Some(self.expect_identifier()?);
                break;
            }

            let key = self.parse_property_key()?;
            let value = if self.eat(&TokenKind::Colon) {
                self.parse_binding_element()?
            } else {
                let PropertyKey::Named(name) = &key else {
                    return Err(self.error("computed keys need a binding target"));
                };
                let target = Pattern::Identifier(name.clone());
                if self.eat(&TokenKind::Equal) {
                    let default = self.parse_assignment()?;
                    Pattern::Default(Box::new(target), Box::new(default))
                } else {
                    target
                }
            };
            properties.push(PatternProperty { key, value });

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RightBrace)?;
        Ok(Pattern::Object { properties, rest })
    }

    fn parse_array_pattern(&mut self) -> Result<Pattern> {
        self.expect(&TokenKind::LeftBracket)?;
        let mut elements = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RightBracket) {
            if self.eat(&TokenKind::Comma) {
                elements.push(None);
                continue;
            }
            if self.eat(&TokenKind::Ellipsis) {
                rest = Some(Box::new(self.parse_binding_target()?));
                break;
            }
            elements.push(Some(self.parse_binding_element()?));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RightBracket)?;
        Ok(Pattern::Array { elements, rest })
    }

    /// Parses `function name?(params) { body }` after an optional `async`.
    pub(super) fn parse_function(&mut self, is_async: bool, require_name: bool) -> Result<Arc<Function>> {
        let start = self.current.span.start;
        self.expect(&TokenKind::Function)?;

        let name = if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            self.advance();
            Some(name)
        } else if require_name {
            return Err(self.error("function declarations need a name"));
        } else {
            None
        };

        self.finish_function(name, is_async, false, start)
    }

    /// Parses `(params) { body }` shared by declarations, expressions and
    /// object-literal methods.
    pub(super) fn finish_function(
        &mut self,
        name: Option<String>,
        is_async: bool,
        is_arrow: bool,
        start: usize,
    ) -> Result<Arc<Function>> {
        self.expect(&TokenKind::LeftParen)?;
        let (params, rest) = self.parse_parameters()?;
        self.expect(&TokenKind::RightParen)?;

        let body = self.parse_function_body()?;

        Ok(Arc::new(Function {
            name,
            params,
            rest,
            body: FunctionBody::Block(body),
            is_async,
            is_arrow,
            span: Span::new(start, self.previous.span.end),
        }))
    }

    /// Parses a parameter list up to (not including) the closing paren.
    pub(super) fn parse_parameters(&mut self) -> Result<(Vec<Pattern>, Option<Pattern>)> {
        let mut params = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RightParen) {
            if self.eat(&TokenKind::Ellipsis) {
                rest = Some(self.parse_binding_target()?);
                break;
            }
            params.push(self.parse_binding_element()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        Ok((params, rest))
    }

    /// Parses `{ statements }` as a function body.
    pub(super) fn parse_function_body(&mut self) -> Result<Vec<Statement>> {
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        body
    }

    pub(super) fn parse_block(&mut self) -> Result<Vec<Statement>> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut body = Vec::new();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        self.expect(&TokenKind::RightBrace)?;
        Ok(body)
    }

    fn parse_if_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'if'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;

        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'while'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let body = Box::new(self.parse_statement()?);

        Ok(Statement::While(WhileStatement { test, body }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'for'
        self.expect(&TokenKind::LeftParen)?;

        // for (const x of items)
        if matches!(
            self.current.kind,
            TokenKind::Const | TokenKind::Let | TokenKind::Var
        ) {
            let mut lookahead = self.scanner.clone();
            let mut depth = 0usize;
            // Find `of` at depth zero after the binding target.
            let mut token = lookahead.next_token();
            let is_for_of = loop {
                match &token.kind {
                    TokenKind::LeftBrace | TokenKind::LeftBracket => depth += 1,
                    TokenKind::RightBrace | TokenKind::RightBracket => {
                        depth = depth.saturating_sub(1)
                    }
                    kind if depth == 0 && kind.is_word("of") => break true,
                    TokenKind::Identifier(_) | TokenKind::Comma | TokenKind::Colon => {}
                    _ if depth > 0 => {}
                    _ => break false,
                }
                token = lookahead.next_token();
            };

            if is_for_of {
                let kind = self.parse_variable_kind()?;
                let left = self.parse_binding_target()?;
                self.advance(); // consume 'of'
                let right = self.parse_assignment()?;
                self.expect(&TokenKind::RightParen)?;
                let body = Box::new(self.parse_statement()?);
                return Ok(Statement::ForOf(ForOfStatement {
                    kind,
                    left,
                    right,
                    body,
                }));
            }
        }

        let init = if self.eat(&TokenKind::Semicolon) {
            None
        } else {
            let init = if matches!(
                self.current.kind,
                TokenKind::Const | TokenKind::Let | TokenKind::Var
            ) {
                Statement::VariableDeclaration(self.parse_variable_declaration(false)?)
            } else {
                Statement::Expression(self.parse_expression()?)
            };
            self.expect(&TokenKind::Semicolon)?;
            Some(Box::new(init))
        };

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RightParen)?;

        let body = Box::new(self.parse_statement()?);

        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement> {
        if self.function_depth == 0 {
            return Err(self.error("'return' outside of a function"));
        }
        self.advance(); // consume 'return'

        // A line break after `return` ends the statement.
        if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RightBrace)
            || self.is_at_end()
            || self.newline_before_current()
        {
            self.eat(&TokenKind::Semicolon);
            return Ok(Statement::Return(None));
        }

        let argument = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::Return(Some(argument)))
    }

    fn parse_throw_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'throw'
        if self.newline_before_current() {
            return Err(self.error("illegal newline after throw"));
        }
        let argument = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::Throw(argument))
    }

    fn parse_try_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'try'
        let block = self.parse_block()?;

        let mut param = None;
        let mut handler = None;
        if self.eat(&TokenKind::Catch) {
            if self.eat(&TokenKind::LeftParen) {
                param = Some(self.parse_binding_target()?);
                self.expect(&TokenKind::RightParen)?;
            }
            handler = Some(self.parse_block()?);
        }

        let finalizer = if self.eat(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("missing catch or finally after try"));
        }

        Ok(Statement::Try(TryStatement {
            block,
            param,
            handler,
            finalizer,
        }))
    }

    // Token helpers

    pub(super) fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.scanner.next_token());
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    pub(super) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    pub(super) fn expect_identifier(&mut self) -> Result<String> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error(format!(
                "expected identifier, found '{}'",
                self.current_text()
            )))
        }
    }

    /// Statement terminator with automatic semicolon insertion at line
    /// breaks, before `}` and at the end of input.
    pub(super) fn consume_semicolon(&mut self) -> Result<()> {
        if self.eat(&TokenKind::Semicolon)
            || self.check(&TokenKind::RightBrace)
            || self.is_at_end()
            || self.newline_before_current()
        {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    pub(super) fn peek_kind(&self) -> TokenKind {
        self.scanner.clone().next_token().kind
    }

    /// True when a line break separates the current token from the next.
    pub(super) fn peek_newline(&self) -> bool {
        let next = self.scanner.clone().next_token();
        self.source
            .get(self.current.span.end..next.span.start)
            .is_some_and(|gap| gap.contains('\n'))
    }

    pub(super) fn newline_before_current(&self) -> bool {
        self.source
            .get(self.previous.span.end..self.current.span.start)
            .is_some_and(|gap| gap.contains('\n'))
    }

    pub(super) fn current_text(&self) -> &'a str {
        match self.current.kind {
            TokenKind::Eof => "end of input",
            _ => self.current.span.slice(self.source),
        }
    }

    pub(super) fn error(&self, message: impl Into<String>) -> Error {
        Error::syntax(message, self.current.span.start)
    }

    pub(super) fn unexpected(&self) -> Error {
        if self.current.kind == TokenKind::Invalid {
            return self.error(format!("invalid or unterminated token '{}'", self.current_text()));
        }
        self.error(format!("unexpected token '{}'", self.current_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source).parse_function_program().expect("should parse")
    }

    #[test]
    fn test_variable_declarations() {
        let program = parse("const a = 1, b = 2; let c; var d = 'x'");
        assert_eq!(program.body.len(), 3);
        let Statement::VariableDeclaration(decl) = &program.body[0] else {
            panic!("expected declaration");
        };
        assert_eq!(decl.kind, VariableKind::Const);
        assert_eq!(decl.declarations.len(), 2);
    }

    #[test]
    fn test_destructuring_patterns() {
        let program = parse("const { a, b: c, d = 1, ...rest } = obj; const [x, , y] = list;");
        let Statement::VariableDeclaration(decl) = &program.body[0] else {
            panic!("expected declaration");
        };
        let mut names = Vec::new();
        decl.declarations[0].id.bound_names(&mut names);
        assert_eq!(names, vec!["a", "c", "d", "rest"]);

        let Statement::VariableDeclaration(decl) = &program.body[1] else {
            panic!("expected declaration");
        };
        let mut names = Vec::new();
        decl.declarations[0].id.bound_names(&mut names);
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_const_requires_initializer() {
        assert!(Parser::new("const a;").parse_program().is_err());
    }

    #[test]
    fn test_return_only_inside_functions() {
        assert!(Parser::new("return 1;").parse_program().is_err());
        assert!(Parser::new("return 1;").parse_function_program().is_ok());
        assert!(Parser::new("function f() { return 1 }").parse_program().is_ok());
    }

    #[test]
    fn test_return_then_newline_returns_undefined() {
        let program = parse("return\n42");
        assert_eq!(program.body[0], Statement::Return(None));
    }

    #[test]
    fn test_automatic_semicolons() {
        let program = parse("const a = 1\nconst b = 2\nif (a) { b }");
        assert_eq!(program.body.len(), 3);
        assert!(Parser::new("const a = 1 const b = 2").parse_program().is_err());
    }

    #[test]
    fn test_function_declarations() {
        let program = parse("function add(a, b = 1, ...more) { return a + b }\nasync function load() {}");
        let Statement::FunctionDeclaration(add) = &program.body[0] else {
            panic!("expected function");
        };
        assert_eq!(add.name.as_deref(), Some("add"));
        assert_eq!(add.params.len(), 2);
        assert!(add.rest.is_some());
        let Statement::FunctionDeclaration(load) = &program.body[1] else {
            panic!("expected function");
        };
        assert!(load.is_async);
    }

    #[test]
    fn test_control_flow() {
        let program = parse(
            "for (let i = 0; i < 3; i++) { if (i) continue; else break }\n\
             for (const [k, v] of pairs) {}\n\
             while (x) x--\n\
             try { f() } catch (e) { g(e) } finally { h() }",
        );
        assert!(matches!(program.body[0], Statement::For(_)));
        assert!(matches!(program.body[1], Statement::ForOf(_)));
        assert!(matches!(program.body[2], Statement::While(_)));
        assert!(matches!(program.body[3], Statement::Try(_)));
    }

    #[test]
    fn test_module_syntax_is_rejected() {
        let err = Parser::new("import x from './x.js';").parse_program().unwrap_err();
        assert!(err.to_string().contains("transpiled"));
    }

    #[test]
    fn test_syntax_error_reports_offset() {
        let err = Parser::new("const a = ;").parse_program().unwrap_err();
        assert!(matches!(err, Error::Syntax { offset: 10, .. }));
    }
}
