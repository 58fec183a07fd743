// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Expression parsing.

use super::Parser;
use crate::ast::*;
use crate::error::Result;
use crate::lexer::TokenKind;
use std::sync::Arc;

/// Binding power of a binary or logical operator token.
fn infix_precedence(kind: &TokenKind) -> Option<u8> {
    let precedence = match kind {
        TokenKind::QuestionQuestion | TokenKind::PipePipe => 1,
        TokenKind::AmpersandAmpersand => 2,
        TokenKind::EqualEqual
        | TokenKind::NotEqual
        | TokenKind::StrictEqual
        | TokenKind::StrictNotEqual => 3,
        TokenKind::LessThan
        | TokenKind::GreaterThan
        | TokenKind::LessThanEqual
        | TokenKind::GreaterThanEqual
        | TokenKind::In
        | TokenKind::Instanceof => 4,
        TokenKind::Plus | TokenKind::Minus => 5,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 6,
        TokenKind::StarStar => 7,
        _ => return None,
    };
    Some(precedence)
}

enum Infix {
    Binary(BinaryOperator),
    Logical(LogicalOperator),
}

fn infix_operator(kind: &TokenKind) -> Option<Infix> {
    let op = match kind {
        TokenKind::QuestionQuestion => Infix::Logical(LogicalOperator::Nullish),
        TokenKind::PipePipe => Infix::Logical(LogicalOperator::Or),
        TokenKind::AmpersandAmpersand => Infix::Logical(LogicalOperator::And),
        TokenKind::EqualEqual => Infix::Binary(BinaryOperator::Equal),
        TokenKind::NotEqual => Infix::Binary(BinaryOperator::NotEqual),
        TokenKind::StrictEqual => Infix::Binary(BinaryOperator::StrictEqual),
        TokenKind::StrictNotEqual => Infix::Binary(BinaryOperator::StrictNotEqual),
        TokenKind::LessThan => Infix::Binary(BinaryOperator::LessThan),
        TokenKind::GreaterThan => Infix::Binary(BinaryOperator::GreaterThan),
        TokenKind::LessThanEqual => Infix::Binary(BinaryOperator::LessThanEqual),
        TokenKind::GreaterThanEqual => Infix::Binary(BinaryOperator::GreaterThanEqual),
        TokenKind::In => Infix::Binary(BinaryOperator::In),
        TokenKind::Instanceof => Infix::Binary(BinaryOperator::Instanceof),
        TokenKind::Plus => Infix::Binary(BinaryOperator::Add),
        TokenKind::Minus => Infix::Binary(BinaryOperator::Subtract),
        TokenKind::Star => Infix::Binary(BinaryOperator::Multiply),
        TokenKind::Slash => Infix::Binary(BinaryOperator::Divide),
        TokenKind::Percent => Infix::Binary(BinaryOperator::Modulo),
        TokenKind::StarStar => Infix::Binary(BinaryOperator::Exponent),
        _ => return None,
    };
    Some(op)
}

fn assignment_operator(kind: &TokenKind) -> Option<AssignmentOperator> {
    let op = match kind {
        TokenKind::Equal => AssignmentOperator::Assign,
        TokenKind::PlusEqual => AssignmentOperator::Compound(BinaryOperator::Add),
        TokenKind::MinusEqual => AssignmentOperator::Compound(BinaryOperator::Subtract),
        TokenKind::StarEqual => AssignmentOperator::Compound(BinaryOperator::Multiply),
        TokenKind::SlashEqual => AssignmentOperator::Compound(BinaryOperator::Divide),
        TokenKind::PercentEqual => AssignmentOperator::Compound(BinaryOperator::Modulo),
        TokenKind::AmpersandAmpersandEqual => AssignmentOperator::Logical(LogicalOperator::And),
        TokenKind::PipePipeEqual => AssignmentOperator::Logical(LogicalOperator::Or),
        TokenKind::QuestionQuestionEqual => AssignmentOperator::Logical(LogicalOperator::Nullish),
        _ => return None,
    };
    Some(op)
}

fn is_assignment_target(expression: &Expression) -> bool {
    matches!(
        expression,
        Expression::Identifier(_) | Expression::Member { optional: false, .. }
    )
}

impl<'a> Parser<'a> {
    /// Parses an expression, including the comma operator.
    pub fn parse_expression(&mut self) -> Result<Expression> {
        let first = self.parse_assignment()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut expressions = vec![first];
        while self.eat(&TokenKind::Comma) {
            expressions.push(self.parse_assignment()?);
        }
        Ok(Expression::Sequence(expressions))
    }

    /// Parses an assignment expression (or anything of higher precedence).
    pub(super) fn parse_assignment(&mut self) -> Result<Expression> {
        if let Some(arrow) = self.try_parse_arrow()? {
            return Ok(arrow);
        }

        let target = self.parse_conditional()?;

        let Some(operator) = assignment_operator(&self.current.kind) else {
            return Ok(target);
        };
        if !is_assignment_target(&target) {
            return Err(self.error("invalid assignment target"));
        }
        self.advance();

        let value = self.parse_assignment()?;
        Ok(Expression::Assignment {
            operator,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn try_parse_arrow(&mut self) -> Result<Option<Expression>> {
        let start = self.current.span.start;
        match &self.current.kind {
            TokenKind::Identifier(name) if self.peek_kind() == TokenKind::Arrow => {
                let param = Pattern::Identifier(name.clone());
                self.advance(); // consume the parameter
                self.advance(); // consume '=>'
                self.finish_arrow(vec![param], None, false, start).map(Some)
            }
            TokenKind::LeftParen if self.arrow_follows_parens() => {
                self.advance();
                let (params, rest) = self.parse_parameters()?;
                self.expect(&TokenKind::RightParen)?;
                self.expect(&TokenKind::Arrow)?;
                self.finish_arrow(params, rest, false, start).map(Some)
            }
            TokenKind::Async if !self.peek_newline() => match self.peek_kind() {
                TokenKind::Identifier(name) => {
                    self.advance(); // consume 'async'
                    self.advance(); // consume the parameter
                    self.expect(&TokenKind::Arrow)?;
                    self.finish_arrow(vec![Pattern::Identifier(name)], None, true, start)
                        .map(Some)
                }
                TokenKind::LeftParen => {
                    self.advance(); // consume 'async'
                    if !self.arrow_follows_parens() {
                        return Err(self.error("expected arrow function after 'async'"));
                    }
                    self.advance();
                    let (params, rest) = self.parse_parameters()?;
                    self.expect(&TokenKind::RightParen)?;
                    self.expect(&TokenKind::Arrow)?;
                    self.finish_arrow(params, rest, true, start).map(Some)
                }
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    /// With the current token on `(`, checks whether the matching `)` is
    /// followed by `=>`.
    fn arrow_follows_parens(&self) -> bool {
        let mut lookahead = self.scanner.clone();
        let mut depth = 1usize;
        loop {
            match lookahead.next_token().kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        return lookahead.next_token().kind == TokenKind::Arrow;
                    }
                }
                TokenKind::Eof | TokenKind::Invalid => return false,
                _ => {}
            }
        }
    }

    fn finish_arrow(
        &mut self,
        params: Vec<Pattern>,
        rest: Option<Pattern>,
        is_async: bool,
        start: usize,
    ) -> Result<Expression> {
        let body = if self.check(&TokenKind::LeftBrace) {
            FunctionBody::Block(self.parse_function_body()?)
        } else {
            FunctionBody::Expression(Box::new(self.parse_assignment()?))
        };

        Ok(Expression::Function(Arc::new(Function {
            name: None,
            params,
            rest,
            body,
            is_async,
            is_arrow: true,
            span: crate::lexer::Span::new(start, self.previous.span.end),
        })))
    }

    fn parse_conditional(&mut self) -> Result<Expression> {
        let test = self.parse_binary(0)?;

        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }

        let consequent = self.parse_assignment()?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;

        Ok(Expression::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    /// Precedence climbing over binary and logical operators.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expression> {
        let mut left = self.parse_unary()?;

        while let Some(precedence) = infix_precedence(&self.current.kind) {
            if precedence <= min_precedence {
                break;
            }
            let Some(operator) = infix_operator(&self.current.kind) else {
                break;
            };
            self.advance();

            // `**` is right associative
            let next_min = if precedence == 7 {
                precedence - 1
            } else {
                precedence
            };
            let right = self.parse_binary(next_min)?;

            left = match operator {
                Infix::Binary(operator) => Expression::Binary {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                Infix::Logical(operator) => Expression::Logical {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let operator = match &self.current.kind {
            TokenKind::Bang => Some(UnaryOperator::Not),
            TokenKind::Minus => Some(UnaryOperator::Minus),
            TokenKind::Plus => Some(UnaryOperator::Plus),
            TokenKind::Tilde => Some(UnaryOperator::BitwiseNot),
            TokenKind::Typeof => Some(UnaryOperator::Typeof),
            TokenKind::Void => Some(UnaryOperator::Void),
            _ => None,
        };

        if let Some(operator) = operator {
            self.advance();
            let argument = self.parse_unary()?;
            return Ok(Expression::Unary {
                operator,
                argument: Box::new(argument),
            });
        }

        match &self.current.kind {
            TokenKind::Await => {
                self.advance();
                let argument = self.parse_unary()?;
                Ok(Expression::Await(Box::new(argument)))
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let increment = self.check(&TokenKind::PlusPlus);
                self.advance();
                let argument = self.parse_unary()?;
                if !is_assignment_target(&argument) {
                    return Err(self.error("invalid update target"));
                }
                Ok(Expression::Update {
                    increment,
                    prefix: true,
                    argument: Box::new(argument),
                })
            }
            TokenKind::Delete => Err(self.error("unsupported syntax 'delete'")),
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let expression = self.parse_call_member()?;

        if matches!(self.current.kind, TokenKind::PlusPlus | TokenKind::MinusMinus)
            && !self.newline_before_current()
        {
            if !is_assignment_target(&expression) {
                return Err(self.error("invalid update target"));
            }
            let increment = self.check(&TokenKind::PlusPlus);
            self.advance();
            return Ok(Expression::Update {
                increment,
                prefix: false,
                argument: Box::new(expression),
            });
        }

        Ok(expression)
    }

    /// Parses member accesses and calls. A chain containing `?.` is wrapped
    /// in [`Expression::OptionalChain`] so it short-circuits as a whole.
    fn parse_call_member(&mut self) -> Result<Expression> {
        let mut expression = if self.check(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        let mut in_chain = false;

        loop {
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.parse_property_name()?;
                    expression = Expression::Member {
                        object: Box::new(expression),
                        property: MemberProperty::Named(name),
                        optional: false,
                    };
                }
                TokenKind::QuestionDot => {
                    self.advance();
                    in_chain = true;
                    expression = match &self.current.kind {
                        TokenKind::LeftParen => {
                            let arguments = self.parse_arguments()?;
                            Expression::Call {
                                callee: Box::new(expression),
                                arguments,
                                optional: true,
                            }
                        }
                        TokenKind::LeftBracket => {
                            self.advance();
                            let property = self.parse_expression()?;
                            self.expect(&TokenKind::RightBracket)?;
                            Expression::Member {
                                object: Box::new(expression),
                                property: MemberProperty::Computed(Box::new(property)),
                                optional: true,
                            }
                        }
                        _ => {
                            let name = self.parse_property_name()?;
                            Expression::Member {
                                object: Box::new(expression),
                                property: MemberProperty::Named(name),
                                optional: true,
                            }
                        }
                    };
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let property = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket)?;
                    expression = Expression::Member {
                        object: Box::new(expression),
                        property: MemberProperty::Computed(Box::new(property)),
                        optional: false,
                    };
                }
                TokenKind::LeftParen => {
                    let arguments = self.parse_arguments()?;
                    expression = Expression::Call {
                        callee: Box::new(expression),
                        arguments,
                        optional: false,
                    };
                }
                TokenKind::Template { .. } => {
                    return Err(self.error("tagged templates are not supported"));
                }
                _ => break,
            }
        }

        if in_chain {
            expression = Expression::OptionalChain(Box::new(expression));
        }
        Ok(expression)
    }

    fn parse_new(&mut self) -> Result<Expression> {
        self.advance(); // consume 'new'

        let mut callee = if self.check(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        while self.eat(&TokenKind::Dot) {
            let name = self.parse_property_name()?;
            callee = Expression::Member {
                object: Box::new(callee),
                property: MemberProperty::Named(name),
                optional: false,
            };
        }

        let arguments = if self.check(&TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(Expression::New {
            callee: Box::new(callee),
            arguments,
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<ArrayElement>> {
        self.expect(&TokenKind::LeftParen)?;
        let mut arguments = Vec::new();

        while !self.check(&TokenKind::RightParen) {
            if self.eat(&TokenKind::Ellipsis) {
                arguments.push(ArrayElement::Spread(self.parse_assignment()?));
            } else {
                arguments.push(ArrayElement::Expression(self.parse_assignment()?));
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RightParen)?;
        Ok(arguments)
    }

    /// Identifier or keyword after `.`.
    fn parse_property_name(&mut self) -> Result<String> {
        let name = match &self.current.kind {
            TokenKind::Identifier(name) => name.clone(),
            kind => match kind.keyword_text() {
                Some(text) => text.to_string(),
                None => return Err(self.error("expected property name")),
            },
        };
        self.advance();
        Ok(name)
    }

    /// Parses an object-literal or object-pattern key.
    pub(super) fn parse_property_key(&mut self) -> Result<PropertyKey> {
        let key = match &self.current.kind {
            TokenKind::String(value) => PropertyKey::Named(value.clone()),
            TokenKind::Number(value) => {
                PropertyKey::Named(crate::runtime::number_to_string(*value))
            }
            TokenKind::LeftBracket => {
                self.advance();
                let key = self.parse_assignment()?;
                self.expect(&TokenKind::RightBracket)?;
                return Ok(PropertyKey::Computed(Box::new(key)));
            }
            _ => return self.parse_property_name().map(PropertyKey::Named),
        };
        self.advance();
        Ok(key)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let expression = match self.current.kind.clone() {
            TokenKind::Number(value) => Expression::Number(value),
            TokenKind::String(value) => Expression::String(value),
            TokenKind::True => Expression::Boolean(true),
            TokenKind::False => Expression::Boolean(false),
            TokenKind::Null => Expression::Null,
            TokenKind::This => Expression::This,
            TokenKind::Identifier(name) => Expression::Identifier(name),
            TokenKind::Template {
                quasis,
                substitutions,
            } => {
                let mut expressions = Vec::with_capacity(substitutions.len());
                for span in substitutions {
                    let mut inner = Parser::new_in(self.source, span);
                    expressions.push(inner.parse_standalone_expression()?);
                }
                Expression::Template {
                    quasis,
                    expressions,
                }
            }
            TokenKind::LeftParen => {
                self.advance();
                let expression = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                return Ok(expression);
            }
            TokenKind::LeftBracket => return self.parse_array_literal(),
            TokenKind::LeftBrace => return self.parse_object_literal(),
            TokenKind::Function => {
                return Ok(Expression::Function(self.parse_function(false, false)?));
            }
            TokenKind::Async if self.peek_kind() == TokenKind::Function => {
                self.advance();
                return Ok(Expression::Function(self.parse_function(true, false)?));
            }
            _ => return Err(self.unexpected()),
        };

        self.advance();
        Ok(expression)
    }

    fn parse_array_literal(&mut self) -> Result<Expression> {
        self.expect(&TokenKind::LeftBracket)?;
        let mut elements = Vec::new();

        while !self.check(&TokenKind::RightBracket) {
            if self.eat(&TokenKind::Comma) {
                elements.push(ArrayElement::Hole);
                continue;
            }
            if self.eat(&TokenKind::Ellipsis) {
                elements.push(ArrayElement::Spread(self.parse_assignment()?));
            } else {
                elements.push(ArrayElement::Expression(self.parse_assignment()?));
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RightBracket)?;
        Ok(Expression::Array(elements))
    }

    fn parse_object_literal(&mut self) -> Result<Expression> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RightBrace) {
            properties.push(self.parse_object_property()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RightBrace)?;
        Ok(Expression::Object(properties))
    }

    fn parse_object_property(&mut self) -> Result<ObjectProperty> {
        if self.eat(&TokenKind::Ellipsis) {
            return Ok(ObjectProperty::Spread(self.parse_assignment()?));
        }

        let start = self.current.span.start;
        let shorthand = match &self.current.kind {
            TokenKind::Identifier(name) => Some(name.clone()),
            _ => None,
        };
        let mut is_async = false;
        let mut key = self.parse_property_key()?;

        // async method: `async name() {}`
        if key == PropertyKey::Named("async".into())
            && !matches!(
                self.current.kind,
                TokenKind::Colon | TokenKind::LeftParen | TokenKind::Comma | TokenKind::RightBrace
            )
        {
            is_async = true;
            key = self.parse_property_key()?;
        }

        match &self.current.kind {
            TokenKind::Colon if !is_async => {
                self.advance();
                let value = self.parse_assignment()?;
                Ok(ObjectProperty::KeyValue(key, value))
            }
            TokenKind::LeftParen => {
                let name = match &key {
                    PropertyKey::Named(name) => Some(name.clone()),
                    PropertyKey::Computed(_) => None,
                };
                let method = self.finish_function(name, is_async, false, start)?;
                Ok(ObjectProperty::KeyValue(key, Expression::Function(method)))
            }
            TokenKind::Comma | TokenKind::RightBrace if !is_async => match shorthand {
                Some(name) => Ok(ObjectProperty::Shorthand(name)),
                None => Err(self.unexpected()),
            },
            _ => Err(self.unexpected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expression {
        Parser::new(source)
            .parse_standalone_expression()
            .expect("should parse")
    }

    #[test]
    fn test_precedence() {
        let Expression::Binary { operator, right, .. } = expr("1 + 2 * 3") else {
            panic!("expected binary");
        };
        assert_eq!(operator, BinaryOperator::Add);
        assert!(matches!(
            *right,
            Expression::Binary {
                operator: BinaryOperator::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let Expression::Binary { left, .. } = expr("2 ** 3 ** 2") else {
            panic!("expected binary");
        };
        assert_eq!(*left, Expression::Number(2.0));
    }

    #[test]
    fn test_logical_and_conditional() {
        assert!(matches!(
            expr("a ?? b || c"),
            Expression::Logical { .. }
        ));
        assert!(matches!(
            expr("a ? b : c"),
            Expression::Conditional { .. }
        ));
    }

    #[test]
    fn test_arrow_functions() {
        let Expression::Function(f) = expr("x => x + 1") else {
            panic!("expected function");
        };
        assert!(f.is_arrow);
        assert_eq!(f.params.len(), 1);
        assert!(matches!(f.body, FunctionBody::Expression(_)));

        let Expression::Function(f) = expr("async (a, { b }, ...rest) => { return a }") else {
            panic!("expected function");
        };
        assert!(f.is_async);
        assert_eq!(f.params.len(), 2);
        assert!(f.rest.is_some());

        assert!(matches!(expr("(a + b)"), Expression::Binary { .. }));
    }

    #[test]
    fn test_object_literal_forms() {
        let Expression::Object(props) =
            expr("({ a: 1, b, 'c-d': 2, [k]: 3, ...rest, render() { return 1 }, async load() {}, default: 4 })")
        else {
            panic!("expected object");
        };
        assert_eq!(props.len(), 8);
        assert_eq!(props[1], ObjectProperty::Shorthand("b".into()));
        assert!(matches!(props[3], ObjectProperty::KeyValue(PropertyKey::Computed(_), _)));
        let ObjectProperty::KeyValue(_, Expression::Function(method)) = &props[6] else {
            panic!("expected method");
        };
        assert!(method.is_async);
    }

    #[test]
    fn test_optional_chain_wraps_whole_chain() {
        let Expression::OptionalChain(inner) = expr("a?.b.c()") else {
            panic!("expected optional chain");
        };
        assert!(matches!(*inner, Expression::Call { optional: false, .. }));
    }

    #[test]
    fn test_template_substitutions_parse() {
        let Expression::Template { quasis, expressions } = expr("`a${ b + 1 }c${ `x${y}` }`") else {
            panic!("expected template");
        };
        assert_eq!(quasis.len(), 3);
        assert_eq!(expressions.len(), 2);
        assert!(matches!(expressions[1], Expression::Template { .. }));
    }

    #[test]
    fn test_template_substitution_error_has_absolute_offset() {
        let err = Parser::new("`ok ${ ) }`").parse_standalone_expression().unwrap_err();
        assert!(matches!(err, crate::Error::Syntax { offset: 7, .. }));
    }

    #[test]
    fn test_assignment_targets() {
        assert!(matches!(expr("a.b += 1"), Expression::Assignment { .. }));
        assert!(Parser::new("1 = 2").parse_standalone_expression().is_err());
    }

    #[test]
    fn test_new_and_await() {
        assert!(matches!(expr("new Error('x')"), Expression::New { .. }));
        assert!(matches!(expr("await load('a')"), Expression::Await(_)));
    }

    #[test]
    fn test_keyword_property_names() {
        let Expression::Member { property, .. } = expr("module.default") else {
            panic!("expected member");
        };
        assert_eq!(property, MemberProperty::Named("default".into()));
    }
}
