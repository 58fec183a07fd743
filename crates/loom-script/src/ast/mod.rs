// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Abstract Syntax Tree (AST) definitions for the script subset.
//!
//! Node shapes follow ESTree loosely. Function nodes are reference counted so
//! closures created at runtime share their body with the tree.

use crate::lexer::Span;
use std::sync::Arc;

/// A complete script.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The statements in the program
    pub body: Vec<Statement>,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Variable declaration (var, let, const)
    VariableDeclaration(VariableDeclaration),
    /// Function declaration
    FunctionDeclaration(Arc<Function>),
    /// Expression statement
    Expression(Expression),
    /// Block statement { ... }
    Block(Vec<Statement>),
    /// If statement
    If(IfStatement),
    /// While statement
    While(WhileStatement),
    /// For statement
    For(ForStatement),
    /// For-of statement
    ForOf(ForOfStatement),
    /// Return statement
    Return(Option<Expression>),
    /// Break statement
    Break,
    /// Continue statement
    Continue,
    /// Throw statement
    Throw(Expression),
    /// Try statement
    Try(TryStatement),
    /// Empty statement (;)
    Empty,
}

/// Variable declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// var declaration
    Var,
    /// let declaration
    Let,
    /// const declaration
    Const,
}

/// A variable declaration statement.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    /// The kind of declaration
    pub kind: VariableKind,
    /// The declarators
    pub declarations: Vec<VariableDeclarator>,
}

/// A single variable declarator.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    /// The binding target
    pub id: Pattern,
    /// Optional initializer expression
    pub init: Option<Expression>,
}

/// A binding pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// `name`
    Identifier(String),
    /// `{ a, b: c, ...rest }`
    Object {
        /// Destructured properties
        properties: Vec<PatternProperty>,
        /// Name bound to the remaining properties
        rest: Option<String>,
    },
    /// `[a, , b, ...rest]`
    Array {
        /// Elements; `None` marks a hole
        elements: Vec<Option<Pattern>>,
        /// Pattern bound to the remaining elements
        rest: Option<Box<Pattern>>,
    },
    /// `pattern = default`
    Default(Box<Pattern>, Box<Expression>),
}

impl Pattern {
    /// Collects every name this pattern binds, in source order.
    pub fn bound_names(&self, names: &mut Vec<String>) {
        match self {
            Pattern::Identifier(name) => names.push(name.clone()),
            Pattern::Object { properties, rest } => {
                for property in properties {
                    property.value.bound_names(names);
                }
                if let Some(rest) = rest {
                    names.push(rest.clone());
                }
            }
            Pattern::Array { elements, rest } => {
                for element in elements.iter().flatten() {
                    element.bound_names(names);
                }
                if let Some(rest) = rest {
                    rest.bound_names(names);
                }
            }
            Pattern::Default(inner, _) => inner.bound_names(names),
        }
    }
}

/// A property inside an object pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternProperty {
    /// The property read from the source object
    pub key: PropertyKey,
    /// Where the value is bound
    pub value: Pattern,
}

/// A function of any flavour (declaration, expression, arrow, method).
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// The function name, if any
    pub name: Option<String>,
    /// The parameters
    pub params: Vec<Pattern>,
    /// Rest parameter
    pub rest: Option<Pattern>,
    /// The function body
    pub body: FunctionBody,
    /// Whether this is an async function
    pub is_async: bool,
    /// Arrow functions capture `this` lexically
    pub is_arrow: bool,
    /// Source span, used when printing the function
    pub span: Span,
}

/// The body of a function.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    /// `{ statements }`
    Block(Vec<Statement>),
    /// Concise arrow body `=> expression`
    Expression(Box<Expression>),
}

/// An if statement.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    /// The condition
    pub test: Expression,
    /// The then branch
    pub consequent: Box<Statement>,
    /// The optional else branch
    pub alternate: Option<Box<Statement>>,
}

/// A while statement.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    /// The condition
    pub test: Expression,
    /// The loop body
    pub body: Box<Statement>,
}

/// A for statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    /// The initializer (declaration or expression statement)
    pub init: Option<Box<Statement>>,
    /// The condition
    pub test: Option<Expression>,
    /// The update expression
    pub update: Option<Expression>,
    /// The loop body
    pub body: Box<Statement>,
}

/// A for-of statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ForOfStatement {
    /// Declaration kind of the loop variable
    pub kind: VariableKind,
    /// The loop variable pattern
    pub left: Pattern,
    /// The iterated expression
    pub right: Expression,
    /// The loop body
    pub body: Box<Statement>,
}

/// A try statement.
#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    /// The protected block
    pub block: Vec<Statement>,
    /// The catch parameter
    pub param: Option<Pattern>,
    /// The catch block
    pub handler: Option<Vec<Statement>>,
    /// The finally block
    pub finalizer: Option<Vec<Statement>>,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// null
    Null,
    /// Template literal
    Template {
        /// Cooked string parts, one more than `expressions`
        quasis: Vec<String>,
        /// Substituted expressions
        expressions: Vec<Expression>,
    },
    /// Identifier reference
    Identifier(String),
    /// this
    This,
    /// Array literal
    Array(Vec<ArrayElement>),
    /// Object literal
    Object(Vec<ObjectProperty>),
    /// Function or arrow function expression
    Function(Arc<Function>),
    /// Unary operation
    Unary {
        /// The operator
        operator: UnaryOperator,
        /// The operand
        argument: Box<Expression>,
    },
    /// `++x`, `x--`
    Update {
        /// Increment or decrement
        increment: bool,
        /// Prefix form returns the new value
        prefix: bool,
        /// The target
        argument: Box<Expression>,
    },
    /// Binary operation
    Binary {
        /// The operator
        operator: BinaryOperator,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// Short-circuiting operation
    Logical {
        /// The operator
        operator: LogicalOperator,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// `test ? consequent : alternate`
    Conditional {
        /// The condition
        test: Box<Expression>,
        /// Value when truthy
        consequent: Box<Expression>,
        /// Value when falsy
        alternate: Box<Expression>,
    },
    /// Assignment
    Assignment {
        /// `=` or a compound operator
        operator: AssignmentOperator,
        /// Identifier or member target
        target: Box<Expression>,
        /// Assigned value
        value: Box<Expression>,
    },
    /// Property access
    Member {
        /// The object
        object: Box<Expression>,
        /// The property
        property: MemberProperty,
        /// `?.` access
        optional: bool,
    },
    /// Function call
    Call {
        /// The callee
        callee: Box<Expression>,
        /// The arguments
        arguments: Vec<ArrayElement>,
        /// `?.()` call
        optional: bool,
    },
    /// `new Callee(args)`
    New {
        /// The constructor
        callee: Box<Expression>,
        /// The arguments
        arguments: Vec<ArrayElement>,
    },
    /// Boundary of an optional chain; short-circuits to `undefined`
    OptionalChain(Box<Expression>),
    /// `await expression`
    Await(Box<Expression>),
    /// `a, b`
    Sequence(Vec<Expression>),
}

/// An element of an array literal or argument list.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElement {
    /// Plain expression
    Expression(Expression),
    /// `...expression`
    Spread(Expression),
    /// Elision (`[a, , b]`)
    Hole,
}

/// A property in an object literal.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProperty {
    /// `key: value` (methods are function values)
    KeyValue(PropertyKey, Expression),
    /// `{ name }`
    Shorthand(String),
    /// `{ ...source }`
    Spread(Expression),
}

/// A property key.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    /// Identifier, string or number key
    Named(String),
    /// `[expression]`
    Computed(Box<Expression>),
}

/// The property of a member expression.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// `.name`
    Named(String),
    /// `[expression]`
    Computed(Box<Expression>),
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// !
    Not,
    /// -
    Minus,
    /// +
    Plus,
    /// ~
    BitwiseNot,
    /// typeof
    Typeof,
    /// void
    Void,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// +
    Add,
    /// -
    Subtract,
    /// *
    Multiply,
    /// /
    Divide,
    /// %
    Modulo,
    /// **
    Exponent,
    /// ==
    Equal,
    /// !=
    NotEqual,
    /// ===
    StrictEqual,
    /// !==
    StrictNotEqual,
    /// <
    LessThan,
    /// <=
    LessThanEqual,
    /// >
    GreaterThan,
    /// >=
    GreaterThanEqual,
    /// in
    In,
    /// instanceof
    Instanceof,
}

/// Short-circuit operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    /// &&
    And,
    /// ||
    Or,
    /// ??
    Nullish,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    /// =
    Assign,
    /// += -= *= /= %=
    Compound(BinaryOperator),
    /// &&= ||= ??=
    Logical(LogicalOperator),
}
