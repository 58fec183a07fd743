// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Asynchronous tree-walking interpreter.
//!
//! Every evaluation step returns a boxed future so that `await` inside a
//! script can suspend on host futures (module loads, for instance) without
//! blocking the executor. Values are never pending promises: calling an
//! `async` function runs it to completion, and `await` on a plain value
//! yields the value.

pub mod operators;

use crate::ast::*;
use crate::builtins;
use crate::error::{Error, Result};
use crate::parser;
use crate::runtime::{
    Callable, Closure, Environment, Exception, FunctionObject, ObjectRef, Scope, Value,
};
use futures::future::{BoxFuture, FutureExt};
use operators::to_property_key;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Nesting limit for script function calls.
const MAX_CALL_DEPTH: usize = 64;

/// The script interpreter.
///
/// Cloning is cheap: clones share the global scope and the step budget.
#[derive(Clone)]
pub struct Interpreter {
    globals: Scope,
    budget: Arc<Budget>,
    depth: usize,
}

#[derive(Debug)]
struct Budget {
    limit: Option<u64>,
    used: AtomicU64,
}

impl Budget {
    fn new(limit: Option<u64>) -> Self {
        Self {
            limit,
            used: AtomicU64::new(0),
        }
    }

    fn step(&self) -> std::result::Result<(), Exception> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        if self.used.fetch_add(1, Ordering::Relaxed) >= limit {
            return Err(Exception::range_error(format!(
                "step limit of {} exceeded",
                limit
            )));
        }
        Ok(())
    }
}

/// Per-activation state: the current scope and `this`.
#[derive(Clone)]
struct Context {
    scope: Scope,
    this: Value,
}

impl Context {
    fn child(&self) -> Context {
        Context {
            scope: Environment::child(&self.scope),
            this: self.this.clone(),
        }
    }
}

/// How a statement finished.
enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

type Eval<'a, T> = BoxFuture<'a, std::result::Result<T, Exception>>;

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("step_limit", &self.budget.limit)
            .field("depth", &self.depth)
            .finish()
    }
}

impl Interpreter {
    /// Creates an interpreter with the built-in globals installed.
    pub fn new() -> Self {
        let globals = Environment::global();
        builtins::install(&globals);
        Self {
            globals,
            budget: Arc::new(Budget::new(None)),
            depth: 0,
        }
    }

    /// Bounds the number of evaluation steps; exceeding it throws a
    /// `RangeError`.
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.budget = Arc::new(Budget::new(Some(limit)));
        self
    }

    /// Returns a handle sharing the globals but with an unused step budget.
    pub fn with_fresh_budget(&self) -> Self {
        Self {
            globals: Arc::clone(&self.globals),
            budget: Arc::new(Budget::new(self.budget.limit)),
            depth: self.depth,
        }
    }

    /// The configured step limit.
    pub fn step_limit(&self) -> Option<u64> {
        self.budget.limit
    }

    /// Defines (or replaces) a global binding.
    pub fn define_global(&self, name: impl Into<String>, value: Value) {
        self.globals.declare(name, value, false);
    }

    /// Reads a global binding.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name)
    }

    /// Evaluates `source` as a script body. A top-level `return` provides
    /// the result; otherwise a trailing expression statement does.
    pub async fn evaluate(&self, source: &str) -> Result<Value> {
        let program = parser::parse_function_body(source)?;
        let ctx = Context {
            scope: Environment::child(&self.globals),
            this: Value::Undefined,
        };
        self.hoist_functions(&program.body, &ctx);

        let last = program.body.len().saturating_sub(1);
        for (index, statement) in program.body.iter().enumerate() {
            if index == last {
                if let Statement::Expression(expression) = statement {
                    return Ok(self.eval(expression, &ctx).await?);
                }
            }
            match self.execute(statement, &ctx).await? {
                Completion::Return(value) => return Ok(value),
                Completion::Normal => {}
                Completion::Break | Completion::Continue => {
                    return Err(Error::syntax("illegal break or continue", 0));
                }
            }
        }
        Ok(Value::Undefined)
    }

    /// Evaluates `source`, which must be a single function expression, in
    /// the global scope and returns the function without calling it.
    pub fn eval_function(&self, source: &str) -> Result<Value> {
        let Expression::Function(function) = parser::parse_expression(source)? else {
            return Err(Error::syntax("expected a function expression", 0));
        };
        let ctx = Context {
            scope: Arc::clone(&self.globals),
            this: Value::Undefined,
        };
        Ok(self.make_closure(&function, &ctx))
    }

    /// Calls a function value.
    pub fn call(
        &self,
        function: &Value,
        this: Value,
        args: Vec<Value>,
    ) -> BoxFuture<'static, std::result::Result<Value, Exception>> {
        let interpreter = self.clone();
        let function = function.clone();
        async move {
            let Value::Function(object) = &function else {
                return Err(Exception::type_error(format!(
                    "{} is not a function",
                    function.inspect()
                )));
            };
            match &object.callable {
                Callable::Native(native) => native.invoke(interpreter, this, args).await,
                Callable::Closure(closure) => interpreter.call_closure(closure, this, args).await,
            }
        }
        .boxed()
    }

    /// `new function(...args)`; only native constructors are supported.
    pub async fn construct(
        &self,
        function: &Value,
        args: Vec<Value>,
    ) -> std::result::Result<Value, Exception> {
        match function {
            Value::Function(object) if object.is_constructor() => {
                self.call(function, Value::Undefined, args).await
            }
            other => Err(Exception::type_error(format!(
                "{} is not a constructor",
                other.inspect()
            ))),
        }
    }

    async fn call_closure(
        &self,
        closure: &Closure,
        this: Value,
        args: Vec<Value>,
    ) -> std::result::Result<Value, Exception> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(Exception::range_error("Maximum call stack size exceeded"));
        }
        self.budget.step()?;

        let inner = Interpreter {
            depth: self.depth + 1,
            ..self.clone()
        };
        let ctx = Context {
            scope: Environment::child(&closure.scope),
            this: closure.this.clone().unwrap_or(this),
        };
        let function = &closure.function;
        trace!(name = function.name.as_deref().unwrap_or("<anonymous>"), "call");

        let mut args = args.into_iter();
        for param in &function.params {
            let value = args.next().unwrap_or_default();
            inner.bind_pattern(param, value, &ctx, true).await?;
        }
        if let Some(rest) = &function.rest {
            inner
                .bind_pattern(rest, Value::array(args.collect()), &ctx, true)
                .await?;
        }

        match &function.body {
            FunctionBody::Block(body) => match inner.execute_block(body, &ctx).await? {
                Completion::Return(value) => Ok(value),
                _ => Ok(Value::Undefined),
            },
            FunctionBody::Expression(expression) => inner.eval(expression, &ctx).await,
        }
    }

    fn make_closure(&self, function: &Arc<Function>, ctx: &Context) -> Value {
        let closure = Closure {
            function: Arc::clone(function),
            scope: Arc::clone(&ctx.scope),
            this: function.is_arrow.then(|| ctx.this.clone()),
        };
        Value::Function(Arc::new(FunctionObject::from(closure)))
    }

    fn hoist_functions(&self, body: &[Statement], ctx: &Context) {
        for statement in body {
            if let Statement::FunctionDeclaration(function) = statement {
                if let Some(name) = &function.name {
                    ctx.scope
                        .declare(name.clone(), self.make_closure(function, ctx), true);
                }
            }
        }
    }

    // Statements

    fn execute_block<'a>(&'a self, body: &'a [Statement], ctx: &'a Context) -> Eval<'a, Completion> {
        async move {
            self.hoist_functions(body, ctx);
            for statement in body {
                match self.execute(statement, ctx).await? {
                    Completion::Normal => {}
                    other => return Ok(other),
                }
            }
            Ok(Completion::Normal)
        }
        .boxed()
    }

    fn execute<'a>(&'a self, statement: &'a Statement, ctx: &'a Context) -> Eval<'a, Completion> {
        async move {
            self.budget.step()?;

            match statement {
                Statement::VariableDeclaration(declaration) => {
                    let mutable = declaration.kind != VariableKind::Const;
                    for declarator in &declaration.declarations {
                        let value = match &declarator.init {
                            Some(init) => self.eval(init, ctx).await?,
                            None => Value::Undefined,
                        };
                        self.bind_pattern(&declarator.id, value, ctx, mutable).await?;
                    }
                    Ok(Completion::Normal)
                }
                Statement::FunctionDeclaration(_) | Statement::Empty => Ok(Completion::Normal),
                Statement::Expression(expression) => {
                    self.eval(expression, ctx).await?;
                    Ok(Completion::Normal)
                }
                Statement::Block(body) => self.execute_block(body, &ctx.child()).await,
                Statement::If(stmt) => {
                    if self.eval(&stmt.test, ctx).await?.to_boolean() {
                        self.execute(&stmt.consequent, ctx).await
                    } else if let Some(alternate) = &stmt.alternate {
                        self.execute(alternate, ctx).await
                    } else {
                        Ok(Completion::Normal)
                    }
                }
                Statement::While(stmt) => {
                    while self.eval(&stmt.test, ctx).await?.to_boolean() {
                        self.budget.step()?;
                        match self.execute(&stmt.body, ctx).await? {
                            Completion::Break => break,
                            Completion::Return(value) => return Ok(Completion::Return(value)),
                            Completion::Normal | Completion::Continue => {}
                        }
                    }
                    Ok(Completion::Normal)
                }
                Statement::For(stmt) => {
                    let loop_ctx = ctx.child();
                    if let Some(init) = &stmt.init {
                        self.execute(init, &loop_ctx).await?;
                    }
                    loop {
                        if let Some(test) = &stmt.test {
                            if !self.eval(test, &loop_ctx).await?.to_boolean() {
                                break;
                            }
                        }
                        self.budget.step()?;
                        match self.execute(&stmt.body, &loop_ctx).await? {
                            Completion::Break => break,
                            Completion::Return(value) => return Ok(Completion::Return(value)),
                            Completion::Normal | Completion::Continue => {}
                        }
                        if let Some(update) = &stmt.update {
                            self.eval(update, &loop_ctx).await?;
                        }
                    }
                    Ok(Completion::Normal)
                }
                Statement::ForOf(stmt) => {
                    let iterable = self.eval(&stmt.right, ctx).await?;
                    let mutable = stmt.kind != VariableKind::Const;
                    for item in iterate(&iterable)? {
                        self.budget.step()?;
                        let iteration = ctx.child();
                        self.bind_pattern(&stmt.left, item, &iteration, mutable).await?;
                        match self.execute(&stmt.body, &iteration).await? {
                            Completion::Break => break,
                            Completion::Return(value) => return Ok(Completion::Return(value)),
                            Completion::Normal | Completion::Continue => {}
                        }
                    }
                    Ok(Completion::Normal)
                }
                Statement::Return(argument) => {
                    let value = match argument {
                        Some(argument) => self.eval(argument, ctx).await?,
                        None => Value::Undefined,
                    };
                    Ok(Completion::Return(value))
                }
                Statement::Break => Ok(Completion::Break),
                Statement::Continue => Ok(Completion::Continue),
                Statement::Throw(argument) => {
                    let value = self.eval(argument, ctx).await?;
                    Err(Exception::new(value))
                }
                Statement::Try(stmt) => self.execute_try(stmt, ctx).await,
            }
        }
        .boxed()
    }

    async fn execute_try(
        &self,
        stmt: &TryStatement,
        ctx: &Context,
    ) -> std::result::Result<Completion, Exception> {
        let result = self.execute_block(&stmt.block, &ctx.child()).await;

        let result = match (result, &stmt.handler) {
            (Err(exception), Some(handler)) => {
                let catch_ctx = ctx.child();
                let bound = match &stmt.param {
                    Some(param) => {
                        self.bind_pattern(param, exception.into_value(), &catch_ctx, true)
                            .await
                    }
                    None => Ok(()),
                };
                match bound {
                    Ok(()) => self.execute_block(handler, &catch_ctx).await,
                    Err(error) => Err(error),
                }
            }
            (result, _) => result,
        };

        if let Some(finalizer) = &stmt.finalizer {
            match self.execute_block(finalizer, &ctx.child()).await? {
                Completion::Normal => {}
                other => return Ok(other),
            }
        }

        result
    }

    fn bind_pattern<'a>(
        &'a self,
        pattern: &'a Pattern,
        value: Value,
        ctx: &'a Context,
        mutable: bool,
    ) -> Eval<'a, ()> {
        async move {
            match pattern {
                Pattern::Identifier(name) => {
                    ctx.scope.declare(name.clone(), value, mutable);
                }
                Pattern::Default(inner, default) => {
                    let value = if value.is_undefined() {
                        self.eval(default, ctx).await?
                    } else {
                        value
                    };
                    self.bind_pattern(inner, value, ctx, mutable).await?;
                }
                Pattern::Object { properties, rest } => {
                    if value.is_nullish() {
                        return Err(Exception::type_error(format!(
                            "Cannot destructure '{}' as it is {}.",
                            value, value
                        )));
                    }
                    let mut used = Vec::with_capacity(properties.len());
                    for property in properties {
                        let key = self.property_key(&property.key, ctx).await?;
                        let item = get_property(&value, &key)?;
                        used.push(key);
                        self.bind_pattern(&property.value, item, ctx, mutable).await?;
                    }
                    if let Some(rest) = rest {
                        let remaining = match &value {
                            Value::Object(object) => object
                                .entries()
                                .into_iter()
                                .filter(|(key, _)| !used.contains(key))
                                .collect(),
                            _ => Vec::new(),
                        };
                        ctx.scope.declare(rest.clone(), Value::object(remaining), mutable);
                    }
                }
                Pattern::Array { elements, rest } => {
                    let items = iterate(&value)?;
                    for (index, element) in elements.iter().enumerate() {
                        if let Some(element) = element {
                            let item = items.get(index).cloned().unwrap_or_default();
                            self.bind_pattern(element, item, ctx, mutable).await?;
                        }
                    }
                    if let Some(rest) = rest {
                        let remaining = items.into_iter().skip(elements.len()).collect();
                        self.bind_pattern(rest, Value::array(remaining), ctx, mutable)
                            .await?;
                    }
                }
            }
            Ok(())
        }
        .boxed()
    }

    // Expressions

    fn eval<'a>(&'a self, expression: &'a Expression, ctx: &'a Context) -> Eval<'a, Value> {
        async move {
            let value = match expression {
                Expression::Number(n) => Value::Number(*n),
                Expression::String(s) => Value::String(s.clone()),
                Expression::Boolean(b) => Value::Boolean(*b),
                Expression::Null => Value::Null,
                Expression::Template {
                    quasis,
                    expressions,
                } => {
                    let mut out = quasis.first().cloned().unwrap_or_default();
                    for (index, expression) in expressions.iter().enumerate() {
                        let value = self.eval(expression, ctx).await?;
                        out.push_str(&value.to_js_string());
                        if let Some(quasi) = quasis.get(index + 1) {
                            out.push_str(quasi);
                        }
                    }
                    Value::String(out)
                }
                Expression::Identifier(name) => lookup(name, ctx)?,
                Expression::This => ctx.this.clone(),
                Expression::Array(elements) => Value::array(self.eval_elements(elements, ctx).await?),
                Expression::Object(properties) => self.eval_object(properties, ctx).await?,
                Expression::Function(function) => self.make_closure(function, ctx),
                Expression::Unary { operator, argument } => {
                    // typeof tolerates undeclared names
                    if let (UnaryOperator::Typeof, Expression::Identifier(name)) =
                        (operator, argument.as_ref())
                    {
                        let value = ctx.scope.get(name).unwrap_or_default();
                        return Ok(Value::from(value.type_of()));
                    }
                    let value = self.eval(argument, ctx).await?;
                    operators::unary(*operator, &value)
                }
                Expression::Update {
                    increment,
                    prefix,
                    argument,
                } => {
                    let old = self.eval(argument, ctx).await?.to_number();
                    let new = if *increment { old + 1.0 } else { old - 1.0 };
                    self.assign(argument, Value::Number(new), ctx).await?;
                    Value::Number(if *prefix { new } else { old })
                }
                Expression::Binary {
                    operator,
                    left,
                    right,
                } => {
                    let left = self.eval(left, ctx).await?;
                    let right = self.eval(right, ctx).await?;
                    operators::binary(*operator, &left, &right)?
                }
                Expression::Logical {
                    operator,
                    left,
                    right,
                } => {
                    let left = self.eval(left, ctx).await?;
                    if short_circuits(*operator, &left) {
                        left
                    } else {
                        self.eval(right, ctx).await?
                    }
                }
                Expression::Conditional {
                    test,
                    consequent,
                    alternate,
                } => {
                    if self.eval(test, ctx).await?.to_boolean() {
                        self.eval(consequent, ctx).await?
                    } else {
                        self.eval(alternate, ctx).await?
                    }
                }
                Expression::Assignment {
                    operator,
                    target,
                    value,
                } => match operator {
                    AssignmentOperator::Assign => {
                        let value = self.eval(value, ctx).await?;
                        self.assign(target, value.clone(), ctx).await?;
                        value
                    }
                    AssignmentOperator::Compound(op) => {
                        let current = self.eval(target, ctx).await?;
                        let right = self.eval(value, ctx).await?;
                        let value = operators::binary(*op, &current, &right)?;
                        self.assign(target, value.clone(), ctx).await?;
                        value
                    }
                    AssignmentOperator::Logical(op) => {
                        let current = self.eval(target, ctx).await?;
                        if short_circuits(*op, &current) {
                            current
                        } else {
                            let value = self.eval(value, ctx).await?;
                            self.assign(target, value.clone(), ctx).await?;
                            value
                        }
                    }
                },
                Expression::Member { .. } | Expression::Call { .. } => {
                    self.eval_chain(expression, ctx).await?.unwrap_or_default()
                }
                Expression::OptionalChain(inner) => {
                    self.eval_chain(inner, ctx).await?.unwrap_or_default()
                }
                Expression::New { callee, arguments } => {
                    let constructor = self.eval(callee, ctx).await?;
                    let args = self.eval_elements(arguments, ctx).await?;
                    self.construct(&constructor, args).await?
                }
                Expression::Await(argument) => self.eval(argument, ctx).await?,
                Expression::Sequence(expressions) => {
                    let mut last = Value::Undefined;
                    for expression in expressions {
                        last = self.eval(expression, ctx).await?;
                    }
                    last
                }
            };
            Ok(value)
        }
        .boxed()
    }

    /// Evaluates member and call chains. `None` means an optional link
    /// short-circuited.
    fn eval_chain<'a>(&'a self, expression: &'a Expression, ctx: &'a Context) -> Eval<'a, Option<Value>> {
        async move {
            match expression {
                Expression::Member {
                    object,
                    property,
                    optional,
                } => {
                    let Some(target) = self.eval_chain(object, ctx).await? else {
                        return Ok(None);
                    };
                    if *optional && target.is_nullish() {
                        return Ok(None);
                    }
                    let key = self.member_key(property, ctx).await?;
                    Ok(Some(get_property(&target, &key)?))
                }
                Expression::Call {
                    callee,
                    arguments,
                    optional,
                } => {
                    let (this, function) = match callee.as_ref() {
                        Expression::Member {
                            object,
                            property,
                            optional: member_optional,
                        } => {
                            let Some(target) = self.eval_chain(object, ctx).await? else {
                                return Ok(None);
                            };
                            if *member_optional && target.is_nullish() {
                                return Ok(None);
                            }
                            let key = self.member_key(property, ctx).await?;
                            let function = get_property(&target, &key)?;
                            (target, function)
                        }
                        other => {
                            let Some(function) = self.eval_chain(other, ctx).await? else {
                                return Ok(None);
                            };
                            (Value::Undefined, function)
                        }
                    };

                    if *optional && function.is_nullish() {
                        return Ok(None);
                    }
                    if !function.is_function() {
                        return Err(Exception::type_error(format!(
                            "{} is not a function",
                            describe(callee)
                        )));
                    }

                    let args = self.eval_elements(arguments, ctx).await?;
                    Ok(Some(self.call(&function, this, args).await?))
                }
                other => Ok(Some(self.eval(other, ctx).await?)),
            }
        }
        .boxed()
    }

    async fn assign(
        &self,
        target: &Expression,
        value: Value,
        ctx: &Context,
    ) -> std::result::Result<(), Exception> {
        match target {
            Expression::Identifier(name) => ctx.scope.set(name, value),
            Expression::Member {
                object, property, ..
            } => {
                let object = self.eval(object, ctx).await?;
                let key = self.member_key(property, ctx).await?;
                set_property(&object, key, value)
            }
            _ => Err(Exception::error("SyntaxError", "Invalid assignment target")),
        }
    }

    async fn member_key(
        &self,
        property: &MemberProperty,
        ctx: &Context,
    ) -> std::result::Result<String, Exception> {
        match property {
            MemberProperty::Named(name) => Ok(name.clone()),
            MemberProperty::Computed(expression) => {
                Ok(to_property_key(&self.eval(expression, ctx).await?))
            }
        }
    }

    async fn property_key(
        &self,
        key: &PropertyKey,
        ctx: &Context,
    ) -> std::result::Result<String, Exception> {
        match key {
            PropertyKey::Named(name) => Ok(name.clone()),
            PropertyKey::Computed(expression) => {
                Ok(to_property_key(&self.eval(expression, ctx).await?))
            }
        }
    }

    async fn eval_elements(
        &self,
        elements: &[ArrayElement],
        ctx: &Context,
    ) -> std::result::Result<Vec<Value>, Exception> {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                ArrayElement::Expression(expression) => {
                    values.push(self.eval(expression, ctx).await?)
                }
                ArrayElement::Spread(expression) => {
                    let spread = self.eval(expression, ctx).await?;
                    values.extend(iterate(&spread)?);
                }
                ArrayElement::Hole => values.push(Value::Undefined),
            }
        }
        Ok(values)
    }

    async fn eval_object(
        &self,
        properties: &[ObjectProperty],
        ctx: &Context,
    ) -> std::result::Result<Value, Exception> {
        let object = ObjectRef::new();
        for property in properties {
            match property {
                ObjectProperty::KeyValue(key, value) => {
                    let key = self.property_key(key, ctx).await?;
                    let value = self.eval(value, ctx).await?;
                    object.set(key, value);
                }
                ObjectProperty::Shorthand(name) => {
                    object.set(name.clone(), lookup(name, ctx)?);
                }
                ObjectProperty::Spread(expression) => {
                    for (key, value) in own_entries(&self.eval(expression, ctx).await?) {
                        object.set(key, value);
                    }
                }
            }
        }
        Ok(Value::Object(object))
    }
}

fn lookup(name: &str, ctx: &Context) -> std::result::Result<Value, Exception> {
    ctx.scope
        .get(name)
        .ok_or_else(|| Exception::reference_error(format!("{} is not defined", name)))
}

fn short_circuits(operator: LogicalOperator, left: &Value) -> bool {
    match operator {
        LogicalOperator::And => !left.to_boolean(),
        LogicalOperator::Or => left.to_boolean(),
        LogicalOperator::Nullish => !left.is_nullish(),
    }
}

/// Names a callee for error messages (`a.b.c is not a function`).
fn describe(expression: &Expression) -> String {
    match expression {
        Expression::Identifier(name) => name.clone(),
        Expression::This => "this".to_string(),
        Expression::Member {
            object,
            property: MemberProperty::Named(name),
            ..
        } => format!("{}.{}", describe(object), name),
        Expression::Member { object, .. } => format!("{}[...]", describe(object)),
        Expression::Call { callee, .. } => format!("{}(...)", describe(callee)),
        _ => "expression".to_string(),
    }
}

/// Expands an iterable value into its items.
pub(crate) fn iterate(value: &Value) -> std::result::Result<Vec<Value>, Exception> {
    match value {
        Value::Array(array) => Ok(array.to_vec()),
        Value::String(s) => Ok(s.chars().map(|c| Value::String(c.to_string())).collect()),
        other => Err(Exception::type_error(format!(
            "{} is not iterable",
            other.inspect()
        ))),
    }
}

/// Own enumerable entries, as used by spread and `Object.entries`.
pub(crate) fn own_entries(value: &Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(object) => object.entries(),
        Value::Array(array) => array
            .to_vec()
            .into_iter()
            .enumerate()
            .map(|(index, value)| (index.to_string(), value))
            .collect(),
        Value::String(s) => s
            .chars()
            .enumerate()
            .map(|(index, c)| (index.to_string(), Value::String(c.to_string())))
            .collect(),
        _ => Vec::new(),
    }
}

/// Reads `target[key]`, including the methods of built-in types.
pub fn get_property(target: &Value, key: &str) -> std::result::Result<Value, Exception> {
    let value = match target {
        Value::Undefined | Value::Null => {
            return Err(Exception::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                target, key
            )));
        }
        Value::Object(object) => match object.get(key) {
            Some(value) => value,
            None => builtins::object::method(key).map(Value::native).unwrap_or_default(),
        },
        Value::Array(array) => match key {
            "length" => Value::from(array.len()),
            _ => match key.parse::<usize>() {
                Ok(index) => array.get(index),
                Err(_) => builtins::array::method(key).map(Value::native).unwrap_or_default(),
            },
        },
        Value::String(s) => match key {
            "length" => Value::from(s.encode_utf16().count()),
            _ => match key.parse::<usize>() {
                Ok(index) => s
                    .chars()
                    .nth(index)
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or_default(),
                Err(_) => builtins::string::method(key).map(Value::native).unwrap_or_default(),
            },
        },
        Value::Function(function) => match function.properties.get(key) {
            Some(value) => value,
            None if key == "name" => Value::from(function.name()),
            None => Value::Undefined,
        },
        Value::Number(_) => builtins::number::method(key).map(Value::native).unwrap_or_default(),
        Value::Boolean(_) => Value::Undefined,
    };
    Ok(value)
}

/// Writes `target[key] = value`.
pub fn set_property(target: &Value, key: String, value: Value) -> std::result::Result<(), Exception> {
    match target {
        Value::Undefined | Value::Null => Err(Exception::type_error(format!(
            "Cannot set properties of {} (setting '{}')",
            target, key
        ))),
        Value::Object(object) => {
            object.set(key, value);
            Ok(())
        }
        Value::Array(array) => {
            if key == "length" {
                let len = value.to_number();
                if len < 0.0 || len.fract() != 0.0 || !len.is_finite() {
                    return Err(Exception::range_error("Invalid array length"));
                }
                array.set_len(len as usize)?;
            } else if let Ok(index) = key.parse::<usize>() {
                array.set(index, value)?;
            }
            Ok(())
        }
        Value::Function(function) => {
            function.properties.set(key, value);
            Ok(())
        }
        // Writes to primitives are silently dropped.
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn eval(source: &str) -> Value {
        Interpreter::new()
            .evaluate(source)
            .await
            .unwrap_or_else(|e| panic!("{source}: {e}"))
    }

    async fn eval_err(source: &str) -> Error {
        Interpreter::new()
            .evaluate(source)
            .await
            .expect_err("should fail")
    }

    #[tokio::test]
    async fn test_arithmetic_and_variables() {
        assert_eq!(eval("const a = 2; let b = 3; a * b + 1").await, Value::Number(7.0));
        assert_eq!(eval("let x = 1; x += 4; x++; x").await, Value::Number(6.0));
        assert_eq!(eval("'a' + 1 + 2").await, Value::from("a12"));
    }

    #[tokio::test]
    async fn test_functions_and_closures() {
        let source = "
            function counter() {
                let n = 0
                return () => ++n
            }
            const next = counter()
            next(); next()
            next()
        ";
        assert_eq!(eval(source).await, Value::Number(3.0));
        assert_eq!(eval("const f = (a, b = 10, ...rest) => a + b + rest.length; f(1)").await, Value::Number(11.0));
        assert_eq!(eval("hoisted(); function hoisted() { return 'ok' }").await, Value::Undefined);
        assert_eq!(eval("return hoisted(); function hoisted() { return 'ok' }").await, Value::from("ok"));
    }

    #[tokio::test]
    async fn test_destructuring() {
        let source = "
            const { a, b: { c }, d = 4, ...rest } = { a: 1, b: { c: 2 }, e: 5, f: 6 }
            const [x, , y = 9, ...tail] = [7, 8, undefined, 10, 11]
            return [a, c, d, Object.keys(rest).join(''), x, y, tail.length].join(',')
        ";
        assert_eq!(eval(source).await, Value::from("1,2,4,ef,7,9,2"));
    }

    #[tokio::test]
    async fn test_objects_are_shared_references() {
        let source = "
            const a = { n: 1 }
            const b = a
            b.n = 2
            return a.n === 2 && a === b && a !== { n: 2 }
        ";
        assert_eq!(eval(source).await, Value::Boolean(true));
    }

    #[tokio::test]
    async fn test_control_flow() {
        let source = "
            let total = 0
            for (let i = 0; i < 10; i++) {
                if (i % 2) continue
                if (i > 6) break
                total += i
            }
            for (const n of [1, 2, 3]) total += n
            let w = 3
            while (w--) total++
            return total
        ";
        assert_eq!(eval(source).await, Value::Number(21.0));
    }

    #[tokio::test]
    async fn test_try_catch_finally() {
        let source = "
            const log = []
            try {
                log.push('try')
                null.x
            } catch (e) {
                log.push(e instanceof TypeError ? 'type' : 'other')
            } finally {
                log.push('finally')
            }
            try { throw new RangeError('r') } catch ({ message }) { log.push(message) }
            return log.join(' ')
        ";
        assert_eq!(eval(source).await, Value::from("try type finally r"));
    }

    #[tokio::test]
    async fn test_uncaught_throw_surfaces_value() {
        let Error::Thrown(exception) = eval_err("throw new Error('boom')").await else {
            panic!("expected a thrown error");
        };
        assert_eq!(exception.message(), "boom");

        let Error::Thrown(exception) = eval_err("missing + 1").await else {
            panic!("expected a thrown error");
        };
        assert_eq!(exception.to_string(), "ReferenceError: missing is not defined");
    }

    #[tokio::test]
    async fn test_optional_chaining_and_nullish() {
        assert_eq!(eval("const o = null; o?.a.b.c").await, Value::Undefined);
        assert_eq!(eval("const o = { f: null }; o.f?.()").await, Value::Undefined);
        assert_eq!(eval("const o = {}; o.a ?? 'default'").await, Value::from("default"));
        assert_eq!(eval("let v = 0; v ||= 5; v").await, Value::Number(5.0));
    }

    #[tokio::test]
    async fn test_not_a_function_message() {
        let Error::Thrown(exception) = eval_err("const o = {}; o.missing()").await else {
            panic!("expected a thrown error");
        };
        assert_eq!(exception.message(), "o.missing is not a function");
    }

    #[tokio::test]
    async fn test_huge_array_writes_throw_range_errors() {
        let source = "
            const arr = [1]
            const caught = []
            try { arr[4294967294] = 1 } catch (e) { caught.push(e.name) }
            try { arr.length = 4294967295 } catch (e) { caught.push(e.name) }
            arr[3] = 2
            return caught.join(' ') + ' ' + arr.length
        ";
        assert_eq!(eval(source).await, Value::from("RangeError RangeError 4"));
    }

    #[tokio::test]
    async fn test_const_reassignment_fails() {
        let err = eval_err("const a = 1; a = 2").await;
        assert!(err.to_string().contains("Assignment to constant variable."));
    }

    #[tokio::test]
    async fn test_methods_and_this() {
        let source = "
            const counter = {
                count: 1,
                bump() { this.count += 1; return this },
                read: function () { return this.count },
            }
            return counter.bump().bump().read()
        ";
        assert_eq!(eval(source).await, Value::Number(3.0));
    }

    #[tokio::test]
    async fn test_template_literals() {
        assert_eq!(eval("const n = 2; `${n} + ${n} = ${n + n}`").await, Value::from("2 + 2 = 4"));
    }

    #[tokio::test]
    async fn test_async_native_is_awaited() {
        let interpreter = Interpreter::new();
        interpreter.define_global(
            "fetchValue",
            Value::native(crate::runtime::NativeFunction::new("fetchValue", |_, _, args| async move {
                tokio::task::yield_now().await;
                Ok(Value::Number(args[0].to_number() * 2.0))
            })),
        );
        let value = interpreter
            .evaluate("const f = async (x) => await fetchValue(x) + 1; return await f(20)")
            .await
            .unwrap();
        assert_eq!(value, Value::Number(41.0));
    }

    #[tokio::test]
    async fn test_eval_function_and_call() {
        let interpreter = Interpreter::new();
        let function = interpreter.eval_function("async (ctx) => ctx.value * 2").unwrap();
        assert!(function.is_function());
        let result = interpreter
            .call(&function, Value::Undefined, vec![Value::object([("value", Value::Number(21.0))])])
            .await
            .unwrap();
        assert_eq!(result, Value::Number(42.0));

        assert!(interpreter.eval_function("1 + 2").is_err());
    }

    #[tokio::test]
    async fn test_step_limit() {
        let interpreter = Interpreter::new().with_step_limit(1_000);
        let err = interpreter.evaluate("while (true) {}").await.unwrap_err();
        assert!(err.to_string().contains("step limit of 1000 exceeded"));

        let fresh = interpreter.with_fresh_budget();
        assert_eq!(fresh.evaluate("1 + 1").await.unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_deep_recursion_is_bounded() {
        // Unoptimized builds use large poll frames; give the runtime room.
        let handle = std::thread::Builder::new()
            .stack_size(32 * 1024 * 1024)
            .spawn(|| {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                runtime.block_on(eval_err("function f() { return f() } f()"))
            })
            .unwrap();
        let err = handle.join().unwrap();
        assert!(err.to_string().contains("Maximum call stack size exceeded"));
    }

    #[tokio::test]
    async fn test_typeof_undeclared() {
        assert_eq!(eval("typeof nothingHere").await, Value::from("undefined"));
        assert_eq!(eval("typeof (() => 1)").await, Value::from("function"));
    }
}
