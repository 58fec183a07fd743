// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Array constructor and prototype methods.
//!
//! Methods taking callbacks are async natives: the callback may be a
//! script function that awaits.

use super::{arg, function_with_statics, relative_index};
use crate::interpreter::{iterate, Interpreter};
use crate::runtime::{ArrayRef, Exception, NativeFunction, Value};

/// Creates the `Array` global.
pub fn create() -> Value {
    let constructor =
        NativeFunction::sync("Array", |_, _, args| Ok(Value::array(args.to_vec()))).constructor();

    function_with_statics(
        constructor,
        vec![
            NativeFunction::sync("isArray", |_, _, args| {
                Ok(Value::Boolean(matches!(arg(args, 0), Value::Array(_))))
            }),
            NativeFunction::new("from", |interpreter, _, args| async move {
                let items = iterate(&arg(&args, 0))?;
                let mapper = arg(&args, 1);
                if !mapper.is_function() {
                    return Ok(Value::array(items));
                }
                let mut mapped = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    mapped.push(
                        interpreter
                            .call(&mapper, Value::Undefined, vec![item, Value::from(index)])
                            .await?,
                    );
                }
                Ok(Value::array(mapped))
            }),
            NativeFunction::sync("of", |_, _, args| Ok(Value::array(args.to_vec()))),
        ],
    )
}

fn this_array(this: &Value, method: &str) -> Result<ArrayRef, Exception> {
    match this {
        Value::Array(array) => Ok(array.clone()),
        other => Err(Exception::type_error(format!(
            "Array.prototype.{} called on {}",
            method,
            other.inspect()
        ))),
    }
}

fn callback(args: &[Value], method: &str) -> Result<Value, Exception> {
    let callback = arg(args, 0);
    if !callback.is_function() {
        return Err(Exception::type_error(format!(
            "{} is not a function (in Array.prototype.{})",
            callback.inspect(),
            method
        )));
    }
    Ok(callback)
}

/// Calls `callback(item, index, array)` for each element in order.
async fn each(
    interpreter: &Interpreter,
    this: &Value,
    args: &[Value],
    method: &str,
) -> Result<Vec<(Value, Value)>, Exception> {
    let array = this_array(this, method)?;
    let callback = callback(args, method)?;
    let mut results = Vec::with_capacity(array.len());
    for (index, item) in array.to_vec().into_iter().enumerate() {
        let result = interpreter
            .call(
                &callback,
                Value::Undefined,
                vec![item.clone(), Value::from(index), this.clone()],
            )
            .await?;
        results.push((item, result));
    }
    Ok(results)
}

/// Looks up an array method by name.
pub fn method(name: &str) -> Option<NativeFunction> {
    let method = match name {
        "push" => NativeFunction::sync("push", |_, this, args| {
            let array = this_array(this, "push")?;
            let mut len = array.len();
            for value in args {
                len = array.push(value.clone());
            }
            Ok(Value::from(len))
        }),
        "pop" => NativeFunction::sync("pop", |_, this, _| {
            let array = this_array(this, "pop")?;
            let mut values = array.to_vec();
            let last = values.pop().unwrap_or_default();
            array.set_len(values.len())?;
            Ok(last)
        }),
        "map" => NativeFunction::new("map", |interpreter, this, args| async move {
            let results = each(&interpreter, &this, &args, "map").await?;
            Ok(Value::array(results.into_iter().map(|(_, result)| result).collect()))
        }),
        "filter" => NativeFunction::new("filter", |interpreter, this, args| async move {
            let results = each(&interpreter, &this, &args, "filter").await?;
            Ok(Value::array(
                results
                    .into_iter()
                    .filter(|(_, keep)| keep.to_boolean())
                    .map(|(item, _)| item)
                    .collect(),
            ))
        }),
        "forEach" => NativeFunction::new("forEach", |interpreter, this, args| async move {
            each(&interpreter, &this, &args, "forEach").await?;
            Ok(Value::Undefined)
        }),
        "find" => NativeFunction::new("find", |interpreter, this, args| async move {
            let array = this_array(&this, "find")?;
            let callback = callback(&args, "find")?;
            for (index, item) in array.to_vec().into_iter().enumerate() {
                let found = interpreter
                    .call(&callback, Value::Undefined, vec![item.clone(), Value::from(index)])
                    .await?;
                if found.to_boolean() {
                    return Ok(item);
                }
            }
            Ok(Value::Undefined)
        }),
        "some" => NativeFunction::new("some", |interpreter, this, args| async move {
            let array = this_array(&this, "some")?;
            let callback = callback(&args, "some")?;
            for (index, item) in array.to_vec().into_iter().enumerate() {
                let hit = interpreter
                    .call(&callback, Value::Undefined, vec![item, Value::from(index)])
                    .await?;
                if hit.to_boolean() {
                    return Ok(Value::Boolean(true));
                }
            }
            Ok(Value::Boolean(false))
        }),
        "reduce" => NativeFunction::new("reduce", |interpreter, this, args| async move {
            let array = this_array(&this, "reduce")?;
            let callback = callback(&args, "reduce")?;
            let mut items = array.to_vec().into_iter().enumerate();
            let mut accumulator = match args.get(1) {
                Some(initial) => initial.clone(),
                None => match items.next() {
                    Some((_, first)) => first,
                    None => {
                        return Err(Exception::type_error(
                            "Reduce of empty array with no initial value",
                        ))
                    }
                },
            };
            for (index, item) in items {
                accumulator = interpreter
                    .call(&callback, Value::Undefined, vec![accumulator, item, Value::from(index)])
                    .await?;
            }
            Ok(accumulator)
        }),
        "join" => NativeFunction::sync("join", |_, this, args| {
            let array = this_array(this, "join")?;
            let separator = match arg(args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_js_string(),
            };
            let parts: Vec<String> = array
                .to_vec()
                .iter()
                .map(|v| if v.is_nullish() { String::new() } else { v.to_js_string() })
                .collect();
            Ok(Value::String(parts.join(&separator)))
        }),
        "includes" => NativeFunction::sync("includes", |_, this, args| {
            let needle = arg(args, 0);
            // includes() uses SameValueZero, so NaN finds NaN
            let is_nan = |v: &Value| matches!(v, Value::Number(n) if n.is_nan());
            let found = this_array(this, "includes")?
                .to_vec()
                .iter()
                .any(|v| v.strict_equals(&needle) || (is_nan(v) && is_nan(&needle)));
            Ok(Value::Boolean(found))
        }),
        "indexOf" => NativeFunction::sync("indexOf", |_, this, args| {
            let needle = arg(args, 0);
            let index = this_array(this, "indexOf")?
                .to_vec()
                .iter()
                .position(|v| v.strict_equals(&needle))
                .map_or(-1.0, |i| i as f64);
            Ok(Value::Number(index))
        }),
        "slice" => NativeFunction::sync("slice", |_, this, args| {
            let values = this_array(this, "slice")?.to_vec();
            let start = relative_index(&arg(args, 0), values.len(), 0);
            let end = relative_index(&arg(args, 1), values.len(), values.len());
            Ok(Value::array(values.get(start..end.max(start)).unwrap_or_default().to_vec()))
        }),
        "concat" => NativeFunction::sync("concat", |_, this, args| {
            let mut values = this_array(this, "concat")?.to_vec();
            for value in args {
                match value {
                    Value::Array(other) => values.extend(other.to_vec()),
                    other => values.push(other.clone()),
                }
            }
            Ok(Value::array(values))
        }),
        "reverse" => NativeFunction::sync("reverse", |_, this, _| {
            let array = this_array(this, "reverse")?;
            let values = array.to_vec();
            for (index, value) in values.into_iter().rev().enumerate() {
                array.set(index, value)?;
            }
            Ok(this.clone())
        }),
        _ => return None,
    };
    Some(method)
}

#[cfg(test)]
mod tests {
    use crate::{Interpreter, Value};

    async fn eval(source: &str) -> Value {
        Interpreter::new()
            .evaluate(source)
            .await
            .unwrap_or_else(|e| panic!("{source}: {e}"))
    }

    #[tokio::test]
    async fn test_callback_methods() {
        assert_eq!(eval("[1, 2, 3].map(n => n * 2).join('-')").await, Value::from("2-4-6"));
        assert_eq!(eval("[1, 2, 3, 4].filter(n => n % 2 === 0).length").await, Value::Number(2.0));
        assert_eq!(eval("[{ id: 1 }, { id: 2 }].find(x => x.id === 2).id").await, Value::Number(2.0));
        assert_eq!(eval("[1, 2, 3].reduce((sum, n) => sum + n, 0)").await, Value::Number(6.0));
        assert_eq!(eval("let seen = 0; [1, 2].forEach(n => { seen += n }); seen").await, Value::Number(3.0));
        assert_eq!(eval("[1, 2].some(n => n > 1)").await, Value::Boolean(true));
    }

    #[tokio::test]
    async fn test_async_callbacks_are_awaited() {
        assert_eq!(
            eval("const out = []; [1, 2].forEach(async (n) => { out.push(await n) }); out.join()").await,
            Value::from("1,2")
        );
    }

    #[tokio::test]
    async fn test_non_callback_methods() {
        assert_eq!(eval("const a = [1]; a.push(2, 3)").await, Value::Number(3.0));
        assert_eq!(eval("[1, 2, 3].includes(2)").await, Value::Boolean(true));
        assert_eq!(eval("[1, 2, 3].indexOf(4)").await, Value::Number(-1.0));
        assert_eq!(eval("[1, 2, 3, 4].slice(1, -1).join()").await, Value::from("2,3"));
        assert_eq!(eval("[1].concat([2, 3], 4).length").await, Value::Number(4.0));
        assert_eq!(eval("[1, null, 'x'].join('|')").await, Value::from("1||x"));
        assert_eq!(eval("const a = [1, 2]; a.pop(); a.length").await, Value::Number(1.0));
    }

    #[tokio::test]
    async fn test_statics() {
        assert_eq!(eval("Array.isArray([]) && !Array.isArray({})").await, Value::Boolean(true));
        assert_eq!(eval("Array.from('abc').join('.')").await, Value::from("a.b.c"));
        assert_eq!(eval("Array.from([1, 2], n => n * 10).join()").await, Value::from("10,20"));
    }

    #[tokio::test]
    async fn test_map_callback_errors_propagate() {
        let err = Interpreter::new().evaluate("[1].map(5)").await.unwrap_err();
        assert!(err.to_string().contains("is not a function"));
    }
}
