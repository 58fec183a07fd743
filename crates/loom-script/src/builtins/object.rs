// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Object constructor and helpers.

use super::{arg, function_with_statics};
use crate::interpreter::{own_entries, set_property};
use crate::interpreter::operators::to_property_key;
use crate::runtime::{Exception, NativeFunction, ObjectRef, Value};

/// Creates the `Object` global.
pub fn create() -> Value {
    let constructor = NativeFunction::sync("Object", |_, _, args| {
        Ok(match arg(args, 0) {
            value @ (Value::Object(_) | Value::Array(_) | Value::Function(_)) => value,
            _ => Value::Object(ObjectRef::new()),
        })
    })
    .constructor();

    function_with_statics(
        constructor,
        vec![
            NativeFunction::sync("keys", |_, _, args| {
                let keys = own_entries(&require_object(args, "keys")?)
                    .into_iter()
                    .map(|(key, _)| Value::String(key))
                    .collect();
                Ok(Value::array(keys))
            }),
            NativeFunction::sync("values", |_, _, args| {
                let values = own_entries(&require_object(args, "values")?)
                    .into_iter()
                    .map(|(_, value)| value)
                    .collect();
                Ok(Value::array(values))
            }),
            NativeFunction::sync("entries", |_, _, args| {
                let entries = own_entries(&require_object(args, "entries")?)
                    .into_iter()
                    .map(|(key, value)| Value::array(vec![Value::String(key), value]))
                    .collect();
                Ok(Value::array(entries))
            }),
            NativeFunction::sync("assign", |_, _, args| {
                let target = require_object(args, "assign")?;
                for source in args.iter().skip(1) {
                    for (key, value) in own_entries(source) {
                        set_property(&target, key, value)?;
                    }
                }
                Ok(target)
            }),
            NativeFunction::sync("freeze", |_, _, args| {
                let target = arg(args, 0);
                if let Value::Object(object) = &target {
                    object.freeze();
                }
                Ok(target)
            }),
            NativeFunction::sync("isFrozen", |_, _, args| {
                Ok(Value::Boolean(match arg(args, 0) {
                    Value::Object(object) => object.is_frozen(),
                    _ => true,
                }))
            }),
            NativeFunction::sync("fromEntries", |_, _, args| {
                let object = ObjectRef::new();
                for entry in crate::interpreter::iterate(&arg(args, 0))? {
                    let pair = crate::interpreter::iterate(&entry)?;
                    let key = pair.first().map(to_property_key).unwrap_or_default();
                    object.set(key, pair.get(1).cloned().unwrap_or_default());
                }
                Ok(Value::Object(object))
            }),
        ],
    )
}

fn require_object(args: &[Value], method: &str) -> Result<Value, Exception> {
    let value = arg(args, 0);
    if value.is_nullish() {
        return Err(Exception::type_error(format!(
            "Object.{} called on {}",
            method, value
        )));
    }
    Ok(value)
}

/// Methods available on every plain object.
pub fn method(name: &str) -> Option<NativeFunction> {
    let method = match name {
        "hasOwnProperty" => NativeFunction::sync("hasOwnProperty", |_, this, args| {
            let key = to_property_key(&arg(args, 0));
            Ok(Value::Boolean(match this {
                Value::Object(object) => object.has(&key),
                _ => false,
            }))
        }),
        "toString" => NativeFunction::sync("toString", |_, this, _| Ok(Value::String(this.to_js_string()))),
        _ => return None,
    };
    Some(method)
}

#[cfg(test)]
mod tests {
    use crate::{Interpreter, Value};

    async fn eval(source: &str) -> Value {
        Interpreter::new().evaluate(source).await.unwrap()
    }

    #[tokio::test]
    async fn test_keys_values_entries_keep_order() {
        assert_eq!(eval("Object.keys({ b: 1, a: 2 }).join()").await, Value::from("b,a"));
        assert_eq!(eval("Object.values({ b: 1, a: 2 }).join()").await, Value::from("1,2"));
        assert_eq!(eval("Object.entries({ x: 1 })[0].join('=')").await, Value::from("x=1"));
    }

    #[tokio::test]
    async fn test_assign_and_freeze() {
        let source = "
            const target = Object.assign({ a: 1 }, { b: 2 }, null, { a: 3 })
            const frozen = Object.freeze({ v: 1 })
            frozen.v = 2
            return [target.a, target.b, frozen.v, Object.isFrozen(frozen)].join()
        ";
        assert_eq!(eval(source).await, Value::from("3,2,1,true"));
    }

    #[tokio::test]
    async fn test_has_own_property_and_from_entries() {
        assert_eq!(eval("({ a: 1 }).hasOwnProperty('a')").await, Value::Boolean(true));
        assert_eq!(eval("Object.fromEntries([['k', 'v']]).k").await, Value::from("v"));
    }
}
