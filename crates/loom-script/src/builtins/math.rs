// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The `Math` namespace.

use super::{arg, namespace};
use crate::runtime::{NativeFunction, Value};

fn unary(name: &'static str, op: fn(f64) -> f64) -> NativeFunction {
    NativeFunction::sync(name, move |_, _, args| Ok(Value::Number(op(arg(args, 0).to_number()))))
}

fn fold(name: &'static str, initial: f64, pick: fn(f64, f64) -> f64) -> NativeFunction {
    NativeFunction::sync(name, move |_, _, args| {
        let mut result = initial;
        for value in args {
            let n = value.to_number();
            if n.is_nan() {
                return Ok(Value::Number(f64::NAN));
            }
            result = pick(result, n);
        }
        Ok(Value::Number(result))
    })
}

/// Creates the `Math` global.
pub fn create() -> Value {
    let math = namespace(vec![
        fold("max", f64::NEG_INFINITY, f64::max),
        fold("min", f64::INFINITY, f64::min),
        unary("abs", f64::abs),
        unary("floor", f64::floor),
        unary("ceil", f64::ceil),
        // Halves round towards +Infinity.
        unary("round", |n| (n + 0.5).floor()),
        unary("trunc", f64::trunc),
        unary("sqrt", f64::sqrt),
        unary("sign", |n| if n.is_nan() || n == 0.0 { n } else { n.signum() }),
        NativeFunction::sync("pow", |_, _, args| {
            Ok(Value::Number(arg(args, 0).to_number().powf(arg(args, 1).to_number())))
        }),
    ]);
    if let Value::Object(object) = &math {
        object.set("PI", Value::Number(std::f64::consts::PI));
        object.set("E", Value::Number(std::f64::consts::E));
    }
    math
}

#[cfg(test)]
mod tests {
    use crate::{Interpreter, Value};

    async fn eval(source: &str) -> Value {
        Interpreter::new().evaluate(source).await.unwrap()
    }

    #[tokio::test]
    async fn test_min_max() {
        assert_eq!(eval("Math.max(1, 5, 3)").await, Value::Number(5.0));
        assert_eq!(eval("Math.min(4, -2)").await, Value::Number(-2.0));
        assert_eq!(eval("Math.max()").await, Value::Number(f64::NEG_INFINITY));
        assert!(matches!(eval("Math.max(1, 'x')").await, Value::Number(n) if n.is_nan()));
    }

    #[tokio::test]
    async fn test_rounding() {
        assert_eq!(eval("Math.round(2.5)").await, Value::Number(3.0));
        assert_eq!(eval("Math.round(-2.5)").await, Value::Number(-2.0));
        assert_eq!(eval("Math.floor(-1.5) + Math.ceil(1.2)").await, Value::Number(0.0));
        assert_eq!(eval("Math.trunc(-4.7)").await, Value::Number(-4.0));
    }

    #[tokio::test]
    async fn test_misc() {
        assert_eq!(eval("Math.abs(-3) + Math.sqrt(16) + Math.pow(2, 3)").await, Value::Number(15.0));
        assert_eq!(eval("Math.sign(-9)").await, Value::Number(-1.0));
        assert_eq!(eval("Math.PI > 3.14 && Math.PI < 3.15").await, Value::Boolean(true));
    }
}
