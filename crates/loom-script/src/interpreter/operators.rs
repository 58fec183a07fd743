// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Unary and binary operator semantics.

use crate::ast::{BinaryOperator, UnaryOperator};
use crate::runtime::{number_to_string, Exception, Value};

/// Converts a value to a property key.
pub fn to_property_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_to_string(*n),
        other => other.to_js_string(),
    }
}

/// ToInt32.
pub fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32 as i32
}

/// Applies a unary operator (other than `typeof` on unresolved names).
pub fn unary(operator: UnaryOperator, value: &Value) -> Value {
    match operator {
        UnaryOperator::Not => Value::Boolean(!value.to_boolean()),
        UnaryOperator::Minus => Value::Number(-value.to_number()),
        UnaryOperator::Plus => Value::Number(value.to_number()),
        UnaryOperator::BitwiseNot => Value::Number(f64::from(!to_int32(value.to_number()))),
        UnaryOperator::Typeof => Value::from(value.type_of()),
        UnaryOperator::Void => Value::Undefined,
    }
}

/// Applies a binary operator.
pub fn binary(operator: BinaryOperator, left: &Value, right: &Value) -> Result<Value, Exception> {
    let value = match operator {
        BinaryOperator::Add => add(left, right),
        BinaryOperator::Subtract => Value::Number(left.to_number() - right.to_number()),
        BinaryOperator::Multiply => Value::Number(left.to_number() * right.to_number()),
        BinaryOperator::Divide => Value::Number(left.to_number() / right.to_number()),
        BinaryOperator::Modulo => Value::Number(left.to_number() % right.to_number()),
        BinaryOperator::Exponent => Value::Number(left.to_number().powf(right.to_number())),
        BinaryOperator::Equal => Value::Boolean(left.loose_equals(right)),
        BinaryOperator::NotEqual => Value::Boolean(!left.loose_equals(right)),
        BinaryOperator::StrictEqual => Value::Boolean(left.strict_equals(right)),
        BinaryOperator::StrictNotEqual => Value::Boolean(!left.strict_equals(right)),
        BinaryOperator::LessThan => compare(left, right, |o| o.is_lt()),
        BinaryOperator::LessThanEqual => compare(left, right, |o| o.is_le()),
        BinaryOperator::GreaterThan => compare(left, right, |o| o.is_gt()),
        BinaryOperator::GreaterThanEqual => compare(left, right, |o| o.is_ge()),
        BinaryOperator::In => Value::Boolean(has_property(right, left)?),
        BinaryOperator::Instanceof => Value::Boolean(instance_of(left, right)?),
    };
    Ok(value)
}

fn add(left: &Value, right: &Value) -> Value {
    let is_textual = |v: &Value| {
        matches!(
            v,
            Value::String(_) | Value::Array(_) | Value::Object(_) | Value::Function(_)
        )
    };
    if is_textual(left) || is_textual(right) {
        let mut s = left.to_js_string();
        s.push_str(&right.to_js_string());
        Value::String(s)
    } else {
        Value::Number(left.to_number() + right.to_number())
    }
}

fn compare(left: &Value, right: &Value, test: impl Fn(std::cmp::Ordering) -> bool) -> Value {
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    Value::Boolean(ordering.is_some_and(test))
}

fn has_property(target: &Value, key: &Value) -> Result<bool, Exception> {
    let key = to_property_key(key);
    match target {
        Value::Object(object) => Ok(object.has(&key)),
        Value::Array(array) => Ok(key == "length"
            || key.parse::<usize>().is_ok_and(|index| index < array.len())),
        Value::Function(function) => Ok(function.properties.has(&key)),
        other => Err(Exception::type_error(format!(
            "Cannot use 'in' operator to search for '{}' in {}",
            key,
            other.inspect()
        ))),
    }
}

fn instance_of(value: &Value, constructor: &Value) -> Result<bool, Exception> {
    let Value::Function(constructor) = constructor else {
        return Err(Exception::type_error(
            "Right-hand side of 'instanceof' is not callable",
        ));
    };
    let name = constructor.name();
    let matches = match value {
        Value::Object(object) => match object.error_kind() {
            Some(kind) => name == "Error" || name == kind || name == "Object",
            None => name == "Object",
        },
        Value::Array(_) => name == "Array" || name == "Object",
        Value::Function(_) => name == "Function" || name == "Object",
        _ => false,
    };
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_addition_concatenates_strings() {
        assert_eq!(binary(BinaryOperator::Add, &num(1.0), &num(2.0)).unwrap(), num(3.0));
        assert_eq!(
            binary(BinaryOperator::Add, &Value::from("a"), &num(1.0)).unwrap(),
            Value::from("a1")
        );
        assert_eq!(
            binary(BinaryOperator::Add, &Value::array(vec![num(1.0), num(2.0)]), &Value::from("!")).unwrap(),
            Value::from("1,2!")
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(binary(BinaryOperator::LessThan, &Value::from("a"), &Value::from("b")).unwrap(), Value::Boolean(true));
        assert_eq!(binary(BinaryOperator::GreaterThanEqual, &num(2.0), &Value::from("2")).unwrap(), Value::Boolean(true));
        assert_eq!(binary(BinaryOperator::LessThan, &num(f64::NAN), &num(1.0)).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_modulo_keeps_dividend_sign() {
        assert_eq!(binary(BinaryOperator::Modulo, &num(-7.0), &num(3.0)).unwrap(), num(-1.0));
    }

    #[test]
    fn test_in_operator() {
        let object = Value::object([("a", Value::Null)]);
        assert_eq!(binary(BinaryOperator::In, &Value::from("a"), &object).unwrap(), Value::Boolean(true));
        assert!(binary(BinaryOperator::In, &Value::from("a"), &num(1.0)).is_err());
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary(UnaryOperator::Not, &Value::from("")), Value::Boolean(true));
        assert_eq!(unary(UnaryOperator::BitwiseNot, &num(5.0)), num(-6.0));
        assert_eq!(unary(UnaryOperator::Typeof, &Value::Null), Value::from("object"));
    }

    #[test]
    fn test_to_int32_wraps() {
        assert_eq!(to_int32(4_294_967_297.0), 1);
        assert_eq!(to_int32(-1.0), -1);
        assert_eq!(to_int32(f64::NAN), 0);
    }
}
