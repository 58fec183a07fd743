// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Embedding tests: host objects, async host calls and factory functions.

use loom_script::{Error, Interpreter, NativeFunction, ObjectRef, Value};
use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;

fn host_loader(calls: Arc<Mutex<Vec<String>>>) -> Value {
    let load = NativeFunction::new("load", move |_, _, args| {
        let calls = Arc::clone(&calls);
        async move {
            let name = args.first().map(Value::to_js_string).unwrap_or_default();
            tokio::time::sleep(Duration::from_millis(1)).await;
            calls.lock().push(name.clone());
            Ok(Value::object([("name", Value::String(name))]))
        }
    });
    Value::Object(ObjectRef::from_entries([("load", Value::native(load))]))
}

#[tokio::test]
async fn factory_awaits_host_and_returns_exports() {
    let interpreter = Interpreter::new();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let factory = interpreter
        .eval_function(
            "async (__loader) => {
                const Button = await __loader.load('./button.component');
                const Icon = await __loader.load('./icon.component');
                const name = 'card';
                return { name, parts: [Button.name, Icon.name] };
            }",
        )
        .unwrap();

    let exports = interpreter
        .call(&factory, Value::Undefined, vec![host_loader(Arc::clone(&calls))])
        .await
        .unwrap();

    assert_eq!(
        exports.inspect(),
        "{ name: 'card', parts: [ './button.component', './icon.component' ] }"
    );
    assert_eq!(*calls.lock(), vec!["./button.component", "./icon.component"]);
}

#[tokio::test]
async fn factory_catch_reaches_host_handler() {
    let interpreter = Interpreter::new();
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let handle_error = NativeFunction::sync("handleError", move |_, _, args| {
        *sink.lock() = args.first().cloned();
        Ok(Value::Undefined)
    });
    let host = Value::Object(ObjectRef::from_entries([("handleError", Value::native(handle_error))]));

    let factory = interpreter
        .eval_function(
            "async (__loader) => {
                try {
                    const broken = undefined;
                    return broken.field;
                } catch (e) {
                    __loader.handleError(e);
                }
            }",
        )
        .unwrap();
    let result = interpreter.call(&factory, Value::Undefined, vec![host]).await.unwrap();

    assert!(result.is_undefined());
    let error = seen.lock().clone().expect("handler was not called");
    let error = error.as_object().expect("error object").clone();
    assert_eq!(error.error_kind().as_deref(), Some("TypeError"));
}

#[tokio::test]
async fn uncaught_errors_surface_as_thrown() {
    let interpreter = Interpreter::new();
    let err = interpreter.evaluate("throw new Error('boom')").await.unwrap_err();
    assert!(matches!(err, Error::Thrown(_)));
    assert_eq!(err.to_string(), "Error: boom");
    assert_eq!(err.message(), "boom");
}

#[tokio::test]
async fn syntax_errors_carry_offsets() {
    let err = Interpreter::new().evaluate("let x = (1 +;").await.unwrap_err();
    match err {
        Error::Syntax { offset, .. } => assert_eq!(offset, 12),
        other => panic!("expected a syntax error, got {other}"),
    }
}

#[tokio::test]
async fn globals_are_shared_across_fresh_budgets() {
    let interpreter = Interpreter::new().with_step_limit(10_000);
    interpreter.define_global("shared", Value::from("hello"));
    let other = interpreter.with_fresh_budget();
    assert_eq!(other.step_limit(), Some(10_000));
    assert_eq!(other.evaluate("shared + '!'").await.unwrap(), Value::from("hello!"));
}
