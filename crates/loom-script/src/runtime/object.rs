// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Heap objects and arrays.
//!
//! Both are shared by reference: cloning an [`ObjectRef`] or [`ArrayRef`]
//! clones the handle, not the contents. Locks are never held across an
//! await point; every accessor copies values out.

use super::exception::Exception;
use super::value::Value;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// What kind of object this is, beyond its properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectClass {
    /// An ordinary object
    Plain,
    /// An error object created by one of the error constructors
    Error(String),
}

/// An object with insertion-ordered properties.
#[derive(Debug)]
pub struct Object {
    properties: IndexMap<String, Value>,
    class: ObjectClass,
    frozen: bool,
}

/// A shared reference to an [`Object`].
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    /// Creates an empty plain object.
    pub fn new() -> Self {
        Self::with_class(ObjectClass::Plain)
    }

    /// Creates an empty object of the given class.
    pub fn with_class(class: ObjectClass) -> Self {
        Self(Arc::new(RwLock::new(Object {
            properties: IndexMap::new(),
            class,
            frozen: false,
        })))
    }

    /// Creates a plain object from key/value pairs, keeping their order.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let object = Self::new();
        {
            let mut inner = object.0.write();
            for (key, value) in entries {
                inner.properties.insert(key.into(), value);
            }
        }
        object
    }

    /// Creates an error object with `name` and `message` properties.
    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        let object = Self::with_class(ObjectClass::Error(kind.to_string()));
        object.set("name", Value::from(kind));
        object.set("message", Value::String(message.into()));
        object
    }

    /// Returns the object's class.
    pub fn class(&self) -> ObjectClass {
        self.0.read().class.clone()
    }

    /// Returns the error kind if this is an error object.
    pub fn error_kind(&self) -> Option<String> {
        match &self.0.read().class {
            ObjectClass::Error(kind) => Some(kind.clone()),
            ObjectClass::Plain => None,
        }
    }

    /// Reads an own property.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.read().properties.get(key).cloned()
    }

    /// Writes a property. Writes to a frozen object are ignored.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let mut inner = self.0.write();
        if !inner.frozen {
            inner.properties.insert(key.into(), value);
        }
    }

    /// Returns true if the object has an own property named `key`.
    pub fn has(&self, key: &str) -> bool {
        self.0.read().properties.contains_key(key)
    }

    /// Returns the property names in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0.read().properties.keys().cloned().collect()
    }

    /// Returns a snapshot of the properties in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .read()
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns the number of own properties.
    pub fn len(&self) -> usize {
        self.0.read().properties.len()
    }

    /// Returns true if the object has no properties.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Prevents further writes.
    pub fn freeze(&self) {
        self.0.write().frozen = true;
    }

    /// Returns true after [`ObjectRef::freeze`].
    pub fn is_frozen(&self) -> bool {
        self.0.read().frozen
    }

    /// Reference identity.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for ObjectRef {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Contents may be cyclic, so only the shape is printed.
        let inner = self.0.read();
        f.debug_struct("Object")
            .field("class", &inner.class)
            .field("keys", &inner.properties.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A shared, growable array.
#[derive(Clone)]
pub struct ArrayRef(Arc<RwLock<Vec<Value>>>);

/// Largest length an array may be grown to by index or `length` writes.
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

fn check_length(len: usize) -> Result<(), Exception> {
    if len > MAX_ARRAY_LENGTH {
        return Err(Exception::range_error("Invalid array length"));
    }
    Ok(())
}

impl ArrayRef {
    /// Creates an array holding `values`.
    pub fn new(values: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(values)))
    }

    /// Reads an element; holes and out-of-range reads are `undefined`.
    pub fn get(&self, index: usize) -> Value {
        self.0.read().get(index).cloned().unwrap_or(Value::Undefined)
    }

    /// Writes an element, padding with `undefined` as needed. Fails with a
    /// `RangeError` past [`MAX_ARRAY_LENGTH`].
    pub fn set(&self, index: usize, value: Value) -> Result<(), Exception> {
        let mut values = self.0.write();
        if index >= values.len() {
            check_length(index.saturating_add(1))?;
            values.resize(index + 1, Value::Undefined);
        }
        values[index] = value;
        Ok(())
    }

    /// Appends an element and returns the new length.
    pub fn push(&self, value: Value) -> usize {
        let mut values = self.0.write();
        values.push(value);
        values.len()
    }

    /// Truncates or pads the array to `len`.
    pub fn set_len(&self, len: usize) -> Result<(), Exception> {
        check_length(len)?;
        self.0.write().resize(len, Value::Undefined);
        Ok(())
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Returns true if the array is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of the elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.read().clone()
    }

    /// Reference identity.
    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Array(len = {})", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_keep_insertion_order() {
        let object = ObjectRef::new();
        object.set("b", Value::Number(1.0));
        object.set("a", Value::Number(2.0));
        object.set("b", Value::Number(3.0));
        assert_eq!(object.keys(), vec!["b", "a"]);
        assert_eq!(object.get("b"), Some(Value::Number(3.0)));
    }

    #[test]
    fn test_frozen_objects_ignore_writes() {
        let object = ObjectRef::from_entries([("a", Value::Number(1.0))]);
        object.freeze();
        object.set("a", Value::Number(2.0));
        object.set("b", Value::Null);
        assert_eq!(object.get("a"), Some(Value::Number(1.0)));
        assert!(!object.has("b"));
    }

    #[test]
    fn test_clones_share_contents() {
        let object = ObjectRef::new();
        let alias = object.clone();
        alias.set("x", Value::Boolean(true));
        assert!(object.has("x"));
        assert!(object.ptr_eq(&alias));
        assert!(!object.ptr_eq(&ObjectRef::new()));
    }

    #[test]
    fn test_error_objects() {
        let error = ObjectRef::error("TypeError", "bad");
        assert_eq!(error.error_kind().as_deref(), Some("TypeError"));
        assert_eq!(error.get("message"), Some(Value::from("bad")));
    }

    #[test]
    fn test_array_padding() {
        let array = ArrayRef::new(vec![]);
        array.set(2, Value::Number(1.0)).unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array.get(0), Value::Undefined);
        assert_eq!(array.get(10), Value::Undefined);
        assert_eq!(array.push(Value::Null), 4);
    }

    #[test]
    fn test_array_growth_is_bounded() {
        let array = ArrayRef::new(vec![Value::Null]);
        assert!(array.set(u32::MAX as usize - 1, Value::Null).is_err());
        assert!(array.set(usize::MAX, Value::Null).is_err());
        assert!(array.set_len(MAX_ARRAY_LENGTH + 1).is_err());
        assert_eq!(array.len(), 1);

        array.set_len(0).unwrap();
        assert!(array.is_empty());
    }
}
