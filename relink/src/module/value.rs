// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Values held by module slots and handed out by binding registries.

use std::{cell::RefCell, fmt, rc::Rc};

use crate::{error::ExecutionError, module::registry::BindingRegistry};

type NativeFunction = dyn Fn(&[Value]) -> Result<Value, ExecutionError>;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
    Function(Function),
    Class(Class),
    Object(Object),
    /// Live view of another module's exports.
    Namespace(BindingRegistry),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(string) => Some(string),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_namespace(&self) -> Option<&BindingRegistry> {
        match self {
            Value::Namespace(namespace) => Some(namespace),
            _ => None,
        }
    }

    pub fn call(&self, arguments: &[Value]) -> Result<Value, ExecutionError> {
        match self {
            Value::Function(function) => function.call(arguments),
            other => Err(ExecutionError::NotCallable(other.to_string())),
        }
    }

    /// `value instanceof class`
    pub fn instance_of(&self, class: &Class) -> bool {
        match self {
            Value::Object(object) => object
                .class()
                .is_some_and(|own| Rc::ptr_eq(&own.0, &class.0)),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(&a.0, &b.0),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(&a.0, &b.0),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(&a.0, &b.0),
            (Value::Namespace(a), Value::Namespace(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Boolean(boolean) => write!(f, "{boolean}"),
            Value::Number(number) => f.write_str(ryu_js::Buffer::new().format(*number)),
            Value::String(string) => f.write_str(string),
            Value::Function(function) => write!(f, "function {}() {{ [native code] }}", function.name()),
            Value::Class(class) => write!(f, "class {} {{ }}", class.name()),
            Value::Object(object) => match object.class() {
                Some(class) => write!(f, "[object {}]", class.name()),
                None => f.write_str("[object Object]"),
            },
            Value::Namespace(_) => f.write_str("[object Module]"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(string) => write!(f, "{string:?}"),
            Value::Namespace(namespace) => write!(f, "[Module {}]", namespace.module()),
            other => write!(f, "{other}"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value.into())
    }
}

impl From<Function> for Value {
    fn from(value: Function) -> Self {
        Value::Function(value)
    }
}

impl From<Class> for Value {
    fn from(value: Class) -> Self {
        Value::Class(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

/// A native function. Closures capture slots or imports to observe and
/// update module state after the module body has finished.
#[derive(Clone)]
pub struct Function(Rc<FunctionData>);

struct FunctionData {
    name: String,
    behaviour: Box<NativeFunction>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        behaviour: impl Fn(&[Value]) -> Result<Value, ExecutionError> + 'static,
    ) -> Self {
        Self(Rc::new(FunctionData {
            name: name.into(),
            behaviour: Box::new(behaviour),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn call(&self, arguments: &[Value]) -> Result<Value, ExecutionError> {
        (self.0.behaviour)(arguments)
    }
}

#[derive(Clone)]
pub struct Class(Rc<ClassData>);

struct ClassData {
    name: String,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Rc::new(ClassData { name: name.into() }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// `new Class()`
    pub fn construct(&self) -> Object {
        Object(Rc::new(ObjectData {
            class: Some(self.clone()),
            properties: RefCell::default(),
        }))
    }
}

#[derive(Clone)]
pub struct Object(Rc<ObjectData>);

struct ObjectData {
    class: Option<Class>,
    properties: RefCell<Vec<(String, Value)>>,
}

impl Default for Object {
    fn default() -> Self {
        Self(Rc::new(ObjectData {
            class: None,
            properties: RefCell::default(),
        }))
    }
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(&self) -> Option<&Class> {
        self.0.class.as_ref()
    }

    pub fn get(&self, key: &str) -> Value {
        self.0
            .properties
            .borrow()
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let mut properties = self.0.properties.borrow_mut();
        match properties.iter_mut().find(|(name, _)| name == key) {
            Some((_, slot)) => *slot = value,
            None => properties.push((key.to_owned(), value)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn numbers_print_like_javascript() {
        assert_eq!(Value::from(2).to_string(), "2");
        assert_eq!(Value::from(0.5).to_string(), "0.5");
        assert_eq!(Value::from(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::from(-3.25).to_string(), "-3.25");
    }

    #[test]
    fn instance_of_compares_class_identity() {
        let module = Class::new("Module");
        let other = Class::new("Module");
        let instance = Value::from(module.construct());
        assert!(instance.instance_of(&module));
        assert!(!instance.instance_of(&other));
        assert!(!Value::Null.instance_of(&module));
    }

    #[test]
    fn calling_a_non_function_fails() {
        let error = Value::from(1).call(&[]).unwrap_err();
        assert!(matches!(error, ExecutionError::NotCallable(_)));
    }
}
