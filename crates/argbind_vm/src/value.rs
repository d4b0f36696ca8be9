//! Runtime values.
//!
//! Arrays, hashes and objects are shared and mutable: `dup` on the stack
//! copies the handle, not the contents. That is what lets a rest parameter
//! alias the argument array and a keyword rest alias the keyword hash.

use crate::error::RuntimeError;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub type ArrayRef = Rc<RefCell<Vec<Value>>>;
pub type HashRef = Rc<RefCell<IndexMap<HashKey, Value>>>;
pub type ObjectRef = Rc<RefCell<Object>>;

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    String(Rc<str>),
    Symbol(Rc<str>),
    Array(ArrayRef),
    Hash(HashRef),
    Object(ObjectRef),
}

/// The subset of values usable as hash keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Nil,
    Bool(bool),
    Integer(i64),
    String(Rc<str>),
    Symbol(Rc<str>),
}

impl HashKey {
    pub fn symbol(name: &str) -> Self {
        HashKey::Symbol(Rc::from(name))
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            HashKey::Symbol(name) => Some(&**name),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            HashKey::Nil => Value::Nil,
            HashKey::Bool(b) => Value::Bool(*b),
            HashKey::Integer(n) => Value::Integer(*n),
            HashKey::String(s) => Value::String(s.clone()),
            HashKey::Symbol(s) => Value::Symbol(s.clone()),
        }
    }
}

/// A plain object: a class name and its instance variables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    pub class_name: String,
    pub ivars: IndexMap<String, Value>,
}

impl Object {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ivars: IndexMap::new(),
        }
    }
}

impl Value {
    // ========================================================================
    // Construction
    // ========================================================================

    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    pub fn symbol(s: &str) -> Self {
        Value::Symbol(Rc::from(s))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn hash(entries: IndexMap<HashKey, Value>) -> Self {
        Value::Hash(Rc::new(RefCell::new(entries)))
    }

    /// A hash with symbol keys, in the given order.
    pub fn keywords<'k>(entries: impl IntoIterator<Item = (&'k str, Value)>) -> Self {
        Value::hash(
            entries
                .into_iter()
                .map(|(k, v)| (HashKey::symbol(k), v))
                .collect(),
        )
    }

    pub fn object(object: Object) -> Self {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    /// Convert a JSON document. Objects become symbol-keyed hashes; numbers
    /// must be integers.
    pub fn from_json(json: &serde_json::Value) -> Result<Value, RuntimeError> {
        Ok(match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(n) => Value::Integer(n),
                None => return Err(RuntimeError::conversion("Float", "Integer")),
            },
            serde_json::Value::String(s) => Value::string(s),
            serde_json::Value::Array(items) => Value::array(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(HashKey::symbol(key), Value::from_json(value)?);
                }
                Value::hash(map)
            }
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Only `nil` and `false` are falsy.
    #[inline]
    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn class_name(&self) -> String {
        match self {
            Value::Nil => "NilClass".to_string(),
            Value::Bool(true) => "TrueClass".to_string(),
            Value::Bool(false) => "FalseClass".to_string(),
            Value::Integer(_) => "Integer".to_string(),
            Value::String(_) => "String".to_string(),
            Value::Symbol(_) => "Symbol".to_string(),
            Value::Array(_) => "Array".to_string(),
            Value::Hash(_) => "Hash".to_string(),
            Value::Object(object) => object.borrow().class_name.clone(),
        }
    }

    pub fn to_key(&self) -> Result<HashKey, RuntimeError> {
        Ok(match self {
            Value::Nil => HashKey::Nil,
            Value::Bool(b) => HashKey::Bool(*b),
            Value::Integer(n) => HashKey::Integer(*n),
            Value::String(s) => HashKey::String(s.clone()),
            Value::Symbol(s) => HashKey::Symbol(s.clone()),
            other => {
                return Err(RuntimeError::TypeError {
                    message: format!("{} cannot be used as a hash key", other.class_name()),
                })
            }
        })
    }

    /// A plain keyword hash: a hash whose keys are all symbols.
    pub fn is_keyword_hash(&self) -> bool {
        match self {
            Value::Hash(hash) => hash.borrow().keys().all(|k| k.as_symbol().is_some()),
            _ => false,
        }
    }

    /// Elements of an array, copied out. `None` for anything else.
    pub fn array_items(&self) -> Option<Vec<Value>> {
        match self {
            Value::Array(items) => Some(items.borrow().clone()),
            _ => None,
        }
    }

    /// A fresh array for destructuring. Arrays are copied, `nil` becomes an
    /// empty array; anything else cannot be destructured.
    pub fn coerce_to_array(&self) -> Result<Value, RuntimeError> {
        match self {
            Value::Array(items) => Ok(Value::array(items.borrow().clone())),
            Value::Nil => Ok(Value::array(Vec::new())),
            other => Err(RuntimeError::conversion(&other.class_name(), "Array")),
        }
    }

    /// The right-hand side of a multiple assignment: arrays are copied, any
    /// other value is wrapped.
    pub fn splat_array(&self) -> Value {
        match self {
            Value::Array(items) => Value::array(items.borrow().clone()),
            other => Value::array(vec![other.clone()]),
        }
    }

    /// Same handle, not just equal contents.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Inspection text: `[1, :a, "s"]`, `{a: 1, "k" => nil}`.
    pub fn inspect(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Symbol(s) => write!(f, ":{}", s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Hash(entries) => {
                let entries = entries.borrow();
                if entries.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match key.as_symbol() {
                        Some(name) => write!(f, "{}: {}", name, value)?,
                        None => write!(f, "{} => {}", key.to_value(), value)?,
                    }
                }
                f.write_str("}")
            }
            Value::Object(object) => {
                let object = object.borrow();
                write!(f, "#<{}", object.class_name)?;
                for (i, (name, value)) in object.ivars.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{}{}={}", sep, name, value)?;
                }
                f.write_str(">")
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect() {
        let hash = Value::keywords([("a", Value::Integer(1)), ("b", Value::Nil)]);
        assert_eq!(hash.inspect(), "{a: 1, b: nil}");
        let mixed = Value::array(vec![Value::symbol("x"), Value::string("s"), Value::Bool(true)]);
        assert_eq!(mixed.inspect(), "[:x, \"s\", true]");
        let mut entries = IndexMap::new();
        entries.insert(HashKey::String(Rc::from("k")), Value::Integer(2));
        assert_eq!(Value::hash(entries).inspect(), "{\"k\" => 2}");
    }

    #[test]
    fn test_from_json() {
        let json: serde_json::Value = serde_json::from_str(r#"[1, [2, 3], {"a": 1, "z": null}]"#).unwrap();
        let value = Value::from_json(&json).unwrap();
        assert_eq!(value.inspect(), "[1, [2, 3], {a: 1, z: nil}]");
        let items = value.array_items().unwrap();
        assert!(items[2].is_keyword_hash());
        assert!(!items[1].is_keyword_hash());

        let float: serde_json::Value = serde_json::from_str("1.5").unwrap();
        assert!(Value::from_json(&float).is_err());
    }

    #[test]
    fn test_coercions() {
        assert_eq!(
            Value::Nil.coerce_to_array().unwrap(),
            Value::array(Vec::new())
        );
        assert_eq!(
            Value::Integer(2).coerce_to_array(),
            Err(RuntimeError::conversion("Integer", "Array"))
        );
        assert_eq!(
            Value::Integer(2).splat_array(),
            Value::array(vec![Value::Integer(2)])
        );

        let original = Value::array(vec![Value::Integer(1)]);
        let copy = original.coerce_to_array().unwrap();
        assert_eq!(copy, original);
        assert!(!copy.ptr_eq(&original));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.truthy());
        assert!(!Value::Bool(false).truthy());
        assert!(Value::Integer(0).truthy());
        assert!(Value::array(Vec::new()).truthy());
    }
}
