use std::{
    borrow::Cow,
    fmt::{self, Debug, Display, Formatter},
};

use itertools::Itertools;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::{
    Target,
    error::runtime::{Exception, ExceptionKind},
};

/// Runtime value passed to and returned from every function.
#[derive(Clone, PartialEq, Default)]
pub enum Value {
    String(String),
    Integer(i64),
    Array(Array),
    #[default]
    Null,
}

/// Array key. String keys holding a canonical decimal integer (`"7"`, `"-3"`,
/// but not `"+7"` or `"07"`) are normalised to [`Key::Index`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Index(i64),
    Name(SmolStr),
}

impl Key {
    pub fn name(name: &str) -> Self {
        match name.parse::<i64>() {
            Ok(i) if i.to_string() == name => Key::Index(i),
            _ => Key::Name(SmolStr::new(name)),
        }
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Index(i)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i as i64)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::name(name)
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Insertion-ordered array that is indexed and associative at the same time.
#[derive(Clone, Default)]
pub struct Array {
    entries: Vec<(Key, Value)>,
    index: FxHashMap<Key, usize>,
    next_index: i64,
    associative: bool,
}

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    /// An array that always displays its keys, even when they are `0..n`.
    pub fn associative() -> Self {
        Self {
            associative: true,
            ..Self::default()
        }
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        let key = Key::Index(self.next_index);
        self.set(key, value);
    }

    pub fn set(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();

        if let Key::Index(i) = key {
            if i >= self.next_index {
                self.next_index = i.saturating_add(1);
            }
        }

        match self.index.get(&key) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn is_associative(&self) -> bool {
        self.associative
            || self
                .entries
                .iter()
                .enumerate()
                .any(|(i, (key, _))| *key != Key::Index(i as i64))
    }
}

// The associative marker only changes how an array prints.
impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<V: Into<Value>> FromIterator<V> for Array {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        let mut array = Array::new();
        for value in iter {
            array.push(value);
        }
        array
    }
}

impl Display for Array {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let body = if self.is_associative() {
            self.entries
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .join(", ")
        } else {
            self.values().map(|v| v.to_string()).join(", ")
        };
        write!(f, "{{{}}}", body)
    }
}

impl Debug for Array {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().collect())
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Array(a) => write!(f, "{}", a),
            Value::Null => write!(f, "null"),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Array(a) => write!(f, "{:?}", a),
            Value::Null => write!(f, "null"),
        }
    }
}

impl Value {
    pub const NULL: Value = Self::Null;

    pub fn name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "int",
            Value::Array(_) => "array",
            Value::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// String form of any value, borrowed when it already is a string.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Value::String(s) => Cow::Borrowed(s),
            other => Cow::Owned(other.to_string()),
        }
    }

    pub fn to_integer(&self, target: &Target) -> Result<i64, Exception> {
        match self {
            Value::Integer(n) => Ok(*n),
            Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
                Exception::new(
                    ExceptionKind::Cast,
                    format!("Expecting an integer, but received \"{}\"", s),
                    target.clone(),
                )
            }),
            other => Err(Exception::new(
                ExceptionKind::Cast,
                format!("Expecting an integer, but received {}", other.name()),
                target.clone(),
            )),
        }
    }
}
