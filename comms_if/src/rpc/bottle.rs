//! # Bottle
//!
//! A bottle is an ordered list of typed values, the unit of every request, reply and streamed
//! message exchanged between the control module, the world and the test harness. Field order is
//! significant, so all accessors are positional.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An ordered list of values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bottle(Vec<Value>);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A single value in a [`Bottle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// A short keyword, such as `ack`, `get` or `many`.
    Vocab(String),

    /// Free text.
    String(String),

    Float64(f64),

    Int32(i32),

    /// A nested list.
    List(Vec<Value>),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Bottle {
    /// Create an empty bottle.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a vocab.
    pub fn with_vocab(mut self, vocab: &str) -> Self {
        self.0.push(Value::Vocab(vocab.into()));
        self
    }

    /// Append a string.
    pub fn with_string(mut self, string: &str) -> Self {
        self.0.push(Value::String(string.into()));
        self
    }

    /// Append a float.
    pub fn with_float64(mut self, value: f64) -> Self {
        self.0.push(Value::Float64(value));
        self
    }

    /// Append an integer.
    pub fn with_int32(mut self, value: i32) -> Self {
        self.0.push(Value::Int32(value));
        self
    }

    /// Append any value.
    pub fn push(&mut self, value: Value) {
        self.0.push(value)
    }

    /// Get the value at `index`, or `None` if the bottle is too short.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Get the text (vocab or string) at `index`.
    pub fn text(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_text)
    }

    /// Get the number at `index` as a float.
    pub fn float64(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(Value::as_f64)
    }

    /// Number of values in the bottle.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }

    /// Iterate over the values.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    /// Serialize the bottle into the JSON text frame sent on the wire.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a bottle from a JSON text frame.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<Vec<Value>> for Bottle {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl fmt::Display for Bottle {
    /// Space separated rendering, strings are quoted and lists parenthesised.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

impl Value {
    /// The vocab, if this value is one.
    pub fn as_vocab(&self) -> Option<&str> {
        match self {
            Value::Vocab(v) => Some(v),
            _ => None,
        }
    }

    /// The string, if this value is one.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Either a vocab or a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Vocab(s) | Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a float, integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            Value::Int32(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Vocab(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::List(l) => {
                write!(f, "(")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
