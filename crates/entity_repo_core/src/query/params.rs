//! Named query parameters.
//!
//! # Invariants
//! - Keys are never null; list construction requires an even length.
//! - Insertion order is kept; re-inserting a key replaces its value in place.

use crate::repo::{RepoError, RepoResult};
use indexmap::IndexMap;
use rusqlite::types::Value;
use std::borrow::Cow;

const PLACEHOLDER_PREFIXES: [char; 3] = [':', '@', '$'];

/// Ordered name → value bindings for one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMap {
    entries: IndexMap<String, Value>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ParameterMap::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Binds `value` to `name`, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

/// Builds a `ParameterMap` from alternating key/value arguments.
///
/// Text keys are used verbatim, numeric keys are stringified.
///
/// # Errors
/// - `InvariantViolation` when the argument count is odd.
/// - `InvariantViolation` when a key is `NULL` or a blob.
pub fn create_parameter_map(args: impl IntoIterator<Item = Value>) -> RepoResult<ParameterMap> {
    let args = args.into_iter().collect::<Vec<_>>();
    if args.len() % 2 != 0 {
        return Err(RepoError::InvariantViolation(format!(
            "parameter list must alternate keys and values, got {} arguments",
            args.len()
        )));
    }

    let mut map = ParameterMap::new();
    let mut iter = args.into_iter().enumerate();
    while let (Some((position, key)), Some((_, value))) = (iter.next(), iter.next()) {
        map.insert(parameter_key(position, key)?, value);
    }
    Ok(map)
}

fn parameter_key(position: usize, key: Value) -> RepoResult<String> {
    match key {
        Value::Text(text) => Ok(text),
        Value::Integer(number) => Ok(number.to_string()),
        Value::Real(number) => Ok(number.to_string()),
        Value::Null => Err(RepoError::InvariantViolation(format!(
            "parameter key at position {position} is null"
        ))),
        Value::Blob(_) => Err(RepoError::InvariantViolation(format!(
            "parameter key at position {position} is a blob"
        ))),
    }
}

/// SQL placeholder for a parameter name: `name` becomes `:name`.
pub(crate) fn placeholder(name: &str) -> Cow<'_, str> {
    if name.starts_with(PLACEHOLDER_PREFIXES) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!(":{name}"))
    }
}
