//! Executable query descriptions.
//!
//! # Responsibility
//! - Describe what a session should run: statement source, bindings, and
//!   pagination window.
//! - Validate pagination arguments before anything reaches the store.
//!
//! # Invariants
//! - `max_results`, when set, is at least 1.
//! - `first_result` is never negative.

pub mod named;
pub mod params;

use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;

pub use named::NamedQueryRegistry;
pub use params::{create_parameter_map, ParameterMap};

/// Where a statement's SQL comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuerySource<'a> {
    /// SQL supplied at call time; rows map to the entity type.
    Literal(&'a str),
    /// Statement registered in a `NamedQueryRegistry`.
    Named(&'a str),
    /// Dialect-specific SQL whose rows stay untyped.
    Native(&'a str),
}

impl QuerySource<'_> {
    /// Short kind label used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Literal(_) => "literal",
            Self::Named(_) => "named",
            Self::Native(_) => "native",
        }
    }
}

/// One statement plus its bindings and pagination window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Query<'a> {
    source: QuerySource<'a>,
    params: Option<&'a ParameterMap>,
    first_result: i64,
    max_results: Option<i64>,
}

impl<'a> Query<'a> {
    pub fn new(source: QuerySource<'a>) -> Self {
        Self {
            source,
            params: None,
            first_result: 0,
            max_results: None,
        }
    }

    pub fn literal(sql: &'a str) -> Self {
        Self::new(QuerySource::Literal(sql))
    }

    pub fn named(name: &'a str) -> Self {
        Self::new(QuerySource::Named(name))
    }

    pub fn native(sql: &'a str) -> Self {
        Self::new(QuerySource::Native(sql))
    }

    /// Attaches bindings. `None` runs the statement unparameterized.
    pub fn bind(mut self, params: Option<&'a ParameterMap>) -> Self {
        self.params = params;
        self
    }

    /// Caps the number of returned rows.
    ///
    /// # Errors
    /// - `InvalidArgument` when `max_results < 1`.
    pub fn with_max_results(mut self, max_results: i64) -> RepoResult<Self> {
        check_max_results(max_results)?;
        self.max_results = Some(max_results);
        Ok(self)
    }

    /// Skips the first `first_result` rows (zero-based).
    ///
    /// # Errors
    /// - `InvalidArgument` when `first_result < 0`.
    pub fn with_first_result(mut self, first_result: i64) -> RepoResult<Self> {
        if first_result < 0 {
            return Err(RepoError::InvalidArgument(format!(
                "first_result must not be negative, got {first_result}"
            )));
        }
        self.first_result = first_result;
        Ok(self)
    }

    pub fn source(&self) -> QuerySource<'a> {
        self.source
    }

    pub fn params(&self) -> Option<&'a ParameterMap> {
        self.params
    }

    pub fn first_result(&self) -> i64 {
        self.first_result
    }

    pub fn max_results(&self) -> Option<i64> {
        self.max_results
    }

    pub fn is_paginated(&self) -> bool {
        self.first_result > 0 || self.max_results.is_some()
    }

    /// Name or SQL text identifying this query in error messages.
    pub fn describe(&self) -> &'a str {
        match self.source {
            QuerySource::Literal(sql) | QuerySource::Native(sql) => sql,
            QuerySource::Named(name) => name,
        }
    }
}

/// Rejects row caps below 1.
pub fn check_max_results(max_results: i64) -> RepoResult<()> {
    if max_results < 1 {
        return Err(RepoError::InvalidArgument(format!(
            "max_results must not be less than 1, got {max_results}"
        )));
    }
    Ok(())
}

/// Untyped result record from a native query.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeRow {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl NativeRow {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Value of the first column named `column`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|name| name == column)
            .and_then(|index| self.values.get(index))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
