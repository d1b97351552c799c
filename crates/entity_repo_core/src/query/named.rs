//! Registry of precompiled, name-addressable statements.

use crate::repo::{RepoError, RepoResult};
use std::collections::BTreeMap;

/// Name → SQL table consulted when a query is addressed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedQueryRegistry {
    queries: BTreeMap<String, String>,
}

impl NamedQueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `sql` under `name`.
    ///
    /// # Errors
    /// - `InvariantViolation` when `name` or `sql` is blank.
    /// - `DuplicateNamedQuery` when `name` is already registered.
    pub fn register(&mut self, name: impl Into<String>, sql: impl Into<String>) -> RepoResult<()> {
        let name = name.into();
        let sql = sql.into();
        if name.trim().is_empty() {
            return Err(RepoError::InvariantViolation(
                "named query name cannot be blank".to_string(),
            ));
        }
        if sql.trim().is_empty() {
            return Err(RepoError::InvariantViolation(format!(
                "named query `{name}` has blank SQL"
            )));
        }
        if self.queries.contains_key(&name) {
            return Err(RepoError::DuplicateNamedQuery(name));
        }

        self.queries.insert(name, sql);
        Ok(())
    }

    /// Builder form of [`NamedQueryRegistry::register`].
    pub fn with(mut self, name: impl Into<String>, sql: impl Into<String>) -> RepoResult<Self> {
        self.register(name, sql)?;
        Ok(self)
    }

    /// Looks up the SQL registered under `name`.
    pub fn resolve(&self, name: &str) -> RepoResult<&str> {
        self.queries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| RepoError::UnknownNamedQuery(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
