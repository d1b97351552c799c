//! Repository error taxonomy.
//!
//! # Invariants
//! - Caller precondition failures never reach the store.
//! - Store failures are wrapped, never translated or swallowed.

use crate::db::DbError;
use crate::model::entity::{DescriptorError, EntityId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors raised by sessions and repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Caller broke a precondition (null id, null key, odd parameter list).
    InvariantViolation(String),
    /// Out-of-range pagination argument.
    InvalidArgument(String),
    /// Single-result query matched no rows.
    NoResult { query: String },
    /// Single-result query matched more than one row.
    NonUniqueResult { query: String },
    /// Descriptor cannot back a repository.
    UnsupportedConfiguration(DescriptorError),
    /// Descriptor table is absent from the connected schema.
    MissingRequiredTable(&'static str),
    /// Descriptor column is absent from its table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// No statement registered under this name.
    UnknownNamedQuery(String),
    /// A statement is already registered under this name.
    DuplicateNamedQuery(String),
    /// Managed entity no longer has a backing row.
    NotFound(EntityId),
    /// Entity state does not fit its descriptor.
    InvalidData(String),
    /// Underlying store failure.
    Db(DbError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvariantViolation(message) => write!(f, "invariant violated: {message}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::NoResult { query } => write!(f, "query `{query}` returned no result"),
            Self::NonUniqueResult { query } => {
                write!(f, "query `{query}` returned more than one result")
            }
            Self::UnsupportedConfiguration(err) => {
                write!(f, "unsupported repository configuration: {err}")
            }
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::UnknownNamedQuery(name) => write!(f, "named query not registered: {name}"),
            Self::DuplicateNamedQuery(name) => {
                write!(f, "named query already registered: {name}")
            }
            Self::NotFound(id) => write!(f, "entity not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid entity data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnsupportedConfiguration(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvariantViolation(_)
            | Self::InvalidArgument(_)
            | Self::NoResult { .. }
            | Self::NonUniqueResult { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. }
            | Self::UnknownNamedQuery(_)
            | Self::DuplicateNamedQuery(_)
            | Self::NotFound(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DescriptorError> for RepoError {
    fn from(value: DescriptorError) -> Self {
        Self::UnsupportedConfiguration(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
