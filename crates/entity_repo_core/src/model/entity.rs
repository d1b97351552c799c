//! Entity trait and explicit entity descriptor.
//!
//! # Responsibility
//! - Let a domain type describe its own row mapping (`Entity`).
//! - Describe the mapped table (`EntityDescriptor`) so repositories receive
//!   their entity type as a constructor argument.
//!
//! # Invariants
//! - `Entity::column_values` is ordered exactly like `EntityDescriptor::columns`.
//! - Descriptor identifiers are plain SQL identifiers (`[A-Za-z_][A-Za-z0-9_]*`).
//! - The id column never appears in `columns` or `generated_columns`.

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::Row;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static SQL_IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Surrogate identity shared by every entity type.
pub type EntityId = i64;

/// Domain object stored as one row of one table.
///
/// Implementations map by column name, so any statement whose rows should be
/// read back as `Self` must select every column named by the descriptor.
pub trait Entity: Clone {
    /// Returns the identity, or `None` while the entity is transient.
    fn id(&self) -> Option<EntityId>;

    /// Assigns the identity produced by the store.
    fn set_id(&mut self, id: EntityId);

    /// Writable column values, in `EntityDescriptor::columns` order.
    fn column_values(&self) -> Vec<Value>;

    /// Builds an entity from one result row.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Explicit description of the table backing an entity type.
///
/// A repository is handed one of these at construction and keeps it
/// unchanged for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Human-readable entity name, used in logs and errors.
    pub name: &'static str,
    /// Backing table.
    pub table: &'static str,
    /// Integer identity column, expected to be the table's primary key.
    pub id_column: &'static str,
    /// Columns written on insert/update, in `Entity::column_values` order.
    pub columns: &'static [&'static str],
    /// Store-computed columns: selected on every read, never written.
    pub generated_columns: &'static [&'static str],
}

impl EntityDescriptor {
    /// Checks that the descriptor names a usable table mapping.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.name.trim().is_empty() {
            return Err(DescriptorError::EmptyName);
        }

        check_identifier("table", self.table)?;
        check_identifier("id column", self.id_column)?;

        if self.columns.is_empty() {
            return Err(DescriptorError::NoWritableColumns(self.name));
        }

        let mut seen = BTreeSet::new();
        seen.insert(self.id_column);
        for column in self.columns.iter().chain(self.generated_columns).copied() {
            check_identifier("column", column)?;
            if column == self.id_column {
                return Err(DescriptorError::IdColumnRepeated(column));
            }
            if !seen.insert(column) {
                return Err(DescriptorError::DuplicateColumn(column));
            }
        }

        Ok(())
    }

    /// Every mapped column: id first, then writable, then generated columns.
    pub fn all_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.id_column)
            .chain(self.columns.iter().copied())
            .chain(self.generated_columns.iter().copied())
    }

    /// `SELECT <all columns> FROM <table>` without a trailing clause.
    pub fn select_clause(&self) -> String {
        let columns = self.all_columns().collect::<Vec<_>>().join(", ");
        format!("SELECT {columns} FROM {}", self.table)
    }
}

fn check_identifier(role: &'static str, value: &'static str) -> Result<(), DescriptorError> {
    if SQL_IDENTIFIER_RE.is_match(value) {
        Ok(())
    } else {
        Err(DescriptorError::InvalidIdentifier { role, value })
    }
}

/// Reasons an `EntityDescriptor` cannot back a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    EmptyName,
    InvalidIdentifier {
        role: &'static str,
        value: &'static str,
    },
    NoWritableColumns(&'static str),
    IdColumnRepeated(&'static str),
    DuplicateColumn(&'static str),
}

impl Display for DescriptorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "entity name cannot be empty"),
            Self::InvalidIdentifier { role, value } => {
                write!(f, "{role} `{value}` is not a valid SQL identifier")
            }
            Self::NoWritableColumns(name) => {
                write!(f, "entity `{name}` declares no writable columns")
            }
            Self::IdColumnRepeated(column) => {
                write!(f, "id column `{column}` must not be listed as a data column")
            }
            Self::DuplicateColumn(column) => write!(f, "column `{column}` is mapped twice"),
        }
    }
}

impl Error for DescriptorError {}
