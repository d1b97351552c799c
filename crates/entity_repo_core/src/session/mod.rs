//! Persistence-session contract.
//!
//! # Responsibility
//! - Define the unit-of-work surface a repository orchestrates.
//! - Keep the backing store swappable behind one trait.
//!
//! # Invariants
//! - Sessions never demarcate transactions; callers own that boundary.
//! - Store failures surface as `RepoError::Db`, unchanged.

mod sqlite;

use crate::model::entity::{Entity, EntityDescriptor, EntityId};
use crate::query::{NativeRow, Query};
use crate::repo::{RepoError, RepoResult};

pub use sqlite::SqliteSession;

/// Unit of work through which every read, write, and query is issued.
pub trait Session {
    /// Verifies that the store holds the table and columns `descriptor` maps.
    fn ensure_mapped(&self, descriptor: &EntityDescriptor) -> RepoResult<()>;

    /// Inserts a transient entity (assigning its id) or upserts by id.
    fn persist<E: Entity>(&self, descriptor: &EntityDescriptor, entity: &mut E)
        -> RepoResult<()>;

    /// Writes a possibly-detached entity's state and returns the managed copy.
    fn merge<E: Entity>(&self, descriptor: &EntityDescriptor, entity: &E) -> RepoResult<E>;

    /// Pushes pending writes to the store.
    fn flush(&self) -> RepoResult<()>;

    /// Reloads `entity` from its row.
    fn refresh<E: Entity>(&self, descriptor: &EntityDescriptor, entity: &mut E)
        -> RepoResult<()>;

    /// Removes the row backing `entity`.
    fn remove<E: Entity>(&self, descriptor: &EntityDescriptor, entity: &E) -> RepoResult<()>;

    /// Loads the row with `id`, if any.
    fn find<E: Entity>(&self, descriptor: &EntityDescriptor, id: EntityId)
        -> RepoResult<Option<E>>;

    /// Existence check that does not materialize the entity.
    fn contains(&self, descriptor: &EntityDescriptor, id: EntityId) -> RepoResult<bool>;

    /// Runs `query` and maps every row to `E`.
    fn result_list<E: Entity>(&self, query: &Query<'_>) -> RepoResult<Vec<E>>;

    /// Runs `query` and returns untyped rows.
    fn native_result_list(&self, query: &Query<'_>) -> RepoResult<Vec<NativeRow>>;

    /// Runs a bulk update/delete and returns the affected row count.
    fn execute_update(&self, query: &Query<'_>) -> RepoResult<usize>;

    /// Runs `query` expecting exactly one row.
    ///
    /// # Errors
    /// - `NoResult` when no row matches.
    /// - `NonUniqueResult` when more than one row matches.
    fn single_result<E: Entity>(&self, query: &Query<'_>) -> RepoResult<E> {
        // Two rows are enough to tell "one" from "many".
        let probe = match query.max_results() {
            Some(_) => *query,
            None => query.with_max_results(2)?,
        };

        let mut rows = self.result_list::<E>(&probe)?;
        match rows.len() {
            0 => Err(RepoError::NoResult {
                query: query.describe().to_string(),
            }),
            1 => Ok(rows.remove(0)),
            _ => Err(RepoError::NonUniqueResult {
                query: query.describe().to_string(),
            }),
        }
    }
}
