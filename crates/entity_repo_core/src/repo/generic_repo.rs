//! Generic entity repository over an injected session.
//!
//! # Responsibility
//! - Give every entity type uniform CRUD and query operations.
//! - Hide session plumbing (query building, binding, pagination) from callers.
//!
//! # Invariants
//! - The descriptor is validated and checked against the store at
//!   construction, then never changes.
//! - Pagination arguments are validated before any statement runs.
//! - Store failures propagate unchanged; nothing is retried or recovered.

use crate::model::entity::{Entity, EntityDescriptor, EntityId};
use crate::query::{check_max_results, NativeRow, ParameterMap, Query};
use crate::repo::{RepoError, RepoResult};
use crate::session::Session;
use log::debug;
use std::marker::PhantomData;

/// Uniform data access for one entity type.
///
/// Concrete repositories wrap this type and add domain-named finders on top
/// of the query helpers.
pub struct GenericRepository<'s, E, S> {
    session: &'s S,
    descriptor: EntityDescriptor,
    _entity: PhantomData<fn() -> E>,
}

impl<'s, E: Entity, S: Session> GenericRepository<'s, E, S> {
    /// Binds a repository to `descriptor` on top of `session`.
    ///
    /// # Errors
    /// - `UnsupportedConfiguration` when the descriptor is malformed.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the store does not
    ///   hold the mapped table.
    pub fn try_new(session: &'s S, descriptor: EntityDescriptor) -> RepoResult<Self> {
        descriptor.validate()?;
        session.ensure_mapped(&descriptor)?;
        debug!(
            "event=repo_init module=repo status=ok entity={} table={}",
            descriptor.name, descriptor.table
        );

        Ok(Self {
            session,
            descriptor,
            _entity: PhantomData,
        })
    }

    /// Entity type this repository is bound to.
    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    pub fn session(&self) -> &'s S {
        self.session
    }

    /// Select prefix whose rows `E::from_row` can map.
    pub fn base_select(&self) -> String {
        self.descriptor.select_clause()
    }

    /// Makes `entity` persistent. A transient entity receives its generated
    /// id; an entity that already carries an id is written as an update.
    pub fn save(&self, entity: &mut E) -> RepoResult<()> {
        self.session.persist(&self.descriptor, entity)
    }

    /// Writes a possibly-detached entity and returns the managed copy as the
    /// store now holds it.
    ///
    /// Flushes and refreshes before returning, so store-computed columns
    /// (defaults, trigger output) are current in the result.
    pub fn merge(&self, entity: &E) -> RepoResult<E> {
        let mut merged = self.session.merge(&self.descriptor, entity)?;
        self.session.flush()?;
        self.session.refresh(&self.descriptor, &mut merged)?;
        Ok(merged)
    }

    /// Removes the row backing `entity`.
    pub fn delete(&self, entity: &E) -> RepoResult<()> {
        self.session.remove(&self.descriptor, entity)
    }

    /// Loads the entity with `id`, or `None` when no row exists.
    ///
    /// # Errors
    /// - `InvariantViolation` when `id` is `None`.
    pub fn load(&self, id: impl Into<Option<EntityId>>) -> RepoResult<Option<E>> {
        let id = self.require_id(id.into())?;
        self.session.find(&self.descriptor, id)
    }

    /// Whether a row with `id` exists.
    ///
    /// # Errors
    /// - `InvariantViolation` when `id` is `None`.
    pub fn exists(&self, id: impl Into<Option<EntityId>>) -> RepoResult<bool> {
        let id = self.require_id(id.into())?;
        self.session.contains(&self.descriptor, id)
    }

    /// Every row of the bound entity type, ordered by id.
    pub fn load_all(&self) -> RepoResult<Vec<E>> {
        let sql = format!(
            "{} ORDER BY {}",
            self.descriptor.select_clause(),
            self.descriptor.id_column
        );
        self.session.result_list(&Query::literal(&sql))
    }

    /// Runs `stmt` expecting exactly one row.
    pub fn load_by_query(&self, stmt: &str) -> RepoResult<E> {
        self.session.single_result(&Query::literal(stmt))
    }

    pub fn find_by_query(&self, stmt: &str, params: Option<&ParameterMap>) -> RepoResult<Vec<E>> {
        self.session.result_list(&Query::literal(stmt).bind(params))
    }

    /// Like [`Self::find_by_query`], returning at most `max_results` rows.
    ///
    /// # Errors
    /// - `InvalidArgument` when `max_results < 1`.
    pub fn find_by_query_limited(
        &self,
        stmt: &str,
        params: Option<&ParameterMap>,
        max_results: i64,
    ) -> RepoResult<Vec<E>> {
        check_max_results(max_results)?;
        let query = Query::literal(stmt)
            .bind(params)
            .with_max_results(max_results)?;
        self.session.result_list(&query)
    }

    /// Runs the named query expecting exactly one row.
    ///
    /// # Errors
    /// - `NoResult` on zero rows, `NonUniqueResult` on more than one.
    pub fn load_by_named_query(
        &self,
        name: &str,
        params: Option<&ParameterMap>,
    ) -> RepoResult<E> {
        self.session.single_result(&Query::named(name).bind(params))
    }

    /// First row of the named query, or `None` when it matches nothing.
    pub fn find_single_by_named_query(
        &self,
        name: &str,
        params: Option<&ParameterMap>,
    ) -> RepoResult<Option<E>> {
        let query = Query::named(name).bind(params).with_max_results(1)?;
        Ok(self.session.result_list(&query)?.into_iter().next())
    }

    pub fn find_by_named_query(
        &self,
        name: &str,
        params: Option<&ParameterMap>,
    ) -> RepoResult<Vec<E>> {
        self.session.result_list(&Query::named(name).bind(params))
    }

    /// Rows `first_result..first_result + max_results` of the named query.
    ///
    /// # Errors
    /// - `InvalidArgument` when `max_results < 1` or `first_result < 0`.
    pub fn find_by_named_query_paged(
        &self,
        name: &str,
        params: Option<&ParameterMap>,
        first_result: i64,
        max_results: i64,
    ) -> RepoResult<Vec<E>> {
        check_max_results(max_results)?;
        let query = Query::named(name)
            .bind(params)
            .with_first_result(first_result)?
            .with_max_results(max_results)?;
        self.session.result_list(&query)
    }

    /// Runs dialect-specific SQL; rows are returned untyped.
    pub fn find_by_native_query(
        &self,
        stmt: &str,
        params: Option<&ParameterMap>,
    ) -> RepoResult<Vec<NativeRow>> {
        self.session.native_result_list(&Query::native(stmt).bind(params))
    }

    /// Runs a named bulk update/delete and returns the affected row count.
    pub fn execute_update(&self, name: &str, params: Option<&ParameterMap>) -> RepoResult<usize> {
        self.session.execute_update(&Query::named(name).bind(params))
    }

    fn require_id(&self, id: Option<EntityId>) -> RepoResult<EntityId> {
        id.ok_or_else(|| {
            RepoError::InvariantViolation(format!(
                "id of `{}` must not be null",
                self.descriptor.name
            ))
        })
    }
}
