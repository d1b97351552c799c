//! SQLite-backed persistence session.
//!
//! # Responsibility
//! - Translate session operations into SQLite statements.
//! - Resolve named queries and bind parameters by name.
//!
//! # Invariants
//! - Writes are issued immediately; `flush` has nothing left to push.
//! - The id column is an integer primary key usable as an upsert target.
//! - Statement text and bound values never appear in log events.

use crate::model::entity::{Entity, EntityDescriptor, EntityId};
use crate::query::params::placeholder;
use crate::query::{NamedQueryRegistry, NativeRow, ParameterMap, Query, QuerySource};
use crate::repo::{RepoError, RepoResult};
use crate::session::Session;
use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Statement};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::time::Instant;

/// Session over a borrowed SQLite connection.
///
/// The caller owns the connection, including any transaction open on it.
pub struct SqliteSession<'conn> {
    conn: &'conn Connection,
    named_queries: NamedQueryRegistry,
}

impl<'conn> SqliteSession<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            named_queries: NamedQueryRegistry::new(),
        }
    }

    /// Replaces the registry consulted for `QuerySource::Named`.
    pub fn with_named_queries(mut self, named_queries: NamedQueryRegistry) -> Self {
        self.named_queries = named_queries;
        self
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    pub fn named_queries(&self) -> &NamedQueryRegistry {
        &self.named_queries
    }

    fn resolve_sql<'s>(&'s self, source: QuerySource<'s>) -> RepoResult<&'s str> {
        match source {
            QuerySource::Literal(sql) | QuerySource::Native(sql) => Ok(sql),
            QuerySource::Named(name) => self.named_queries.resolve(name),
        }
    }

    fn prepare_bound(
        &self,
        sql: &str,
        params: Option<&ParameterMap>,
    ) -> RepoResult<Statement<'conn>> {
        let mut stmt = self.conn.prepare(sql)?;
        let Some(params) = params else {
            return Ok(stmt);
        };

        for (name, value) in params.iter() {
            let placeholder = placeholder(name);
            let index = stmt
                .parameter_index(&placeholder)?
                .ok_or_else(|| rusqlite::Error::InvalidParameterName(placeholder.to_string()))?;
            stmt.raw_bind_parameter(index, value)?;
        }
        Ok(stmt)
    }

    /// Inserts or upserts `entity`, returning the id its row ended up with.
    fn write<E: Entity>(&self, descriptor: &EntityDescriptor, entity: &E) -> RepoResult<EntityId> {
        let values = writable_values(descriptor, entity)?;
        let columns = descriptor.columns.join(", ");

        match entity.id() {
            None => {
                let sql = format!(
                    "INSERT INTO {} ({columns}) VALUES ({}) RETURNING {};",
                    descriptor.table,
                    numbered_placeholders(1, values.len()),
                    descriptor.id_column
                );
                let id = self
                    .conn
                    .query_row(&sql, params_from_iter(values), |row| row.get(0))?;
                Ok(id)
            }
            Some(id) => {
                let assignments = descriptor
                    .columns
                    .iter()
                    .map(|column| format!("{column} = excluded.{column}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    "INSERT INTO {table} ({id_column}, {columns}) VALUES (?1, {})
                     ON CONFLICT({id_column}) DO UPDATE SET {assignments};",
                    numbered_placeholders(2, values.len()),
                    table = descriptor.table,
                    id_column = descriptor.id_column,
                );
                let bound = std::iter::once(Value::Integer(id)).chain(values);
                self.conn.execute(&sql, params_from_iter(bound))?;
                Ok(id)
            }
        }
    }
}

impl Session for SqliteSession<'_> {
    fn ensure_mapped(&self, descriptor: &EntityDescriptor) -> RepoResult<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type IN ('table', 'view') AND name = ?1
            );",
            [descriptor.table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(descriptor.table));
        }

        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({});", descriptor.table))?;
        let mut rows = stmt.query([])?;
        let mut present = BTreeSet::new();
        while let Some(row) = rows.next()? {
            present.insert(row.get::<_, String>(1)?);
        }

        for column in descriptor.all_columns() {
            if !present.contains(column) {
                return Err(RepoError::MissingRequiredColumn {
                    table: descriptor.table,
                    column,
                });
            }
        }

        Ok(())
    }

    fn persist<E: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        entity: &mut E,
    ) -> RepoResult<()> {
        let id = self.write(descriptor, entity)?;
        entity.set_id(id);
        debug!(
            "event=entity_persist module=session status=ok entity={} id={id}",
            descriptor.name
        );
        Ok(())
    }

    fn merge<E: Entity>(&self, descriptor: &EntityDescriptor, entity: &E) -> RepoResult<E> {
        let mut managed = entity.clone();
        let id = self.write(descriptor, &managed)?;
        managed.set_id(id);
        debug!(
            "event=entity_merge module=session status=ok entity={} id={id}",
            descriptor.name
        );
        Ok(managed)
    }

    fn flush(&self) -> RepoResult<()> {
        debug!("event=session_flush module=session status=ok pending=0");
        Ok(())
    }

    fn refresh<E: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        entity: &mut E,
    ) -> RepoResult<()> {
        let id = require_id(descriptor, entity, "refresh")?;
        *entity = self
            .find(descriptor, id)?
            .ok_or(RepoError::NotFound(id))?;
        Ok(())
    }

    fn remove<E: Entity>(&self, descriptor: &EntityDescriptor, entity: &E) -> RepoResult<()> {
        let id = require_id(descriptor, entity, "remove")?;
        let removed = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1;",
                descriptor.table, descriptor.id_column
            ),
            [id],
        )?;
        debug!(
            "event=entity_remove module=session status=ok entity={} id={id} rows={removed}",
            descriptor.name
        );
        Ok(())
    }

    fn find<E: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        id: EntityId,
    ) -> RepoResult<Option<E>> {
        let sql = format!(
            "{} WHERE {} = ?1;",
            descriptor.select_clause(),
            descriptor.id_column
        );
        let entity = self
            .conn
            .query_row(&sql, [id], |row| E::from_row(row))
            .optional()?;
        Ok(entity)
    }

    fn contains(&self, descriptor: &EntityDescriptor, id: EntityId) -> RepoResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1);",
            descriptor.table, descriptor.id_column
        );
        let exists: i64 = self.conn.query_row(&sql, [id], |row| row.get(0))?;
        Ok(exists == 1)
    }

    fn result_list<E: Entity>(&self, query: &Query<'_>) -> RepoResult<Vec<E>> {
        let started_at = Instant::now();
        let result = self.resolve_sql(query.source()).and_then(|sql| {
            let sql = windowed_sql(sql, query);
            let mut stmt = self.prepare_bound(&sql, query.params())?;
            let mut rows = stmt.raw_query();
            let mut entities = Vec::new();
            while let Some(row) = rows.next()? {
                entities.push(E::from_row(row)?);
            }
            Ok(entities)
        });
        observe(query, started_at, result, Vec::len)
    }

    fn native_result_list(&self, query: &Query<'_>) -> RepoResult<Vec<NativeRow>> {
        let started_at = Instant::now();
        let result = self.resolve_sql(query.source()).and_then(|sql| {
            let sql = windowed_sql(sql, query);
            let mut stmt = self.prepare_bound(&sql, query.params())?;
            let columns = stmt
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>();

            let mut rows = stmt.raw_query();
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                let values = (0..columns.len())
                    .map(|index| row.get::<_, Value>(index))
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                records.push(NativeRow::new(columns.clone(), values));
            }
            Ok(records)
        });
        observe(query, started_at, result, Vec::len)
    }

    fn execute_update(&self, query: &Query<'_>) -> RepoResult<usize> {
        let started_at = Instant::now();
        let result = self.resolve_sql(query.source()).and_then(|sql| {
            let mut stmt = self.prepare_bound(sql, query.params())?;
            Ok(stmt.raw_execute()?)
        });
        observe(query, started_at, result, |changed| *changed)
    }
}

fn writable_values<E: Entity>(descriptor: &EntityDescriptor, entity: &E) -> RepoResult<Vec<Value>> {
    let values = entity.column_values();
    if values.len() != descriptor.columns.len() {
        return Err(RepoError::InvalidData(format!(
            "entity `{}` produced {} column values for {} mapped columns",
            descriptor.name,
            values.len(),
            descriptor.columns.len()
        )));
    }
    Ok(values)
}

fn require_id<E: Entity>(
    descriptor: &EntityDescriptor,
    entity: &E,
    operation: &str,
) -> RepoResult<EntityId> {
    entity.id().ok_or_else(|| {
        RepoError::InvariantViolation(format!(
            "cannot {operation} a transient `{}` without id",
            descriptor.name
        ))
    })
}

fn numbered_placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Wraps `sql` in a LIMIT/OFFSET window when the query is paginated.
fn windowed_sql<'q>(sql: &'q str, query: &Query<'_>) -> Cow<'q, str> {
    if !query.is_paginated() {
        return Cow::Borrowed(sql);
    }

    let inner = sql.trim_end().trim_end_matches(';').trim_end();
    // SQLite reads a negative LIMIT as "no limit".
    let limit = query.max_results().unwrap_or(-1);
    // Inner SQL stays on its own lines so a trailing `--` comment cannot
    // swallow the closing paren.
    Cow::Owned(format!(
        "SELECT * FROM (\n{inner}\n) LIMIT {limit} OFFSET {}",
        query.first_result()
    ))
}

fn observe<T>(
    query: &Query<'_>,
    started_at: Instant,
    result: RepoResult<T>,
    rows: impl FnOnce(&T) -> usize,
) -> RepoResult<T> {
    let source = query.source();
    let name = match source {
        QuerySource::Named(name) => name,
        QuerySource::Literal(_) | QuerySource::Native(_) => "-",
    };

    match &result {
        Ok(value) => debug!(
            "event=query_exec module=session status=ok kind={} name={} rows={} duration_ms={}",
            source.kind(),
            name,
            rows(value),
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=query_exec module=session status=error kind={} name={} duration_ms={} error={}",
            source.kind(),
            name,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}
