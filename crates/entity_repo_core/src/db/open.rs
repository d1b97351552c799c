//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Apply `DbConfig` pragmas before handing the connection out.
//!
//! # Invariants
//! - Returned connections honor `DbConfig::foreign_keys`.
//! - Returned connections carry the configured busy timeout.

use super::{DbConfig, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite database file with default configuration.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with(path, &DbConfig::default())
}

/// Opens an in-memory SQLite database with default configuration.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_db_in_memory_with(&DbConfig::default())
}

/// Opens a SQLite database file and applies `config`.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_with(path: impl AsRef<Path>, config: &DbConfig) -> DbResult<Connection> {
    open_logged("file", config, || Connection::open(path))
}

/// Opens an in-memory SQLite database and applies `config`.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory_with(config: &DbConfig) -> DbResult<Connection> {
    open_logged("memory", config, Connection::open_in_memory)
}

fn open_logged(
    mode: &str,
    config: &DbConfig,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let conn = open().and_then(|conn| configure_connection(&conn, config).map(|()| conn));
    match conn {
        Ok(conn) => {
            info!(
                "event=db_open module=db status=ok mode={mode} foreign_keys={} duration_ms={}",
                config.foreign_keys,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err.into())
        }
    }
}

fn configure_connection(conn: &Connection, config: &DbConfig) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(())
}
