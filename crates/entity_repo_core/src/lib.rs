//! Generic entity repositories over SQLite.
//!
//! A `GenericRepository` gives any `Entity` uniform CRUD and query access
//! through an injected `Session`; `SqliteSession` is the bundled store.

pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod session;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::{DescriptorError, Entity, EntityDescriptor, EntityId};
pub use query::{
    create_parameter_map, NamedQueryRegistry, NativeRow, ParameterMap, Query, QuerySource,
};
pub use repo::{GenericRepository, RepoError, RepoResult};
pub use session::{Session, SqliteSession};
