//! Repository layer.
//!
//! # Responsibility
//! - Provide `GenericRepository`, the uniform data-access base for entities.
//! - Define the error taxonomy shared with sessions and queries.
//!
//! # Invariants
//! - Repositories never own the session or the connection under it.
//! - Caller precondition failures are reported before touching the store.

pub mod error;
pub mod generic_repo;

pub use error::{RepoError, RepoResult};
pub use generic_repo::GenericRepository;
