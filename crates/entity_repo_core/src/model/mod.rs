//! Entity mapping contracts shared by sessions and repositories.
//!
//! # Responsibility
//! - Define how a domain type maps onto one table row.
//! - Carry the explicit type descriptor a repository is built with.
//!
//! # Invariants
//! - Every persisted entity is identified by an integer `EntityId`.
//! - Descriptors are plain data and never inferred at runtime.

pub mod entity;
