//! Repository layer: queries, relationship loading and transactional writes.
//!
//! # Responsibility
//! - Define per-entity data access contracts.
//! - Keep SQLite query details out of callers.
//!
//! # Invariants
//! - Repository writes validate payloads before persistence.
//! - Every error is a `RepoError` with exactly one `ErrorKind`.

pub mod filter;
pub mod media_repo;
pub mod page_repo;
pub mod post_repo;
pub mod relation;
mod rows;
mod unit_of_work;
