//! Persistence and query core for the CMS backend.
//! Pages, posts and media are validated, stored and related here; HTTP and
//! JSON shaping live in the calling adapter.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;

pub use clock::{Clock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use error::{ErrorKind, RepoError, RepoResult, StorageError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::media::{Media, MediaPatch, NewMedia};
pub use model::page::{NewPage, Page, PagePatch};
pub use model::post::{MediaRef, NewPost, Post, PostPatch};
pub use model::validation::ValidationError;
pub use model::{Deleted, EntityId, EntityKind, Timestamp};
pub use repo::filter::{ListFilter, MediaFilter, PageFilter, PostFilter, Predicate};
pub use repo::media_repo::{MediaRepository, SqliteMediaRepository};
pub use repo::page_repo::{PageRepository, SqlitePageRepository};
pub use repo::post_repo::{PostRepository, SqlitePostRepository};
pub use repo::relation::{attach_media, load_post_media, PostMediaSource};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
