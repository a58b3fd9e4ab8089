//! Entity model for pages, posts and media.
//!
//! # Responsibility
//! - Define the records persisted by core and the payloads that create or
//!   patch them.
//! - Define field-level validation shared by every write path.
//!
//! # Invariants
//! - Every persisted record carries a store-assigned `EntityId`.
//! - Timestamps are Unix epoch milliseconds.
//! - Deletion is a hard delete; there is no tombstone column.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub mod media;
pub mod page;
pub mod post;
pub mod validation;

/// Store-assigned row identifier shared by all entities.
pub type EntityId = i64;

/// Unix epoch milliseconds.
pub type Timestamp = i64;

/// Names one of the persisted entity families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Page,
    Media,
    Post,
}

impl EntityKind {
    /// Lowercase name used in logs and messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Media => "media",
            Self::Post => "post",
        }
    }

    /// Human-facing label, e.g. `Post` in `Post not found`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Page => "Page",
            Self::Media => "Media",
            Self::Post => "Post",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confirmation returned by a successful delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deleted {
    pub entity: EntityKind,
    pub id: EntityId,
}

impl Deleted {
    /// Message shown to API callers, e.g. `Post deleted successfully`.
    pub fn message(&self) -> String {
        format!("{} deleted successfully", self.entity.label())
    }
}
