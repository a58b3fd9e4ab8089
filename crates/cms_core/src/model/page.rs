//! Page records and write payloads.
//!
//! # Invariants
//! - `title` is non-empty and at most 255 characters.
//! - `content` is non-empty.

use super::validation::{limit_chars, require_non_empty, ValidationError, TITLE_MAX_CHARS};
use super::{EntityId, EntityKind, Timestamp};
use serde::{Deserialize, Serialize};

/// Standalone content page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: EntityId,
    pub title: String,
    pub content: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Page {
    /// Checks the persisted-state invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.title, &self.content)
    }
}

/// Create payload for a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPage {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl NewPage {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.title, &self.content)
    }
}

/// Partial update for a page. Absent and empty fields keep stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagePatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

fn validate_fields(title: &str, content: &str) -> Result<(), ValidationError> {
    require_non_empty(EntityKind::Page, "title", title)?;
    limit_chars(EntityKind::Page, "title", title, TITLE_MAX_CHARS)?;
    require_non_empty(EntityKind::Page, "content", content)?;
    Ok(())
}
