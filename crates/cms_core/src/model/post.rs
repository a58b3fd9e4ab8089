//! Post records, media references and write payloads.
//!
//! # Invariants
//! - `title` is non-empty and at most 255 characters.
//! - `content` is non-empty.
//! - `author`, when set, is non-empty and at most 100 characters.
//! - `media` is always present; posts without associations carry `[]`.

use super::media::Media;
use super::validation::{
    limit_chars, require_non_empty, ValidationError, AUTHOR_MAX_CHARS, TITLE_MAX_CHARS,
};
use super::{EntityId, EntityKind, Timestamp};
use serde::{Deserialize, Serialize};

/// Blog post with its associated media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: EntityId,
    pub title: String,
    pub content: String,
    pub author: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Order is by media id; callers should treat it as a set.
    #[serde(default)]
    pub media: Vec<Media>,
}

impl Post {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.title, &self.content, self.author.as_deref())
    }

    /// Ids of the associated media.
    pub fn media_ids(&self) -> Vec<EntityId> {
        self.media.iter().map(|media| media.id).collect()
    }
}

/// Reference to an existing media row, shaped `{"id": n}` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: EntityId,
}

impl From<EntityId> for MediaRef {
    fn from(id: EntityId) -> Self {
        Self { id }
    }
}

/// Create payload for a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    /// Existing media to associate; core never creates media here.
    #[serde(default)]
    pub media: Vec<MediaRef>,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_media(mut self, ids: impl IntoIterator<Item = EntityId>) -> Self {
        self.media = ids.into_iter().map(MediaRef::from).collect();
        self
    }

    /// Author with the empty string folded into `None`.
    pub fn normalized_author(&self) -> Option<&str> {
        self.author.as_deref().filter(|value| !value.is_empty())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.title, &self.content, self.normalized_author())
    }
}

/// Partial update for a post.
///
/// `media: None` (or an empty list) keeps the current association set;
/// a non-empty list replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub media: Option<Vec<MediaRef>>,
}

fn validate_fields(
    title: &str,
    content: &str,
    author: Option<&str>,
) -> Result<(), ValidationError> {
    require_non_empty(EntityKind::Post, "title", title)?;
    limit_chars(EntityKind::Post, "title", title, TITLE_MAX_CHARS)?;
    require_non_empty(EntityKind::Post, "content", content)?;
    if let Some(author) = author {
        require_non_empty(EntityKind::Post, "author", author)?;
        limit_chars(EntityKind::Post, "author", author, AUTHOR_MAX_CHARS)?;
    }
    Ok(())
}
