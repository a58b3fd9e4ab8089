//! Media records and write payloads.

use super::validation::{require_non_empty, ValidationError};
use super::{EntityId, EntityKind, Timestamp};
use serde::{Deserialize, Serialize};

/// Media asset that posts may reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: EntityId,
    pub url: String,
    /// Free-form category such as `image` or `video`.
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Media {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.url, &self.kind)
    }
}

/// Create payload for a media asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedia {
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl NewMedia {
    pub fn new(url: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: kind.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.url, &self.kind)
    }
}

/// Partial update for a media asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaPatch {
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

fn validate_fields(url: &str, kind: &str) -> Result<(), ValidationError> {
    require_non_empty(EntityKind::Media, "url", url)?;
    require_non_empty(EntityKind::Media, "type", kind)?;
    Ok(())
}
