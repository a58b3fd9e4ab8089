//! Field-level validation for entity writes.
//!
//! # Invariants
//! - Required text fields must be non-empty.
//! - Length limits count characters, not bytes, to match SQLite `length()`.

use super::{EntityId, EntityKind};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum characters for page and post titles.
pub const TITLE_MAX_CHARS: usize = 255;
/// Maximum characters for post authors.
pub const AUTHOR_MAX_CHARS: usize = 100;

/// Client-supplied data that cannot be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    MissingField {
        entity: EntityKind,
        field: &'static str,
    },
    /// A bounded field exceeds its limit.
    FieldTooLong {
        entity: EntityKind,
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
    /// A post references a media id that does not exist.
    UnknownMedia(EntityId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { entity, field } => {
                write!(f, "{} {field} is required", entity.label())
            }
            Self::FieldTooLong {
                entity,
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "{} {field} must be at most {max_chars} characters, got {actual_chars}",
                entity.label()
            ),
            Self::UnknownMedia(id) => write!(f, "media not found: {id}"),
        }
    }
}

impl Error for ValidationError {}

/// Rejects an empty required field.
pub fn require_non_empty(
    entity: EntityKind,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField { entity, field });
    }
    Ok(())
}

/// Rejects a field longer than `max_chars` characters.
pub fn limit_chars(
    entity: EntityKind,
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    let actual_chars = value.chars().count();
    if actual_chars > max_chars {
        return Err(ValidationError::FieldTooLong {
            entity,
            field,
            max_chars,
            actual_chars,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{limit_chars, require_non_empty, ValidationError};
    use crate::model::EntityKind;

    #[test]
    fn empty_value_is_missing() {
        let err = require_non_empty(EntityKind::Page, "title", "").unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                entity: EntityKind::Page,
                field: "title"
            }
        );
        assert_eq!(err.to_string(), "Page title is required");
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let title = "é".repeat(255);
        assert!(title.len() > 255);
        limit_chars(EntityKind::Post, "title", &title, 255).unwrap();

        let err = limit_chars(EntityKind::Post, "title", &"a".repeat(256), 255).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::FieldTooLong {
                actual_chars: 256,
                ..
            }
        ));
    }
}
