//! Media repository contract and SQLite implementation.
//!
//! # Invariants
//! - Same write rules as pages.
//! - Deleting media also clears its `post_media` rows (foreign key
//!   `ON DELETE CASCADE`), so posts never point at missing media.

use super::filter::{ListFilter, MediaFilter};
use super::rows::{list_where, require_by_id};
use super::unit_of_work::{
    delete_entity, in_transaction, overwrite_if_supplied, write_op, WriteAction,
};
use crate::clock::{next_update_timestamp, Clock, SystemClock};
use crate::db::{ensure_repository_ready, TableSpec};
use crate::error::{RepoError, RepoResult};
use crate::model::media::{Media, MediaPatch, NewMedia};
use crate::model::{Deleted, EntityId, EntityKind};
use rusqlite::{params, Connection};

const MEDIA_TABLES: &[TableSpec] = &[
    ("media", &["id", "url", "type", "created_at", "updated_at"]),
    ("post_media", &["post_id", "media_id"]),
];

/// Repository interface for media operations.
pub trait MediaRepository {
    fn list_media(&self, filter: &MediaFilter) -> RepoResult<Vec<Media>>;
    fn get_media(&self, id: EntityId) -> RepoResult<Media>;
    fn create_media(&self, payload: &NewMedia) -> RepoResult<Media>;
    fn update_media(&self, id: EntityId, patch: &MediaPatch) -> RepoResult<Media>;
    fn delete_media(&self, id: EntityId) -> RepoResult<Deleted>;
}

/// SQLite-backed media repository.
pub struct SqliteMediaRepository<'conn, C = SystemClock> {
    conn: &'conn Connection,
    clock: C,
}

impl<'conn> SqliteMediaRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::with_clock(conn, SystemClock)
    }
}

impl<'conn, C: Clock> SqliteMediaRepository<'conn, C> {
    pub fn with_clock(conn: &'conn Connection, clock: C) -> RepoResult<Self> {
        ensure_repository_ready(conn, MEDIA_TABLES)?;
        Ok(Self { conn, clock })
    }
}

impl<C: Clock> MediaRepository for SqliteMediaRepository<'_, C> {
    fn list_media(&self, filter: &MediaFilter) -> RepoResult<Vec<Media>> {
        list_where(self.conn, &filter.predicate())
    }

    fn get_media(&self, id: EntityId) -> RepoResult<Media> {
        require_by_id(self.conn, id)
    }

    fn create_media(&self, payload: &NewMedia) -> RepoResult<Media> {
        write_op(EntityKind::Media, WriteAction::Create, || {
            payload.validate()?;
            let now = self.clock.now_ms();

            in_transaction(self.conn, EntityKind::Media, |tx| {
                tx.execute(
                    "INSERT INTO media (url, type, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?3);",
                    params![payload.url, payload.kind, now],
                )?;
                require_by_id(tx, tx.last_insert_rowid())
            })
        })
    }

    fn update_media(&self, id: EntityId, patch: &MediaPatch) -> RepoResult<Media> {
        write_op(EntityKind::Media, WriteAction::Update, || {
            let mut media: Media = require_by_id(self.conn, id)?;
            overwrite_if_supplied(&mut media.url, patch.url.as_deref());
            overwrite_if_supplied(&mut media.kind, patch.kind.as_deref());
            media.validate()?;
            media.updated_at = next_update_timestamp(&self.clock, media.updated_at);

            in_transaction(self.conn, EntityKind::Media, |tx| {
                let changed = tx.execute(
                    "UPDATE media
                     SET url = ?2, type = ?3, updated_at = ?4
                     WHERE id = ?1;",
                    params![media.id, media.url, media.kind, media.updated_at],
                )?;
                if changed == 0 {
                    return Err(RepoError::not_found(EntityKind::Media, id));
                }
                Ok(())
            })?;

            Ok(media)
        })
    }

    fn delete_media(&self, id: EntityId) -> RepoResult<Deleted> {
        delete_entity::<Media>(self.conn, id)
    }
}
