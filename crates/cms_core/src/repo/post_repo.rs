//! Post repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist posts together with their `post_media` association rows.
//! - Return posts with `media` populated by the relationship loader.
//!
//! # Invariants
//! - Media references are resolved before a transaction opens; an unknown
//!   id is a validation error.
//! - The post row and its association rows commit or roll back together.
//! - `PostPatch.media` replaces the association set only when non-empty.

use super::filter::{ListFilter, PostFilter, Predicate};
use super::relation::{attach_media, load_post_media};
use super::rows::{list_where, require_by_id};
use super::unit_of_work::{
    delete_entity, in_transaction, overwrite_if_supplied, overwrite_optional_if_supplied,
    write_op, WriteAction,
};
use crate::clock::{next_update_timestamp, Clock, SystemClock};
use crate::db::{ensure_repository_ready, TableSpec};
use crate::error::{RepoError, RepoResult};
use crate::model::post::{MediaRef, NewPost, Post, PostPatch};
use crate::model::validation::ValidationError;
use crate::model::{Deleted, EntityId, EntityKind};
use rusqlite::{params, params_from_iter, Connection};
use std::collections::BTreeSet;

const POST_TABLES: &[TableSpec] = &[
    (
        "posts",
        &["id", "title", "content", "author", "created_at", "updated_at"],
    ),
    ("media", &["id", "url", "type", "created_at", "updated_at"]),
    ("post_media", &["post_id", "media_id"]),
];

/// Repository interface for post operations.
pub trait PostRepository {
    /// Lists matching posts; media for the whole page is loaded in one lookup.
    fn list_posts(&self, filter: &PostFilter) -> RepoResult<Vec<Post>>;
    fn get_post(&self, id: EntityId) -> RepoResult<Post>;
    fn create_post(&self, payload: &NewPost) -> RepoResult<Post>;
    fn update_post(&self, id: EntityId, patch: &PostPatch) -> RepoResult<Post>;
    fn delete_post(&self, id: EntityId) -> RepoResult<Deleted>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'conn, C = SystemClock> {
    conn: &'conn Connection,
    clock: C,
}

impl<'conn> SqlitePostRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::with_clock(conn, SystemClock)
    }
}

impl<'conn, C: Clock> SqlitePostRepository<'conn, C> {
    pub fn with_clock(conn: &'conn Connection, clock: C) -> RepoResult<Self> {
        ensure_repository_ready(conn, POST_TABLES)?;
        Ok(Self { conn, clock })
    }
}

impl<C: Clock> PostRepository for SqlitePostRepository<'_, C> {
    fn list_posts(&self, filter: &PostFilter) -> RepoResult<Vec<Post>> {
        let mut posts = list_where(self.conn, &filter.predicate())?;
        attach_media(self.conn, &mut posts)?;
        Ok(posts)
    }

    fn get_post(&self, id: EntityId) -> RepoResult<Post> {
        let mut post: Post = require_by_id(self.conn, id)?;
        post.media = load_post_media(self.conn, id)?;
        Ok(post)
    }

    fn create_post(&self, payload: &NewPost) -> RepoResult<Post> {
        write_op(EntityKind::Post, WriteAction::Create, || {
            payload.validate()?;
            let media_ids = distinct_ids(&payload.media);
            ensure_media_exist(self.conn, &media_ids)?;
            let now = self.clock.now_ms();

            in_transaction(self.conn, EntityKind::Post, |tx| {
                tx.execute(
                    "INSERT INTO posts (title, content, author, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?4);",
                    params![
                        payload.title,
                        payload.content,
                        payload.normalized_author(),
                        now
                    ],
                )?;
                let post_id = tx.last_insert_rowid();
                link_media(tx, post_id, &media_ids)?;

                let mut post: Post = require_by_id(tx, post_id)?;
                post.media = load_post_media(&**tx, post_id)?;
                Ok(post)
            })
        })
    }

    fn update_post(&self, id: EntityId, patch: &PostPatch) -> RepoResult<Post> {
        write_op(EntityKind::Post, WriteAction::Update, || {
            let mut post: Post = require_by_id(self.conn, id)?;
            overwrite_if_supplied(&mut post.title, patch.title.as_deref());
            overwrite_if_supplied(&mut post.content, patch.content.as_deref());
            overwrite_optional_if_supplied(&mut post.author, patch.author.as_deref());
            post.validate()?;

            let replacement = patch
                .media
                .as_deref()
                .filter(|refs| !refs.is_empty())
                .map(distinct_ids);
            if let Some(media_ids) = &replacement {
                ensure_media_exist(self.conn, media_ids)?;
            }
            post.updated_at = next_update_timestamp(&self.clock, post.updated_at);

            post.media = in_transaction(self.conn, EntityKind::Post, |tx| {
                let changed = tx.execute(
                    "UPDATE posts
                     SET title = ?2, content = ?3, author = ?4, updated_at = ?5
                     WHERE id = ?1;",
                    params![
                        post.id,
                        post.title,
                        post.content,
                        post.author,
                        post.updated_at
                    ],
                )?;
                if changed == 0 {
                    return Err(RepoError::not_found(EntityKind::Post, id));
                }

                if let Some(media_ids) = &replacement {
                    tx.execute("DELETE FROM post_media WHERE post_id = ?1;", [id])?;
                    link_media(tx, id, media_ids)?;
                }
                load_post_media(&**tx, id)
            })?;

            Ok(post)
        })
    }

    /// Association rows go with the post through `ON DELETE CASCADE`.
    fn delete_post(&self, id: EntityId) -> RepoResult<Deleted> {
        delete_entity::<Post>(self.conn, id)
    }
}

fn distinct_ids(refs: &[MediaRef]) -> Vec<EntityId> {
    refs.iter()
        .map(|media| media.id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Fails with `UnknownMedia` for the smallest id that has no media row.
fn ensure_media_exist(conn: &Connection, media_ids: &[EntityId]) -> RepoResult<()> {
    if media_ids.is_empty() {
        return Ok(());
    }

    let predicate = Predicate::match_all().and_in("id", media_ids);
    let mut stmt = conn.prepare(&format!("SELECT id FROM media{};", predicate.where_sql()))?;
    let mut rows = stmt.query(params_from_iter(predicate.binds()))?;
    let mut found = BTreeSet::new();
    while let Some(row) = rows.next()? {
        found.insert(row.get::<_, EntityId>(0)?);
    }

    match media_ids.iter().find(|id| !found.contains(*id)) {
        Some(missing) => Err(ValidationError::UnknownMedia(*missing).into()),
        None => Ok(()),
    }
}

fn link_media(conn: &Connection, post_id: EntityId, media_ids: &[EntityId]) -> RepoResult<()> {
    let mut stmt = conn.prepare("INSERT INTO post_media (post_id, media_id) VALUES (?1, ?2);")?;
    for media_id in media_ids {
        stmt.execute(params![post_id, media_id])?;
    }
    Ok(())
}
