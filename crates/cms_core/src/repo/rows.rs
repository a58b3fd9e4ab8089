//! Row mapping and single-table reads shared by entity repositories.
//!
//! # Invariants
//! - Read paths reject rows that break model invariants instead of masking
//!   them; such rows surface as storage errors.
//! - Lists are ordered by primary key ascending.

use super::filter::Predicate;
use crate::error::{RepoError, RepoResult};
use crate::model::media::Media;
use crate::model::page::Page;
use crate::model::post::Post;
use crate::model::{EntityId, EntityKind};
use rusqlite::{params_from_iter, Connection, Row};

/// A model type persisted as one row of one table.
pub(crate) trait StoredRecord: Sized {
    const KIND: EntityKind;
    const TABLE: &'static str;
    /// Column list, without `WHERE`/`ORDER BY`.
    const SELECT_SQL: &'static str;

    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}

impl StoredRecord for Page {
    const KIND: EntityKind = EntityKind::Page;
    const TABLE: &'static str = "pages";
    const SELECT_SQL: &'static str =
        "SELECT id, title, content, created_at, updated_at FROM pages";

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let page = Page {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        };
        page.validate()
            .map_err(|err| corrupt_row(Self::KIND, page.id, &err))?;
        Ok(page)
    }
}

impl StoredRecord for Media {
    const KIND: EntityKind = EntityKind::Media;
    const TABLE: &'static str = "media";
    const SELECT_SQL: &'static str = "SELECT id, url, type, created_at, updated_at FROM media";

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let media = Media {
            id: row.get("id")?,
            url: row.get("url")?,
            kind: row.get("type")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        };
        media
            .validate()
            .map_err(|err| corrupt_row(Self::KIND, media.id, &err))?;
        Ok(media)
    }
}

impl StoredRecord for Post {
    const KIND: EntityKind = EntityKind::Post;
    const TABLE: &'static str = "posts";
    const SELECT_SQL: &'static str =
        "SELECT id, title, content, author, created_at, updated_at FROM posts";

    /// Leaves `media` empty; the relationship loader fills it.
    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let post = Post {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            author: row.get("author")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            media: Vec::new(),
        };
        post.validate()
            .map_err(|err| corrupt_row(Self::KIND, post.id, &err))?;
        Ok(post)
    }
}

pub(crate) fn find_by_id<T: StoredRecord>(conn: &Connection, id: EntityId) -> RepoResult<Option<T>> {
    let mut stmt = conn.prepare(&format!("{} WHERE id = ?1;", T::SELECT_SQL))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(T::from_row(row)?));
    }
    Ok(None)
}

/// Like `find_by_id`, but a missing row is `NotFound`.
pub(crate) fn require_by_id<T: StoredRecord>(conn: &Connection, id: EntityId) -> RepoResult<T> {
    find_by_id(conn, id)?.ok_or_else(|| RepoError::not_found(T::KIND, id))
}

pub(crate) fn exists<T: StoredRecord>(conn: &Connection, id: EntityId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);", T::TABLE),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn list_where<T: StoredRecord>(
    conn: &Connection,
    predicate: &Predicate,
) -> RepoResult<Vec<T>> {
    let sql = format!("{}{} ORDER BY id ASC;", T::SELECT_SQL, predicate.where_sql());
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(predicate.binds()))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(T::from_row(row)?);
    }
    Ok(records)
}

fn corrupt_row(entity: EntityKind, id: EntityId, reason: &dyn std::fmt::Display) -> RepoError {
    RepoError::invalid_data(format!("{entity} {id}: {reason}"))
}
