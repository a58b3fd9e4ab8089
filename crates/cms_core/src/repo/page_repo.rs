//! Page repository contract and SQLite implementation.
//!
//! # Invariants
//! - Create validates before any transaction opens.
//! - Update and delete look the row up first; a miss never opens a
//!   transaction.
//! - Update saves the full merged row and refreshes `updated_at`.

use super::filter::{ListFilter, PageFilter};
use super::rows::{list_where, require_by_id};
use super::unit_of_work::{
    delete_entity, in_transaction, overwrite_if_supplied, write_op, WriteAction,
};
use crate::clock::{next_update_timestamp, Clock, SystemClock};
use crate::db::{ensure_repository_ready, TableSpec};
use crate::error::{RepoError, RepoResult};
use crate::model::page::{NewPage, Page, PagePatch};
use crate::model::{Deleted, EntityId, EntityKind};
use rusqlite::{params, Connection};

const PAGE_TABLES: &[TableSpec] = &[(
    "pages",
    &["id", "title", "content", "created_at", "updated_at"],
)];

/// Repository interface for page operations.
pub trait PageRepository {
    fn list_pages(&self, filter: &PageFilter) -> RepoResult<Vec<Page>>;
    fn get_page(&self, id: EntityId) -> RepoResult<Page>;
    fn create_page(&self, payload: &NewPage) -> RepoResult<Page>;
    fn update_page(&self, id: EntityId, patch: &PagePatch) -> RepoResult<Page>;
    fn delete_page(&self, id: EntityId) -> RepoResult<Deleted>;
}

/// SQLite-backed page repository.
pub struct SqlitePageRepository<'conn, C = SystemClock> {
    conn: &'conn Connection,
    clock: C,
}

impl<'conn> SqlitePageRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::with_clock(conn, SystemClock)
    }
}

impl<'conn, C: Clock> SqlitePageRepository<'conn, C> {
    /// Constructs a repository that stamps writes with `clock`.
    pub fn with_clock(conn: &'conn Connection, clock: C) -> RepoResult<Self> {
        ensure_repository_ready(conn, PAGE_TABLES)?;
        Ok(Self { conn, clock })
    }
}

impl<C: Clock> PageRepository for SqlitePageRepository<'_, C> {
    fn list_pages(&self, filter: &PageFilter) -> RepoResult<Vec<Page>> {
        list_where(self.conn, &filter.predicate())
    }

    fn get_page(&self, id: EntityId) -> RepoResult<Page> {
        require_by_id(self.conn, id)
    }

    fn create_page(&self, payload: &NewPage) -> RepoResult<Page> {
        write_op(EntityKind::Page, WriteAction::Create, || {
            payload.validate()?;
            let now = self.clock.now_ms();

            in_transaction(self.conn, EntityKind::Page, |tx| {
                tx.execute(
                    "INSERT INTO pages (title, content, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?3);",
                    params![payload.title, payload.content, now],
                )?;
                require_by_id(tx, tx.last_insert_rowid())
            })
        })
    }

    fn update_page(&self, id: EntityId, patch: &PagePatch) -> RepoResult<Page> {
        write_op(EntityKind::Page, WriteAction::Update, || {
            let mut page: Page = require_by_id(self.conn, id)?;
            overwrite_if_supplied(&mut page.title, patch.title.as_deref());
            overwrite_if_supplied(&mut page.content, patch.content.as_deref());
            page.validate()?;
            page.updated_at = next_update_timestamp(&self.clock, page.updated_at);

            in_transaction(self.conn, EntityKind::Page, |tx| {
                let changed = tx.execute(
                    "UPDATE pages
                     SET title = ?2, content = ?3, updated_at = ?4
                     WHERE id = ?1;",
                    params![page.id, page.title, page.content, page.updated_at],
                )?;
                if changed == 0 {
                    return Err(RepoError::not_found(EntityKind::Page, id));
                }
                Ok(())
            })?;

            Ok(page)
        })
    }

    fn delete_page(&self, id: EntityId) -> RepoResult<Deleted> {
        delete_entity::<Page>(self.conn, id)
    }
}
