//! Transactional unit of work for entity writes.
//!
//! # Responsibility
//! - Run one create/update/delete inside a scoped SQLite transaction.
//! - Log each write outcome with its error classification.
//! - Hold the partial-patch merge rules shared by every entity.
//!
//! # Invariants
//! - Work that returns `Err` is rolled back explicitly before the error is
//!   returned.
//! - Work that panics or returns early is rolled back by the transaction
//!   guard when it drops.
//! - Write transactions start with `BEGIN IMMEDIATE`, so the write lock is
//!   taken up front.

use super::rows::{exists, StoredRecord};
use crate::error::{RepoError, RepoResult};
use crate::model::{Deleted, EntityId, EntityKind};
use log::{error, log, warn, Level};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;

/// Write operation kind, used in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteAction {
    Create,
    Update,
    Delete,
}

impl WriteAction {
    fn event(self) -> &'static str {
        match self {
            Self::Create => "entity_create",
            Self::Update => "entity_update",
            Self::Delete => "entity_delete",
        }
    }
}

/// Runs a full write operation (checks plus transaction) and logs the
/// outcome.
pub(crate) fn write_op<T>(
    entity: EntityKind,
    action: WriteAction,
    op: impl FnOnce() -> RepoResult<T>,
) -> RepoResult<T> {
    let started_at = Instant::now();
    let result = op();
    let duration_ms = started_at.elapsed().as_millis();
    let (level, status) = outcome_level(&result);
    match &result {
        Ok(_) => log!(
            level,
            "event={} module=repo status={status} entity={entity} duration_ms={duration_ms}",
            action.event()
        ),
        Err(err) => log!(
            level,
            "event={} module=repo status={status} entity={entity} duration_ms={duration_ms} error_code={} error={err}",
            action.event(),
            err.kind().code()
        ),
    }
    result
}

/// Log level and status for a write outcome.
///
/// Every failure reports `status=error`; caller mistakes (validation,
/// missing rows) log at `warn`, storage failures at `error`.
fn outcome_level<T>(result: &RepoResult<T>) -> (Level, &'static str) {
    match result {
        Ok(_) => (Level::Info, "ok"),
        Err(RepoError::Storage(_)) => (Level::Error, "error"),
        Err(_) => (Level::Warn, "error"),
    }
}

/// Runs `work` in an immediate transaction and commits on success.
pub(crate) fn in_transaction<T>(
    conn: &Connection,
    entity: EntityKind,
    work: impl FnOnce(&Transaction<'_>) -> RepoResult<T>,
) -> RepoResult<T> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    match work(&tx) {
        Ok(value) => {
            // A failed commit drops the guard, which rolls back.
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            match tx.rollback() {
                Ok(()) => warn!(
                    "event=tx_rollback module=repo status=ok entity={entity} error_code={}",
                    err.kind().code()
                ),
                Err(rollback_err) => error!(
                    "event=tx_rollback module=repo status=error entity={entity} error={rollback_err}"
                ),
            }
            Err(err)
        }
    }
}

/// Deletes one row after confirming it exists.
///
/// A missing row is `NotFound` and never opens a transaction.
pub(crate) fn delete_entity<T: StoredRecord>(
    conn: &Connection,
    id: EntityId,
) -> RepoResult<Deleted> {
    write_op(T::KIND, WriteAction::Delete, || {
        if !exists::<T>(conn, id)? {
            return Err(RepoError::not_found(T::KIND, id));
        }

        in_transaction(conn, T::KIND, |tx| {
            let changed = tx.execute(&format!("DELETE FROM {} WHERE id = ?1;", T::TABLE), [id])?;
            if changed == 0 {
                return Err(RepoError::not_found(T::KIND, id));
            }
            Ok(())
        })?;

        Ok(Deleted {
            entity: T::KIND,
            id,
        })
    })
}

/// Overwrites `target` only when `incoming` is present and non-empty.
pub(crate) fn overwrite_if_supplied(target: &mut String, incoming: Option<&str>) {
    if let Some(value) = incoming.filter(|value| !value.is_empty()) {
        *target = value.to_string();
    }
}

/// Optional-field variant of `overwrite_if_supplied`.
pub(crate) fn overwrite_optional_if_supplied(target: &mut Option<String>, incoming: Option<&str>) {
    if let Some(value) = incoming.filter(|value| !value.is_empty()) {
        *target = Some(value.to_string());
    }
}
