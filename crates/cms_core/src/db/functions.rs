//! Application-defined SQL functions.
//!
//! # Invariants
//! - Registration is per connection and may be repeated.
//! - `cms_fold(NULL)` is `NULL`.

use super::DbResult;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// SQL name of the Unicode lowercase fold used by substring filters.
pub const FOLD_FUNCTION: &str = "cms_fold";

/// Registers every core SQL function on `conn`.
pub fn register_functions(conn: &Connection) -> DbResult<()> {
    conn.create_scalar_function(
        FOLD_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|value| fold_case(&value)))
        },
    )?;
    Ok(())
}

/// Case fold applied on both sides of a case-insensitive match.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}
