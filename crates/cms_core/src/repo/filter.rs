//! List filters and the composable predicate they compile to.
//!
//! # Responsibility
//! - Turn optional filter values into SQL conditions with bound values.
//! - Keep user input out of SQL text; only column names are interpolated.
//!
//! # Invariants
//! - No conditions means "match all".
//! - Conditions combine with `AND`.
//! - `None` and empty strings are both "not supplied".
//! - Substring filters match `%`, `_` and `\` literally.

use crate::db::{fold_case, FOLD_FUNCTION};
use crate::model::EntityId;
use rusqlite::types::Value;
use serde::Deserialize;

/// Conjunction of SQL conditions plus their positional bind values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<String>,
    binds: Vec<Value>,
}

impl Predicate {
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn is_match_all(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Adds a case-insensitive substring match when `needle` is supplied.
    ///
    /// Both sides go through the Unicode fold, so `école` matches `ÉCOLE`.
    pub fn and_contains_ci(mut self, column: &'static str, needle: Option<&str>) -> Self {
        if let Some(needle) = supplied(needle) {
            self.clauses
                .push(format!("{FOLD_FUNCTION}({column}) LIKE ? ESCAPE '\\'"));
            self.binds
                .push(Value::Text(format!("%{}%", escape_like(&fold_case(needle)))));
        }
        self
    }

    /// Adds an exact match when `value` is supplied.
    pub fn and_equals(mut self, column: &'static str, value: Option<&str>) -> Self {
        if let Some(value) = supplied(value) {
            self.clauses.push(format!("{column} = ?"));
            self.binds.push(Value::Text(value.to_string()));
        }
        self
    }

    /// Adds a membership test. An empty id set matches nothing.
    ///
    /// The ids travel as one JSON array bind, so the set size is not bounded
    /// by SQLite's host-parameter limit.
    pub fn and_in(mut self, column: &'static str, ids: &[EntityId]) -> Self {
        if ids.is_empty() {
            self.clauses.push("0 = 1".to_string());
            return self;
        }
        self.clauses
            .push(format!("{column} IN (SELECT value FROM json_each(?))"));
        self.binds
            .push(Value::Text(serde_json::Value::from(ids.to_vec()).to_string()));
        self
    }

    /// Renders ` WHERE …`, or an empty string for match-all.
    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn binds(&self) -> &[Value] {
        &self.binds
    }
}

/// Compiles a filter into a predicate.
pub trait ListFilter {
    fn predicate(&self) -> Predicate;
}

/// Page list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageFilter {
    /// Case-insensitive substring of `title`.
    pub title: Option<String>,
}

impl PageFilter {
    pub fn title_contains(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }
}

impl ListFilter for PageFilter {
    fn predicate(&self) -> Predicate {
        Predicate::match_all().and_contains_ci("title", self.title.as_deref())
    }
}

/// Post list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostFilter {
    /// Case-insensitive substring of `title`.
    pub title: Option<String>,
    /// Exact `author`.
    pub author: Option<String>,
}

impl PostFilter {
    pub fn title_contains(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn by_author(author: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
            ..Self::default()
        }
    }
}

impl ListFilter for PostFilter {
    fn predicate(&self) -> Predicate {
        Predicate::match_all()
            .and_contains_ci("title", self.title.as_deref())
            .and_equals("author", self.author.as_deref())
    }
}

/// Media list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MediaFilter {
    /// Exact `type`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl MediaFilter {
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
        }
    }
}

impl ListFilter for MediaFilter {
    fn predicate(&self) -> Predicate {
        Predicate::match_all().and_equals("type", self.kind.as_deref())
    }
}

fn supplied(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
