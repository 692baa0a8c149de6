use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Enum fields ──────────────────────────────────────────────────────────────

/// Task priority. Stored as lowercase TEXT; unknown strings are rejected at
/// the JSON boundary and never reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// Task status. Same TEXT representation rules as [`Priority`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Done,
    Blocked,
}

/// Sort direction for task listing. Parsing is case-insensitive but the value
/// must normalize to exactly `ASC` or `DESC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = InvalidSortDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(InvalidSortDirection),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSortDirection;

impl fmt::Display for InvalidSortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sort order must be ASC or DESC")
    }
}

impl std::error::Error for InvalidSortDirection {}

// ─── Row types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub name: String,
    pub priority: Priority,
    pub status: Status,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TagRow {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// Join row linking a task to a tag. One row per tag supplied at create time;
/// removed by cascade when either side is deleted.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TaskTagRow {
    pub id: String,
    pub task_id: String,
    pub tag_id: String,
    pub created_at: String,
}
