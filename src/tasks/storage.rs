use anyhow::{anyhow, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::model::{Priority, SortDirection, Status, TagRow, TaskRow, TaskTagRow};
use crate::storage::with_timeout;

/// Page size applied when the caller supplies `total <= 0` or nothing at all.
pub const DEFAULT_PAGE_SIZE: i64 = 5;

/// A tag reference supplied at task-create time. A blank id (absent, empty,
/// or the nil UUID) means "mint a fresh one".
#[derive(Debug, Clone)]
pub struct TagInput {
    pub id: Option<String>,
    pub name: String,
}

/// Effective page size: anything non-positive falls back to the default.
pub fn effective_page_size(total: i64) -> i64 {
    if total <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        total
    }
}

/// Effective row skip: page index is clamped to 0, then skip = page × size.
pub fn effective_skip(page: i64, size: i64) -> i64 {
    if page <= 0 {
        0
    } else {
        page * size
    }
}

/// Map a requested sort field to an ORDER BY column. Matching is
/// case-insensitive; unrecognized fields fall back to the id column.
pub fn sort_column(field: &str) -> &'static str {
    match field.to_lowercase().as_str() {
        "name" => "name",
        "status" => "status",
        "priority" => "priority",
        _ => "id",
    }
}

fn is_blank_tag_id(id: Option<&str>) -> bool {
    match id {
        None => true,
        Some(s) => s.is_empty() || s == "00000000-0000-0000-0000-000000000000",
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

// ─── TaskStore ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// One page of tasks, sorted by a whitelisted column.
    ///
    /// The column comes from [`sort_column`] and the direction from
    /// [`SortDirection`], so the interpolation below never sees caller input.
    pub async fn list_page(
        &self,
        sort_by: &str,
        direction: SortDirection,
        page: i64,
        total: i64,
    ) -> Result<Vec<TaskRow>> {
        let size = effective_page_size(total);
        let skip = effective_skip(page, size);
        let sql = format!(
            "SELECT * FROM tasks ORDER BY {} {} LIMIT ? OFFSET ?",
            sort_column(sort_by),
            direction.as_sql()
        );

        with_timeout(async {
            Ok(sqlx::query_as(&sql)
                .bind(size)
                .bind(skip)
                .fetch_all(&self.pool)
                .await?)
        })
        .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<TaskRow>> {
        Ok(sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Create a task together with its tag associations, atomically.
    ///
    /// Per supplied tag: blank id → insert under a fresh UUID; known id →
    /// overwrite its name. Then the task row, then one task_tags row per tag.
    /// Everything runs in one transaction — a failure anywhere rolls the
    /// whole create back, so no partial state (orphan tags, task without its
    /// associations) can survive.
    pub async fn create_with_tags(
        &self,
        title: &str,
        name: &str,
        priority: Priority,
        status: Status,
        tags: &[TagInput],
    ) -> Result<TaskRow> {
        let task_id = Uuid::new_v4().to_string();
        let now = now_rfc3339();

        let mut tx = self.pool.begin().await?;

        let mut tag_ids = Vec::with_capacity(tags.len());
        for tag in tags {
            let tag_id = if is_blank_tag_id(tag.id.as_deref()) {
                Uuid::new_v4().to_string()
            } else {
                tag.id.clone().unwrap_or_default()
            };
            sqlx::query(
                "INSERT INTO tags (id, name, created_at) VALUES (?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            )
            .bind(&tag_id)
            .bind(&tag.name)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
            tag_ids.push(tag_id);
        }

        sqlx::query(
            "INSERT INTO tasks (id, title, name, priority, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&task_id)
        .bind(title)
        .bind(name)
        .bind(priority)
        .bind(status)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for tag_id in &tag_ids {
            sqlx::query(
                "INSERT INTO task_tags (id, task_id, tag_id, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&task_id)
            .bind(tag_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get(&task_id)
            .await?
            .ok_or_else(|| anyhow!("task not found after insert"))
    }

    /// Overwrite the four scalar fields. Tag associations are untouched.
    /// Returns None when no task has the given id.
    pub async fn update_fields(
        &self,
        id: &str,
        title: &str,
        name: &str,
        priority: Priority,
        status: Status,
    ) -> Result<Option<TaskRow>> {
        let rows_affected = sqlx::query(
            "UPDATE tasks SET title = ?, name = ?, priority = ?, status = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(title)
        .bind(name)
        .bind(priority)
        .bind(status)
        .bind(now_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    /// Delete a task row. Association rows go with it via cascade.
    /// Returns false when no task has the given id.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let rows_affected = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }

    /// Association rows for a task, in insert order.
    pub async fn associations_for(&self, task_id: &str) -> Result<Vec<TaskTagRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM task_tags WHERE task_id = ? ORDER BY rowid")
                .bind(task_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Tags associated with a task, in association-insert order.
    pub async fn tags_for(&self, task_id: &str) -> Result<Vec<TagRow>> {
        Ok(sqlx::query_as(
            "SELECT t.* FROM tags t
             JOIN task_tags tt ON tt.tag_id = t.id
             WHERE tt.task_id = ?
             ORDER BY tt.rowid",
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    async fn test_store() -> TaskStore {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .unwrap();
        let sql = include_str!("../storage/migrations/001_init.sql");
        for stmt in sql.split(';') {
            let stmt = stmt.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(&pool).await.unwrap();
            }
        }
        TaskStore::new(pool)
    }

    fn tag(name: &str) -> TagInput {
        TagInput {
            id: None,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_sort_column_whitelist() {
        assert_eq!(sort_column("name"), "name");
        assert_eq!(sort_column("Priority"), "priority");
        assert_eq!(sort_column("STATUS"), "status");
        assert_eq!(sort_column("id"), "id");
        assert_eq!(sort_column("created_at"), "id");
        assert_eq!(sort_column("'; DROP TABLE tasks; --"), "id");
    }

    proptest! {
        /// Non-positive page sizes always fall back to the default.
        #[test]
        fn prop_page_size_default(total in -1000i64..=0) {
            prop_assert_eq!(effective_page_size(total), DEFAULT_PAGE_SIZE);
        }

        /// Positive page sizes pass through unchanged.
        #[test]
        fn prop_page_size_passthrough(total in 1i64..=10_000) {
            prop_assert_eq!(effective_page_size(total), total);
        }

        /// Non-positive page indexes always mean "skip nothing".
        #[test]
        fn prop_skip_zero_for_nonpositive_page(page in -1000i64..=0, size in 1i64..=500) {
            prop_assert_eq!(effective_skip(page, size), 0);
        }

        /// Positive pages skip page × size rows.
        #[test]
        fn prop_skip_is_page_times_size(page in 1i64..=1000, size in 1i64..=500) {
            prop_assert_eq!(effective_skip(page, size), page * size);
        }
    }

    #[tokio::test]
    async fn test_create_upserts_tags_and_links_them() {
        let s = test_store().await;

        // Pre-existing tag whose name will be overwritten.
        sqlx::query("INSERT INTO tags (id, name, created_at) VALUES ('tag-1', 'oldname', 'x')")
            .execute(&s.pool)
            .await
            .unwrap();

        let task = s
            .create_with_tags(
                "Ship it",
                "ship",
                Priority::High,
                Status::Pending,
                &[
                    TagInput {
                        id: Some("tag-1".to_string()),
                        name: "renamed".to_string(),
                    },
                    tag("fresh"),
                ],
            )
            .await
            .unwrap();

        let tags = s.tags_for(&task.id).await.unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].id, "tag-1");
        assert_eq!(tags[0].name, "renamed");
        assert_eq!(tags[1].name, "fresh");
        assert_ne!(tags[1].id, "");

        let links = s.associations_for(&task.id).await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].tag_id, "tag-1");
        assert!(links.iter().all(|l| l.task_id == task.id));
    }

    #[tokio::test]
    async fn test_blank_tag_id_sentinels_generate_fresh_ids() {
        let s = test_store().await;
        let task = s
            .create_with_tags(
                "t",
                "t",
                Priority::Low,
                Status::Pending,
                &[
                    TagInput {
                        id: Some(String::new()),
                        name: "empty-id".to_string(),
                    },
                    TagInput {
                        id: Some("00000000-0000-0000-0000-000000000000".to_string()),
                        name: "nil-uuid".to_string(),
                    },
                ],
            )
            .await
            .unwrap();

        let tags = s.tags_for(&task.id).await.unwrap();
        assert_eq!(tags.len(), 2);
        for t in &tags {
            assert!(!t.id.is_empty());
            assert_ne!(t.id, "00000000-0000-0000-0000-000000000000");
        }
    }

    #[tokio::test]
    async fn test_update_overwrites_scalars_only() {
        let s = test_store().await;
        let task = s
            .create_with_tags("old", "old", Priority::Low, Status::Pending, &[tag("keep")])
            .await
            .unwrap();

        let updated = s
            .update_fields(&task.id, "new", "newname", Priority::Critical, Status::Done)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "new");
        assert_eq!(updated.name, "newname");
        assert_eq!(updated.priority, Priority::Critical);
        assert_eq!(updated.status, Status::Done);

        // Associations untouched.
        let tags = s.tags_for(&task.id).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "keep");
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_none() {
        let s = test_store().await;
        let result = s
            .update_fields("nope", "t", "n", Priority::Low, Status::Pending)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_twice_and_cascade() {
        let s = test_store().await;
        let task = s
            .create_with_tags("t", "n", Priority::Medium, Status::Pending, &[tag("a")])
            .await
            .unwrap();

        assert!(s.delete(&task.id).await.unwrap());
        assert!(!s.delete(&task.id).await.unwrap());

        // Cascade removed the association rows; the tag itself survives.
        let links: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM task_tags")
            .fetch_one(&s.pool)
            .await
            .unwrap();
        assert_eq!(links.0, 0);
        let tags: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags")
            .fetch_one(&s.pool)
            .await
            .unwrap();
        assert_eq!(tags.0, 1);
    }

    #[tokio::test]
    async fn test_list_page_sorts_and_paginates() {
        let s = test_store().await;
        for name in ["charlie", "alpha", "bravo"] {
            s.create_with_tags("t", name, Priority::Medium, Status::Pending, &[])
                .await
                .unwrap();
        }

        let rows = s
            .list_page("name", SortDirection::Asc, 0, 2)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "alpha");
        assert_eq!(rows[1].name, "bravo");

        let rows = s
            .list_page("name", SortDirection::Asc, 1, 2)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "charlie");

        let rows = s
            .list_page("name", SortDirection::Desc, 0, 10)
            .await
            .unwrap();
        assert_eq!(rows[0].name, "charlie");

        // Past the end: empty page (the REST layer turns this into 404).
        let rows = s
            .list_page("name", SortDirection::Asc, 5, 2)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_list_unknown_sort_field_falls_back_to_id() {
        let s = test_store().await;
        s.create_with_tags("t", "n", Priority::Low, Status::Pending, &[])
            .await
            .unwrap();
        // Must not error — unrecognized field orders by id.
        let rows = s
            .list_page("bogus", SortDirection::Asc, 0, 0)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
