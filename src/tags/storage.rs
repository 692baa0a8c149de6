use anyhow::Result;
use sqlx::SqlitePool;

use crate::storage::with_timeout;
use crate::tasks::model::TagRow;
use crate::tasks::storage::{effective_page_size, effective_skip};

/// Read/delete operations on tags. Tag creation happens only through the
/// task-create upsert path in [`crate::tasks::TaskStore`].
#[derive(Clone)]
pub struct TagStore {
    pool: SqlitePool,
}

impl TagStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// One page of tags, ordered by id. Same page/size conventions as task
    /// listing.
    pub async fn list_page(&self, page: i64, total: i64) -> Result<Vec<TagRow>> {
        let size = effective_page_size(total);
        let skip = effective_skip(page, size);
        with_timeout(async {
            Ok(
                sqlx::query_as("SELECT * FROM tags ORDER BY id LIMIT ? OFFSET ?")
                    .bind(size)
                    .bind(skip)
                    .fetch_all(&self.pool)
                    .await?,
            )
        })
        .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<TagRow>> {
        Ok(sqlx::query_as("SELECT * FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Delete a tag row. Association rows referencing it go via cascade;
    /// tasks are untouched. Returns false when no tag has the given id.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let rows_affected = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }
}
