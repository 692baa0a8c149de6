// rest/routes/tags.rs — Tag read/delete routes.
//
// Tags are created only through the task-create upsert path; these routes
// cover list/detail/delete.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use std::sync::Arc;

use crate::rest::envelope::{ApiError, ApiResult, Envelope};
use crate::rest::routes::tasks::TagSummary;
use crate::AppContext;

#[derive(Debug, Default, Deserialize)]
pub struct ListTagsQuery {
    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub total: Option<i64>,
}

/// GET /tags?page=&total= — same pagination conventions as task listing,
/// ordered by id.
pub async fn list_tags(
    State(ctx): State<Arc<AppContext>>,
    query: Result<Query<ListTagsQuery>, QueryRejection>,
) -> ApiResult<Vec<TagSummary>> {
    let Query(q) = query
        .map_err(|_| ApiError::InvalidArgument("invalid query parameters".to_string()))?;

    let rows = ctx
        .tags
        .list_page(q.page.unwrap_or(0), q.total.unwrap_or(0))
        .await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound("no tags found".to_string()));
    }

    let out: Vec<TagSummary> = rows.into_iter().map(TagSummary::from).collect();
    Ok(Envelope::ok(format!("found {} tags", out.len()), out))
}

/// GET /tags/{id}
pub async fn get_tag(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> ApiResult<TagSummary> {
    match ctx.tags.get(&id).await? {
        Some(row) => Ok(Envelope::ok("tag found", TagSummary::from(row))),
        None => Err(ApiError::NotFound("tag not found".to_string())),
    }
}

/// DELETE /tags/{id} — association rows referencing the tag are removed by
/// cascade; tasks are untouched.
pub async fn delete_tag(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    if ctx.tags.delete(&id).await? {
        Ok(Envelope::ok_empty("tag deleted"))
    } else {
        Err(ApiError::NotFound("tag not found".to_string()))
    }
}
