// rest/routes/tasks.rs — Task CRUD routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::rest::envelope::{ApiError, ApiResult, Envelope};
use crate::tasks::{Priority, SortDirection, Status, TagInput, TagRow, TaskRow};
use crate::AppContext;

// ─── Contracts ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSummary {
    pub id: String,
    pub name: String,
}

impl From<TagRow> for TagSummary {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: String,
    pub title: String,
    pub name: String,
    pub priority: Priority,
    pub status: Status,
    pub tags: Vec<TagSummary>,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskResponse {
    fn from_row(row: TaskRow, tags: Vec<TagRow>) -> Self {
        Self {
            id: row.id,
            title: row.title,
            name: row.name,
            priority: row.priority,
            status: row.status,
            tags: tags.into_iter().map(TagSummary::from).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TagRef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub task_name: String,
    pub title: String,
    pub priority: Priority,
    pub status: Status,
    #[serde(default)]
    pub tags: Vec<TagRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub task_name: String,
    pub title: String,
    pub priority: Priority,
    pub status: Status,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "super::empty_as_none")]
    pub total: Option<i64>,
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

/// GET /tasks?sortBy=&sortOrder=&page=&total=
///
/// An empty result page is a 404, never a 200 with an empty list — callers
/// rely on that distinction.
pub async fn list_tasks(
    State(ctx): State<Arc<AppContext>>,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> ApiResult<Vec<TaskResponse>> {
    let Query(q) = query
        .map_err(|_| ApiError::InvalidArgument("invalid query parameters".to_string()))?;

    let direction: SortDirection = q
        .sort_order
        .as_deref()
        .unwrap_or("")
        .parse()
        .map_err(|_| ApiError::InvalidArgument("sort order must be ASC or DESC".to_string()))?;

    let sort_by = q.sort_by.unwrap_or_default();
    if sort_by.is_empty() {
        return Err(ApiError::InvalidArgument(
            "sort field must not be empty".to_string(),
        ));
    }

    let rows = ctx
        .tasks
        .list_page(&sort_by, direction, q.page.unwrap_or(0), q.total.unwrap_or(0))
        .await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound("no tasks found".to_string()));
    }

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let tags = ctx.tasks.tags_for(&row.id).await?;
        out.push(TaskResponse::from_row(row, tags));
    }
    Ok(Envelope::ok(format!("found {} tasks", out.len()), out))
}

/// POST /tasks/create
pub async fn create_task(
    State(ctx): State<Arc<AppContext>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<TaskResponse> {
    let Json(req) = payload.map_err(|_| {
        ApiError::InvalidArgument("request body is missing or malformed".to_string())
    })?;

    let tags: Vec<TagInput> = req
        .tags
        .into_iter()
        .map(|t| TagInput {
            id: t.id,
            name: t.name,
        })
        .collect();

    let task = ctx
        .tasks
        .create_with_tags(&req.title, &req.task_name, req.priority, req.status, &tags)
        .await?;
    let tags = ctx.tasks.tags_for(&task.id).await?;
    Ok(Envelope::ok(
        "task created",
        TaskResponse::from_row(task, tags),
    ))
}

/// PUT /tasks/{id} — overwrite title/name/priority/status only.
pub async fn update_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<TaskResponse> {
    let Json(req) = payload.map_err(|_| {
        ApiError::InvalidArgument("request body is missing or malformed".to_string())
    })?;

    match ctx
        .tasks
        .update_fields(&id, &req.title, &req.task_name, req.priority, req.status)
        .await?
    {
        Some(task) => {
            let tags = ctx.tasks.tags_for(&task.id).await?;
            Ok(Envelope::ok(
                "task updated",
                TaskResponse::from_row(task, tags),
            ))
        }
        None => Err(ApiError::NotFound("task not found".to_string())),
    }
}

/// DELETE /tasks/{id}
pub async fn delete_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    if ctx.tasks.delete(&id).await? {
        Ok(Envelope::ok_empty("task deleted"))
    } else {
        Err(ApiError::NotFound("task not found".to_string()))
    }
}
