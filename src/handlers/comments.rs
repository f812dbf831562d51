use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::comment::{Comment, CommentStatus, CreateCommentRequest, UpdateCommentRequest},
    utils::{html::clean_content, jwt::Claims},
};

use super::{COMMENT_COLUMNS, begin_write, fetch_comment, fetch_video_owner, recount_replies};

/// Create a new comment or reply.
///
/// Replies must target an ACTIVE top-level comment on the same video.
/// When the reply author differs from the parent's author, a notification
/// row is written for the parent author in the same transaction.
pub async fn create_comment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if payload.content.trim().is_empty() {
        return Err(AppError::Validation(
            "Comment content cannot be empty".to_string(),
        ));
    }

    let author_id = claims.user_id()?;
    let content = clean_content(payload.content.trim());

    let mut tx = begin_write(&pool).await?;

    // Video must exist before anything is written under it.
    let _owner = fetch_video_owner(&mut *tx, video_id).await?;

    // Resolve the parent, if any. Structural violations are InvalidParent,
    // not NotFound: the caller is building a thread, not fetching a row.
    let parent = match payload.parent_id {
        Some(parent_id) => {
            let sql =
                format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ? AND video_id = ?");
            let parent: Option<Comment> = sqlx::query_as(&sql)
                .bind(parent_id)
                .bind(video_id)
                .fetch_optional(&mut *tx)
                .await?;

            let parent = parent.ok_or_else(|| {
                AppError::InvalidParent("Parent comment not found on this video".to_string())
            })?;

            if parent.parent_id.is_some() {
                return Err(AppError::InvalidParent(
                    "Replies cannot be nested".to_string(),
                ));
            }
            if parent.status != CommentStatus::Active {
                return Err(AppError::InvalidParent(
                    "Parent comment is not active".to_string(),
                ));
            }

            Some(parent)
        }
        None => None,
    };

    let now = Utc::now();
    let new_id: i64 = sqlx::query_scalar(
        "INSERT INTO comments (video_id, author_id, author_name, parent_id, content, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, 'active', ?, ?) \
         RETURNING id",
    )
    .bind(video_id)
    .bind(author_id)
    .bind(&claims.name)
    .bind(payload.parent_id)
    .bind(&content)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(parent) = parent {
        recount_replies(&mut *tx, parent.id).await?;

        // Fan out to the parent author. Self-replies stay silent.
        if parent.author_id != author_id {
            sqlx::query(
                "INSERT INTO comment_notifications (user_id, comment_id, kind, is_read, created_at) \
                 VALUES (?, ?, 'reply', 0, ?)",
            )
            .bind(parent.author_id)
            .bind(new_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
    }

    let comment = fetch_comment(&mut *tx, video_id, new_id).await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "data": comment })),
    ))
}

/// Edit a comment's content. Author-only; touches `updated_at` but never
/// the pin state or cached counters.
pub async fn edit_comment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((video_id, comment_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if payload.content.trim().is_empty() {
        return Err(AppError::Validation(
            "Comment content cannot be empty".to_string(),
        ));
    }

    let editor_id = claims.user_id()?;
    let content = clean_content(payload.content.trim());

    let mut tx = begin_write(&pool).await?;

    let comment = fetch_comment(&mut *tx, video_id, comment_id).await?;
    if comment.status == CommentStatus::Deleted {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }
    if comment.author_id != editor_id {
        return Err(AppError::Forbidden(
            "Only the author can edit this comment".to_string(),
        ));
    }

    sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
        .bind(&content)
        .bind(Utc::now())
        .bind(comment_id)
        .execute(&mut *tx)
        .await?;

    let updated = fetch_comment(&mut *tx, video_id, comment_id).await?;

    tx.commit().await?;

    Ok(Json(
        serde_json::json!({ "success": true, "data": updated }),
    ))
}

/// Soft-delete a comment. Permitted for its author and for the video's
/// channel owner. Deleted replies come off their parent's reply count;
/// a deleted pinned comment releases the video's pin slot.
pub async fn delete_comment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((video_id, comment_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let requester_id = claims.user_id()?;

    let mut tx = begin_write(&pool).await?;

    let comment = fetch_comment(&mut *tx, video_id, comment_id).await?;
    if comment.status == CommentStatus::Deleted {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    let owner_id = fetch_video_owner(&mut *tx, video_id).await?;
    if comment.author_id != requester_id && owner_id != requester_id {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this comment".to_string(),
        ));
    }

    sqlx::query(
        "UPDATE comments \
         SET status = 'deleted', pinned = 0, pinned_at = NULL, pinned_by = NULL \
         WHERE id = ?",
    )
    .bind(comment_id)
    .execute(&mut *tx)
    .await?;

    if let Some(parent_id) = comment.parent_id {
        recount_replies(&mut *tx, parent_id).await?;
    }

    tx.commit().await?;

    Ok(Json(serde_json::json!({ "success": true })))
}
