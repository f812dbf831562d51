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
    models::{
        comment::{Comment, CommentStatus},
        moderation::{
            BulkAction, BulkActionRequest, BulkOutcome, CreateReportRequest, SetStatusRequest,
        },
    },
    utils::jwt::Claims,
};

use super::{begin_write, fetch_comment, fetch_video_owner, recount_replies};

/// Report a comment. Any authenticated user; reports are an append-only
/// log with no dedup, recorded for later review rather than
/// auto-adjudicated.
pub async fn report_comment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((video_id, comment_id)): Path<(i64, i64)>,
    Json(payload): Json<CreateReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if payload.reason.trim().is_empty() {
        return Err(AppError::Validation(
            "Report reason is required".to_string(),
        ));
    }

    let reporter_id = claims.user_id()?;

    let comment = fetch_comment(&pool, video_id, comment_id).await?;
    if comment.status == CommentStatus::Deleted {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    let report_id: i64 = sqlx::query_scalar(
        "INSERT INTO comment_reports (comment_id, reporter_id, reason, description, created_at) \
         VALUES (?, ?, ?, ?, ?) \
         RETURNING id",
    )
    .bind(comment_id)
    .bind(reporter_id)
    .bind(payload.reason.trim())
    .bind(&payload.description)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "data": { "id": report_id } })),
    ))
}

/// Hide or un-hide a comment. Channel-owner only; `deleted` is terminal
/// and not reachable from here (a deleted comment reads as absent).
pub async fn set_status(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((video_id, comment_id)): Path<(i64, i64)>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let requester_id = claims.user_id()?;

    let mut tx = begin_write(&pool).await?;

    let owner_id = fetch_video_owner(&mut *tx, video_id).await?;
    if owner_id != requester_id {
        return Err(AppError::Forbidden(
            "Only the channel owner can moderate comments".to_string(),
        ));
    }

    let comment = fetch_comment(&mut *tx, video_id, comment_id).await?;
    if comment.status == CommentStatus::Deleted {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    let status: CommentStatus = payload.status.into();
    sqlx::query("UPDATE comments SET status = ? WHERE id = ?")
        .bind(status)
        .bind(comment_id)
        .execute(&mut *tx)
        .await?;

    // Hidden replies stop counting toward the parent's reply_count.
    if let Some(parent_id) = comment.parent_id {
        recount_replies(&mut *tx, parent_id).await?;
    }

    let updated = fetch_comment(&mut *tx, video_id, comment_id).await?;

    tx.commit().await?;

    Ok(Json(
        serde_json::json!({ "success": true, "data": updated }),
    ))
}

/// Apply one moderation action to a batch of comments.
///
/// Each id runs in its own transaction and reports its own outcome;
/// one invalid id never aborts the rest of the batch.
pub async fn bulk_action(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BulkActionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.comment_ids.is_empty() {
        return Err(AppError::Validation(
            "commentIds must not be empty".to_string(),
        ));
    }

    let requester_id = claims.user_id()?;

    let mut results = Vec::with_capacity(payload.comment_ids.len());
    for comment_id in payload.comment_ids {
        let outcome = apply_action(&pool, comment_id, payload.action, requester_id).await;
        results.push(match outcome {
            Ok(()) => BulkOutcome {
                id: comment_id,
                success: true,
                error: None,
            },
            Err(e) => BulkOutcome {
                id: comment_id,
                success: false,
                error: Some(e.to_string()),
            },
        });
    }

    Ok(Json(
        serde_json::json!({ "success": true, "data": { "results": results } }),
    ))
}

/// One bulk item: ownership is checked against the comment's own video,
/// so a batch may legitimately span videos of the same channel owner.
async fn apply_action(
    pool: &SqlitePool,
    comment_id: i64,
    action: BulkAction,
    requester_id: i64,
) -> Result<(), AppError> {
    let mut tx = begin_write(&pool).await?;

    let comment = fetch_comment_any_video(&mut tx, comment_id).await?;
    if comment.status == CommentStatus::Deleted {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    let owner_id = fetch_video_owner(&mut *tx, comment.video_id).await?;
    if owner_id != requester_id {
        return Err(AppError::Forbidden(
            "You do not own this comment's video".to_string(),
        ));
    }

    match action {
        BulkAction::Hide => {
            sqlx::query("UPDATE comments SET status = 'hidden' WHERE id = ?")
                .bind(comment_id)
                .execute(&mut *tx)
                .await?;
        }
        BulkAction::Delete => {
            sqlx::query(
                "UPDATE comments \
                 SET status = 'deleted', pinned = 0, pinned_at = NULL, pinned_by = NULL \
                 WHERE id = ?",
            )
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    if let Some(parent_id) = comment.parent_id {
        recount_replies(&mut *tx, parent_id).await?;
    }

    tx.commit().await?;
    Ok(())
}

async fn fetch_comment_any_video(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    comment_id: i64,
) -> Result<Comment, AppError> {
    let sql = format!(
        "SELECT {} FROM comments WHERE id = ?",
        super::COMMENT_COLUMNS
    );
    let comment: Option<Comment> = sqlx::query_as(&sql)
        .bind(comment_id)
        .fetch_optional(&mut **tx)
        .await?;

    comment.ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
}
