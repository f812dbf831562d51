use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::comment::CommentStatus,
    utils::jwt::Claims,
};

use super::{begin_write, fetch_comment, fetch_video_owner};

/// Pin a top-level comment to its video. Channel-owner only.
///
/// Clear-then-set in a single transaction: every other pinned comment of
/// the video is unpinned before the target is set, which is what keeps
/// at most one comment pinned per video under concurrent pin requests
/// (the loser of a race is fully superseded, never merged).
pub async fn pin_comment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((video_id, comment_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let requester_id = claims.user_id()?;

    let mut tx = begin_write(&pool).await?;

    let owner_id = fetch_video_owner(&mut *tx, video_id).await?;
    if owner_id != requester_id {
        return Err(AppError::Forbidden(
            "Only the channel owner can pin comments".to_string(),
        ));
    }

    let comment = fetch_comment(&mut *tx, video_id, comment_id).await?;
    if comment.parent_id.is_some() {
        return Err(AppError::InvalidTarget(
            "Replies cannot be pinned".to_string(),
        ));
    }
    if comment.status != CommentStatus::Active {
        return Err(AppError::InvalidTarget(
            "Only active comments can be pinned".to_string(),
        ));
    }

    sqlx::query(
        "UPDATE comments SET pinned = 0, pinned_at = NULL, pinned_by = NULL \
         WHERE video_id = ? AND pinned = 1",
    )
    .bind(video_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE comments SET pinned = 1, pinned_at = ?, pinned_by = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(requester_id)
        .bind(comment_id)
        .execute(&mut *tx)
        .await?;

    let pinned = fetch_comment(&mut *tx, video_id, comment_id).await?;

    tx.commit().await?;

    Ok(Json(serde_json::json!({ "success": true, "data": pinned })))
}

/// Unpin a comment. Channel-owner only; clears the pin only if the
/// target currently holds it, otherwise a no-op success.
pub async fn unpin_comment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((video_id, comment_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let requester_id = claims.user_id()?;

    let owner_id = fetch_video_owner(&pool, video_id).await?;
    if owner_id != requester_id {
        return Err(AppError::Forbidden(
            "Only the channel owner can unpin comments".to_string(),
        ));
    }

    sqlx::query(
        "UPDATE comments SET pinned = 0, pinned_at = NULL, pinned_by = NULL \
         WHERE id = ? AND video_id = ? AND pinned = 1",
    )
    .bind(comment_id)
    .bind(video_id)
    .execute(&pool)
    .await?;

    Ok(Json(serde_json::json!({ "success": true })))
}
