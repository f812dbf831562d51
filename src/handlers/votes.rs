use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        comment::CommentStatus,
        vote::{VoteCounts, VoteRequest, VoteType},
    },
    utils::jwt::Claims,
};

use super::{begin_write, fetch_comment};

/// Cast, switch, or retract a vote on a comment.
///
/// One row per (comment, user): a first vote inserts it, a different
/// type replaces it, and re-submitting the currently held type removes
/// it (toggle-off). The cached counters on the comment are recomputed
/// from the ledger inside the same transaction, and the fresh counts are
/// returned so the caller need not re-fetch.
pub async fn cast_vote(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((video_id, comment_id)): Path<(i64, i64)>,
    Json(payload): Json<VoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let mut tx = begin_write(&pool).await?;

    let comment = fetch_comment(&mut *tx, video_id, comment_id).await?;
    if comment.status == CommentStatus::Deleted {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    let existing: Option<VoteType> =
        sqlx::query_scalar("SELECT vote_type FROM comment_votes WHERE comment_id = ? AND user_id = ?")
            .bind(comment_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

    match existing {
        Some(current) if current == payload.vote_type => {
            // Toggle off
            sqlx::query("DELETE FROM comment_votes WHERE comment_id = ? AND user_id = ?")
                .bind(comment_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        Some(_) => {
            // Switch type
            sqlx::query(
                "UPDATE comment_votes SET vote_type = ? WHERE comment_id = ? AND user_id = ?",
            )
            .bind(payload.vote_type)
            .bind(comment_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }
        None => {
            sqlx::query(
                "INSERT INTO comment_votes (comment_id, user_id, vote_type, created_at) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(comment_id)
            .bind(user_id)
            .bind(payload.vote_type)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }
    }

    sqlx::query(
        "UPDATE comments SET \
            like_count = (SELECT COUNT(*) FROM comment_votes \
                          WHERE comment_id = comments.id AND vote_type = 'like'), \
            dislike_count = (SELECT COUNT(*) FROM comment_votes \
                             WHERE comment_id = comments.id AND vote_type = 'dislike') \
         WHERE id = ?",
    )
    .bind(comment_id)
    .execute(&mut *tx)
    .await?;

    let counts: VoteCounts =
        sqlx::query_as("SELECT like_count, dislike_count FROM comments WHERE id = ?")
            .bind(comment_id)
            .fetch_one(&mut *tx)
            .await?;

    tx.commit().await?;

    Ok(Json(serde_json::json!({ "success": true, "data": counts })))
}
