// src/handlers/mod.rs

pub mod comments;
pub mod moderation;
pub mod notifications;
pub mod pins;
pub mod thread;
pub mod votes;

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{error::AppError, models::comment::Comment};

/// How many times a writer re-attempts taking the write lock before the
/// conflict is surfaced to the caller.
const WRITE_ATTEMPTS: u32 = 3;

/// Opens a write transaction with the write lock taken up front.
///
/// A deferred transaction that reads before writing fails with
/// SQLITE_BUSY_SNAPSHOT on the read-to-write upgrade under concurrent
/// writers, and the connection's busy timeout does not cover that
/// upgrade. BEGIN IMMEDIATE makes contending writers queue on the busy
/// timeout instead; a begin that still comes back busy is re-attempted
/// a bounded number of times.
pub(crate) async fn begin_write(
    pool: &SqlitePool,
) -> Result<Transaction<'static, Sqlite>, AppError> {
    let mut attempt = 0;
    loop {
        match pool.begin_with("BEGIN IMMEDIATE").await {
            Ok(tx) => return Ok(tx),
            Err(e) if attempt < WRITE_ATTEMPTS && is_busy(&e) => {
                attempt += 1;
                tracing::warn!("write lock busy, retrying (attempt {attempt}): {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended
/// codes.
fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some("5" | "6" | "261" | "262" | "517"))
        }
        _ => false,
    }
}

/// Column list shared by every comment-row query.
pub(crate) const COMMENT_COLUMNS: &str = "id, video_id, author_id, author_name, parent_id, \
     content, status, like_count, dislike_count, reply_count, pinned, pinned_at, pinned_by, \
     created_at, updated_at";

/// Resolves the channel owner of a video.
pub(crate) async fn fetch_video_owner<'e, E>(executor: E, video_id: i64) -> Result<i64, AppError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let owner: Option<i64> = sqlx::query_scalar("SELECT channel_owner_id FROM videos WHERE id = ?")
        .bind(video_id)
        .fetch_optional(executor)
        .await?;

    owner.ok_or_else(|| AppError::NotFound("Video not found".to_string()))
}

/// Fetches a comment scoped to its video. A comment id that exists under
/// a different video is treated as absent.
pub(crate) async fn fetch_comment<'e, E>(
    executor: E,
    video_id: i64,
    comment_id: i64,
) -> Result<Comment, AppError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ? AND video_id = ?");
    let comment: Option<Comment> = sqlx::query_as(&sql)
        .bind(comment_id)
        .bind(video_id)
        .fetch_optional(executor)
        .await?;

    comment.ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
}

/// Recomputes a parent's cached `reply_count` from its ACTIVE children.
/// Must run inside the same transaction as the mutation that changed the
/// children.
pub(crate) async fn recount_replies<'e, E>(executor: E, parent_id: i64) -> Result<(), AppError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "UPDATE comments \
         SET reply_count = (SELECT COUNT(*) FROM comments AS r \
                            WHERE r.parent_id = comments.id AND r.status = 'active') \
         WHERE id = ?",
    )
    .bind(parent_id)
    .execute(executor)
    .await?;

    Ok(())
}
