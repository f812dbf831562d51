use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::AppError,
    models::comment::{Comment, CommentListParams, CommentSort, Pagination, ThreadComment},
    utils::jwt::OptionalClaims,
};

use super::{COMMENT_COLUMNS, fetch_video_owner};

/// List a video's comment thread.
///
/// A page of top-level comments with all of their ACTIVE replies
/// attached. Anonymous viewers and non-owners see ACTIVE top-level
/// comments; the channel owner additionally sees HIDDEN ones. The pinned
/// comment (if any) always sorts first regardless of the requested
/// order. Pagination counts and page rows come from the same read
/// transaction so totals never drift from the contents.
pub async fn list_comments(
    State(pool): State<SqlitePool>,
    OptionalClaims(claims): OptionalClaims,
    Path(video_id): Path<i64>,
    Query(params): Query<CommentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100); // Default 20, max 100
    // Saturate: an absurd page number yields an empty page, not overflow.
    let offset = (page - 1).saturating_mul(limit);
    let sort = params.sort.unwrap_or_default();

    let mut tx = pool.begin().await?;

    let owner_id = fetch_video_owner(&mut *tx, video_id).await?;
    let viewer_id = claims.as_ref().and_then(|c| c.user_id().ok());
    let is_owner = viewer_id == Some(owner_id);

    let visibility = "(status = 'active' OR (? AND status = 'hidden'))";

    let count_sql = format!(
        "SELECT COUNT(*) FROM comments WHERE video_id = ? AND parent_id IS NULL AND {visibility}"
    );
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(video_id)
        .bind(is_owner)
        .fetch_one(&mut *tx)
        .await?;

    let order = match sort {
        CommentSort::Newest => "created_at DESC",
        CommentSort::Oldest => "created_at ASC",
        CommentSort::Top => "(like_count - dislike_count) DESC, created_at DESC",
    };

    let page_sql = format!(
        "SELECT {COMMENT_COLUMNS} FROM comments \
         WHERE video_id = ? AND parent_id IS NULL AND {visibility} \
         ORDER BY pinned DESC, {order} \
         LIMIT ? OFFSET ?"
    );
    let parents: Vec<Comment> = sqlx::query_as(&page_sql)
        .bind(video_id)
        .bind(is_owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *tx)
        .await?;

    // Batch-fetch all replies for the page's parents, oldest first.
    let mut replies_by_parent: HashMap<i64, Vec<Comment>> = HashMap::new();
    if !parents.is_empty() {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE status = 'active' AND parent_id IN ("
        ));
        let mut separated = builder.separated(", ");
        for parent in &parents {
            separated.push_bind(parent.id);
        }
        builder.push(") ORDER BY created_at ASC");

        let replies: Vec<Comment> = builder.build_query_as().fetch_all(&mut *tx).await?;
        for reply in replies {
            if let Some(parent_id) = reply.parent_id {
                replies_by_parent.entry(parent_id).or_default().push(reply);
            }
        }
    }

    tx.commit().await?;

    let comments: Vec<ThreadComment> = parents
        .into_iter()
        .map(|comment| {
            let replies = replies_by_parent.remove(&comment.id).unwrap_or_default();
            ThreadComment { comment, replies }
        })
        .collect();

    let pagination = Pagination {
        page,
        limit,
        total,
        pages: (total + limit - 1) / limit,
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "data": {
            "comments": comments,
            "pagination": pagination,
        },
    })))
}
