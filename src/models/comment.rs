use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Moderation lifecycle of a comment.
///
/// `Active ⇄ Hidden` is moderator-reversible; `Deleted` is terminal and
/// reachable from either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CommentStatus {
    Active,
    Hidden,
    Deleted,
}

/// Represents the 'comments' table in the database.
///
/// A row is either a top-level comment (`parent_id` NULL) or a reply to
/// one; replies never nest further. The `*_count` columns are cached
/// aggregates over the vote ledger / active children, recomputed inside
/// the same transaction as any mutation that changes them.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub video_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub parent_id: Option<i64>,
    pub content: String,
    pub status: CommentStatus,
    pub like_count: i64,
    pub dislike_count: i64,
    pub reply_count: i64,
    pub pinned: bool,
    pub pinned_at: Option<DateTime<Utc>>,
    pub pinned_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new comment or reply.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Comment must be between 1 and 1000 characters"
    ))]
    pub content: String,

    /// Optional: the ID of the top-level comment being replied to.
    pub parent_id: Option<i64>,
}

/// DTO for editing a comment's content.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Comment must be between 1 and 1000 characters"
    ))]
    pub content: String,
}

/// Sort orders for the thread listing. The pinned comment is always
/// surfaced first regardless of the chosen order.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentSort {
    #[default]
    Newest,
    Oldest,
    Top,
}

/// Query parameters for listing a video's comment thread.
#[derive(Debug, Deserialize)]
pub struct CommentListParams {
    /// 1-based page over top-level comments.
    pub page: Option<i64>,

    /// Number of top-level comments per page (default: 20, max: 100).
    pub limit: Option<i64>,

    pub sort: Option<CommentSort>,
}

/// A top-level comment with all of its active replies attached.
/// Replies are not separately paginated.
#[derive(Debug, Serialize)]
pub struct ThreadComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

/// Pagination metadata computed from the same query generation as the
/// page contents.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}
