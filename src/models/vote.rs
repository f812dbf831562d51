use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The two vote kinds a user can hold on a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum VoteType {
    Like,
    Dislike,
}

/// DTO for casting a vote.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    #[serde(rename = "type")]
    pub vote_type: VoteType,
}

/// Fresh aggregate counts returned from every vote mutation so the
/// caller need not re-fetch the comment.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCounts {
    pub like_count: i64,
    pub dislike_count: i64,
}
