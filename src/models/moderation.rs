use serde::{Deserialize, Serialize};
use validator::Validate;

use super::comment::CommentStatus;

/// DTO for reporting a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    #[validate(length(min = 1, max = 200, message = "Report reason is required"))]
    pub reason: String,

    #[validate(length(max = 1000, message = "Report description is too long"))]
    pub description: Option<String>,
}

/// Target state for the owner-only hide/unhide transition. `deleted` is
/// deliberately not representable here; deletion goes through the delete
/// endpoint and is terminal.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeratedStatus {
    Active,
    Hidden,
}

impl From<ModeratedStatus> for CommentStatus {
    fn from(status: ModeratedStatus) -> Self {
        match status {
            ModeratedStatus::Active => CommentStatus::Active,
            ModeratedStatus::Hidden => CommentStatus::Hidden,
        }
    }
}

/// DTO for the hide/unhide transition.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: ModeratedStatus,
}

/// Bulk moderation verbs.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Hide,
    Delete,
}

/// DTO for applying one action to a batch of comments.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkActionRequest {
    pub comment_ids: Vec<i64>,
    pub action: BulkAction,
}

/// Per-item outcome of a bulk action; one invalid id never fails the
/// whole batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub id: i64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
