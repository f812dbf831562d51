use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'comment_notifications' table in the database.
///
/// Owned by the recipient; the only mutation is mark-as-read.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    /// Recipient user id.
    pub user_id: i64,
    /// The reply that triggered the notification.
    pub comment_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "read")]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing a user's notifications.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub unread_only: Option<bool>,
}

/// DTO for marking a notification as read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub notification_id: i64,
}
