use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        comment::Pagination,
        notification::{MarkReadRequest, Notification, NotificationListParams},
    },
    utils::jwt::Claims,
};

/// List the caller's reply notifications, newest first.
pub async fn list_notifications(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<NotificationListParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1).saturating_mul(limit);
    let unread_only = params.unread_only.unwrap_or(false);

    let mut tx = pool.begin().await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM comment_notifications \
         WHERE user_id = ? AND (? = 0 OR is_read = 0)",
    )
    .bind(user_id)
    .bind(unread_only)
    .fetch_one(&mut *tx)
    .await?;

    let notifications: Vec<Notification> = sqlx::query_as(
        "SELECT id, user_id, comment_id, kind, is_read, created_at \
         FROM comment_notifications \
         WHERE user_id = ? AND (? = 0 OR is_read = 0) \
         ORDER BY created_at DESC, id DESC \
         LIMIT ? OFFSET ?",
    )
    .bind(user_id)
    .bind(unread_only)
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    let pagination = Pagination {
        page,
        limit,
        total,
        pages: (total + limit - 1) / limit,
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "data": {
            "notifications": notifications,
            "pagination": pagination,
        },
    })))
}

/// Mark one of the caller's notifications as read.
pub async fn mark_read(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<MarkReadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let notification: Option<Notification> = sqlx::query_as(
        "SELECT id, user_id, comment_id, kind, is_read, created_at \
         FROM comment_notifications WHERE id = ?",
    )
    .bind(payload.notification_id)
    .fetch_optional(&pool)
    .await?;

    let notification =
        notification.ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    if notification.user_id != user_id {
        return Err(AppError::Forbidden(
            "This notification does not belong to you".to_string(),
        ));
    }

    sqlx::query("UPDATE comment_notifications SET is_read = 1 WHERE id = ?")
        .bind(notification.id)
        .execute(&pool)
        .await?;

    Ok(Json(serde_json::json!({ "success": true })))
}
