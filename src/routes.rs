// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{comments, moderation, notifications, pins, thread, votes},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Thread listing is public (owner sees more via optional auth).
/// * Every mutating route sits behind the bearer-token middleware.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: [axum::http::HeaderValue; 2] = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let public_routes =
        Router::new().route("/videos/{video_id}/comments", get(thread::list_comments));

    let protected_routes = Router::new()
        .route(
            "/videos/{video_id}/comments",
            post(comments::create_comment),
        )
        .route(
            "/videos/{video_id}/comments/{id}",
            put(comments::edit_comment)
                .delete(comments::delete_comment)
                .post(votes::cast_vote),
        )
        .route(
            "/videos/{video_id}/comments/{id}/pin",
            post(pins::pin_comment).delete(pins::unpin_comment),
        )
        .route(
            "/videos/{video_id}/comments/{id}/status",
            put(moderation::set_status),
        )
        .route(
            "/videos/{video_id}/comments/{id}/report",
            post(moderation::report_comment),
        )
        .route("/moderation/comments/bulk", post(moderation::bulk_action))
        .route(
            "/notifications/comments",
            get(notifications::list_notifications).put(notifications::mark_read),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
