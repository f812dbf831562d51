// tests/notifications_api.rs

use comment_engine::{config::Config, routes, state::AppState, utils::jwt::sign_jwt};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

struct TestApp {
    address: String,
    pool: SqlitePool,
    jwt_secret: String,
}

async fn spawn_app() -> TestApp {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        rust_log: "error".to_string(),
        port: 0,
    };

    let jwt_secret = config.jwt_secret.clone();
    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        jwt_secret,
    }
}

impl TestApp {
    fn token(&self, user_id: i64, name: &str) -> String {
        sign_jwt(user_id, name, &self.jwt_secret, 600).expect("Failed to sign token")
    }

    async fn seed_video(&self, owner_id: i64) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO videos (channel_owner_id, title, created_at) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(owner_id)
        .bind("Test video")
        .bind(chrono::Utc::now())
        .fetch_one(&self.pool)
        .await
        .expect("Failed to seed video")
    }
}

async fn create_comment(
    client: &reqwest::Client,
    app: &TestApp,
    video_id: i64,
    token: &str,
    content: &str,
    parent_id: Option<i64>,
) -> i64 {
    let mut body = serde_json::json!({ "content": content });
    if let Some(pid) = parent_id {
        body["parentId"] = serde_json::json!(pid);
    }
    let response = client
        .post(format!("{}/videos/{}/comments", app.address, video_id))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap()
}

async fn list_notifications(
    client: &reqwest::Client,
    app: &TestApp,
    token: &str,
    query: &str,
) -> serde_json::Value {
    let response = client
        .get(format!("{}/notifications/comments{}", app.address, query))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    body["data"].clone()
}

#[tokio::test]
async fn notifications_require_auth() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/notifications/comments", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn self_reply_produces_no_notification() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let video_id = app.seed_video(1).await;
    let u1 = app.token(10, "u1");

    let c1 = create_comment(&client, &app, video_id, &u1, "talking", None).await;
    create_comment(&client, &app, video_id, &u1, "to myself", Some(c1)).await;

    let data = list_notifications(&client, &app, &u1, "").await;
    assert_eq!(data["pagination"]["total"], 0);
}

#[tokio::test]
async fn unread_only_filter_and_mark_read() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let video_id = app.seed_video(1).await;
    let u1 = app.token(10, "u1");
    let u2 = app.token(20, "u2");

    let c1 = create_comment(&client, &app, video_id, &u1, "top", None).await;
    create_comment(&client, &app, video_id, &u2, "first reply", Some(c1)).await;
    create_comment(&client, &app, video_id, &u2, "second reply", Some(c1)).await;

    let data = list_notifications(&client, &app, &u1, "").await;
    assert_eq!(data["pagination"]["total"], 2);
    let first_id = data["notifications"][0]["id"].as_i64().unwrap();

    let response = client
        .put(format!("{}/notifications/comments", app.address))
        .bearer_auth(&u1)
        .json(&serde_json::json!({ "notificationId": first_id }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let data = list_notifications(&client, &app, &u1, "?unreadOnly=true").await;
    assert_eq!(data["pagination"]["total"], 1);
    assert_ne!(data["notifications"][0]["id"], first_id);

    // Full list still shows both
    let data = list_notifications(&client, &app, &u1, "").await;
    assert_eq!(data["pagination"]["total"], 2);
}

#[tokio::test]
async fn mark_read_enforces_ownership() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let video_id = app.seed_video(1).await;
    let u1 = app.token(10, "u1");
    let u2 = app.token(20, "u2");
    let u3 = app.token(30, "u3");

    let c1 = create_comment(&client, &app, video_id, &u1, "top", None).await;
    create_comment(&client, &app, video_id, &u2, "reply", Some(c1)).await;

    let data = list_notifications(&client, &app, &u1, "").await;
    let notification_id = data["notifications"][0]["id"].as_i64().unwrap();

    // Someone else's notification
    let response = client
        .put(format!("{}/notifications/comments", app.address))
        .bearer_auth(&u3)
        .json(&serde_json::json!({ "notificationId": notification_id }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 403);

    // Unknown id
    let response = client
        .put(format!("{}/notifications/comments", app.address))
        .bearer_auth(&u1)
        .json(&serde_json::json!({ "notificationId": 999999 }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn notifications_paginate_newest_first() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let video_id = app.seed_video(1).await;
    let u1 = app.token(10, "u1");
    let u2 = app.token(20, "u2");

    let c1 = create_comment(&client, &app, video_id, &u1, "top", None).await;
    let mut reply_ids = Vec::new();
    for i in 0..3 {
        let id = create_comment(
            &client,
            &app,
            video_id,
            &u2,
            &format!("reply {}", i),
            Some(c1),
        )
        .await;
        reply_ids.push(id);
    }

    let data = list_notifications(&client, &app, &u1, "?page=1&limit=2").await;
    assert_eq!(data["pagination"]["total"], 3);
    assert_eq!(data["pagination"]["pages"], 2);
    let page = data["notifications"].as_array().unwrap();
    assert_eq!(page.len(), 2);
    // Newest reply first
    assert_eq!(page[0]["commentId"], reply_ids[2]);

    let data = list_notifications(&client, &app, &u1, "?page=2&limit=2").await;
    assert_eq!(data["notifications"].as_array().unwrap().len(), 1);
    assert_eq!(data["notifications"][0]["commentId"], reply_ids[0]);
}

#[tokio::test]
async fn notification_page_number_at_i64_max_is_just_empty() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let video_id = app.seed_video(1).await;
    let u1 = app.token(10, "u1");
    let u2 = app.token(20, "u2");

    let c1 = create_comment(&client, &app, video_id, &u1, "top", None).await;
    create_comment(&client, &app, video_id, &u2, "reply", Some(c1)).await;

    let data =
        list_notifications(&client, &app, &u1, "?page=9223372036854775807&limit=100").await;
    assert_eq!(data["notifications"].as_array().unwrap().len(), 0);
    assert_eq!(data["pagination"]["total"], 1);
}

#[tokio::test]
async fn rapid_replies_each_notify() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let video_id = app.seed_video(1).await;
    let u1 = app.token(10, "u1");
    let u2 = app.token(20, "u2");

    let c1 = create_comment(&client, &app, video_id, &u1, "top", None).await;
    create_comment(&client, &app, video_id, &u2, "same text", Some(c1)).await;
    create_comment(&client, &app, video_id, &u2, "same text", Some(c1)).await;

    // No dedup window: both replies produce a notification
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM comment_notifications WHERE user_id = 10")
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(count, 2);
}
