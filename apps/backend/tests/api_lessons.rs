//! User, lesson and card authoring API tests.
//!
//! These tests require a running PostgreSQL database (DATABASE_URL).

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use common::{get_as, post_as, put_as, TestContext};
use lessondeck_backend::models::UserRole;

#[tokio::test]
#[ignore = "requires database"]
async fn test_health_check() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_and_me() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server
        .post("/api/users/register")
        .json(&json!({ "display_name": "Ada", "role": "teacher" }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let user_id: Uuid = body["user_id"].as_str().unwrap().parse().unwrap();
    ctx.track(user_id);
    let token = body["token"].as_str().unwrap().to_string();

    let response = get_as(&server, "/api/users/me", &token).await;
    response.assert_status_ok();
    let me: serde_json::Value = response.json();
    assert_eq!(me["display_name"], "Ada");
    assert_eq!(me["role"], "teacher");
    assert_eq!(me["progress"]["total_reviews"], 0);

    ctx.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_validation() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    server
        .post("/api/users/register")
        .json(&json!({ "display_name": "  " }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/api/users/register")
        .json(&json!({ "display_name": "Eve", "role": "admin" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_lesson_lifecycle() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (teacher_id, teacher_token) = ctx.create_user(UserRole::Teacher).await;
    let (_, student_token) = ctx.create_user(UserRole::Student).await;

    post_as(&server, "/api/lessons", &student_token)
        .json(&json!({ "title": "Not allowed" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = post_as(&server, "/api/lessons", &teacher_token)
        .json(&json!({ "title": "Geography", "description": "Capitals" }))
        .await;
    response.assert_status_ok();
    let lesson: serde_json::Value = response.json();
    assert_eq!(lesson["owner_id"], teacher_id.to_string());
    let lesson_id = lesson["id"].as_str().unwrap().to_string();

    let enroll_path = format!("/api/lessons/{lesson_id}/enroll");
    let first: serde_json::Value = post_as(&server, &enroll_path, &student_token).await.json();
    let second: serde_json::Value = post_as(&server, &enroll_path, &student_token).await.json();
    assert_eq!(first["newly_enrolled"], true);
    assert_eq!(second["newly_enrolled"], false);

    let listing: serde_json::Value = get_as(&server, "/api/lessons", &student_token).await.json();
    assert_eq!(listing["owned"].as_array().unwrap().len(), 0);
    assert_eq!(listing["enrolled"][0]["title"], "Geography");

    post_as(&server, &format!("/api/lessons/{}/enroll", Uuid::new_v4()), &student_token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_card_authoring_and_approval() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (teacher_id, teacher_token) = ctx.create_user(UserRole::Teacher).await;
    let (student_id, student_token) = ctx.create_user(UserRole::Student).await;
    let (_, outsider_token) = ctx.create_user(UserRole::Student).await;
    let lesson_id = ctx.create_lesson(teacher_id, "Geography").await;
    ctx.enroll(student_id, lesson_id).await;
    let cards_path = format!("/api/lessons/{lesson_id}/cards");
    let card = json!({
        "front_content": "Capital of Japan?",
        "back_content": "Tokyo",
        "difficulty_level": "easy",
        "tags": ["asia"],
    });

    let owned: serde_json::Value = post_as(&server, &cards_path, &teacher_token)
        .json(&card)
        .await
        .json();
    assert_eq!(owned["approval_status"], "approved");
    assert_eq!(owned["difficulty_level"], "easy");

    let submitted: serde_json::Value = post_as(&server, &cards_path, &student_token)
        .json(&card)
        .await
        .json();
    assert_eq!(submitted["approval_status"], "pending");

    post_as(&server, &cards_path, &outsider_token)
        .json(&card)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    post_as(&server, &cards_path, &teacher_token)
        .json(&json!({ "front_content": "", "back_content": "x" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_non_owner_edit_returns_card_to_pending() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (teacher_id, teacher_token) = ctx.create_user(UserRole::Teacher).await;
    let (student_id, student_token) = ctx.create_user(UserRole::Student).await;
    let lesson_id = ctx.create_lesson(teacher_id, "Geography").await;
    ctx.enroll(student_id, lesson_id).await;
    let card_id = ctx.create_card(lesson_id, student_id, "Capital of Peru?", "approved").await;
    let path = format!("/api/cards/{card_id}");

    let edited: serde_json::Value = put_as(&server, &path, &student_token)
        .json(&json!({ "back_content": "Lima" }))
        .await
        .json();
    assert_eq!(edited["back_content"], "Lima");
    assert_eq!(edited["approval_status"], "pending");

    // Owner edits keep whatever status the card has.
    ctx.db
        .set_approval_status(card_id, lessondeck_backend::models::ApprovalStatus::Approved)
        .await
        .unwrap();
    let edited: serde_json::Value = put_as(&server, &path, &teacher_token)
        .json(&json!({ "tags": ["south-america"] }))
        .await
        .json();
    assert_eq!(edited["approval_status"], "approved");
    assert_eq!(edited["tags"][0], "south-america");

    let (_, outsider_token) = ctx.create_user(UserRole::Student).await;
    put_as(&server, &path, &outsider_token)
        .json(&json!({ "back_content": "Cusco" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    ctx.cleanup().await;
}
