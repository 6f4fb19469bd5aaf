//! Request bodies and rows used across integration tests.

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use lessondeck_backend::models::DbCard;

pub fn card(lesson_id: Uuid, author_id: Uuid, front: &str, approval: &str) -> DbCard {
    let now = Utc::now();
    DbCard {
        id: Uuid::new_v4(),
        lesson_id,
        author_id,
        front_content: front.to_string(),
        back_content: format!("answer to {front}"),
        card_type: "basic".to_string(),
        difficulty_level: "medium".to_string(),
        tags: vec!["test".to_string()],
        approval_status: approval.to_string(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

pub fn study_request(pool_type: &str, lesson_id: Option<Uuid>) -> serde_json::Value {
    json!({ "poolType": pool_type, "lessonId": lesson_id })
}

pub fn review_request(card_id: Uuid, quality: i32, review_id: Option<Uuid>) -> serde_json::Value {
    json!({
        "cardId": card_id,
        "quality": quality,
        "responseTimeMs": 1500,
        "reviewId": review_id,
    })
}

pub fn flag_request(content_type: &str, content_id: Uuid, anonymous: bool) -> serde_json::Value {
    json!({
        "contentType": content_type,
        "contentId": content_id,
        "category": "incorrect",
        "reason": "The answer is wrong",
        "evidenceText": "See chapter 3",
        "anonymous": anonymous,
    })
}
