//! Lesson and card authoring endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use lessondeck_core::CoreError;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

fn required(value: &str, field: &'static str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::EmptyField { field }.into());
    }
    Ok(trimmed.to_string())
}

/// POST /api/lessons
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<Json<LessonResponse>> {
    auth.require_teacher()?;
    let title = required(&payload.title, "title")?;

    let lesson = state
        .db
        .create_lesson(auth.user_id, &title, payload.description.as_deref())
        .await?;
    tracing::info!(lesson_id = %lesson.id, owner_id = %auth.user_id, "lesson created");

    Ok(Json(lesson.to_response()))
}

/// GET /api/lessons
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<LessonListResponse>> {
    let owned = state.db.get_owned_lessons(auth.user_id).await?;
    let enrolled = state.db.get_enrolled_lessons(auth.user_id).await?;

    Ok(Json(LessonListResponse {
        owned: owned.iter().map(DbLesson::to_response).collect(),
        enrolled: enrolled.iter().map(DbLesson::to_response).collect(),
    }))
}

/// POST /api/lessons/:id/enroll
pub async fn enroll(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<EnrollResponse>> {
    let lesson = state
        .db
        .get_lesson(lesson_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    let newly_enrolled = state.db.enroll(auth.user_id, lesson.id).await?;

    Ok(Json(EnrollResponse {
        lesson_id: lesson.id,
        newly_enrolled,
    }))
}

/// POST /api/lessons/:id/cards
pub async fn create_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(lesson_id): Path<Uuid>,
    Json(payload): Json<CreateCardRequest>,
) -> Result<Json<CardResponse>> {
    let lesson = state
        .db
        .get_lesson(lesson_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    let is_owner = lesson.owner_id == auth.user_id;
    if !is_owner && !state.db.is_enrolled(auth.user_id, lesson.id).await? {
        return Err(ApiError::Forbidden(
            "Only the owner or enrolled students can add cards".to_string(),
        ));
    }

    let card_type: CardType = match payload.card_type.as_deref() {
        Some(raw) => raw.parse()?,
        None => CardType::default(),
    };
    let difficulty: DifficultyLevel = match payload.difficulty_level.as_deref() {
        Some(raw) => raw.parse()?,
        None => DifficultyLevel::default(),
    };
    let approval = if is_owner {
        ApprovalStatus::Approved
    } else {
        ApprovalStatus::Pending
    };

    let now = Utc::now();
    let card = DbCard {
        id: Uuid::new_v4(),
        lesson_id: lesson.id,
        author_id: auth.user_id,
        front_content: required(&payload.front_content, "front_content")?,
        back_content: required(&payload.back_content, "back_content")?,
        card_type: card_type.as_str().to_string(),
        difficulty_level: difficulty.as_str().to_string(),
        tags: payload.tags,
        approval_status: approval.as_str().to_string(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    let created = state.db.create_card(&card).await?;
    Ok(Json(created.to_response()))
}

/// PUT /api/cards/:id
pub async fn update_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(card_id): Path<Uuid>,
    Json(payload): Json<UpdateCardRequest>,
) -> Result<Json<CardResponse>> {
    let mut card = state
        .db
        .get_card(card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Card not found".to_string()))?;
    let lesson = state
        .db
        .get_lesson(card.lesson_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    let is_owner = lesson.owner_id == auth.user_id;
    if !is_owner && card.author_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "Only the author or lesson owner can edit this card".to_string(),
        ));
    }

    if let Some(front) = payload.front_content.as_deref() {
        card.front_content = required(front, "front_content")?;
    }
    if let Some(back) = payload.back_content.as_deref() {
        card.back_content = required(back, "back_content")?;
    }
    if let Some(raw) = payload.card_type.as_deref() {
        card.card_type = raw.parse::<CardType>()?.as_str().to_string();
    }
    if let Some(raw) = payload.difficulty_level.as_deref() {
        card.difficulty_level = raw.parse::<DifficultyLevel>()?.as_str().to_string();
    }
    if let Some(tags) = payload.tags {
        card.tags = tags;
    }

    card.approval_status = edited_approval(card.approval_status(), is_owner)
        .as_str()
        .to_string();

    let updated = state.db.update_card(&card).await?;
    Ok(Json(updated.to_response()))
}

/// Approval status after an edit: approved content edited by anyone but
/// the lesson owner goes back to review.
fn edited_approval(current: ApprovalStatus, editor_owns_lesson: bool) -> ApprovalStatus {
    match current {
        ApprovalStatus::Approved if !editor_owns_lesson => ApprovalStatus::Pending,
        other => other,
    }
}
