//! Content moderation endpoints

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

/// POST /rpc/flag_content
pub async fn flag_content(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<FlagContentRequest>,
) -> Result<Json<FlagContentResponse>> {
    let content_type: ContentType = payload.content_type.parse()?;
    let category: FlagCategory = payload.category.parse()?;
    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err(CoreError::EmptyField { field: "reason" }.into());
    }

    if !state.db.content_exists(content_type, payload.content_id).await? {
        return Err(ApiError::NotFound(format!(
            "{} {} not found",
            content_type.as_str(),
            payload.content_id
        )));
    }

    let flag = DbContentFlag {
        id: Uuid::new_v4(),
        content_type: content_type.as_str().to_string(),
        content_id: payload.content_id,
        category: category.as_str().to_string(),
        reason: reason.to_string(),
        evidence_text: payload.evidence_text.filter(|t| !t.trim().is_empty()),
        reporter_id: (!payload.anonymous).then_some(auth.user_id),
        anonymous: payload.anonymous,
        status: "open".to_string(),
        created_at: Utc::now(),
    };
    state.db.insert_flag(&flag).await?;

    tracing::info!(
        flag_id = %flag.id,
        content_type = content_type.as_str(),
        content_id = %flag.content_id,
        category = category.as_str(),
        "content flagged"
    );

    Ok(Json(FlagContentResponse {
        success: true,
        flag_id: flag.id,
    }))
}

/// POST /api/cards/:id/moderate
pub async fn moderate_card(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(card_id): Path<Uuid>,
    Json(payload): Json<ModerateCardRequest>,
) -> Result<Json<CardResponse>> {
    let status: ApprovalStatus = payload.status.parse()?;

    let card = state
        .db
        .get_card(card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Card not found".to_string()))?;

    if auth.role != UserRole::Moderator {
        let lesson = state
            .db
            .get_lesson(card.lesson_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;
        if lesson.owner_id != auth.user_id {
            return Err(ApiError::Forbidden(
                "Only the lesson owner or a moderator can moderate cards".to_string(),
            ));
        }
    }

    let updated = state.db.set_approval_status(card.id, status).await?;
    tracing::info!(card_id = %card.id, status = status.as_str(), "card moderated");

    Ok(Json(updated.to_response()))
}
