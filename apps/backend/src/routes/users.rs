//! User registration and profile endpoints

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use lessondeck_core::CoreError;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// POST /api/users/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<RegisterUserResponse>> {
    let display_name = payload.display_name.trim();
    if display_name.is_empty() {
        return Err(CoreError::EmptyField { field: "display_name" }.into());
    }
    let role: UserRole = match payload.role.as_deref() {
        Some(raw) => raw.parse()?,
        None => UserRole::default(),
    };

    let user = state.db.create_user(display_name, role).await?;
    tracing::info!(user_id = %user.id, role = role.as_str(), "registered user");

    Ok(Json(RegisterUserResponse {
        user_id: user.id,
        token: user.token,
    }))
}

/// GET /api/users/me
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<MeResponse>> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let progress = state.db.get_progress(auth.user_id).await?.to_core();

    Ok(Json(MeResponse {
        user_id: user.id,
        display_name: user.display_name.clone(),
        role: user.role(),
        progress: ProgressResponse {
            total_reviews: progress.total_reviews,
            current_streak: progress.streak_as_of(Utc::now().date_naive()),
            longest_streak: progress.longest_streak,
            last_study_date: progress.last_study_date,
        },
    }))
}
