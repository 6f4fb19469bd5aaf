//! Teacher dashboard RPC endpoints

use axum::{extract::State, Extension, Json};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

const RECENT_ACTIVITY_LIMIT: i64 = 20;

/// POST /rpc/get_teacher_stats
pub async fn get_teacher_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<TeacherStatsResponse>> {
    auth.require_teacher()?;

    let counts = state.db.get_teacher_counts(auth.user_id).await?;
    let recent_activity = state
        .db
        .get_recent_activity(auth.user_id, RECENT_ACTIVITY_LIMIT)
        .await?;

    Ok(Json(TeacherStatsResponse {
        total_lessons: counts.total_lessons,
        total_students: counts.total_students,
        total_cards_created: counts.total_cards_created,
        pending_cards: counts.pending_cards,
        recent_activity,
    }))
}

/// POST /rpc/get_teacher_lessons
pub async fn get_teacher_lessons(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<LessonWithStats>>> {
    auth.require_teacher()?;

    let lessons = state.db.get_teacher_lessons(auth.user_id).await?;
    Ok(Json(lessons))
}

/// POST /rpc/delete_lesson
///
/// Ownership and existence failures are reported in the body, not as HTTP
/// errors; storage failures still propagate.
pub async fn delete_lesson(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<DeleteLessonRequest>,
) -> Result<Json<DeleteLessonResponse>> {
    match soft_delete_owned_lesson(&state, &auth, &payload).await {
        Ok(()) => {
            tracing::info!(
                lesson_id = %payload.lesson_id,
                user_id = %auth.user_id,
                "lesson deleted"
            );
            Ok(Json(DeleteLessonResponse::deleted()))
        }
        Err(ApiError::NotFound(msg) | ApiError::Forbidden(msg)) => {
            Ok(Json(DeleteLessonResponse::failed(msg)))
        }
        Err(e) => Err(e),
    }
}

async fn soft_delete_owned_lesson(
    state: &AppState,
    auth: &AuthenticatedUser,
    payload: &DeleteLessonRequest,
) -> Result<()> {
    let lesson = state
        .db
        .get_lesson(payload.lesson_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    if lesson.owner_id != auth.user_id {
        return Err(ApiError::Forbidden("Only the lesson owner can delete it".to_string()));
    }

    if !state.db.soft_delete_lesson(lesson.id).await? {
        return Err(ApiError::NotFound("Lesson not found".to_string()));
    }

    Ok(())
}
