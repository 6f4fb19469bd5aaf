//! Study RPC endpoints

use axum::{extract::State, Extension, Json};
use chrono::Utc;

use crate::error::Result;
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::services::recorder::{self, ReviewSubmission};
use crate::services::study;
use crate::AppState;

/// POST /rpc/get_cards_for_study
pub async fn get_cards_for_study(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<GetCardsForStudyRequest>,
) -> Result<Json<Vec<StudyCardResponse>>> {
    let batch = study::build_study_batch(
        &state.db,
        &state.config.study,
        auth.user_id,
        &payload,
        Utc::now(),
    )
    .await?;

    Ok(Json(batch.into_iter().map(StudyCardResponse::from).collect()))
}

/// POST /rpc/record_sr_review
pub async fn record_sr_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<RecordReviewRequest>,
) -> Result<Json<RecordReviewResponse>> {
    let submission = ReviewSubmission::from_request(auth.user_id, &payload)?;
    let updated_state =
        recorder::record_review(&state.db, &state.config.sm2, &submission, Utc::now()).await?;

    Ok(Json(RecordReviewResponse {
        success: true,
        updated_state,
    }))
}
