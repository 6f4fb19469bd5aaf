//! Review recording.
//!
//! One transaction per review: lock the user's scheduling state row, append
//! the review, write the new state and bump progress counters. A client
//! supplied review id makes the call idempotent.

use chrono::{DateTime, Utc};
use lessondeck_core::{CoreError, Quality, SchedulingState, Sm2, SpacedRepetitionAlgorithm};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::db::{reviews, Database};
use crate::error::{ApiError, Result};
use crate::models::{DbProgress, DbReview, DbSchedulingState, RecordReviewRequest};

/// A validated review submission
#[derive(Debug, Clone)]
pub struct ReviewSubmission {
    pub user_id: Uuid,
    pub card_id: Uuid,
    pub quality: Quality,
    pub response_time_ms: i64,
    pub review_id: Uuid,
}

impl ReviewSubmission {
    pub fn from_request(user_id: Uuid, request: &RecordReviewRequest) -> Result<Self> {
        let quality = Quality::new(request.quality)?;
        if request.response_time_ms < 0 {
            return Err(CoreError::NegativeResponseTime(request.response_time_ms).into());
        }

        Ok(Self {
            user_id,
            card_id: request.card_id,
            quality,
            response_time_ms: request.response_time_ms,
            review_id: request.review_id.unwrap_or_else(Uuid::new_v4),
        })
    }

    /// Hash of the inputs a replay must repeat
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.user_id.as_bytes());
        hasher.update(self.card_id.as_bytes());
        hasher.update([self.quality.value()]);
        hasher.update(self.response_time_ms.to_be_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Resolve a stored review against a replayed submission
fn replay(existing: &DbReview, fingerprint: &str) -> Result<SchedulingState> {
    if existing.fingerprint == fingerprint {
        Ok(existing.state_after())
    } else {
        tracing::warn!(review_id = %existing.id, "review id reused with different inputs");
        Err(ApiError::Conflict(format!(
            "Review {} was already recorded with different inputs",
            existing.id
        )))
    }
}

/// Record a review and return the resulting scheduling state
pub async fn record_review(
    db: &Database,
    algorithm: &Sm2,
    submission: &ReviewSubmission,
    now: DateTime<Utc>,
) -> Result<SchedulingState> {
    let card = db
        .get_card(submission.card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Card {} not found", submission.card_id)))?;

    if !db.is_enrolled(submission.user_id, card.lesson_id).await? {
        return Err(ApiError::NotFound(format!("Card {} not found", submission.card_id)));
    }

    let fingerprint = submission.fingerprint();
    let mut tx = db.begin().await?;

    let initial = algorithm.initial_state();
    reviews::ensure_state_row(&mut tx, submission.user_id, card.id, &initial).await?;
    let locked = reviews::lock_state(&mut tx, submission.user_id, card.id).await?;

    // Checked after taking the lock so a committed duplicate is visible.
    if let Some(existing) = reviews::find_review(&mut tx, submission.review_id).await? {
        tx.rollback().await?;
        return replay(&existing, &fingerprint);
    }

    let before = locked.to_core_state();
    let result = algorithm.schedule(&before, submission.quality, now);

    let review = DbReview {
        id: submission.review_id,
        user_id: submission.user_id,
        card_id: card.id,
        quality: i32::from(submission.quality),
        response_time_ms: submission.response_time_ms,
        reviewed_at: now,
        fingerprint: fingerprint.clone(),
        interval_before: before.interval_days,
        ease_before: before.ease_factor,
        repetitions_before: before.repetitions as i32,
        status_after: result.new_state.status.as_str().to_string(),
        interval_after: result.new_state.interval_days,
        ease_after: result.new_state.ease_factor,
        repetitions_after: result.new_state.repetitions as i32,
        lapses_after: result.new_state.lapses as i32,
        due_after: result.next_due,
        created_at: now,
    };

    if !reviews::insert_review(&mut tx, &review).await? {
        // Lost a race on the review id to a request for another row.
        tx.rollback().await?;
        let mut conn = db.pool().acquire().await?;
        let existing = reviews::find_review(&mut conn, submission.review_id)
            .await?
            .ok_or_else(|| {
                ApiError::Transient("Concurrent review insert not yet visible".to_string())
            })?;
        return replay(&existing, &fingerprint);
    }

    let mut state_row =
        DbSchedulingState::from_core_state(submission.user_id, card.id, &result.new_state);
    state_row.created_at = locked.created_at;
    reviews::upsert_state(&mut tx, &state_row).await?;

    let progress = reviews::lock_progress(&mut tx, submission.user_id).await?;
    let updated = progress.to_core().record_review(now.date_naive());
    reviews::save_progress(&mut tx, &DbProgress::from_core(submission.user_id, &updated)).await?;

    tx.commit().await?;

    tracing::debug!(
        user_id = %submission.user_id,
        card_id = %card.id,
        quality = %submission.quality,
        interval = result.new_state.interval_days,
        "recorded review"
    );

    Ok(result.new_state)
}
