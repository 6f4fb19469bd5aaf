//! Study batch assembly: fetches candidates from the database and hands them
//! to the core selector.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use lessondeck_core::{
    select_study_batch, shuffle_seed, BatchRequest, Candidates, NewCardOrder, StudyCard,
};
use uuid::Uuid;

use crate::config::StudyConfig;
use crate::db::Database;
use crate::error::{ApiError, Result};
use crate::models::{CandidateRow, GetCardsForStudyRequest};

/// How many new candidates to pull per slot when shuffling, so the shuffle
/// draws from more than the oldest `limit_new` cards.
const SHUFFLE_POOL_FACTOR: usize = 5;

/// Effective (new, due) limits after defaults and clamping
pub fn resolve_limits(
    request: &GetCardsForStudyRequest,
    config: &StudyConfig,
) -> Result<(usize, usize)> {
    let limit = |value: Option<i64>, default: usize, name: &str| -> Result<usize> {
        match value {
            Some(v) if v < 0 => Err(ApiError::Validation(format!("{name} must not be negative"))),
            Some(v) => Ok((v as usize).min(config.max_batch_size)),
            None => Ok(default.min(config.max_batch_size)),
        }
    };

    Ok((
        limit(request.limit_new, config.default_new_limit, "limitNew")?,
        limit(request.limit_due, config.default_due_limit, "limitDue")?,
    ))
}

/// Build the study batch for a user
pub async fn build_study_batch(
    db: &Database,
    config: &StudyConfig,
    user_id: Uuid,
    request: &GetCardsForStudyRequest,
    now: DateTime<Utc>,
) -> Result<Vec<StudyCard>> {
    let (limit_new, limit_due) = resolve_limits(request, config)?;

    let enrolled: HashSet<Uuid> = db.get_enrolled_lesson_ids(user_id).await?.into_iter().collect();
    if let Some(lesson_id) = request.lesson_id {
        if !enrolled.contains(&lesson_id) {
            return Err(ApiError::NotFound(format!("Lesson {lesson_id} not found")));
        }
    }

    let mut candidates = Candidates::default();

    if request.pool_type.includes_due() && limit_due > 0 {
        candidates.scheduled_cards = db
            .get_due_candidates(user_id, request.lesson_id, now, limit_due as i64)
            .await?
            .into_iter()
            .map(CandidateRow::into_study_card)
            .collect();
    }

    if request.pool_type.includes_new() && limit_new > 0 {
        let fetch = match config.new_card_order {
            NewCardOrder::Shuffle => limit_new.saturating_mul(SHUFFLE_POOL_FACTOR),
            NewCardOrder::Created => limit_new,
        };
        candidates.new_cards = db
            .get_new_candidates(user_id, request.lesson_id, fetch as i64)
            .await?
            .into_iter()
            .map(CandidateRow::into_study_card)
            .collect();
    }

    let batch_request = BatchRequest {
        pool: request.pool_type,
        limit_new,
        limit_due,
        max_batch_size: config.max_batch_size,
        lesson_filter: request.lesson_id,
        enrolled_lessons: enrolled,
        new_card_order: config.new_card_order,
        shuffle_seed: shuffle_seed(user_id, now.date_naive()),
    };

    let batch = select_study_batch(candidates, &batch_request, now);

    tracing::debug!(
        user_id = %user_id,
        pool = ?request.pool_type,
        cards = batch.len(),
        "selected study batch"
    );

    Ok(batch)
}
