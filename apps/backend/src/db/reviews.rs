//! Review recording queries. These run inside a caller-owned transaction so
//! the review insert, state upsert and progress update commit together.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

const REVIEW_COLUMNS: &str = "id, user_id, card_id, quality, response_time_ms, reviewed_at, \
    fingerprint, interval_before, ease_before, repetitions_before, status_after, interval_after, \
    ease_after, repetitions_after, lapses_after, due_after, created_at";

/// Look up a previously recorded review by its idempotency key
pub async fn find_review(conn: &mut PgConnection, review_id: Uuid) -> Result<Option<DbReview>> {
    let review = sqlx::query_as::<_, DbReview>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
    ))
    .bind(review_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(review)
}

/// Make sure a state row exists so it can be row-locked
pub async fn ensure_state_row(
    conn: &mut PgConnection,
    user_id: Uuid,
    card_id: Uuid,
    initial: &SchedulingState,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO scheduling_states (user_id, card_id, status, ease_factor, interval_days,
                                       repetitions, lapses)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id, card_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(card_id)
    .bind(initial.status.as_str())
    .bind(initial.ease_factor)
    .bind(initial.interval_days)
    .bind(initial.repetitions as i32)
    .bind(initial.lapses as i32)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Read the state row under `FOR UPDATE`; concurrent reviews of the same
/// (user, card) serialize here
pub async fn lock_state(
    conn: &mut PgConnection,
    user_id: Uuid,
    card_id: Uuid,
) -> Result<DbSchedulingState> {
    let state = sqlx::query_as::<_, DbSchedulingState>(
        r#"
        SELECT user_id, card_id, status, ease_factor, interval_days, repetitions, lapses,
               due_at, last_reviewed_at, last_quality, created_at, updated_at
        FROM scheduling_states
        WHERE user_id = $1 AND card_id = $2
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(card_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(state)
}

/// Append a review; returns false if the id was already taken
pub async fn insert_review(conn: &mut PgConnection, review: &DbReview) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO reviews (id, user_id, card_id, quality, response_time_ms, reviewed_at,
                             fingerprint, interval_before, ease_before, repetitions_before,
                             status_after, interval_after, ease_after, repetitions_after,
                             lapses_after, due_after, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(review.id)
    .bind(review.user_id)
    .bind(review.card_id)
    .bind(review.quality)
    .bind(review.response_time_ms)
    .bind(review.reviewed_at)
    .bind(&review.fingerprint)
    .bind(review.interval_before)
    .bind(review.ease_before)
    .bind(review.repetitions_before)
    .bind(&review.status_after)
    .bind(review.interval_after)
    .bind(review.ease_after)
    .bind(review.repetitions_after)
    .bind(review.lapses_after)
    .bind(review.due_after)
    .bind(review.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Write the post-review scheduling state
pub async fn upsert_state(conn: &mut PgConnection, state: &DbSchedulingState) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO scheduling_states (user_id, card_id, status, ease_factor, interval_days,
                                       repetitions, lapses, due_at, last_reviewed_at,
                                       last_quality, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (user_id, card_id) DO UPDATE SET
            status = EXCLUDED.status,
            ease_factor = EXCLUDED.ease_factor,
            interval_days = EXCLUDED.interval_days,
            repetitions = EXCLUDED.repetitions,
            lapses = EXCLUDED.lapses,
            due_at = EXCLUDED.due_at,
            last_reviewed_at = EXCLUDED.last_reviewed_at,
            last_quality = EXCLUDED.last_quality,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(state.user_id)
    .bind(state.card_id)
    .bind(&state.status)
    .bind(state.ease_factor)
    .bind(state.interval_days)
    .bind(state.repetitions)
    .bind(state.lapses)
    .bind(state.due_at)
    .bind(state.last_reviewed_at)
    .bind(state.last_quality)
    .bind(state.created_at)
    .bind(state.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Lock the progress row for update, creating it if the user predates it
pub async fn lock_progress(conn: &mut PgConnection, user_id: Uuid) -> Result<DbProgress> {
    sqlx::query("INSERT INTO user_progress (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    let progress = sqlx::query_as::<_, DbProgress>(
        r#"
        SELECT user_id, total_reviews, current_streak, longest_streak, last_study_date
        FROM user_progress
        WHERE user_id = $1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(progress)
}

pub async fn save_progress(conn: &mut PgConnection, progress: &DbProgress) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE user_progress
        SET total_reviews = $2,
            current_streak = $3,
            longest_streak = $4,
            last_study_date = $5,
            updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(progress.user_id)
    .bind(progress.total_reviews)
    .bind(progress.current_streak)
    .bind(progress.longest_streak)
    .bind(progress.last_study_date)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
