//! PostgreSQL database operations

pub mod reviews;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;

const CARD_COLUMNS: &str = "id, lesson_id, author_id, front_content, back_content, card_type, \
    difficulty_level, tags, approval_status, created_at, updated_at, deleted_at";

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Start a transaction
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    // === User Repository ===

    /// Create a new user with generated token
    pub async fn create_user(&self, display_name: &str, role: UserRole) -> Result<DbUser> {
        let token = Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, DbUser>(
            r#"
            INSERT INTO users (token, display_name, role)
            VALUES ($1, $2, $3)
            RETURNING id, token, display_name, role, created_at, last_seen_at
            "#,
        )
        .bind(&token)
        .bind(display_name)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_progress (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Get user by token
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, token, display_name, role, created_at, last_seen_at
            FROM users
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by ID
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, token, display_name, role, created_at, last_seen_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update user last_seen_at timestamp
    pub async fn update_last_seen(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_seen_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Get derived progress counters, zeroed if none recorded yet
    pub async fn get_progress(&self, user_id: Uuid) -> Result<DbProgress> {
        let progress = sqlx::query_as::<_, DbProgress>(
            r#"
            SELECT user_id, total_reviews, current_streak, longest_streak, last_study_date
            FROM user_progress
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .unwrap_or_else(|| DbProgress::empty(user_id));

        Ok(progress)
    }

    // === Lesson Repository ===

    /// Create a lesson owned by `owner_id`
    pub async fn create_lesson(
        &self,
        owner_id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> Result<DbLesson> {
        let lesson = sqlx::query_as::<_, DbLesson>(
            r#"
            INSERT INTO lessons (owner_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, title, description, created_at, updated_at, deleted_at
            "#,
        )
        .bind(owner_id)
        .bind(title)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(lesson)
    }

    /// Get a live (not deleted) lesson
    pub async fn get_lesson(&self, lesson_id: Uuid) -> Result<Option<DbLesson>> {
        let lesson = sqlx::query_as::<_, DbLesson>(
            r#"
            SELECT id, owner_id, title, description, created_at, updated_at, deleted_at
            FROM lessons
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lesson)
    }

    /// Lessons owned by a teacher
    pub async fn get_owned_lessons(&self, owner_id: Uuid) -> Result<Vec<DbLesson>> {
        let lessons = sqlx::query_as::<_, DbLesson>(
            r#"
            SELECT id, owner_id, title, description, created_at, updated_at, deleted_at
            FROM lessons
            WHERE owner_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lessons)
    }

    /// Lessons a user is enrolled in
    pub async fn get_enrolled_lessons(&self, user_id: Uuid) -> Result<Vec<DbLesson>> {
        let lessons = sqlx::query_as::<_, DbLesson>(
            r#"
            SELECT l.id, l.owner_id, l.title, l.description,
                   l.created_at, l.updated_at, l.deleted_at
            FROM lessons l
            JOIN enrollments e ON e.lesson_id = l.id AND e.user_id = $1
            WHERE l.deleted_at IS NULL
            ORDER BY e.enrolled_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lessons)
    }

    /// IDs of live lessons a user is enrolled in
    pub async fn get_enrolled_lesson_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT e.lesson_id
            FROM enrollments e
            JOIN lessons l ON l.id = e.lesson_id
            WHERE e.user_id = $1 AND l.deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Enroll a user; returns false when already enrolled
    pub async fn enroll(&self, user_id: Uuid, lesson_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO enrollments (user_id, lesson_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, lesson_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check enrollment in a live lesson
    pub async fn is_enrolled(&self, user_id: Uuid, lesson_id: Uuid) -> Result<bool> {
        let enrolled: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM enrollments e
                JOIN lessons l ON l.id = e.lesson_id
                WHERE e.user_id = $1 AND e.lesson_id = $2 AND l.deleted_at IS NULL
            )
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(enrolled)
    }

    /// Soft delete a lesson; history (states, reviews) is retained
    pub async fn soft_delete_lesson(&self, lesson_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE lessons
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(lesson_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Card Repository ===

    /// Insert a card
    pub async fn create_card(&self, card: &DbCard) -> Result<DbCard> {
        let created = sqlx::query_as::<_, DbCard>(&format!(
            r#"
            INSERT INTO cards (lesson_id, author_id, front_content, back_content, card_type,
                               difficulty_level, tags, approval_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CARD_COLUMNS}
            "#
        ))
        .bind(card.lesson_id)
        .bind(card.author_id)
        .bind(&card.front_content)
        .bind(&card.back_content)
        .bind(&card.card_type)
        .bind(&card.difficulty_level)
        .bind(&card.tags)
        .bind(&card.approval_status)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Get a live card whose lesson is also live
    pub async fn get_card(&self, card_id: Uuid) -> Result<Option<DbCard>> {
        let card = sqlx::query_as::<_, DbCard>(
            r#"
            SELECT c.id, c.lesson_id, c.author_id, c.front_content, c.back_content, c.card_type,
                   c.difficulty_level, c.tags, c.approval_status, c.created_at, c.updated_at,
                   c.deleted_at
            FROM cards c
            JOIN lessons l ON l.id = c.lesson_id
            WHERE c.id = $1 AND c.deleted_at IS NULL AND l.deleted_at IS NULL
            "#,
        )
        .bind(card_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    /// Persist edited card content and approval status
    pub async fn update_card(&self, card: &DbCard) -> Result<DbCard> {
        let updated = sqlx::query_as::<_, DbCard>(&format!(
            r#"
            UPDATE cards
            SET front_content = $2,
                back_content = $3,
                card_type = $4,
                difficulty_level = $5,
                tags = $6,
                approval_status = $7,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {CARD_COLUMNS}
            "#
        ))
        .bind(card.id)
        .bind(&card.front_content)
        .bind(&card.back_content)
        .bind(&card.card_type)
        .bind(&card.difficulty_level)
        .bind(&card.tags)
        .bind(&card.approval_status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Card not found".to_string()))?;

        Ok(updated)
    }

    /// Set approval status of a card
    pub async fn set_approval_status(
        &self,
        card_id: Uuid,
        status: ApprovalStatus,
    ) -> Result<DbCard> {
        let updated = sqlx::query_as::<_, DbCard>(&format!(
            r#"
            UPDATE cards
            SET approval_status = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {CARD_COLUMNS}
            "#
        ))
        .bind(card_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Card not found".to_string()))?;

        Ok(updated)
    }

    // === Study Candidate Queries ===

    /// Approved cards in enrolled, live lessons the user has never reviewed
    pub async fn get_new_candidates(
        &self,
        user_id: Uuid,
        lesson_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<CandidateRow>> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT c.id, c.lesson_id, c.front_content, c.back_content, c.card_type,
                   c.difficulty_level, c.tags, c.approval_status, c.created_at,
                   NULL::TIMESTAMPTZ AS due_at
            FROM cards c
            JOIN lessons l ON l.id = c.lesson_id AND l.deleted_at IS NULL
            JOIN enrollments e ON e.lesson_id = c.lesson_id AND e.user_id = $1
            LEFT JOIN scheduling_states s ON s.card_id = c.id AND s.user_id = $1
            WHERE c.deleted_at IS NULL
              AND c.approval_status = 'approved'
              AND s.card_id IS NULL
              AND ($2::UUID IS NULL OR c.lesson_id = $2)
            ORDER BY c.created_at, c.id
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Reviewed cards whose due date has passed, most overdue first
    pub async fn get_due_candidates(
        &self,
        user_id: Uuid,
        lesson_id: Option<Uuid>,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CandidateRow>> {
        let rows = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT c.id, c.lesson_id, c.front_content, c.back_content, c.card_type,
                   c.difficulty_level, c.tags, c.approval_status, c.created_at,
                   s.due_at
            FROM scheduling_states s
            JOIN cards c ON c.id = s.card_id
            JOIN lessons l ON l.id = c.lesson_id AND l.deleted_at IS NULL
            JOIN enrollments e ON e.lesson_id = c.lesson_id AND e.user_id = $1
            WHERE s.user_id = $1
              AND s.due_at <= $3
              AND c.deleted_at IS NULL
              AND c.approval_status = 'approved'
              AND ($2::UUID IS NULL OR c.lesson_id = $2)
            ORDER BY s.due_at, c.created_at, c.id
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // === Teacher Dashboard ===

    /// Headline counts across a teacher's live lessons
    pub async fn get_teacher_counts(&self, owner_id: Uuid) -> Result<TeacherCounts> {
        let counts = sqlx::query_as::<_, TeacherCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM lessons l
                 WHERE l.owner_id = $1 AND l.deleted_at IS NULL) AS total_lessons,
                (SELECT COUNT(DISTINCT e.user_id) FROM enrollments e
                 JOIN lessons l ON l.id = e.lesson_id
                 WHERE l.owner_id = $1 AND l.deleted_at IS NULL) AS total_students,
                (SELECT COUNT(*) FROM cards c
                 JOIN lessons l ON l.id = c.lesson_id
                 WHERE l.owner_id = $1 AND l.deleted_at IS NULL
                   AND c.deleted_at IS NULL) AS total_cards_created,
                (SELECT COUNT(*) FROM cards c
                 JOIN lessons l ON l.id = c.lesson_id
                 WHERE l.owner_id = $1 AND l.deleted_at IS NULL
                   AND c.deleted_at IS NULL AND c.approval_status = 'pending') AS pending_cards
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Latest reviews, enrollments and card submissions in a teacher's lessons
    pub async fn get_recent_activity(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<RecentActivity>> {
        let activity = sqlx::query_as::<_, RecentActivity>(
            r#"
            SELECT kind, lesson_id, lesson_title, actor_name, occurred_at
            FROM (
                SELECT 'review' AS kind, l.id AS lesson_id, l.title AS lesson_title,
                       u.display_name AS actor_name, r.reviewed_at AS occurred_at
                FROM reviews r
                JOIN cards c ON c.id = r.card_id
                JOIN lessons l ON l.id = c.lesson_id
                JOIN users u ON u.id = r.user_id
                WHERE l.owner_id = $1 AND l.deleted_at IS NULL
                UNION ALL
                SELECT 'enrollment', l.id, l.title, u.display_name, e.enrolled_at
                FROM enrollments e
                JOIN lessons l ON l.id = e.lesson_id
                JOIN users u ON u.id = e.user_id
                WHERE l.owner_id = $1 AND l.deleted_at IS NULL
                UNION ALL
                SELECT 'card_created', l.id, l.title, u.display_name, c.created_at
                FROM cards c
                JOIN lessons l ON l.id = c.lesson_id
                JOIN users u ON u.id = c.author_id
                WHERE l.owner_id = $1 AND l.deleted_at IS NULL AND c.deleted_at IS NULL
            ) activity
            ORDER BY occurred_at DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(activity)
    }

    /// A teacher's live lessons with card and student counts
    pub async fn get_teacher_lessons(&self, owner_id: Uuid) -> Result<Vec<LessonWithStats>> {
        let lessons = sqlx::query_as::<_, LessonWithStats>(
            r#"
            SELECT
                l.id, l.title, l.description, l.created_at, l.updated_at,
                COUNT(c.id) AS card_count,
                COUNT(c.id) FILTER (WHERE c.approval_status = 'approved') AS approved_cards,
                COUNT(c.id) FILTER (WHERE c.approval_status = 'pending') AS pending_cards,
                (SELECT COUNT(*) FROM enrollments e WHERE e.lesson_id = l.id) AS student_count
            FROM lessons l
            LEFT JOIN cards c ON c.lesson_id = l.id AND c.deleted_at IS NULL
            WHERE l.owner_id = $1 AND l.deleted_at IS NULL
            GROUP BY l.id
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lessons)
    }

    // === Moderation ===

    /// Whether a flaggable piece of content exists
    pub async fn content_exists(
        &self,
        content_type: ContentType,
        content_id: Uuid,
    ) -> Result<bool> {
        let exists: bool = match content_type {
            // A card in a deleted lesson is gone too.
            ContentType::Card => {
                sqlx::query_scalar(
                    r#"
                    SELECT EXISTS (
                        SELECT 1
                        FROM cards c
                        JOIN lessons l ON l.id = c.lesson_id
                        WHERE c.id = $1 AND c.deleted_at IS NULL AND l.deleted_at IS NULL
                    )
                    "#,
                )
                .bind(content_id)
                .fetch_one(&self.pool)
                .await?
            }
            ContentType::Lesson => {
                sqlx::query_scalar(
                    "SELECT EXISTS (SELECT 1 FROM lessons WHERE id = $1 AND deleted_at IS NULL)",
                )
                .bind(content_id)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(exists)
    }

    /// Insert a content flag
    pub async fn insert_flag(&self, flag: &DbContentFlag) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO content_flags (id, content_type, content_id, category, reason,
                                       evidence_text, reporter_id, anonymous, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(flag.id)
        .bind(&flag.content_type)
        .bind(flag.content_id)
        .bind(&flag.category)
        .bind(&flag.reason)
        .bind(&flag.evidence_text)
        .bind(flag.reporter_id)
        .bind(flag.anonymous)
        .bind(&flag.status)
        .bind(flag.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
