//! Database models and API types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from lessondeck-core
pub use lessondeck_core::types::{
    ApprovalStatus, CardStatus, CardType, ContentType, DifficultyLevel, FlagCategory, PoolType,
    Quality, SchedulingState, StudyCard, UserRole,
};
pub use lessondeck_core::Progress;

// === Database Entity Types ===

/// Registered user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub token: String,
    pub display_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl DbUser {
    pub fn role(&self) -> UserRole {
        self.role.parse().unwrap_or_default()
    }
}

/// Lesson owned by a teacher
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbLesson {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DbLesson {
    pub fn to_response(&self) -> LessonResponse {
        LessonResponse {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title.clone(),
            description: self.description.clone(),
            created_at: self.created_at,
        }
    }
}

/// Card stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCard {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub author_id: Uuid,
    pub front_content: String,
    pub back_content: String,
    pub card_type: String,
    pub difficulty_level: String,
    pub tags: Vec<String>,
    pub approval_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DbCard {
    pub fn approval_status(&self) -> ApprovalStatus {
        self.approval_status.parse().unwrap_or_default()
    }

    /// Convert to API card type
    pub fn to_response(&self) -> CardResponse {
        CardResponse {
            id: self.id,
            lesson_id: self.lesson_id,
            author_id: self.author_id,
            front_content: self.front_content.clone(),
            back_content: self.back_content.clone(),
            card_type: self.card_type.parse().unwrap_or_default(),
            difficulty_level: self.difficulty_level.parse().unwrap_or_default(),
            tags: self.tags.clone(),
            approval_status: self.approval_status(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Card row as returned by the study candidate queries
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub front_content: String,
    pub back_content: String,
    pub card_type: String,
    pub difficulty_level: String,
    pub tags: Vec<String>,
    pub approval_status: String,
    pub created_at: DateTime<Utc>,
    pub due_at: Option<DateTime<Utc>>,
}

impl CandidateRow {
    pub fn into_study_card(self) -> StudyCard {
        StudyCard {
            id: self.id,
            lesson_id: self.lesson_id,
            card_type: self.card_type.parse().unwrap_or_default(),
            difficulty: self.difficulty_level.parse().unwrap_or_default(),
            approval_status: self.approval_status.parse().unwrap_or_default(),
            front: self.front_content,
            back: self.back_content,
            tags: self.tags,
            created_at: self.created_at,
            due_at: self.due_at,
        }
    }
}

/// Scheduling state in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSchedulingState {
    pub user_id: Uuid,
    pub card_id: Uuid,
    pub status: String,
    pub ease_factor: f64,
    pub interval_days: i32,
    pub repetitions: i32,
    pub lapses: i32,
    pub due_at: Option<DateTime<Utc>>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub last_quality: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbSchedulingState {
    /// Create from lessondeck-core SchedulingState
    pub fn from_core_state(user_id: Uuid, card_id: Uuid, state: &SchedulingState) -> Self {
        Self {
            user_id,
            card_id,
            status: state.status.as_str().to_string(),
            ease_factor: state.ease_factor,
            interval_days: state.interval_days,
            repetitions: state.repetitions as i32,
            lapses: state.lapses as i32,
            due_at: state.due_at,
            last_reviewed_at: state.last_reviewed_at,
            last_quality: state.last_quality.map(i32::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Convert to lessondeck-core SchedulingState
    pub fn to_core_state(&self) -> SchedulingState {
        SchedulingState {
            status: self.status.parse().unwrap_or_default(),
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            repetitions: self.repetitions.max(0) as u32,
            lapses: self.lapses.max(0) as u32,
            due_at: self.due_at,
            last_reviewed_at: self.last_reviewed_at,
            last_quality: self.last_quality.map(|q| q.clamp(0, 5) as u8),
        }
    }
}

/// Review record; carries the post-review snapshot so replays can answer
/// without recomputing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbReview {
    pub id: Uuid,
    pub user_id: Uuid,
    pub card_id: Uuid,
    pub quality: i32,
    pub response_time_ms: i64,
    pub reviewed_at: DateTime<Utc>,
    pub fingerprint: String,
    pub interval_before: i32,
    pub ease_before: f64,
    pub repetitions_before: i32,
    pub status_after: String,
    pub interval_after: i32,
    pub ease_after: f64,
    pub repetitions_after: i32,
    pub lapses_after: i32,
    pub due_after: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl DbReview {
    /// Scheduling state as it stood right after this review
    pub fn state_after(&self) -> SchedulingState {
        SchedulingState {
            status: self.status_after.parse().unwrap_or_default(),
            ease_factor: self.ease_after,
            interval_days: self.interval_after,
            repetitions: self.repetitions_after.max(0) as u32,
            lapses: self.lapses_after.max(0) as u32,
            due_at: Some(self.due_after),
            last_reviewed_at: Some(self.reviewed_at),
            last_quality: Some(self.quality.clamp(0, 5) as u8),
        }
    }
}

/// Derived per-user counters
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbProgress {
    pub user_id: Uuid,
    pub total_reviews: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_study_date: Option<NaiveDate>,
}

impl DbProgress {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            total_reviews: 0,
            current_streak: 0,
            longest_streak: 0,
            last_study_date: None,
        }
    }

    pub fn to_core(&self) -> Progress {
        Progress {
            total_reviews: self.total_reviews.max(0) as u64,
            current_streak: self.current_streak.max(0) as u32,
            longest_streak: self.longest_streak.max(0) as u32,
            last_study_date: self.last_study_date,
        }
    }

    pub fn from_core(user_id: Uuid, progress: &Progress) -> Self {
        Self {
            user_id,
            total_reviews: progress.total_reviews as i64,
            current_streak: progress.current_streak as i32,
            longest_streak: progress.longest_streak as i32,
            last_study_date: progress.last_study_date,
        }
    }
}

/// Moderation flag raised against a card or lesson
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbContentFlag {
    pub id: Uuid,
    pub content_type: String,
    pub content_id: Uuid,
    pub category: String,
    pub reason: String,
    pub evidence_text: Option<String>,
    pub reporter_id: Option<Uuid>,
    pub anonymous: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Lesson with aggregate counts for the teacher dashboard
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LessonWithStats {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub card_count: i64,
    pub approved_cards: i64,
    pub pending_cards: i64,
    pub student_count: i64,
}

/// One entry of a teacher's recent activity feed
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub kind: String,
    pub lesson_id: Uuid,
    pub lesson_title: String,
    pub actor_name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Headline counts for the teacher dashboard
#[derive(Debug, Clone, FromRow)]
pub struct TeacherCounts {
    pub total_lessons: i64,
    pub total_students: i64,
    pub total_cards_created: i64,
    pub pending_cards: i64,
}

// === RPC Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCardsForStudyRequest {
    #[serde(default)]
    pub pool_type: PoolType,
    pub limit_new: Option<i64>,
    pub limit_due: Option<i64>,
    pub lesson_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyCardResponse {
    pub card_id: Uuid,
    pub lesson_id: Uuid,
    pub front_content: String,
    pub back_content: String,
    pub card_type: CardType,
    pub difficulty_level: DifficultyLevel,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
}

impl From<StudyCard> for StudyCardResponse {
    fn from(card: StudyCard) -> Self {
        Self {
            card_id: card.id,
            lesson_id: card.lesson_id,
            front_content: card.front,
            back_content: card.back,
            card_type: card.card_type,
            difficulty_level: card.difficulty,
            tags: card.tags,
            due_at: card.due_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordReviewRequest {
    pub card_id: Uuid,
    pub quality: i32,
    pub response_time_ms: i64,
    pub review_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordReviewResponse {
    pub success: bool,
    pub updated_state: SchedulingState,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherStatsResponse {
    pub total_lessons: i64,
    pub total_students: i64,
    pub total_cards_created: i64,
    pub pending_cards: i64,
    pub recent_activity: Vec<RecentActivity>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLessonRequest {
    pub lesson_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLessonResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeleteLessonResponse {
    pub fn deleted() -> Self {
        Self {
            success: true,
            message: Some("Lesson deleted".to_string()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagContentRequest {
    pub content_type: String,
    pub content_id: Uuid,
    pub category: String,
    pub reason: String,
    pub evidence_text: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagContentResponse {
    pub success: bool,
    pub flag_id: Uuid,
}

// === REST Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub display_name: String,
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterUserResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub total_reviews: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_study_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub display_name: String,
    pub role: UserRole,
    pub progress: ProgressResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateLessonRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LessonResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LessonListResponse {
    pub owned: Vec<LessonResponse>,
    pub enrolled: Vec<LessonResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnrollResponse {
    pub lesson_id: Uuid,
    pub newly_enrolled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCardRequest {
    pub front_content: String,
    pub back_content: String,
    pub card_type: Option<String>,
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCardRequest {
    pub front_content: Option<String>,
    pub back_content: Option<String>,
    pub card_type: Option<String>,
    pub difficulty_level: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModerateCardRequest {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CardResponse {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub author_id: Uuid,
    pub front_content: String,
    pub back_content: String,
    pub card_type: CardType,
    pub difficulty_level: DifficultyLevel,
    pub tags: Vec<String>,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
