//! Core types for the lessondeck platform.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Role a user plays on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Teacher,
    Moderator,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Student
    }
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Moderator => "moderator",
        }
    }

    /// Whether the role may own lessons.
    pub fn can_teach(&self) -> bool {
        matches!(self, Self::Teacher | Self::Moderator)
    }
}

impl FromStr for UserRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            "moderator" => Ok(Self::Moderator),
            other => Err(unknown("user role", other)),
        }
    }
}

/// Moderation status of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl Default for ApprovalStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for ApprovalStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(unknown("approval status", other)),
        }
    }
}

/// Presentation type of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Basic,
    Cloze,
    MultipleChoice,
}

impl Default for CardType {
    fn default() -> Self {
        Self::Basic
    }
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Cloze => "cloze",
            Self::MultipleChoice => "multiple_choice",
        }
    }
}

impl FromStr for CardType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "cloze" => Ok(Self::Cloze),
            "multiple_choice" => Ok(Self::MultipleChoice),
            other => Err(unknown("card type", other)),
        }
    }
}

/// Author-assigned difficulty of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

impl Default for DifficultyLevel {
    fn default() -> Self {
        Self::Medium
    }
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl FromStr for DifficultyLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(unknown("difficulty level", other)),
        }
    }
}

/// Learning phase of a scheduled card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    New,
    Learning,
    Review,
}

impl Default for CardStatus {
    fn default() -> Self {
        Self::New
    }
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Review => "review",
        }
    }
}

impl FromStr for CardStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "learning" => Ok(Self::Learning),
            "review" => Ok(Self::Review),
            other => Err(unknown("card status", other)),
        }
    }
}

/// Which cards a study batch draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolType {
    New,
    Due,
    Both,
}

impl Default for PoolType {
    fn default() -> Self {
        Self::Both
    }
}

impl PoolType {
    pub fn includes_new(&self) -> bool {
        matches!(self, Self::New | Self::Both)
    }

    pub fn includes_due(&self) -> bool {
        matches!(self, Self::Due | Self::Both)
    }
}

/// Order in which never-seen cards are served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewCardOrder {
    Created,
    Shuffle,
}

impl Default for NewCardOrder {
    fn default() -> Self {
        Self::Created
    }
}

impl FromStr for NewCardOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "shuffle" => Ok(Self::Shuffle),
            other => Err(unknown("new card order", other)),
        }
    }
}

/// Kind of content a flag points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Card,
    Lesson,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Lesson => "lesson",
        }
    }
}

impl FromStr for ContentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "lesson" => Ok(Self::Lesson),
            other => Err(unknown("content type", other)),
        }
    }
}

/// Reason category for a content flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagCategory {
    Spam,
    Inappropriate,
    Incorrect,
    Copyright,
    Other,
}

impl FlagCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::Inappropriate => "inappropriate",
            Self::Incorrect => "incorrect",
            Self::Copyright => "copyright",
            Self::Other => "other",
        }
    }
}

impl FromStr for FlagCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spam" => Ok(Self::Spam),
            "inappropriate" => Ok(Self::Inappropriate),
            "incorrect" => Ok(Self::Incorrect),
            "copyright" => Ok(Self::Copyright),
            "other" => Ok(Self::Other),
            other => Err(unknown("flag category", other)),
        }
    }
}

fn unknown(kind: &'static str, value: &str) -> CoreError {
    CoreError::UnknownVariant {
        kind,
        value: value.to_string(),
    }
}

/// Self-assessed recall quality, 0 (blackout) to 5 (perfect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    /// Lowest quality that counts as a successful recall.
    pub const PASSING: u8 = 3;

    pub fn new(value: i32) -> crate::Result<Self> {
        if (0..=Self::MAX as i32).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(CoreError::InvalidQuality(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_passing(self) -> bool {
        self.0 >= Self::PASSING
    }
}

impl TryFrom<i32> for Quality {
    type Error = CoreError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quality> for i32 {
    fn from(q: Quality) -> Self {
        q.0 as i32
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per user-card scheduling state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingState {
    pub status: CardStatus,
    pub ease_factor: f64,
    pub interval_days: i32,
    pub repetitions: u32,
    pub lapses: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_quality: Option<u8>,
}

impl Default for SchedulingState {
    fn default() -> Self {
        Self {
            status: CardStatus::New,
            ease_factor: 2.5,
            interval_days: 0,
            repetitions: 0,
            lapses: 0,
            due_at: None,
            last_reviewed_at: None,
            last_quality: None,
        }
    }
}

/// A card as seen by the study session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyCard {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub front: String,
    pub back: String,
    pub card_type: CardType,
    pub difficulty: DifficultyLevel,
    pub tags: Vec<String>,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    /// Present only for cards the user has already reviewed.
    pub due_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quality_accepts_full_range() {
        for v in 0..=5 {
            assert_eq!(Quality::new(v).unwrap().value() as i32, v);
        }
    }

    #[test]
    fn quality_rejects_out_of_range() {
        assert_eq!(Quality::new(6), Err(CoreError::InvalidQuality(6)));
        assert_eq!(Quality::new(-1), Err(CoreError::InvalidQuality(-1)));
    }

    #[test]
    fn quality_passing_threshold() {
        assert!(!Quality::new(2).unwrap().is_passing());
        assert!(Quality::new(3).unwrap().is_passing());
    }

    #[test]
    fn quality_deserializes_with_validation() {
        let q: Quality = serde_json::from_str("4").unwrap();
        assert_eq!(q.value(), 4);
        assert!(serde_json::from_str::<Quality>("9").is_err());
    }

    #[test]
    fn enum_strings_round_trip() {
        assert_eq!("multiple_choice".parse::<CardType>().unwrap(), CardType::MultipleChoice);
        assert_eq!(ApprovalStatus::Approved.as_str(), "approved");
        assert_eq!("teacher".parse::<UserRole>().unwrap(), UserRole::Teacher);
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn pool_type_membership() {
        assert!(PoolType::Both.includes_new() && PoolType::Both.includes_due());
        assert!(!PoolType::New.includes_due());
        assert!(!PoolType::Due.includes_new());
    }

    #[test]
    fn scheduling_state_serializes_camel_case() {
        let json = serde_json::to_value(SchedulingState::default()).unwrap();
        assert_eq!(json["easeFactor"], 2.5);
        assert_eq!(json["intervalDays"], 0);
        assert!(json.get("dueAt").is_none());
    }
}
