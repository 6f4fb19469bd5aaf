//! Core library for the lessondeck learning platform.
//!
//! Provides:
//! - SM-2 scheduling over a 0-5 quality scale
//! - Study batch selection policy (due and new pools)
//! - Derived streak counters
//! - Shared types (StudyCard, SchedulingState, Quality, etc.)

pub mod algorithm;
pub mod error;
pub mod selector;
pub mod streak;
pub mod types;

pub use algorithm::{compute_next_schedule, SchedulingResult, Sm2, SpacedRepetitionAlgorithm};
pub use error::{CoreError, Result};
pub use selector::{select_study_batch, shuffle_seed, BatchRequest, Candidates};
pub use streak::Progress;
pub use types::{
    ApprovalStatus, CardStatus, CardType, ContentType, DifficultyLevel, FlagCategory,
    NewCardOrder, PoolType, Quality, SchedulingState, StudyCard, UserRole,
};
