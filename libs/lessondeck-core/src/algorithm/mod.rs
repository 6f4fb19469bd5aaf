//! Spaced repetition scheduling.

pub mod sm2;

use crate::types::{Quality, SchedulingState};
use chrono::{DateTime, Utc};

pub use sm2::{compute_next_schedule, Sm2};

/// Result of scheduling a card after review.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingResult {
    pub new_state: SchedulingState,
    pub next_due: DateTime<Utc>,
}

/// Trait for spaced repetition algorithms.
pub trait SpacedRepetitionAlgorithm: Send + Sync {
    /// Calculate next review state after a review.
    fn schedule(
        &self,
        state: &SchedulingState,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> SchedulingResult;

    /// Initial state for a card that has never been reviewed.
    fn initial_state(&self) -> SchedulingState;
}
