//! SM-2 spaced repetition algorithm.
//!
//! Based on SuperMemo 2 with configurable parameters. Quality ratings run
//! from 0 (complete blackout) to 5 (perfect recall); anything below 3 is a
//! failed recall and sends the card back to learning.

use super::{SchedulingResult, SpacedRepetitionAlgorithm};
use crate::types::{CardStatus, Quality, SchedulingState};
use chrono::{DateTime, Duration, Utc};

/// SM-2 algorithm with configurable parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Sm2 {
    pub initial_ease: f64,
    pub minimum_ease: f64,
    /// Interval after the first successful repetition.
    pub first_interval: i32,
    /// Interval after the second successful repetition.
    pub second_interval: i32,
    /// Upper bound on any interval, in days.
    pub maximum_interval: i32,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            initial_ease: 2.5,
            minimum_ease: 1.3,
            first_interval: 1,
            second_interval: 6,
            maximum_interval: 36500,
        }
    }
}

impl SpacedRepetitionAlgorithm for Sm2 {
    fn initial_state(&self) -> SchedulingState {
        SchedulingState {
            ease_factor: self.initial_ease,
            ..Default::default()
        }
    }

    fn schedule(
        &self,
        state: &SchedulingState,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> SchedulingResult {
        let ease_factor = self.next_ease(state.ease_factor, quality);

        let (status, interval_days, repetitions, lapses) = if quality.is_passing() {
            self.schedule_success(state, ease_factor)
        } else {
            let lapses = if state.status == CardStatus::Review {
                state.lapses + 1
            } else {
                state.lapses
            };
            (CardStatus::Learning, 1, 0, lapses)
        };

        // Saturate rather than panic if `now` sits near the end of chrono's range.
        let next_due = now
            .checked_add_signed(Duration::days(i64::from(interval_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        SchedulingResult {
            new_state: SchedulingState {
                status,
                ease_factor,
                interval_days,
                repetitions,
                lapses,
                due_at: Some(next_due),
                last_reviewed_at: Some(now),
                last_quality: Some(quality.value()),
            },
            next_due,
        }
    }
}

impl Sm2 {
    /// EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02)), rounded to two
    /// decimals and floored at `minimum_ease`.
    fn next_ease(&self, ease_factor: f64, quality: Quality) -> f64 {
        let miss = (Quality::MAX - quality.value()) as f64;
        let adjusted = ease_factor + (0.1 - miss * (0.08 + miss * 0.02));
        let rounded = (adjusted * 100.0).round() / 100.0;
        rounded.max(self.minimum_ease)
    }

    /// Growth is strict (`interval + 1` at least) until `maximum_interval`,
    /// which always wins.
    fn schedule_success(
        &self,
        state: &SchedulingState,
        ease_factor: f64,
    ) -> (CardStatus, i32, u32, u32) {
        let repetitions = state.repetitions + 1;
        let interval = match state.repetitions {
            0 => self.first_interval,
            1 => self.second_interval,
            _ => {
                let current = f64::from(state.interval_days.max(0));
                let grown = (current * ease_factor).round();
                // f64 -> i32 casts saturate, so huge products cannot wrap.
                (grown as i32).max(state.interval_days.saturating_add(1))
            }
        };
        let status = if repetitions >= 2 {
            CardStatus::Review
        } else {
            CardStatus::Learning
        };
        (
            status,
            interval.min(self.maximum_interval),
            repetitions,
            state.lapses,
        )
    }
}

/// Schedule with the default SM-2 parameters.
pub fn compute_next_schedule(
    state: &SchedulingState,
    quality: Quality,
    now: DateTime<Utc>,
) -> SchedulingResult {
    Sm2::default().schedule(state, quality, now)
}
