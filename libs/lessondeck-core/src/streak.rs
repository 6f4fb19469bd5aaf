//! Study streak bookkeeping.
//!
//! These counters are derived from review events and only exist so
//! dashboards do not have to scan history on every request.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregate study counters for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub total_reviews: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_study_date: Option<NaiveDate>,
}

impl Progress {
    /// Counters after one more review on `day`.
    pub fn record_review(&self, day: NaiveDate) -> Progress {
        let current_streak = match self.last_study_date {
            Some(last) if last == day => self.current_streak.max(1),
            Some(last) if last.succ_opt() == Some(day) => self.current_streak + 1,
            // Out-of-order timestamp: keep the streak as is.
            Some(last) if last > day => self.current_streak,
            _ => 1,
        };

        Progress {
            total_reviews: self.total_reviews + 1,
            current_streak,
            longest_streak: self.longest_streak.max(current_streak),
            last_study_date: match self.last_study_date {
                Some(last) if last > day => Some(last),
                _ => Some(day),
            },
        }
    }

    /// Streak as seen on `today`: a streak survives until a full day is missed.
    pub fn streak_as_of(&self, today: NaiveDate) -> u32 {
        match self.last_study_date {
            Some(last) if last == today || last.succ_opt() == Some(today) => self.current_streak,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn first_review_starts_streak() {
        let p = Progress::default().record_review(day(1));
        assert_eq!(p.current_streak, 1);
        assert_eq!(p.longest_streak, 1);
        assert_eq!(p.total_reviews, 1);
    }

    #[test]
    fn same_day_reviews_do_not_extend() {
        let p = Progress::default().record_review(day(1)).record_review(day(1));
        assert_eq!(p.current_streak, 1);
        assert_eq!(p.total_reviews, 2);
    }

    #[test]
    fn consecutive_days_extend_and_gap_resets() {
        let p = Progress::default()
            .record_review(day(1))
            .record_review(day(2))
            .record_review(day(3));
        assert_eq!(p.current_streak, 3);

        let p = p.record_review(day(6));
        assert_eq!(p.current_streak, 1);
        assert_eq!(p.longest_streak, 3);
    }

    #[test]
    fn out_of_order_review_keeps_latest_date() {
        let p = Progress::default().record_review(day(5)).record_review(day(3));
        assert_eq!(p.last_study_date, Some(day(5)));
        assert_eq!(p.current_streak, 1);
    }

    #[test]
    fn streak_expires_after_missed_day() {
        let p = Progress::default().record_review(day(1)).record_review(day(2));
        assert_eq!(p.streak_as_of(day(3)), 2);
        assert_eq!(p.streak_as_of(day(4)), 0);
    }
}
