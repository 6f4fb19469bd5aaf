//! Study batch selection policy.
//!
//! The repository hands over candidate cards; this module decides which of
//! them make it into a batch and in what order. Due cards come first, most
//! overdue at the front, followed by never-seen cards.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use uuid::Uuid;

use crate::types::{ApprovalStatus, NewCardOrder, PoolType, StudyCard};

/// Parameters for one batch selection.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub pool: PoolType,
    pub limit_new: usize,
    pub limit_due: usize,
    pub max_batch_size: usize,
    pub lesson_filter: Option<Uuid>,
    pub enrolled_lessons: HashSet<Uuid>,
    pub new_card_order: NewCardOrder,
    pub shuffle_seed: u64,
}

/// Candidate cards fetched from storage for a single user.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    /// Cards with no scheduling state for the user.
    pub new_cards: Vec<StudyCard>,
    /// Cards with a scheduling state, due or not.
    pub scheduled_cards: Vec<StudyCard>,
}

impl BatchRequest {
    fn admits(&self, card: &StudyCard) -> bool {
        card.approval_status == ApprovalStatus::Approved
            && self.enrolled_lessons.contains(&card.lesson_id)
            && self.lesson_filter.map_or(true, |lesson| lesson == card.lesson_id)
    }
}

/// Build an ordered, capped study batch from candidates.
pub fn select_study_batch(
    candidates: Candidates,
    request: &BatchRequest,
    now: DateTime<Utc>,
) -> Vec<StudyCard> {
    let mut due: Vec<StudyCard> = if request.pool.includes_due() {
        candidates
            .scheduled_cards
            .into_iter()
            .filter(|c| request.admits(c))
            .filter(|c| c.due_at.is_some_and(|due_at| due_at <= now))
            .collect()
    } else {
        Vec::new()
    };

    let mut fresh: Vec<StudyCard> = if request.pool.includes_new() {
        candidates
            .new_cards
            .into_iter()
            .filter(|c| request.admits(c) && c.due_at.is_none())
            .collect()
    } else {
        Vec::new()
    };

    due.sort_by(|a, b| {
        a.due_at
            .cmp(&b.due_at)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
    due.truncate(request.limit_due);

    fresh.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    if request.new_card_order == NewCardOrder::Shuffle {
        let mut rng = StdRng::seed_from_u64(request.shuffle_seed);
        fresh.shuffle(&mut rng);
    }
    fresh.truncate(request.limit_new);

    let mut batch = due;
    batch.extend(fresh);
    batch.truncate(request.max_batch_size);
    batch
}

/// Seed that keeps a shuffled order stable for one user over one day.
pub fn shuffle_seed(user_id: Uuid, day: NaiveDate) -> u64 {
    let (hi, lo) = user_id.as_u64_pair();
    hi ^ lo.rotate_left(17) ^ day.num_days_from_ce() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CardType, DifficultyLevel};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn card(lesson: Uuid, created_offset: i64, due_offset: Option<i64>) -> StudyCard {
        StudyCard {
            id: Uuid::new_v4(),
            lesson_id: lesson,
            front: "front".to_string(),
            back: "back".to_string(),
            card_type: CardType::Basic,
            difficulty: DifficultyLevel::Medium,
            tags: vec![],
            approval_status: ApprovalStatus::Approved,
            created_at: now() - Duration::days(100) + Duration::minutes(created_offset),
            due_at: due_offset.map(|d| now() + Duration::hours(d)),
        }
    }

    fn request(lessons: &[Uuid]) -> BatchRequest {
        BatchRequest {
            pool: PoolType::Both,
            limit_new: 10,
            limit_due: 10,
            max_batch_size: 100,
            lesson_filter: None,
            enrolled_lessons: lessons.iter().copied().collect(),
            new_card_order: NewCardOrder::Created,
            shuffle_seed: 7,
        }
    }

    #[test]
    fn empty_candidates_give_empty_batch() {
        let batch = select_study_batch(Candidates::default(), &request(&[]), now());
        assert!(batch.is_empty());
    }

    #[test]
    fn due_cards_most_overdue_first() {
        let lesson = Uuid::new_v4();
        let slightly = card(lesson, 0, Some(-1));
        let very = card(lesson, 1, Some(-72));
        let future = card(lesson, 2, Some(5));
        let candidates = Candidates {
            new_cards: vec![],
            scheduled_cards: vec![slightly.clone(), future, very.clone()],
        };
        let batch = select_study_batch(candidates, &request(&[lesson]), now());
        assert_eq!(batch.iter().map(|c| c.id).collect::<Vec<_>>(), vec![very.id, slightly.id]);
    }

    #[test]
    fn due_precede_new_and_limits_apply() {
        let lesson = Uuid::new_v4();
        let candidates = Candidates {
            new_cards: (0..5).map(|i| card(lesson, i, None)).collect(),
            scheduled_cards: (0..5).map(|i| card(lesson, i, Some(-i - 1))).collect(),
        };
        let mut req = request(&[lesson]);
        req.limit_new = 2;
        req.limit_due = 3;
        let batch = select_study_batch(candidates, &req, now());
        assert_eq!(batch.len(), 5);
        assert!(batch[..3].iter().all(|c| c.due_at.is_some()));
        assert!(batch[3..].iter().all(|c| c.due_at.is_none()));
    }

    #[test]
    fn max_batch_size_caps_total() {
        let lesson = Uuid::new_v4();
        let candidates = Candidates {
            new_cards: (0..5).map(|i| card(lesson, i, None)).collect(),
            scheduled_cards: (0..5).map(|i| card(lesson, i, Some(-1))).collect(),
        };
        let mut req = request(&[lesson]);
        req.max_batch_size = 4;
        assert_eq!(select_study_batch(candidates, &req, now()).len(), 4);
    }

    #[test]
    fn filters_unapproved_unenrolled_and_other_lessons() {
        let enrolled = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut pending = card(enrolled, 0, None);
        pending.approval_status = ApprovalStatus::Pending;
        let mut rejected = card(enrolled, 1, Some(-2));
        rejected.approval_status = ApprovalStatus::Rejected;
        let stranger = card(other, 2, None);
        let keep = card(enrolled, 3, None);
        let candidates = Candidates {
            new_cards: vec![pending, stranger, keep.clone()],
            scheduled_cards: vec![rejected],
        };
        let batch = select_study_batch(candidates, &request(&[enrolled]), now());
        assert_eq!(batch, vec![keep]);
    }

    #[test]
    fn lesson_filter_restricts_both_pools() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let candidates = Candidates {
            new_cards: vec![card(a, 0, None), card(b, 1, None)],
            scheduled_cards: vec![card(a, 2, Some(-1)), card(b, 3, Some(-1))],
        };
        let mut req = request(&[a, b]);
        req.lesson_filter = Some(b);
        let batch = select_study_batch(candidates, &req, now());
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|c| c.lesson_id == b));
    }

    #[test]
    fn pool_type_selects_subset() {
        let lesson = Uuid::new_v4();
        let candidates = Candidates {
            new_cards: vec![card(lesson, 0, None)],
            scheduled_cards: vec![card(lesson, 1, Some(-1))],
        };
        let mut req = request(&[lesson]);
        req.pool = PoolType::New;
        let batch = select_study_batch(candidates.clone(), &req, now());
        assert!(batch.len() == 1 && batch[0].due_at.is_none());

        req.pool = PoolType::Due;
        let batch = select_study_batch(candidates, &req, now());
        assert!(batch.len() == 1 && batch[0].due_at.is_some());
    }

    #[test]
    fn shuffle_is_deterministic_per_seed() {
        let lesson = Uuid::new_v4();
        let cards: Vec<StudyCard> = (0..20).map(|i| card(lesson, i, None)).collect();
        let mut req = request(&[lesson]);
        req.limit_new = 20;
        req.new_card_order = NewCardOrder::Shuffle;
        let candidates = Candidates {
            new_cards: cards.clone(),
            scheduled_cards: vec![],
        };
        let first = select_study_batch(candidates.clone(), &req, now());
        let second = select_study_batch(candidates, &req, now());
        assert_eq!(first, second);
        assert_eq!(first.len(), cards.len());
    }

    #[test]
    fn shuffle_seed_changes_by_day() {
        let user = Uuid::new_v4();
        let monday = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
        assert_eq!(shuffle_seed(user, monday), shuffle_seed(user, monday));
        assert_ne!(shuffle_seed(user, monday), shuffle_seed(user, tuesday));
    }
}
