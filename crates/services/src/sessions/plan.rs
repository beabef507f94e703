use rand::rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;

use srs_core::model::{CardRef, ProgressRecord};
use srs_core::queue::DueQueueBuilder;
use srs_core::time::Timestamp;

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    pub cards: Vec<CardRef>,
    pub review_selected: usize,
    pub learning_selected: usize,
    pub new_selected: usize,
}

impl SessionPlan {
    /// Total number of cards in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.cards.len()
    }

    /// Returns true when no cards were selected for this session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Builds a session worklist from catalog cards and their stored progress.
#[derive(Debug, Clone, Copy)]
pub struct SessionBuilder {
    now: Timestamp,
    new_card_cap: usize,
    review_limit: Option<usize>,
    shuffle_new: bool,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(now: Timestamp, new_card_cap: usize) -> Self {
        Self {
            now,
            new_card_cap,
            review_limit: None,
            shuffle_new: false,
        }
    }

    #[must_use]
    pub fn with_review_limit(mut self, limit: Option<usize>) -> Self {
        self.review_limit = limit;
        self
    }

    /// Enable or disable shuffling among new cards before selection.
    #[must_use]
    pub fn with_shuffle_new(mut self, shuffle: bool) -> Self {
        self.shuffle_new = shuffle;
        self
    }

    /// Build a session plan.
    ///
    /// - Due Review/Mastered and Learning cards keep the queue's fixed order.
    /// - New cards come in catalog order, or a random order when shuffling is on.
    /// - `new_card_cap` and the optional review limit bound the selection.
    pub fn build(
        self,
        cards: Vec<CardRef>,
        progress: &HashMap<CardRef, ProgressRecord>,
    ) -> SessionPlan {
        let mut cards = cards;
        if self.shuffle_new {
            // Due cards are fully sorted by the queue, so input order only
            // decides which new cards are picked.
            cards.as_mut_slice().shuffle(&mut rng());
        }

        let mut queue = DueQueueBuilder::new(self.now, self.new_card_cap);
        if let Some(limit) = self.review_limit {
            queue = queue.with_review_limit(limit);
        }
        let queue = queue.build(cards, progress);

        SessionPlan {
            cards: queue.cards,
            review_selected: queue.review_selected,
            learning_selected: queue.learning_selected,
            new_selected: queue.new_selected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use srs_core::Scheduler;
    use srs_core::model::{CardId, DeckId, Quality};
    use srs_core::time::fixed_now;

    fn card(id: u64) -> CardRef {
        CardRef::new(DeckId::new(1), CardId::new(id))
    }

    fn due_review(id: u64, reviewed_days_ago: i64) -> ProgressRecord {
        let reviewed_at = fixed_now() - chrono::Duration::days(reviewed_days_ago);
        Scheduler::new().advance(card(id), None, Quality::Easy, reviewed_at)
    }

    #[test]
    fn builder_prioritizes_due_and_limits_new() {
        let due = due_review(1, 2);
        let progress: HashMap<_, _> = [(due.card(), due)].into_iter().collect();

        let plan = SessionBuilder::new(fixed_now(), 1).build(vec![card(2), card(3), card(1)], &progress);

        assert_eq!(plan.cards, vec![card(1), card(2)]);
        assert_eq!(plan.review_selected, 1);
        assert_eq!(plan.new_selected, 1);
        assert_eq!(plan.total(), 2);
    }

    #[test]
    fn builder_applies_review_limit() {
        let progress: HashMap<_, _> = (1..=3)
            .map(|id| {
                let r = due_review(id, 3);
                (r.card(), r)
            })
            .collect();

        let plan = SessionBuilder::new(fixed_now(), 0)
            .with_review_limit(Some(2))
            .build(vec![card(1), card(2), card(3)], &progress);

        assert_eq!(plan.review_selected, 2);
        assert_eq!(plan.total(), 2);
    }

    #[test]
    fn shuffled_plan_selects_only_new_cards_from_catalog() {
        let cards: Vec<_> = (1..=20).map(card).collect();
        let plan = SessionBuilder::new(fixed_now(), 5)
            .with_shuffle_new(true)
            .build(cards.clone(), &HashMap::new());

        assert_eq!(plan.new_selected, 5);
        assert!(plan.cards.iter().all(|c| cards.contains(c)));
    }

    #[test]
    fn nothing_due_gives_empty_plan() {
        let future = Scheduler::new().advance(card(1), None, Quality::Easy, fixed_now());
        let progress: HashMap<_, _> = [(future.card(), future)].into_iter().collect();
        let plan = SessionBuilder::new(fixed_now(), 10).build(vec![card(1)], &progress);
        assert!(plan.is_empty());
    }
}
