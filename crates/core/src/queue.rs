use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use crate::model::{CardRef, CardStatus, ProgressRecord};
use crate::time::Timestamp;

/// Snapshot worklist for one review session.
///
/// Order is: overdue Review/Mastered cards (most overdue first), then due
/// Learning cards (earliest due first), then never-rated cards in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DueQueue {
    pub cards: Vec<CardRef>,
    pub review_selected: usize,
    pub learning_selected: usize,
    pub new_selected: usize,
}

impl DueQueue {
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards due from earlier study, excluding brand-new ones.
    #[must_use]
    pub fn due_count(&self) -> usize {
        self.review_selected + self.learning_selected
    }
}

/// Selects and orders due cards across one or many decks.
///
/// # Examples
///
/// ```
/// # use std::collections::HashMap;
/// # use srs_core::model::{CardId, CardRef, DeckId};
/// # use srs_core::queue::DueQueueBuilder;
/// # use srs_core::time::fixed_now;
/// let cards = (1..=5).map(|id| CardRef::new(DeckId::new(1), CardId::new(id)));
/// let queue = DueQueueBuilder::new(fixed_now(), 3).build(cards, &HashMap::new());
/// assert_eq!(queue.new_selected, 3);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DueQueueBuilder {
    now: Timestamp,
    new_card_cap: usize,
    review_limit: Option<usize>,
}

impl DueQueueBuilder {
    #[must_use]
    pub fn new(now: Timestamp, new_card_cap: usize) -> Self {
        Self {
            now,
            new_card_cap,
            review_limit: None,
        }
    }

    /// Cap how many already-studied (Review, Mastered, Learning) cards are taken.
    #[must_use]
    pub fn with_review_limit(mut self, limit: usize) -> Self {
        self.review_limit = Some(limit);
        self
    }

    /// Build the queue from the catalog's cards and whatever progress exists.
    ///
    /// `cards` is the universe of cards to consider; records for cards not in it
    /// are ignored. A card appearing twice in `cards` is queued once.
    pub fn build(
        self,
        cards: impl IntoIterator<Item = CardRef>,
        progress: &HashMap<CardRef, ProgressRecord>,
    ) -> DueQueue {
        let now = self.now;
        let mut seen = HashSet::new();
        let mut review: Vec<&ProgressRecord> = Vec::new();
        let mut learning: Vec<&ProgressRecord> = Vec::new();
        let mut fresh: Vec<CardRef> = Vec::new();

        for card in cards {
            if !seen.insert(card) {
                continue;
            }
            match progress.get(&card) {
                None => fresh.push(card),
                Some(record) if !record.is_due(now) => {}
                Some(record) if record.status() == CardStatus::New => fresh.push(card),
                Some(record) if record.status() == CardStatus::Learning => learning.push(record),
                Some(record) => review.push(record),
            }
        }

        review.sort_by_key(|r| (Reverse(r.overdue_by(now)), r.card()));
        learning.sort_by_key(|r| (r.next_review_at(), r.card()));

        let due_cap = self.review_limit.unwrap_or(usize::MAX);
        let review_take = review.len().min(due_cap);
        let learning_take = learning.len().min(due_cap - review_take);
        let new_take = fresh.len().min(self.new_card_cap);

        let mut selected = Vec::with_capacity(review_take + learning_take + new_take);
        selected.extend(review.iter().take(review_take).map(|r| r.card()));
        selected.extend(learning.iter().take(learning_take).map(|r| r.card()));
        selected.extend(fresh.into_iter().take(new_take));

        DueQueue {
            cards: selected,
            review_selected: review_take,
            learning_selected: learning_take,
            new_selected: new_take,
        }
    }
}

/// Ordered list of due cards; see `DueQueueBuilder` for the ordering rules.
pub fn build_queue(
    cards: impl IntoIterator<Item = CardRef>,
    progress: &HashMap<CardRef, ProgressRecord>,
    now: Timestamp,
    new_card_cap: usize,
) -> Vec<CardRef> {
    DueQueueBuilder::new(now, new_card_cap)
        .build(cards, progress)
        .cards
}
