//! Card storage seam used by the queue builder.
//!
//! Persistence is owned by the embedding application. [`MemoryRepository`]
//! is a complete in-memory implementation for tests and embedded use.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};

use crate::algorithm::{ReviewLog, SchedulingResult};
use crate::error::Result;
use crate::types::{Card, CardId, CardStatus, LearnerId, StateCounts};

/// Repository for card and review operations.
pub trait CardRepository {
    /// Cards in `state` due at or before `due_before`, ordered by due date.
    fn cards_in_state(
        &self,
        learner_id: LearnerId,
        deck_path: Option<&str>,
        state: CardStatus,
        due_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Card>>;

    /// New cards ordered by creation time.
    fn new_cards(&self, learner_id: LearnerId, deck_path: Option<&str>, limit: usize) -> Result<Vec<Card>>;

    /// Due cards per state (uncapped) plus all available new cards.
    fn state_counts(
        &self,
        learner_id: LearnerId,
        deck_path: Option<&str>,
        due_before: DateTime<Utc>,
    ) -> Result<StateCounts>;

    /// Number of distinct cards first reviewed as New at or after `since`.
    fn new_cards_introduced_since(&self, learner_id: LearnerId, since: DateTime<Utc>) -> Result<u32>;

    /// Materialise up to `count` more New cards; returns how many were added.
    fn seed_new_cards(&mut self, learner_id: LearnerId, deck_path: Option<&str>, count: usize) -> Result<usize>;

    fn get_card(&self, card_id: CardId) -> Result<Option<Card>>;

    /// Persist a scheduled card together with its review log.
    fn save_review(&mut self, result: &SchedulingResult) -> Result<()>;
}

/// In-memory card repository.
#[derive(Debug, Default, Clone)]
pub struct MemoryRepository {
    cards: BTreeMap<CardId, Card>,
    reserve: Vec<Card>,
    logs: Vec<ReviewLog>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, card: Card) {
        self.cards.insert(card.id, card);
    }

    /// Add a card that only becomes visible once seeded.
    pub fn insert_unseeded(&mut self, card: Card) {
        self.reserve.push(card);
    }

    pub fn logs(&self) -> &[ReviewLog] {
        &self.logs
    }

    fn matching<'a>(
        &'a self,
        learner_id: LearnerId,
        deck_path: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Card> + 'a {
        self.cards
            .values()
            .filter(move |card| card.learner_id == learner_id && card.in_deck(deck_path))
    }
}

impl CardRepository for MemoryRepository {
    fn cards_in_state(
        &self,
        learner_id: LearnerId,
        deck_path: Option<&str>,
        state: CardStatus,
        due_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Card>> {
        let mut cards: Vec<Card> = self
            .matching(learner_id, deck_path)
            .filter(|card| card.state == state && card.due <= due_before)
            .cloned()
            .collect();
        cards.sort_by_key(|card| (card.due, card.id));
        cards.truncate(limit);
        Ok(cards)
    }

    fn new_cards(&self, learner_id: LearnerId, deck_path: Option<&str>, limit: usize) -> Result<Vec<Card>> {
        let mut cards: Vec<Card> = self
            .matching(learner_id, deck_path)
            .filter(|card| card.state == CardStatus::New)
            .cloned()
            .collect();
        cards.sort_by_key(|card| (card.created_at, card.id));
        cards.truncate(limit);
        Ok(cards)
    }

    fn state_counts(
        &self,
        learner_id: LearnerId,
        deck_path: Option<&str>,
        due_before: DateTime<Utc>,
    ) -> Result<StateCounts> {
        let mut counts = StateCounts::default();
        for card in self.matching(learner_id, deck_path) {
            match card.state {
                CardStatus::New => counts.new += 1,
                _ if card.due > due_before => {}
                CardStatus::Learning => counts.learning += 1,
                CardStatus::Review => counts.review += 1,
                CardStatus::Relearning => counts.relearning += 1,
            }
        }
        Ok(counts)
    }

    fn new_cards_introduced_since(&self, learner_id: LearnerId, since: DateTime<Utc>) -> Result<u32> {
        let introduced: HashSet<CardId> = self
            .logs
            .iter()
            .filter(|log| log.state == CardStatus::New && log.reviewed_at >= since)
            .filter(|log| {
                self.cards
                    .get(&log.card_id)
                    .is_some_and(|card| card.learner_id == learner_id)
            })
            .map(|log| log.card_id)
            .collect();
        Ok(introduced.len() as u32)
    }

    fn seed_new_cards(&mut self, learner_id: LearnerId, deck_path: Option<&str>, count: usize) -> Result<usize> {
        let mut seeded = 0;
        let mut remaining = Vec::with_capacity(self.reserve.len());
        for card in self.reserve.drain(..) {
            if seeded < count && card.learner_id == learner_id && card.in_deck(deck_path) {
                self.cards.insert(card.id, card);
                seeded += 1;
            } else {
                remaining.push(card);
            }
        }
        self.reserve = remaining;
        Ok(seeded)
    }

    fn get_card(&self, card_id: CardId) -> Result<Option<Card>> {
        Ok(self.cards.get(&card_id).cloned())
    }

    fn save_review(&mut self, result: &SchedulingResult) -> Result<()> {
        self.cards.insert(result.card.id, result.card.clone());
        self.logs.push(result.log.clone());
        Ok(())
    }
}
