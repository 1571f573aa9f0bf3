//! Core types shared by the queue builder, session orchestrator and scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Card identifier.
pub type CardId = i64;

/// Learner identifier.
pub type LearnerId = Uuid;

/// Card maturity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    New,
    Learning,
    Review,
    Relearning,
}

impl Default for CardStatus {
    fn default() -> Self {
        Self::New
    }
}

impl CardStatus {
    /// All states in queue priority order (most urgent first).
    pub const PRIORITY: [CardStatus; 4] = [
        CardStatus::Relearning,
        CardStatus::Learning,
        CardStatus::Review,
        CardStatus::New,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Review => "review",
            Self::Relearning => "relearning",
        }
    }
}

/// Rating for a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// Convert to 4-point numeric value (1-4).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }

    /// Create from 4-point numeric value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Again),
            2 => Some(Self::Hard),
            3 => Some(Self::Good),
            4 => Some(Self::Easy),
            _ => None,
        }
    }
}

/// One learner's spaced repetition state for one vocabulary item.
///
/// The FSRS fields are only meaningful to the scheduler; the session engine
/// reads `state` and `id` and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub learner_id: LearnerId,
    pub deck_path: String,
    pub state: CardStatus,
    pub due: DateTime<Utc>,
    pub stability: f64,
    pub difficulty: f64,
    pub elapsed_days: f64,
    pub scheduled_days: f64,
    pub reps: u32,
    pub lapses: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_review: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Card {
    /// A fresh card that has never been reviewed.
    pub fn new(id: CardId, learner_id: LearnerId, deck_path: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            learner_id,
            deck_path: deck_path.into(),
            state: CardStatus::New,
            due: now,
            stability: 0.0,
            difficulty: 0.0,
            elapsed_days: 0.0,
            scheduled_days: 0.0,
            reps: 0,
            lapses: 0,
            last_review: None,
            created_at: now,
        }
    }

    /// Whether the card belongs to the given deck filter (`None` matches all decks).
    pub fn in_deck(&self, deck_path: Option<&str>) -> bool {
        match deck_path {
            Some(path) => self.deck_path == path,
            None => true,
        }
    }
}

/// Per-state card counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub new: usize,
    pub learning: usize,
    pub review: usize,
    pub relearning: usize,
}

impl StateCounts {
    pub fn get(&self, state: CardStatus) -> usize {
        match state {
            CardStatus::New => self.new,
            CardStatus::Learning => self.learning,
            CardStatus::Review => self.review,
            CardStatus::Relearning => self.relearning,
        }
    }

    pub fn total(&self) -> usize {
        self.new + self.learning + self.review + self.relearning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_value_round_trip() {
        for rating in [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy] {
            assert_eq!(Rating::from_value(rating.to_value()), Some(rating));
        }
        assert_eq!(Rating::from_value(0), None);
        assert_eq!(Rating::from_value(5), None);
    }

    #[test]
    fn priority_order_is_relearning_first() {
        assert_eq!(CardStatus::PRIORITY[0], CardStatus::Relearning);
        assert_eq!(CardStatus::PRIORITY[3], CardStatus::New);
    }

    #[test]
    fn deck_filter() {
        let card = Card::new(1, Uuid::nil(), "spanish/verbs", Utc::now());
        assert!(card.in_deck(None));
        assert!(card.in_deck(Some("spanish/verbs")));
        assert!(!card.in_deck(Some("french")));
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&CardStatus::Relearning).unwrap();
        assert_eq!(json, "\"relearning\"");
    }
}
