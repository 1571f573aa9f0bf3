//! Study queue construction.
//!
//! Cards are fetched in four buckets and concatenated in priority order
//! Relearning, Learning, Review, New. The order only decides where the
//! session starts its round-robin walk.

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::repository::CardRepository;
use crate::settings::EffectiveSettings;
use crate::types::{Card, CardStatus, LearnerId, StateCounts};

/// Inputs for building a study queue.
#[derive(Debug, Clone)]
pub struct QueueRequest<'a> {
    pub learner_id: LearnerId,
    pub deck_path: Option<&'a str>,
    pub daily_new_quota: u32,
    pub fetch_limit: usize,
    pub daily_reset_hour: u32,
    pub seed_when_starved: bool,
}

impl<'a> QueueRequest<'a> {
    pub fn from_settings(learner_id: LearnerId, deck_path: Option<&'a str>, settings: &EffectiveSettings) -> Self {
        Self {
            learner_id,
            deck_path,
            daily_new_quota: settings.new_cards_per_day,
            fetch_limit: settings.fetch_limit,
            daily_reset_hour: settings.daily_reset_hour,
            seed_when_starved: settings.seed_when_starved,
        }
    }
}

/// New-card quota usage for the current study day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub used: u32,
    pub remaining: u32,
    pub daily: u32,
}

/// Study queue containing cards to study, bucketed by state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyQueue {
    pub relearning: Vec<Card>,
    pub learning: Vec<Card>,
    pub review: Vec<Card>,
    pub new: Vec<Card>,
    pub counts: StateCounts,
    pub quota: QuotaUsage,
}

impl StudyQueue {
    pub fn bucket(&self, state: CardStatus) -> &[Card] {
        match state {
            CardStatus::Relearning => &self.relearning,
            CardStatus::Learning => &self.learning,
            CardStatus::Review => &self.review,
            CardStatus::New => &self.new,
        }
    }

    pub fn len(&self) -> usize {
        self.relearning.len() + self.learning.len() + self.review.len() + self.new.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All cards in priority order.
    pub fn into_working_set(self) -> Vec<Card> {
        let mut cards = Vec::with_capacity(self.len());
        cards.extend(self.relearning);
        cards.extend(self.learning);
        cards.extend(self.review);
        cards.extend(self.new);
        cards
    }
}

/// Start of the study day containing `now`, in UTC.
///
/// Before the reset hour it is still "yesterday" from a study perspective.
pub fn study_day_start(now: DateTime<Utc>, daily_reset_hour: u32) -> DateTime<Utc> {
    let reset = NaiveTime::from_hms_opt(daily_reset_hour.min(23), 0, 0).unwrap_or_default();
    let date = if now.hour() < daily_reset_hour {
        (now - Duration::days(1)).date_naive()
    } else {
        now.date_naive()
    };
    date.and_time(reset).and_utc()
}

/// Fetch the study queue for a learner.
pub fn build_queue<R>(repo: &mut R, request: &QueueRequest<'_>, now: DateTime<Utc>) -> Result<StudyQueue>
where
    R: CardRepository + ?Sized,
{
    let day_start = study_day_start(now, request.daily_reset_hour);
    let day_end = day_start + Duration::days(1);
    let learner = request.learner_id;
    let deck = request.deck_path;

    let relearning =
        repo.cards_in_state(learner, deck, CardStatus::Relearning, now, request.fetch_limit)?;
    let learning = repo.cards_in_state(learner, deck, CardStatus::Learning, now, request.fetch_limit)?;
    let review = repo.cards_in_state(learner, deck, CardStatus::Review, day_end, request.fetch_limit)?;

    let used = repo.new_cards_introduced_since(learner, day_start)?;
    let remaining = request.daily_new_quota.saturating_sub(used);

    let mut new = repo.new_cards(learner, deck, remaining as usize)?;
    if request.seed_when_starved && new.len() < remaining as usize {
        let wanted = remaining as usize - new.len();
        let seeded = repo.seed_new_cards(learner, deck, wanted)?;
        debug!(wanted, seeded, "seeded new cards");
        if seeded > 0 {
            new = repo.new_cards(learner, deck, remaining as usize)?;
        }
    }

    let counts = repo.state_counts(learner, deck, day_end)?;
    let queue = StudyQueue {
        relearning,
        learning,
        review,
        new,
        counts,
        quota: QuotaUsage {
            used,
            remaining,
            daily: request.daily_new_quota,
        },
    };

    info!(
        learner = %learner,
        relearning = queue.relearning.len(),
        learning = queue.learning.len(),
        review = queue.review.len(),
        new = queue.new.len(),
        quota_used = used,
        "built study queue"
    );
    Ok(queue)
}
