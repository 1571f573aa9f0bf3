//! Multi-mode study session orchestration.
//!
//! A session owns one [`CardStudyState`] per card in the working set and
//! advances exactly one of them per learner answer. Cards are interleaved
//! round-robin: a global round counter acts as a barrier so no card's next
//! scheduled mode runs ahead of its peers, and failed modes are repeated
//! before the card moves on. When a card finishes its queue, its attempt
//! history is folded into one composite rating and handed to the scheduler.

mod card_state;

pub use card_state::{CardStudyState, Transition};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::algorithm::{IntervalPreview, Scheduler, SchedulingResult};
use crate::error::{DrillError, Result};
use crate::modes::{ExerciseMode, ModePolicy};
use crate::queue::StudyQueue;
use crate::rating::RatingBreakdown;
use crate::settings::EffectiveSettings;
use crate::types::{Card, CardId, Rating};

/// A card entering the session with its display payload.
#[derive(Debug, Clone)]
pub struct StudyItem<V> {
    pub card: Card,
    pub vocabulary: V,
}

/// The exercise currently on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prompt<'a, V> {
    pub card_id: CardId,
    pub mode: ExerciseMode,
    pub vocabulary: &'a V,
    pub round: usize,
}

/// A learner's result for one exercise, as judged by the exercise itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub card_id: CardId,
    pub mode: ExerciseMode,
    pub passed: bool,
    #[serde(default)]
    pub used_hint: bool,
}

impl Answer {
    pub fn pass(card_id: CardId, mode: ExerciseMode) -> Self {
        Self {
            card_id,
            mode,
            passed: true,
            used_hint: false,
        }
    }

    pub fn fail(card_id: CardId, mode: ExerciseMode) -> Self {
        Self {
            card_id,
            mode,
            passed: false,
            used_hint: false,
        }
    }

    pub fn with_hint(self) -> Self {
        Self {
            used_hint: true,
            ..self
        }
    }
}

/// A card that finished its queue and was scheduled.
#[derive(Debug, Clone)]
pub struct CompletedCard {
    pub card_id: CardId,
    pub rating: RatingBreakdown,
    pub scheduled: SchedulingResult,
}

/// Result of submitting one answer.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub transition: Transition,
    /// Cards scheduled by this call: the answered card once it finishes, and
    /// any card that started complete and was still waiting to be scheduled.
    pub completed: Vec<CompletedCard>,
    pub session_complete: bool,
}

/// Snapshot of session progress for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProgress {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
    pub round: usize,
    pub ratings: Vec<(CardId, Rating)>,
}

pub struct Session<V> {
    id: Uuid,
    cards: Vec<Card>,
    states: Vec<CardStudyState<V>>,
    current_round: usize,
    current_card_idx: usize,
    completed_count: usize,
    completed: Vec<CompletedCard>,
    max_attempts_per_mode: Option<u32>,
    scheduler: Box<dyn Scheduler>,
}

impl<V: Clone> Session<V> {
    /// Start a session, drawing one mode queue per card from `policy`.
    pub fn new<R>(items: Vec<StudyItem<V>>, policy: &ModePolicy, scheduler: Box<dyn Scheduler>, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let entries = items
            .into_iter()
            .map(|item| {
                let modes = policy.modes_for(item.card.state, &mut *rng);
                (item.card, item.vocabulary, modes)
            })
            .collect();
        Self::with_queues(entries, scheduler)
    }

    /// Start a session with the settings' policy, scheduler and retry cap.
    pub fn from_settings<R>(items: Vec<StudyItem<V>>, settings: &EffectiveSettings, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::new(items, &settings.mode_policy, settings.scheduler.build(), rng)
            .with_max_attempts(settings.max_attempts_per_mode)
    }

    /// Start a session from a built queue, attaching each card's payload.
    pub fn from_queue<R, F>(queue: StudyQueue, mut vocabulary: F, settings: &EffectiveSettings, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
        F: FnMut(&Card) -> V,
    {
        let items = queue
            .into_working_set()
            .into_iter()
            .map(|card| StudyItem {
                vocabulary: vocabulary(&card),
                card,
            })
            .collect();
        Self::from_settings(items, settings, rng)
    }

    /// Start a session with explicit mode queues.
    pub fn with_queues(entries: Vec<(Card, V, Vec<ExerciseMode>)>, scheduler: Box<dyn Scheduler>) -> Self {
        let mut cards = Vec::with_capacity(entries.len());
        let mut states = Vec::with_capacity(entries.len());
        for (card, vocabulary, modes) in entries {
            states.push(CardStudyState::new(card.id, vocabulary, card.state, modes));
            cards.push(card);
        }
        let completed_count = states.iter().filter(|s| s.is_complete()).count();

        let mut session = Self {
            id: Uuid::new_v4(),
            cards,
            states,
            current_round: 0,
            current_card_idx: 0,
            completed_count,
            completed: Vec::new(),
            max_attempts_per_mode: None,
            scheduler,
        };
        if let Some(idx) = session.find_servable(0) {
            session.current_card_idx = idx;
        }
        info!(
            session = %session.id,
            cards = session.states.len(),
            scheduler = session.scheduler.name(),
            "session started"
        );
        session
    }

    pub fn with_max_attempts(mut self, max_attempts_per_mode: Option<u32>) -> Self {
        self.max_attempts_per_mode = max_attempts_per_mode;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current_round(&self) -> usize {
        self.current_round
    }

    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.completed_count == self.states.len()
    }

    pub fn states(&self) -> &[CardStudyState<V>] {
        &self.states
    }

    pub fn card_state(&self, card_id: CardId) -> Option<&CardStudyState<V>> {
        self.states.iter().find(|s| s.card_id() == card_id)
    }

    /// Cards scheduled so far, in completion order.
    pub fn completed(&self) -> &[CompletedCard] {
        &self.completed
    }

    /// Mode to show for `card_id` this round; `None` for unknown or finished cards.
    pub fn current_mode(&self, card_id: CardId) -> Option<ExerciseMode> {
        self.card_state(card_id)
            .and_then(|s| s.current_mode(self.current_round))
    }

    /// The exercise to show next, or `None` once the session is over.
    pub fn current(&self) -> Option<Prompt<'_, V>> {
        let state = self.states.get(self.current_card_idx)?;
        let mode = state.current_mode(self.current_round)?;
        Some(Prompt {
            card_id: state.card_id(),
            mode,
            vocabulary: state.vocabulary(),
            round: self.current_round,
        })
    }

    /// Schedule cards that are complete but not yet scheduled.
    ///
    /// Cards with an empty mode queue are complete from the start; call this
    /// before serving prompts to hand them to the scheduler. [`Session::answer`]
    /// does the same for any still pending, so a session whose every card
    /// starts complete is the only case that needs it.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<Vec<CompletedCard>> {
        let pending: Vec<CardId> = self
            .states
            .iter()
            .filter(|s| s.is_complete() && !self.is_scheduled(s.card_id()))
            .map(|s| s.card_id())
            .collect();
        pending
            .into_iter()
            .map(|card_id| self.schedule_completed(card_id, now))
            .collect()
    }

    /// Apply the learner's result for the exercise on screen.
    ///
    /// The card's new state, the round barrier and the next-card pointer are
    /// committed together before the scheduler is called, so a scheduler
    /// failure leaves the session consistent; the card can then be submitted
    /// again with [`Session::start`] or [`Session::schedule_completed`].
    pub fn answer(&mut self, answer: Answer, now: DateTime<Utc>) -> Result<AnswerOutcome> {
        let idx = self.index_of(answer.card_id)?;
        if idx != self.current_card_idx && !self.states[idx].is_complete() {
            warn!(session = %self.id, card_id = answer.card_id, "answer for a card not on screen");
            return Err(DrillError::NotCurrentCard(answer.card_id));
        }

        let applied = self.states[idx].apply(
            answer.mode,
            answer.passed,
            answer.used_hint,
            self.current_round,
            self.max_attempts_per_mode,
        );
        let (next, transition) = match applied {
            Ok(step) => step,
            Err(err) => {
                warn!(session = %self.id, card_id = answer.card_id, error = %err, "answer rejected");
                return Err(err);
            }
        };

        self.states[idx] = next;
        debug!(
            session = %self.id,
            card_id = answer.card_id,
            mode = %answer.mode,
            passed = answer.passed,
            ?transition,
            "answer applied"
        );
        if transition == Transition::Exhausted {
            warn!(session = %self.id, card_id = answer.card_id, mode = %answer.mode, "attempt cap reached");
        }
        if transition.is_final() {
            self.completed_count += 1;
        }
        self.advance_round();
        self.select_next();

        let session_complete = self.is_complete();
        let completed = self.start(now)?;
        if session_complete {
            info!(session = %self.id, cards = self.completed.len(), "session complete");
        }

        Ok(AnswerOutcome {
            transition,
            completed,
            session_complete,
        })
    }

    /// Hand a finished card's composite rating to the scheduler.
    ///
    /// Each card is scheduled at most once per session.
    pub fn schedule_completed(&mut self, card_id: CardId, now: DateTime<Utc>) -> Result<CompletedCard> {
        let idx = self.index_of(card_id)?;
        if self.is_scheduled(card_id) {
            return Err(DrillError::CardComplete(card_id));
        }
        let rating = self.states[idx]
            .rating()
            .ok_or(DrillError::NotComplete(card_id))?;

        let scheduled = self.scheduler.schedule(&self.cards[idx], rating.rating, now)?;
        info!(
            session = %self.id,
            card_id,
            rating = ?rating.rating,
            total_fails = rating.total_fails,
            hard_mode_fails = rating.hard_mode_fails,
            "card scheduled"
        );
        self.cards[idx] = scheduled.card.clone();
        let completed = CompletedCard {
            card_id,
            rating,
            scheduled,
        };
        self.completed.push(completed.clone());
        Ok(completed)
    }

    /// Upcoming intervals for a card, for display only.
    ///
    /// Once the card is scheduled this previews its post-review state.
    pub fn preview(&self, card_id: CardId, now: DateTime<Utc>) -> Result<IntervalPreview> {
        let idx = self.index_of(card_id)?;
        self.scheduler.preview(&self.cards[idx], now)
    }

    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.states.len(),
            completed: self.completed_count,
            remaining: self.states.len() - self.completed_count,
            round: self.current_round,
            ratings: self
                .completed
                .iter()
                .map(|c| (c.card_id, c.rating.rating))
                .collect(),
        }
    }

    /// End the session early. Returns the cards that never completed.
    pub fn abandon(self) -> Vec<CardId> {
        let unfinished: Vec<CardId> = self
            .states
            .iter()
            .filter(|s| !s.is_complete())
            .map(|s| s.card_id())
            .collect();
        info!(session = %self.id, unfinished = unfinished.len(), "session abandoned");
        unfinished
    }

    fn is_scheduled(&self, card_id: CardId) -> bool {
        self.completed.iter().any(|c| c.card_id == card_id)
    }

    fn index_of(&self, card_id: CardId) -> Result<usize> {
        self.states
            .iter()
            .position(|s| s.card_id() == card_id)
            .ok_or(DrillError::UnknownCard(card_id))
    }

    /// Close the round once every card has passed its mode for it.
    fn advance_round(&mut self) {
        if self.is_complete() {
            return;
        }
        let round = self.current_round;
        if self.states.iter().all(|s| s.is_past_round(round)) {
            self.current_round += 1;
            debug!(session = %self.id, round = self.current_round, "round advanced");
        }
    }

    /// Move to the next card with something to show, wrapping around.
    fn select_next(&mut self) {
        if let Some(idx) = self.find_servable(self.current_card_idx + 1) {
            self.current_card_idx = idx;
        }
    }

    /// First card at or after `start` (circularly) with a mode to serve.
    fn find_servable(&self, start: usize) -> Option<usize> {
        let n = self.states.len();
        (0..n)
            .map(|offset| (start + offset) % n)
            .find(|&idx| self.states[idx].current_mode(self.current_round).is_some())
    }
}
