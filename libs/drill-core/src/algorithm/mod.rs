//! Spaced repetition scheduler seam.
//!
//! The session engine hands each completed card's composite rating to a
//! [`Scheduler`]. The crate ships an FSRS implementation; applications may
//! plug in their own.

pub mod fsrs;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DrillError, Result};
use crate::types::{Card, CardId, CardStatus, Rating};

/// Record of one scheduled review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
    pub card_id: CardId,
    pub rating: Rating,
    /// State before the review.
    pub state: CardStatus,
    /// Due date before the review.
    pub due: DateTime<Utc>,
    pub stability: f64,
    pub difficulty: f64,
    pub elapsed_days: f64,
    pub scheduled_days: f64,
    pub reviewed_at: DateTime<Utc>,
}

/// Result of scheduling a card after review.
#[derive(Debug, Clone)]
pub struct SchedulingResult {
    pub card: Card,
    pub log: ReviewLog,
}

/// Time until the card would be due again for each possible rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPreview {
    pub again: Duration,
    pub hard: Duration,
    pub good: Duration,
    pub easy: Duration,
}

impl IntervalPreview {
    pub fn get(&self, rating: Rating) -> Duration {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }
}

/// Trait for spaced repetition schedulers.
pub trait Scheduler: Send + Sync {
    /// Scheduler identifier.
    fn name(&self) -> &'static str;

    /// Calculate the card's next state after a review.
    fn schedule(&self, card: &Card, rating: Rating, now: DateTime<Utc>) -> Result<SchedulingResult>;

    /// Intervals the card would get for each rating, without changing it.
    fn preview(&self, card: &Card, now: DateTime<Utc>) -> Result<IntervalPreview> {
        let interval = |rating| -> Result<Duration> {
            let result = self.schedule(card, rating, now)?;
            Ok(result.card.due - now)
        };
        Ok(IntervalPreview {
            again: interval(Rating::Again)?,
            hard: interval(Rating::Hard)?,
            good: interval(Rating::Good)?,
            easy: interval(Rating::Easy)?,
        })
    }
}

/// Scheduler options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerKind {
    Fsrs,
}

impl Default for SchedulerKind {
    fn default() -> Self {
        Self::Fsrs
    }
}

impl SchedulerKind {
    /// Get the scheduler name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fsrs => "fsrs",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fsrs" => Some(Self::Fsrs),
            _ => None,
        }
    }

    pub fn build(self) -> Box<dyn Scheduler> {
        match self {
            Self::Fsrs => Box::new(fsrs::Fsrs::default()),
        }
    }
}

/// Get scheduler by name.
pub fn get_scheduler(name: &str) -> Result<Box<dyn Scheduler>> {
    SchedulerKind::from_str(name)
        .map(SchedulerKind::build)
        .ok_or_else(|| DrillError::UnknownScheduler(name.to_string()))
}
