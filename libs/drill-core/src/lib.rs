//! Core engine for multi-mode vocabulary review sessions.
//!
//! Provides:
//! - Study queue builder (Relearning, Learning, Review, New buckets)
//! - Exercise mode assignment policy per card maturity
//! - Round-robin session orchestrator with failure retry
//! - Composite rating aggregation and an FSRS scheduler
//! - Shared types (Card, CardStatus, Rating, etc.)

pub mod algorithm;
pub mod error;
pub mod modes;
pub mod queue;
pub mod rating;
pub mod repository;
pub mod session;
pub mod settings;
pub mod types;

pub use algorithm::{get_scheduler, IntervalPreview, ReviewLog, Scheduler, SchedulerKind, SchedulingResult};
pub use error::{DrillError, Result};
pub use modes::{ExerciseMode, ModePolicy, ModePool};
pub use queue::{build_queue, QueueRequest, QuotaUsage, StudyQueue};
pub use rating::{aggregate, ModeAttempts, RatingBreakdown};
pub use repository::{CardRepository, MemoryRepository};
pub use session::{
    Answer, AnswerOutcome, CardStudyState, CompletedCard, Prompt, Session, SessionProgress, StudyItem,
    Transition,
};
pub use settings::{DeckSettings, EffectiveSettings, GlobalSettings};
pub use types::{Card, CardId, CardStatus, LearnerId, Rating, StateCounts};
