//! Error types for drill-core.

use thiserror::Error;

use crate::modes::ExerciseMode;
use crate::types::CardId;

/// Result type alias using DrillError.
pub type Result<T> = std::result::Result<T, DrillError>;

/// Errors raised by the session engine and its collaborators.
#[derive(Debug, Error)]
pub enum DrillError {
    #[error("card {0} is not part of this session")]
    UnknownCard(CardId),

    #[error("card {0} is not the card being shown")]
    NotCurrentCard(CardId),

    #[error("card {0} has already completed")]
    CardComplete(CardId),

    #[error("card {0} has not completed its exercises")]
    NotComplete(CardId),

    #[error("stale answer for card {card_id}: expected {expected:?}, got {got}")]
    StaleAnswer {
        card_id: CardId,
        expected: Option<ExerciseMode>,
        got: ExerciseMode,
    },

    #[error("invalid mode policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("unknown scheduler: {0}")]
    UnknownScheduler(String),

    #[error("repository error: {0}")]
    Repository(String),

    #[error("scheduler error: {0}")]
    Scheduler(String),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}
