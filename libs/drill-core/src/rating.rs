//! Composite rating from a card's multi-mode attempt history.
//!
//! A card runs through several exercises in one session, but the scheduler
//! only accepts one rating per review. The aggregator folds the attempt
//! counts into that rating:
//!
//! 1. no failures and no hint: Easy
//! 2. at most one failure: Good
//! 3. three or more failures on hard (production) modes: Again
//! 4. otherwise: Hard

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::modes::ExerciseMode;
use crate::types::Rating;

/// Attempt count per mode (at least 1 once attempted).
pub type ModeAttempts = BTreeMap<ExerciseMode, u32>;

/// Hard-mode failures at which a card counts as forgotten.
pub const FORGOTTEN_HARD_FAILS: u32 = 3;

/// The figures a composite rating was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingBreakdown {
    pub total_fails: u32,
    pub hard_mode_fails: u32,
    pub used_hint: bool,
    pub rating: Rating,
}

fn fails(attempts: u32) -> u32 {
    attempts.saturating_sub(1)
}

/// Compute the composite rating along with its inputs.
pub fn breakdown(attempts: &ModeAttempts, used_hint: bool) -> RatingBreakdown {
    let total_fails: u32 = attempts.values().copied().map(fails).sum();
    let hard_mode_fails: u32 = attempts
        .iter()
        .filter(|(mode, _)| mode.is_hard())
        .map(|(_, count)| fails(*count))
        .sum();

    let rating = if total_fails == 0 && !used_hint {
        Rating::Easy
    } else if total_fails <= 1 {
        Rating::Good
    } else if hard_mode_fails >= FORGOTTEN_HARD_FAILS {
        Rating::Again
    } else {
        Rating::Hard
    };

    RatingBreakdown {
        total_fails,
        hard_mode_fails,
        used_hint,
        rating,
    }
}

/// Breakdown for a card finalised because one mode ran out of attempts.
pub fn exhausted(attempts: &ModeAttempts, used_hint: bool) -> RatingBreakdown {
    RatingBreakdown {
        rating: Rating::Again,
        ..breakdown(attempts, used_hint)
    }
}

/// Compute the composite rating.
pub fn aggregate(attempts: &ModeAttempts, used_hint: bool) -> Rating {
    breakdown(attempts, used_hint).rating
}
